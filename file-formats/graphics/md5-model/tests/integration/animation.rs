//! Action playback and blending through the skeleton

use glam::Vec3;
use md5_model::animation::{blend_pose, slerp_quat};
use md5_model::{ActionState, InterpolationMethod, Skeleton};

use crate::common::{ARM_MESH, ARM_SWEEP, ROOT_BOB};

fn arm_with(clips: &[(&str, &str)]) -> Skeleton {
    let mut skeleton = Skeleton::parse("arm", ARM_MESH).unwrap();
    for (name, content) in clips {
        skeleton.parse_action(name, content).unwrap();
    }
    skeleton
}

#[test]
fn test_stepped_loop_returns_to_first_frame() {
    let mut skeleton = arm_with(&[("sweep", ARM_SWEEP)]);
    let action = skeleton.action_mut("sweep", true).unwrap();
    action.set_fps(4.0);
    action.play(InterpolationMethod::Frame, true);

    for _ in 0..4 {
        assert!(skeleton.update_actions(0.25));
    }

    let action = skeleton.action("sweep", true).unwrap();
    assert_eq!(action.current_frame(), 0);
    assert_eq!(action.next_frame(), 1);
    assert_eq!(action.state(), ActionState::Playing);
}

#[test]
fn test_update_reports_no_change_when_nothing_plays() {
    let mut skeleton = arm_with(&[("sweep", ARM_SWEEP)]);
    assert!(!skeleton.update_actions(1.0));

    let action = skeleton.action_mut("sweep", true).unwrap();
    action.play(InterpolationMethod::Lerp, false);
    action.pause();
    assert!(!skeleton.update_actions(1.0));
}

#[test]
fn test_blend_boundaries_for_every_method() {
    let skeleton = arm_with(&[("sweep", ARM_SWEEP)]);
    let action = &skeleton.actions()[0];
    let a = action.frame(0).unwrap();
    let b = action.frame(3).unwrap();

    for method in [
        InterpolationMethod::Frame,
        InterpolationMethod::Lerp,
        InterpolationMethod::Slerp,
    ] {
        let mut out = Vec::new();
        blend_pose(&mut out, a, b, method, 0.0);
        assert_eq!(out, a, "{method} at t = 0");
        blend_pose(&mut out, a, b, method, 1.0);
        assert_eq!(out, b, "{method} at t = 1");
    }
}

#[test]
fn test_slerp_of_opposite_signs_is_unit() {
    let skeleton = arm_with(&[]);
    let q = skeleton.joints()[1].transform.rotation;
    let mid = slerp_quat(q, -q, 0.5);
    assert!((mid.length() - 1.0).abs() < 1e-6);
    assert!(mid.dot(q).abs() > 0.99999);
}

#[test]
fn test_additive_blend_passes_static_joints_through() {
    let mut skeleton = arm_with(&[("bob", ROOT_BOB), ("sweep", ARM_SWEEP)]);
    for action in skeleton.actions_mut() {
        action.play(InterpolationMethod::Lerp, true);
    }
    skeleton.update_actions(1.0 / 48.0);

    let pose = skeleton
        .add_pose(0, 1, InterpolationMethod::Slerp, 0.75)
        .unwrap();
    let primary = skeleton.actions()[0].pose();

    // The sweep never moves the root, so the bob passes through untouched.
    assert!(pose[0].bits_eq(&primary[0]));
    // The sweep moves the hand, so the hand is pulled toward it.
    assert!(!pose[1].bits_eq(&primary[1]));

    assert!(skeleton.add_pose(0, 9, InterpolationMethod::Lerp, 0.5).is_none());
}

#[test]
fn test_lerp_stops_on_last_frame_without_loop() {
    let mut skeleton = arm_with(&[("sweep", ARM_SWEEP)]);
    let index = skeleton.action_index("sweep", true).unwrap();
    skeleton.actions_mut()[index].play(InterpolationMethod::Lerp, false);

    for _ in 0..3 {
        skeleton.update_actions(0.25);
    }

    let action = &skeleton.actions()[index];
    assert_eq!(action.state(), ActionState::Stopped);
    assert_eq!(action.pose()[1].location, Vec3::new(3.0, 0.0, 1.0));
}

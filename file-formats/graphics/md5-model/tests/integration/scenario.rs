//! Load, build, animate and upload a two joint arm

use glam::Vec3;
use md5_model::{InterpolationMethod, RecordingBackend, Skeleton};
use pretty_assertions::assert_eq;

use crate::common::{ARM_MESH, ARM_RAISE, init_logging, write_fixture};

fn uploaded_positions(skeleton: &Skeleton, backend: &RecordingBackend) -> Vec<Vec3> {
    let mesh = &skeleton.meshes()[0];
    let bytes = backend
        .vertex_data(mesh.buffers().unwrap().vertex)
        .unwrap();
    let floats: Vec<f32> = bytes[..mesh.vertices.len() * 12]
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    floats.chunks_exact(3).map(Vec3::from_slice).collect()
}

#[test]
fn test_bind_pose_round_trip() {
    let mut skeleton = Skeleton::parse("arm", ARM_MESH).unwrap();
    let mut backend = RecordingBackend::new();
    skeleton.build(&mut backend).unwrap();
    let built = skeleton.meshes()[0].vertex_data().clone();

    let bind_pose = skeleton.bind_pose();
    skeleton.set_pose(&bind_pose, &mut backend).unwrap();

    assert_eq!(skeleton.meshes()[0].vertex_data(), &built);
}

#[test]
fn test_raise_arm_end_to_end() {
    init_logging();
    let mesh_file = write_fixture(ARM_MESH, ".md5mesh");
    let anim_file = write_fixture(ARM_RAISE, ".md5anim");

    let mut backend = RecordingBackend::new();
    let mut skeleton = Skeleton::load(mesh_file.path()).unwrap();
    let raise = skeleton.load_action("raise", anim_file.path()).unwrap();
    skeleton.build(&mut backend).unwrap();

    let bind_positions = uploaded_positions(&skeleton, &backend);
    assert_eq!(
        bind_positions,
        vec![
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 1.0, 1.0),
        ]
    );

    let seconds_per_frame = {
        let action = &mut skeleton.actions_mut()[raise];
        action.play(InterpolationMethod::Lerp, false);
        action.seconds_per_frame()
    };

    assert!(skeleton.update_actions(0.0));
    skeleton.apply_action(raise, &mut backend).unwrap();
    assert_eq!(uploaded_positions(&skeleton, &backend), bind_positions);

    assert!(skeleton.update_actions(seconds_per_frame));
    skeleton.apply_action(raise, &mut backend).unwrap();
    let raised: Vec<Vec3> = bind_positions
        .iter()
        .map(|p| *p + Vec3::new(0.0, 0.0, 1.0))
        .collect();
    assert_eq!(uploaded_positions(&skeleton, &backend), raised);
    assert_eq!(skeleton.meshes()[0].vertex_data().positions, raised);
}

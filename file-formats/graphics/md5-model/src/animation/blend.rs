//! Pose blending

use crate::joint::JointTransform;

use super::action::Action;
use super::interpolation::{lerp_quat, lerp_vec3, slerp_quat};
use super::state::InterpolationMethod;

/// Blend two joint transforms
///
/// Locations are always interpolated linearly. Rotations use a spherical
/// blend for [`InterpolationMethod::Slerp`] and a normalized linear blend
/// otherwise.
pub fn blend_joint(
    a: &JointTransform,
    b: &JointTransform,
    method: InterpolationMethod,
    t: f32,
) -> JointTransform {
    let rotation = match method {
        InterpolationMethod::Slerp => slerp_quat(a.rotation, b.rotation, t),
        InterpolationMethod::Frame | InterpolationMethod::Lerp => {
            lerp_quat(a.rotation, b.rotation, t)
        }
    };
    JointTransform::new(lerp_vec3(a.location, b.location, t), rotation)
}

/// Blend two poses joint by joint into `out`
///
/// `out` is resized to the shorter of the two input poses.
pub fn blend_pose(
    out: &mut Vec<JointTransform>,
    a: &[JointTransform],
    b: &[JointTransform],
    method: InterpolationMethod,
    t: f32,
) {
    out.clear();
    out.extend(
        a.iter()
            .zip(b)
            .map(|(ja, jb)| blend_joint(ja, jb, method, t)),
    );
}

/// Layer a secondary action on top of a primary one
///
/// A joint counts as animated by `secondary` when its transforms in the
/// secondary's current and next frame differ bitwise. Animated joints blend
/// from the primary working pose toward the secondary working pose by
/// `weight`; all other joints take the primary working pose unchanged.
pub fn add_pose(
    out: &mut Vec<JointTransform>,
    primary: &Action,
    secondary: &Action,
    method: InterpolationMethod,
    weight: f32,
) {
    let current = secondary.frame(secondary.current_frame()).unwrap_or_default();
    let next = secondary.frame(secondary.next_frame()).unwrap_or_default();
    let secondary_pose = secondary.pose();

    out.clear();
    out.extend(primary.pose().iter().enumerate().map(|(i, base)| {
        let animated = match (current.get(i), next.get(i), secondary_pose.get(i)) {
            (Some(c), Some(n), Some(layer)) if !c.bits_eq(n) => Some(layer),
            _ => None,
        };
        match animated {
            Some(layer) => blend_joint(base, layer, method, weight),
            None => *base,
        }
    }));
}

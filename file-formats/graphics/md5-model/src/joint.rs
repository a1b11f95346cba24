//! Joint hierarchy records and pose helpers

use glam::{Quat, Vec3};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Location and rotation of a single joint
///
/// In the bind pose and in reconstructed animation frames the transform is
/// absolute (object space), not relative to the parent joint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct JointTransform {
    pub location: Vec3,
    pub rotation: Quat,
}

impl JointTransform {
    pub const IDENTITY: Self = Self {
        location: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub const fn new(location: Vec3, rotation: Quat) -> Self {
        Self { location, rotation }
    }

    /// Build a transform from a location and the X/Y/Z part of a unit quaternion
    pub fn from_components(location: [f32; 3], rotation: [f32; 3]) -> Self {
        Self {
            location: Vec3::from_array(location),
            rotation: quat_from_xyz(rotation[0], rotation[1], rotation[2]),
        }
    }

    /// Transform a point expressed in this joint's local space
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.location + self.rotation * point
    }

    /// Bitwise comparison of location and rotation components
    ///
    /// Unlike `==`, this distinguishes `0.0` from `-0.0` and treats
    /// identical NaN payloads as equal.
    pub fn bits_eq(&self, other: &Self) -> bool {
        let a = self.location.to_array().map(f32::to_bits);
        let b = other.location.to_array().map(f32::to_bits);
        let qa = self.rotation.to_array().map(f32::to_bits);
        let qb = other.rotation.to_array().map(f32::to_bits);
        a == b && qa == qb
    }
}

impl Default for JointTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A named joint of the skeleton hierarchy
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Joint {
    /// Joint name, unique within a skeleton
    pub name: String,
    /// Index of the parent joint, `None` for roots
    pub parent: Option<usize>,
    /// Bind pose transform
    pub transform: JointTransform,
}

impl Joint {
    /// Parent index in file encoding (`-1` for roots)
    pub fn parent_index(&self) -> i32 {
        self.parent.map_or(-1, |p| p as i32)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Reconstruct the W component of a unit quaternion from X, Y and Z
///
/// The negative root is used; when rounding pushes the radicand below zero
/// W is zero.
pub fn quat_w(x: f32, y: f32, z: f32) -> f32 {
    let t = 1.0 - x * x - y * y - z * z;
    if t < 0.0 { 0.0 } else { -t.sqrt() }
}

/// Build a quaternion from its X/Y/Z components, reconstructing W
pub fn quat_from_xyz(x: f32, y: f32, z: f32) -> Quat {
    Quat::from_xyzw(x, y, z, quat_w(x, y, z))
}

/// Copy the bind pose transforms of a joint list into a pose array
pub fn pose_from_joints(joints: &[Joint]) -> Vec<JointTransform> {
    joints.iter().map(|j| j.transform).collect()
}

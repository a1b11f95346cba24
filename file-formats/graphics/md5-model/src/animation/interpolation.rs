//! Location and rotation interpolation for joint blending
//!
//! All functions return their first input exactly at `t == 0.0` and their
//! second input exactly at `t == 1.0`.

use glam::{Quat, Vec3, Vec4};

/// Dot product above which two rotations are treated as parallel
pub const PARALLEL_THRESHOLD: f32 = 0.999_999;

/// Linear interpolation between two locations
pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    if t == 1.0 {
        return b;
    }
    if t == 0.0 {
        return a;
    }
    a + (b - a) * t
}

/// Normalized linear interpolation between two rotations along the shorter arc
pub fn lerp_quat(a: Quat, b: Quat, t: f32) -> Quat {
    if t == 1.0 {
        return b;
    }
    if t == 0.0 {
        return a;
    }

    let b = shortest_path(a, b);
    let blended = Vec4::from(a) * (1.0 - t) + Vec4::from(b) * t;
    normalize_or(blended, a)
}

/// Spherical linear interpolation between two rotations along the shorter arc
///
/// When the rotations are nearly parallel the sine of the angle between them
/// approaches zero, so linear weights are used instead.
pub fn slerp_quat(a: Quat, b: Quat, t: f32) -> Quat {
    if t == 1.0 {
        return b;
    }
    if t == 0.0 {
        return a;
    }

    let mut cos = a.dot(b);
    let mut b = Vec4::from(b);
    if cos < 0.0 {
        b = -b;
        cos = -cos;
    }

    let (k0, k1) = if cos > PARALLEL_THRESHOLD {
        (1.0 - t, t)
    } else {
        let sin = (1.0 - cos * cos).sqrt();
        let angle = sin.atan2(cos);
        let inv_sin = 1.0 / sin;
        (((1.0 - t) * angle).sin() * inv_sin, (t * angle).sin() * inv_sin)
    };

    let blended = Vec4::from(a) * k0 + b * k1;
    if cos > PARALLEL_THRESHOLD {
        normalize_or(blended, a)
    } else {
        Quat::from_vec4(blended)
    }
}

fn shortest_path(a: Quat, b: Quat) -> Quat {
    if a.dot(b) < 0.0 { -b } else { b }
}

fn normalize_or(v: Vec4, fallback: Quat) -> Quat {
    let len = v.length();
    if len > 0.0 && len.is_finite() {
        Quat::from_vec4(v / len)
    } else {
        fallback
    }
}

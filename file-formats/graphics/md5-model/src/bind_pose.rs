//! Joint-space normals and tangents for the bind pose
//!
//! Skinning transforms each weight's normal and tangent by the weight's joint
//! rotation. Those per-weight vectors are derived here once, from the
//! bind-pose vertex positions:
//!
//! 1. Face normals and UV tangents are accumulated into each triangle's
//!    three vertices, then normalized per vertex.
//! 2. Each vertex normal and tangent is rotated into the space of every joint
//!    that influences the vertex (conjugate of the joint's bind rotation),
//!    accumulated into the weight and normalized per weight.

use glam::Vec3;

use crate::joint::JointTransform;
use crate::mesh::Mesh;

/// Summary of one preprocessing pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreprocessReport {
    /// Triangles whose texture coordinates span no area
    pub degenerate_uv_triangles: usize,
    /// Triangles skipped because an index points outside the vertex table
    pub skipped_triangles: usize,
}

/// Compute vertex and weight normals/tangents of `mesh`
///
/// `mesh.vertex_data()` must hold the positions skinned with `bind_pose`.
/// Previous results are discarded, so running the pass twice is harmless.
pub fn preprocess_mesh(mesh: &mut Mesh, bind_pose: &[JointTransform]) -> PreprocessReport {
    let mut report = PreprocessReport::default();
    let positions = &mesh.vertex_data.positions;

    for vertex in &mut mesh.vertices {
        vertex.normal = Vec3::ZERO;
        vertex.tangent = Vec3::ZERO;
    }

    for triangle in &mesh.triangles {
        let [i0, i1, i2] = triangle.indices.map(usize::from);
        let (Some(&p0), Some(&p1), Some(&p2)) = (positions.get(i0), positions.get(i1), positions.get(i2))
        else {
            report.skipped_triangles += 1;
            continue;
        };
        if i0.max(i1).max(i2) >= mesh.vertices.len() {
            report.skipped_triangles += 1;
            continue;
        }

        let v1 = p0 - p1;
        let v2 = p0 - p2;
        let normal = v1.cross(v2).normalize_or_zero();

        let uv0 = mesh.vertices[i0].uv;
        let uv1 = mesh.vertices[i1].uv - uv0;
        let uv2 = mesh.vertices[i2].uv - uv0;
        let c = 1.0 / (uv1.x * uv2.y - uv2.x * uv1.y);
        let tangent = if c.is_finite() {
            (v1 * uv2.y + v2 * uv1.y) * c
        } else {
            report.degenerate_uv_triangles += 1;
            Vec3::ZERO
        };

        for i in [i0, i1, i2] {
            mesh.vertices[i].normal += normal;
            mesh.vertices[i].tangent += tangent;
        }
    }

    for weight in &mut mesh.weights {
        weight.normal = Vec3::ZERO;
        weight.tangent = Vec3::ZERO;
    }

    for vertex in &mut mesh.vertices {
        vertex.normal = vertex.normal.normalize_or_zero();
        vertex.tangent = vertex.tangent.normalize_or_zero();

        let Some(weights) = mesh.weights.get_mut(vertex.weight_range()) else {
            continue;
        };
        for weight in weights {
            let Some(joint) = bind_pose.get(weight.joint) else {
                continue;
            };
            let inverse = joint.rotation.conjugate();
            weight.normal += inverse * vertex.normal;
            weight.tangent += inverse * vertex.tangent;
        }
    }

    for weight in &mut mesh.weights {
        weight.normal = weight.normal.normalize_or_zero();
        weight.tangent = weight.tangent.normalize_or_zero();
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Triangle, Vertex, Weight};
    use crate::skinning::skin_mesh;
    use glam::{Quat, Vec2};

    /// Unit right triangle in the XY plane, one weight per vertex on joint 0
    fn flat_triangle(uvs: [Vec2; 3]) -> Mesh {
        let corners = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let vertices = (0..3)
            .map(|i| Vertex {
                uv: uvs[i],
                start: i,
                count: 1,
                ..Default::default()
            })
            .collect();
        let weights = corners
            .iter()
            .map(|&location| Weight {
                joint: 0,
                bias: 1.0,
                location,
                ..Default::default()
            })
            .collect();
        Mesh::new("flat".into(), vertices, vec![Triangle::from_file_order(0, 1, 2)], weights)
    }

    #[test]
    fn test_face_normal_follows_stored_winding() {
        let mut mesh = flat_triangle([Vec2::ZERO, Vec2::X, Vec2::Y]);
        let pose = [JointTransform::IDENTITY];
        skin_mesh(&mut mesh, &pose);
        let report = preprocess_mesh(&mut mesh, &pose);

        assert_eq!(report, PreprocessReport::default());
        // Stored order is (2, 1, 0): v1 = Y - X, v2 = Y, cross points along -Z.
        for vertex in &mesh.vertices {
            assert!((vertex.normal - Vec3::NEG_Z).length() < 1e-6);
            assert!((vertex.tangent.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_degenerate_uvs_give_zero_tangent() {
        let mut mesh = flat_triangle([Vec2::ZERO; 3]);
        let pose = [JointTransform::IDENTITY];
        skin_mesh(&mut mesh, &pose);
        let report = preprocess_mesh(&mut mesh, &pose);

        assert_eq!(report.degenerate_uv_triangles, 1);
        assert!(mesh.weights.iter().all(|w| w.tangent == Vec3::ZERO));
        assert!(mesh.weights.iter().all(|w| (w.normal.length() - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_weight_normals_are_joint_local() {
        let mut mesh = flat_triangle([Vec2::ZERO, Vec2::X, Vec2::Y]);
        let rotation = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
        let pose = [JointTransform::new(Vec3::ZERO, rotation)];
        skin_mesh(&mut mesh, &pose);
        preprocess_mesh(&mut mesh, &pose);

        // Re-skinning with the same pose must land back on the vertex normals.
        skin_mesh(&mut mesh, &pose);
        for (vertex, normal) in mesh.vertices.iter().zip(&mesh.vertex_data().normals) {
            assert!((vertex.normal - *normal).length() < 1e-5);
        }
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let mut mesh = flat_triangle([Vec2::ZERO, Vec2::X, Vec2::Y]);
        let pose = [JointTransform::IDENTITY];
        skin_mesh(&mut mesh, &pose);
        preprocess_mesh(&mut mesh, &pose);
        let first = mesh.weights.clone();
        preprocess_mesh(&mut mesh, &pose);
        assert_eq!(mesh.weights, first);
    }
}

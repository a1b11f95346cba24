//! Vertex skinning for MD5 meshes
//!
//! Each vertex is the bias-weighted sum of its weights transformed by their
//! joints:
//!
//! ```text
//! position = sum(bias * (joint.location + joint.rotation * weight.location))
//! normal   = sum(bias * (joint.rotation * weight.normal))
//! tangent  = sum(bias * (joint.rotation * weight.tangent))
//! ```
//!
//! Biases are used as stored. A vertex whose biases do not add up to one is
//! scaled accordingly; no renormalization takes place.
//!
//! # Example
//!
//! ```rust,no_run
//! use md5_model::Skeleton;
//! use md5_model::skinning::skin_mesh;
//!
//! let mut skeleton = Skeleton::load("models/hero.md5mesh")?;
//! let pose = skeleton.bind_pose();
//! for mesh in skeleton.meshes_mut() {
//!     skin_mesh(mesh, &pose);
//!     println!("first vertex: {:?}", mesh.vertex_data().positions.first());
//! }
//! # Ok::<(), md5_model::Md5Error>(())
//! ```

use glam::{Vec2, Vec3};

use crate::joint::JointTransform;
use crate::mesh::Mesh;

/// Byte offsets of the planar attribute arrays inside a vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VertexLayout {
    /// Total size in bytes
    pub size: usize,
    /// Offsets of positions, normals, texture coordinates and tangents
    pub offsets: [usize; 4],
}

impl VertexLayout {
    pub const POSITION: usize = 0;
    pub const NORMAL: usize = 1;
    pub const UV: usize = 2;
    pub const TANGENT: usize = 3;

    /// Layout for `count` vertices stored as position, normal, uv, tangent blocks
    pub fn for_vertex_count(count: usize) -> Self {
        let vec3 = std::mem::size_of::<Vec3>();
        let vec2 = std::mem::size_of::<Vec2>();
        let normal = count * vec3;
        let uv = normal + count * vec3;
        let tangent = uv + count * vec2;
        Self {
            size: tangent + count * vec3,
            offsets: [0, normal, uv, tangent],
        }
    }
}

/// CPU side copy of a mesh's skinned vertex attributes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VertexBuffer {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub tangents: Vec<Vec3>,
}

impl VertexBuffer {
    pub fn with_vertex_count(count: usize) -> Self {
        Self {
            positions: vec![Vec3::ZERO; count],
            normals: vec![Vec3::ZERO; count],
            uvs: vec![Vec2::ZERO; count],
            tangents: vec![Vec3::ZERO; count],
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn layout(&self) -> VertexLayout {
        VertexLayout::for_vertex_count(self.len())
    }

    /// Serialize into the upload format: all positions, then normals, uvs and tangents
    pub fn to_bytes(&self) -> Vec<u8> {
        let layout = self.layout();
        let mut bytes = Vec::with_capacity(layout.size);
        bytes.extend_from_slice(bytemuck::cast_slice(&self.positions));
        bytes.extend_from_slice(bytemuck::cast_slice(&self.normals));
        bytes.extend_from_slice(bytemuck::cast_slice(&self.uvs));
        bytes.extend_from_slice(bytemuck::cast_slice(&self.tangents));
        bytes
    }

    fn clear(&mut self) {
        self.positions.fill(Vec3::ZERO);
        self.normals.fill(Vec3::ZERO);
        self.tangents.fill(Vec3::ZERO);
    }
}

/// Recompute a mesh's vertex buffer for the given pose
///
/// `pose` must contain one transform per skeleton joint. Weights that refer
/// to a joint outside the pose, and vertices whose weight range lies outside
/// the weight table, contribute nothing.
pub fn skin_mesh(mesh: &mut Mesh, pose: &[JointTransform]) {
    let Mesh {
        vertices,
        weights,
        vertex_data,
        ..
    } = mesh;

    if vertex_data.len() != vertices.len() {
        *vertex_data = VertexBuffer::with_vertex_count(vertices.len());
    }
    vertex_data.clear();

    for (i, vertex) in vertices.iter().enumerate() {
        let Some(vertex_weights) = weights.get(vertex.weight_range()) else {
            continue;
        };

        let mut position = Vec3::ZERO;
        let mut normal = Vec3::ZERO;
        let mut tangent = Vec3::ZERO;

        for weight in vertex_weights {
            let Some(joint) = pose.get(weight.joint) else {
                continue;
            };

            position += (joint.location + joint.rotation * weight.location) * weight.bias;
            normal += (joint.rotation * weight.normal) * weight.bias;
            tangent += (joint.rotation * weight.tangent) * weight.bias;
        }

        vertex_data.positions[i] = position;
        vertex_data.normals[i] = normal;
        vertex_data.tangents[i] = tangent;
        vertex_data.uvs[i] = vertex.uv;
    }
}

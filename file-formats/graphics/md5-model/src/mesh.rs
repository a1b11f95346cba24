//! Sub-mesh records of an MD5 skeleton

use std::fmt;
use std::sync::Arc;

use glam::{Vec2, Vec3};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use crate::render::{MaterialBinding, MeshBuffers, PrimitiveMode};
use crate::skinning::VertexBuffer;

/// A mesh vertex: texture coordinate plus a run of weights
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Vertex {
    pub uv: Vec2,
    /// Accumulated bind pose normal (filled by the preprocessor)
    pub normal: Vec3,
    /// Accumulated bind pose tangent (filled by the preprocessor)
    pub tangent: Vec3,
    /// Index of the first weight in the mesh weight table
    pub start: usize,
    /// Number of weights influencing the vertex
    pub count: usize,
}

impl Vertex {
    /// Range of this vertex's weights in the mesh weight table
    ///
    /// The end saturates, so a corrupt `start`/`count` pair yields a range
    /// that no weight table can satisfy.
    pub fn weight_range(&self) -> std::ops::Range<usize> {
        self.start..self.start.saturating_add(self.count)
    }

    /// End of the weight range, `None` when `start + count` overflows
    pub fn checked_weight_end(&self) -> Option<usize> {
        self.start.checked_add(self.count)
    }
}

/// Triangle indices, stored in reverse of the file order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Triangle {
    pub indices: [u16; 3],
}

impl Triangle {
    /// Build a triangle from the three indices as written in the file
    pub fn from_file_order(a: u16, b: u16, c: u16) -> Self {
        Self { indices: [c, b, a] }
    }
}

/// A joint influence on a vertex
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Weight {
    pub joint: usize,
    pub bias: f32,
    /// Rest offset from the joint, in joint space
    pub location: Vec3,
    /// Joint-space normal (filled by the preprocessor)
    pub normal: Vec3,
    /// Joint-space tangent (filled by the preprocessor)
    pub tangent: Vec3,
}

/// A drawable sub-mesh of a skeleton
pub struct Mesh {
    /// Shader (material) name declared by the mesh block
    pub shader: String,
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    pub weights: Vec<Weight>,
    pub(crate) indices: Vec<u16>,
    pub(crate) index_count: usize,
    pub(crate) mode: PrimitiveMode,
    pub(crate) visible: bool,
    pub(crate) material: Option<Arc<dyn MaterialBinding>>,
    pub(crate) vertex_data: VertexBuffer,
    pub(crate) buffers: Option<MeshBuffers>,
}

impl Mesh {
    /// Create a mesh from parsed tables, deriving its index buffer
    pub fn new(
        shader: String,
        vertices: Vec<Vertex>,
        triangles: Vec<Triangle>,
        weights: Vec<Weight>,
    ) -> Self {
        let indices: Vec<u16> = triangles.iter().flat_map(|t| t.indices).collect();
        let index_count = indices.len();
        let vertex_data = VertexBuffer::with_vertex_count(vertices.len());
        Self {
            shader,
            vertices,
            triangles,
            weights,
            indices,
            index_count,
            mode: PrimitiveMode::Triangles,
            visible: true,
            material: None,
            vertex_data,
            buffers: None,
        }
    }

    /// Index buffer as submitted for drawing
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Number of indices a draw call submits for this mesh
    pub fn index_count(&self) -> usize {
        self.index_count
    }

    pub fn mode(&self) -> PrimitiveMode {
        self.mode
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Toggle drawing of this mesh
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn material(&self) -> Option<&Arc<dyn MaterialBinding>> {
        self.material.as_ref()
    }

    /// Assign the material bound before this mesh is drawn
    pub fn set_material(&mut self, material: Arc<dyn MaterialBinding>) {
        self.material = Some(material);
    }

    pub fn clear_material(&mut self) {
        self.material = None;
    }

    /// Skinned vertex data from the last pose evaluation
    pub fn vertex_data(&self) -> &VertexBuffer {
        &self.vertex_data
    }

    /// Backend buffers, present once the mesh has been built
    pub fn buffers(&self) -> Option<MeshBuffers> {
        self.buffers
    }

    /// Sum of weight biases for each vertex
    pub fn bias_sums(&self) -> Vec<f32> {
        self.vertices
            .iter()
            .map(|v| {
                self.weights
                    .get(v.weight_range())
                    .map_or(0.0, |ws| ws.iter().map(|w| w.bias).sum())
            })
            .collect()
    }
}

impl fmt::Debug for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mesh")
            .field("shader", &self.shader)
            .field("vertices", &self.vertices.len())
            .field("triangles", &self.triangles.len())
            .field("weights", &self.weights.len())
            .field("index_count", &self.index_count)
            .field("mode", &self.mode)
            .field("visible", &self.visible)
            .field("material", &self.material.as_ref().map(|m| m.name().to_string()))
            .finish_non_exhaustive()
    }
}

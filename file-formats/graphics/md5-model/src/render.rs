//! Render backend boundary
//!
//! The skeleton never talks to a graphics API directly. Buffer creation,
//! vertex uploads, material binding and draw dispatch go through
//! [`RenderBackend`], which the caller passes in by mutable reference on the
//! thread that owns the graphics context.

use std::collections::HashMap;
use std::fmt;

use glam::{Mat4, Vec3, Vec4};

use crate::skinning::VertexLayout;

/// Opaque handle to a backend buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Primitive topology of an index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveMode {
    #[default]
    Triangles,
    TriangleStrip,
}

/// Buffers a built mesh owns on the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBuffers {
    pub vertex: BufferId,
    pub index: BufferId,
}

/// Everything a backend needs to issue one indexed draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub buffers: MeshBuffers,
    pub layout: VertexLayout,
    pub mode: PrimitiveMode,
    pub index_count: usize,
}

/// Value of a shader uniform set by a material
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

/// Graphics API operations used by skeleton building, pose upload and drawing
pub trait RenderBackend {
    /// Create a dynamic vertex buffer initialized with `data`
    fn create_vertex_buffer(&mut self, data: &[u8]) -> BufferId;

    /// Replace the whole content of a vertex buffer
    fn update_vertex_buffer(&mut self, buffer: BufferId, data: &[u8]);

    /// Create a static index buffer
    fn create_index_buffer(&mut self, indices: &[u16]) -> BufferId;

    /// Free a vertex or index buffer; the id is not used again by the caller
    fn release_buffer(&mut self, buffer: BufferId);

    /// Make `program` the active shader program
    fn use_program(&mut self, program: &str);

    /// Set a uniform on the active program
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    /// Issue an indexed draw
    fn draw_indexed(&mut self, call: &DrawCall);
}

/// Per-draw state applied before a mesh is drawn
///
/// A material is attached to a mesh with [`Mesh::set_material`]; the concrete
/// type decides which program and uniforms it binds.
///
/// [`Mesh::set_material`]: crate::mesh::Mesh::set_material
pub trait MaterialBinding: fmt::Debug {
    fn name(&self) -> &str;

    fn bind(&self, backend: &mut dyn RenderBackend);
}

/// A material made of one program and a fixed set of uniforms
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramMaterial {
    pub name: String,
    pub program: String,
    pub uniforms: Vec<(String, UniformValue)>,
}

impl ProgramMaterial {
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            uniforms: Vec::new(),
        }
    }

    pub fn with_uniform(mut self, name: impl Into<String>, value: UniformValue) -> Self {
        self.uniforms.push((name.into(), value));
        self
    }
}

impl MaterialBinding for ProgramMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind(&self, backend: &mut dyn RenderBackend) {
        backend.use_program(&self.program);
        for (name, value) in &self.uniforms {
            backend.set_uniform(name, *value);
        }
    }
}

/// A command captured by [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateVertexBuffer { buffer: BufferId, size: usize },
    UpdateVertexBuffer { buffer: BufferId, size: usize },
    CreateIndexBuffer { buffer: BufferId, count: usize },
    ReleaseBuffer(BufferId),
    UseProgram(String),
    SetUniform(String, UniformValue),
    Draw(DrawCall),
}

/// In-memory backend that keeps buffer contents and a command log
///
/// Useful for headless tools and tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u32,
    vertex_buffers: HashMap<BufferId, Vec<u8>>,
    index_buffers: HashMap<BufferId, Vec<u16>>,
    commands: Vec<Command>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn vertex_data(&self, buffer: BufferId) -> Option<&[u8]> {
        self.vertex_buffers.get(&buffer).map(Vec::as_slice)
    }

    pub fn index_data(&self, buffer: BufferId) -> Option<&[u16]> {
        self.index_buffers.get(&buffer).map(Vec::as_slice)
    }

    /// Number of vertex and index buffers currently alive
    pub fn buffer_count(&self) -> usize {
        self.vertex_buffers.len() + self.index_buffers.len()
    }

    /// Draw calls issued since the log was last cleared
    pub fn draw_calls(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter_map(|c| match c {
            Command::Draw(call) => Some(call),
            _ => None,
        })
    }

    fn allocate(&mut self) -> BufferId {
        self.next_id += 1;
        BufferId(self.next_id)
    }
}

impl RenderBackend for RecordingBackend {
    fn create_vertex_buffer(&mut self, data: &[u8]) -> BufferId {
        let buffer = self.allocate();
        self.vertex_buffers.insert(buffer, data.to_vec());
        self.commands.push(Command::CreateVertexBuffer {
            buffer,
            size: data.len(),
        });
        buffer
    }

    fn update_vertex_buffer(&mut self, buffer: BufferId, data: &[u8]) {
        match self.vertex_buffers.get_mut(&buffer) {
            Some(existing) => {
                existing.clear();
                existing.extend_from_slice(data);
            }
            None => log::warn!("update of unknown vertex buffer {buffer:?}"),
        }
        self.commands.push(Command::UpdateVertexBuffer {
            buffer,
            size: data.len(),
        });
    }

    fn create_index_buffer(&mut self, indices: &[u16]) -> BufferId {
        let buffer = self.allocate();
        self.index_buffers.insert(buffer, indices.to_vec());
        self.commands.push(Command::CreateIndexBuffer {
            buffer,
            count: indices.len(),
        });
        buffer
    }

    fn release_buffer(&mut self, buffer: BufferId) {
        let removed = self.vertex_buffers.remove(&buffer).is_some()
            || self.index_buffers.remove(&buffer).is_some();
        if !removed {
            log::warn!("release of unknown buffer {buffer:?}");
        }
        self.commands.push(Command::ReleaseBuffer(buffer));
    }

    fn use_program(&mut self, program: &str) {
        self.commands.push(Command::UseProgram(program.to_string()));
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.commands
            .push(Command::SetUniform(name.to_string(), value));
    }

    fn draw_indexed(&mut self, call: &DrawCall) {
        self.commands.push(Command::Draw(*call));
    }
}

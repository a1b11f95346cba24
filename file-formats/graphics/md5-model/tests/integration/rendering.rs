//! Buffer upload, materials and draw submission

use std::cell::Cell;
use std::sync::Arc;

use md5_model::render::{Command, UniformValue};
use md5_model::{
    BuildOptions, MaterialBinding, PrimitiveMode, RecordingBackend, RenderBackend, Skeleton,
};

use crate::common::ARM_MESH;

/// Material that reports how often it was bound
#[derive(Debug, Default)]
struct CountingMaterial {
    binds: Cell<u32>,
}

impl MaterialBinding for CountingMaterial {
    fn name(&self) -> &str {
        "counting"
    }

    fn bind(&self, backend: &mut dyn RenderBackend) {
        self.binds.set(self.binds.get() + 1);
        backend.use_program("skinned");
        backend.set_uniform("BIND_COUNT", UniformValue::Int(self.binds.get() as i32));
    }
}

#[test]
fn test_build_order_of_backend_commands() {
    let mut skeleton = Skeleton::parse("arm", ARM_MESH).unwrap();
    let mut backend = RecordingBackend::new();
    skeleton.build(&mut backend).unwrap();

    let commands = backend.commands();
    assert!(matches!(commands[0], Command::CreateVertexBuffer { size: 132, .. }));
    assert!(matches!(commands[1], Command::CreateIndexBuffer { count: 3, .. }));
    assert!(matches!(commands[2], Command::UpdateVertexBuffer { size: 132, .. }));
    assert_eq!(commands.len(), 3);
}

#[test]
fn test_material_is_bound_before_each_draw() {
    let mut skeleton = Skeleton::parse("arm", ARM_MESH).unwrap();
    let mut backend = RecordingBackend::new();
    skeleton.build(&mut backend).unwrap();

    let material = Arc::new(CountingMaterial::default());
    skeleton
        .mesh_mut("arm", true)
        .unwrap()
        .set_material(material.clone());
    backend.clear_commands();

    assert_eq!(skeleton.draw(&mut backend), 3);
    assert_eq!(skeleton.draw(&mut backend), 3);
    assert_eq!(material.binds.get(), 2);
    assert_eq!(backend.draw_calls().count(), 2);
    assert_eq!(
        backend.commands()[0],
        Command::UseProgram("skinned".to_string())
    );

    let call = backend.draw_calls().next().unwrap();
    assert_eq!(call.mode, PrimitiveMode::Triangles);
    assert_eq!(call.index_count, 3);
    assert_eq!(call.layout.offsets, [0, 36, 72, 96]);
}

#[test]
fn test_hidden_mesh_is_not_drawn() {
    let mut skeleton = Skeleton::parse("arm", ARM_MESH).unwrap();
    let mut backend = RecordingBackend::new();
    skeleton.build(&mut backend).unwrap();

    skeleton.mesh_mut("ar", false).unwrap().set_visible(false);
    assert_eq!(skeleton.draw(&mut backend), 0);
    assert_eq!(backend.draw_calls().count(), 0);
}

#[test]
fn test_single_triangle_is_not_stripped() {
    let mut skeleton = Skeleton::parse("arm", ARM_MESH).unwrap();
    let mut backend = RecordingBackend::new();
    let options = BuildOptions {
        optimize: true,
        vertex_cache_size: 8,
        ..Default::default()
    };
    skeleton.build_with(&mut backend, &options).unwrap();

    let mesh = &skeleton.meshes()[0];
    assert_eq!(mesh.mode(), PrimitiveMode::Triangles);
    assert_eq!(mesh.index_count(), 3);
}

#[test]
fn test_bounds_after_build() {
    let mut skeleton = Skeleton::parse("arm", ARM_MESH).unwrap();
    skeleton.build(&mut RecordingBackend::new()).unwrap();

    let bounds = skeleton.bounds();
    assert_eq!(bounds.min, glam::Vec3::new(0.0, 0.0, 1.0));
    assert_eq!(bounds.max, glam::Vec3::new(1.0, 1.0, 1.0));
    assert_eq!(bounds.radius, 0.5);
}

//! Tables printed by the mesh and anim commands

use glam::Vec3;
use md5_model::{Bounds, Joint, JointTransform, Mesh};
use prettytable::{Cell, Row, Table};

use super::format::{format_bytes, format_quat, format_vec3};

fn titled(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(*prettytable::format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(Row::new(
        headers.iter().map(|h| Cell::new(h).style_spec("b")).collect(),
    ));
    table
}

/// Index and count columns are right aligned
fn number(value: usize) -> Cell {
    Cell::new(&value.to_string()).style_spec("r")
}

fn text(value: &str) -> Cell {
    Cell::new(value)
}

/// One row per sub-mesh with its record counts and vertex buffer size
pub fn mesh_table(meshes: &[Mesh]) -> Table {
    let mut table = titled(&["#", "Shader", "Vertices", "Triangles", "Weights", "Buffer"]);
    for (i, mesh) in meshes.iter().enumerate() {
        table.add_row(Row::new(vec![
            number(i),
            text(&mesh.shader),
            number(mesh.vertices.len()),
            number(mesh.triangles.len()),
            number(mesh.weights.len()),
            text(&format_bytes(mesh.vertex_data().layout().size as u64)),
        ]));
    }
    table
}

/// Bind-pose joints with their parent names
pub fn joint_table(joints: &[Joint]) -> Table {
    let mut table = titled(&["#", "Name", "Parent", "Location", "Rotation"]);
    for (i, joint) in joints.iter().enumerate() {
        let parent = joint
            .parent
            .and_then(|p| joints.get(p))
            .map_or("-", |p| p.name.as_str());
        table.add_row(Row::new(vec![
            number(i),
            text(&joint.name),
            text(parent),
            text(&format_vec3(joint.transform.location)),
            text(&format_quat(joint.transform.rotation)),
        ]));
    }
    table
}

/// Named object-space joint transforms of a pose
pub fn pose_table<'a>(joints: impl IntoIterator<Item = (&'a str, &'a JointTransform)>) -> Table {
    let mut table = titled(&["Name", "Location", "Rotation"]);
    for (name, transform) in joints {
        table.add_row(Row::new(vec![
            text(name),
            text(&format_vec3(transform.location)),
            text(&format_quat(transform.rotation)),
        ]));
    }
    table
}

pub fn position_table(positions: &[Vec3]) -> Table {
    let mut table = titled(&["Vertex", "Position"]);
    for (i, p) in positions.iter().enumerate() {
        table.add_row(Row::new(vec![number(i), text(&format_vec3(*p))]));
    }
    table
}

/// Per-frame bounds from an animation's `bounds` block
pub fn frame_bounds_table(bounds: &[Bounds]) -> Table {
    let mut table = titled(&["Frame", "Min", "Max", "Radius"]);
    for (i, b) in bounds.iter().enumerate() {
        table.add_row(Row::new(vec![
            number(i),
            text(&format_vec3(b.min)),
            text(&format_vec3(b.max)),
            text(&format!("{:.3}", b.radius)),
        ]));
    }
    table
}

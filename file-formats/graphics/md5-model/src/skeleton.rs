//! MD5 skeleton: `.md5mesh` loading, actions and rendering
//!
//! A [`Skeleton`] owns its bind-pose joints, its meshes and every action
//! loaded for it. Nothing refers back to the skeleton; actions and meshes are
//! addressed by index or by name.

use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::Path;

use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

use crate::anim::parse_action;
use crate::animation::{Action, InterpolationMethod, add_pose};
use crate::bind_pose::preprocess_mesh;
use crate::bounds::Bounds;
use crate::error::{Md5Error, Result};
use crate::joint::{Joint, JointTransform, pose_from_joints};
use crate::mesh::{Mesh, Triangle, Vertex, Weight};
use crate::parser::{Line, LineReader};
use crate::render::{DrawCall, MeshBuffers, PrimitiveMode, RenderBackend};
use crate::skinning::{VertexBuffer, skin_mesh};
use crate::strip::build_strip;

/// The only `MD5Version` accepted by the readers
pub const MD5_VERSION: i32 = 10;

/// Vertex cache size used by [`Skeleton::optimize`] when none is given
pub const DEFAULT_VERTEX_CACHE_SIZE: usize = 16;

/// Options for reading `.md5mesh` and `.md5anim` files
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Check declared counts and cross references after parsing
    pub validate: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { validate: true }
    }
}

/// Options for [`Skeleton::build_with`]
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Convert index lists to triangle strips before uploading them
    pub optimize: bool,
    /// Vertex cache size for strip generation, 0 selects the default
    pub vertex_cache_size: usize,
    /// Drop triangles and CPU indices once the backend holds them
    pub release_mesh_data: bool,
}

/// A skinned model with its animations
#[derive(Debug)]
pub struct Skeleton {
    /// Model name, the file stem when loaded from disk
    pub name: String,
    /// World location
    pub location: Vec3,
    /// World rotation as XYZ Euler angles, in degrees
    pub rotation: Vec3,
    pub scale: Vec3,
    /// Distance to the viewer; a skeleton at distance 0 is not drawn
    pub distance: f32,
    pub visible: bool,
    joints: Vec<Joint>,
    meshes: Vec<Mesh>,
    actions: Vec<Action>,
    bounds: Bounds,
    options: LoadOptions,
    mesh_data_released: bool,
}

impl Skeleton {
    fn new(name: String, joints: Vec<Joint>, meshes: Vec<Mesh>, options: LoadOptions) -> Self {
        Self {
            name,
            location: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            distance: 1.0,
            visible: true,
            joints,
            meshes,
            actions: Vec::new(),
            bounds: Bounds::default(),
            options,
            mesh_data_released: false,
        }
    }

    /// Load a `.md5mesh` file with default options
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with(path, LoadOptions::default())
    }

    /// Load a `.md5mesh` file
    pub fn load_with<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::parse_with(name, &content, options)
    }

    /// Read a `.md5mesh` document from any reader
    pub fn from_reader<R: Read>(
        name: impl Into<String>,
        reader: &mut R,
        options: LoadOptions,
    ) -> Result<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::parse_with(name, &content, options)
    }

    /// Parse `.md5mesh` text with default options
    pub fn parse(name: impl Into<String>, content: &str) -> Result<Self> {
        Self::parse_with(name, content, LoadOptions::default())
    }

    /// Parse `.md5mesh` text
    pub fn parse_with(name: impl Into<String>, content: &str, options: LoadOptions) -> Result<Self> {
        let name = name.into();
        let mut reader = LineReader::new(content);

        let mut declared_joints: Option<usize> = None;
        let mut declared_meshes: Option<usize> = None;
        let mut joints = Vec::new();
        let mut meshes = Vec::new();
        let mut record_counts = Vec::new();

        while let Some(line) = reader.next() {
            match line.keyword() {
                "MD5Version" => line.check_version()?,
                "commandline" => {}
                "numJoints" => declared_joints = Some(line.field(1, "joint count")?),
                "numMeshes" => declared_meshes = Some(line.field(1, "mesh count")?),
                "joints" => joints = read_joints(&mut reader)?,
                "mesh" => {
                    let (mesh, counts) = read_mesh(&mut reader)?;
                    meshes.push(mesh);
                    record_counts.push(counts);
                }
                other => log::trace!("line {}: skipping '{other}'", line.number),
            }
        }

        if options.validate {
            validate(&joints, declared_joints, &meshes, declared_meshes, &record_counts)?;
        }

        for mesh in &meshes {
            let unweighted = mesh.vertices.iter().filter(|v| v.count == 0).count();
            if unweighted > 0 {
                log::warn!(
                    "mesh '{}': {unweighted} vertices have no weights",
                    mesh.shader
                );
            }
        }

        log::debug!(
            "Loaded skeleton '{name}': {} joints, {} meshes",
            joints.len(),
            meshes.len()
        );

        Ok(Self::new(name, joints, meshes, options))
    }

    /// Load a `.md5anim` clip for this skeleton
    ///
    /// Returns the index of the new action. On failure the action list is
    /// left as it was.
    pub fn load_action<P: AsRef<Path>>(&mut self, name: &str, path: P) -> Result<usize> {
        let content = fs::read_to_string(path)?;
        self.parse_action(name, &content)
    }

    /// Parse `.md5anim` text into a new action for this skeleton
    pub fn parse_action(&mut self, name: &str, content: &str) -> Result<usize> {
        let action = parse_action(name, content, &self.joints, &self.options)?;
        self.actions.push(action);
        Ok(self.actions.len() - 1)
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }

    /// Bind pose transforms in joint order
    pub fn bind_pose(&self) -> Vec<JointTransform> {
        pose_from_joints(&self.joints)
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn meshes_mut(&mut self) -> &mut [Mesh] {
        &mut self.meshes
    }

    /// Find a mesh by shader name, exactly or by substring
    pub fn mesh(&self, name: &str, exact: bool) -> Option<&Mesh> {
        self.meshes.iter().find(|m| name_matches(&m.shader, name, exact))
    }

    pub fn mesh_mut(&mut self, name: &str, exact: bool) -> Option<&mut Mesh> {
        self.meshes
            .iter_mut()
            .find(|m| name_matches(&m.shader, name, exact))
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut [Action] {
        &mut self.actions
    }

    /// Find an action by name, exactly or by substring
    pub fn action(&self, name: &str, exact: bool) -> Option<&Action> {
        self.actions.iter().find(|a| name_matches(a.name(), name, exact))
    }

    pub fn action_mut(&mut self, name: &str, exact: bool) -> Option<&mut Action> {
        self.actions
            .iter_mut()
            .find(|a| name_matches(a.name(), name, exact))
    }

    pub fn action_index(&self, name: &str, exact: bool) -> Option<usize> {
        self.actions
            .iter()
            .position(|a| name_matches(a.name(), name, exact))
    }

    /// Bind-pose bounds computed by the last build or [`Skeleton::update_bounds`]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Whether [`Skeleton::free_mesh_data`] has run
    pub fn is_mesh_data_released(&self) -> bool {
        self.mesh_data_released
    }

    /// World transform built from location, rotation and scale
    pub fn model_matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.z.to_radians(),
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.location)
    }

    /// Build with default options
    pub fn build(&mut self, backend: &mut dyn RenderBackend) -> Result<()> {
        self.build_with(backend, &BuildOptions::default())
    }

    /// Create backend buffers and derive the bind-pose normals and tangents
    ///
    /// Meshes are skinned with the bind pose, preprocessed, skinned again and
    /// uploaded. Bounds are computed from the final bind-pose positions.
    pub fn build_with(&mut self, backend: &mut dyn RenderBackend, options: &BuildOptions) -> Result<()> {
        if self.mesh_data_released {
            return Err(Md5Error::Validation(format!(
                "skeleton '{}': mesh data was released, cannot build again",
                self.name
            )));
        }

        if options.optimize {
            self.optimize(options.vertex_cache_size);
        }

        for mesh in &mut self.meshes {
            if let Some(old) = mesh.buffers.take() {
                backend.release_buffer(old.vertex);
                backend.release_buffer(old.index);
            }
            mesh.vertex_data = VertexBuffer::with_vertex_count(mesh.vertices.len());
            let vertex = backend.create_vertex_buffer(&mesh.vertex_data.to_bytes());
            let index = backend.create_index_buffer(&mesh.indices);
            mesh.buffers = Some(MeshBuffers { vertex, index });
        }

        let bind_pose = self.bind_pose();
        for mesh in &mut self.meshes {
            skin_mesh(mesh, &bind_pose);
            let report = preprocess_mesh(mesh, &bind_pose);
            if report.degenerate_uv_triangles > 0 {
                log::warn!(
                    "mesh '{}': {} triangles have degenerate texture coordinates",
                    mesh.shader,
                    report.degenerate_uv_triangles
                );
            }
            if report.skipped_triangles > 0 {
                log::warn!(
                    "mesh '{}': skipped {} triangles with out of range indices",
                    mesh.shader,
                    report.skipped_triangles
                );
            }
            skin_mesh(mesh, &bind_pose);
            upload(mesh, backend);
        }

        self.update_bounds();

        if options.release_mesh_data {
            self.free_mesh_data();
        }

        log::debug!(
            "Built skeleton '{}': {} meshes, radius {}",
            self.name,
            self.meshes.len(),
            self.bounds.radius
        );
        Ok(())
    }

    /// Recompute bounds from the current skinned positions of every mesh
    pub fn update_bounds(&mut self) {
        self.bounds = Bounds::from_points(
            self.meshes
                .iter()
                .flat_map(|m| m.vertex_data.positions.iter()),
        );
    }

    /// Skin every mesh with `pose` without touching the backend
    pub fn evaluate_pose(&mut self, pose: &[JointTransform]) -> Result<()> {
        self.check_pose(pose)?;
        for mesh in &mut self.meshes {
            skin_mesh(mesh, pose);
        }
        Ok(())
    }

    /// Skin every mesh with `pose` and upload the result
    pub fn set_pose(&mut self, pose: &[JointTransform], backend: &mut dyn RenderBackend) -> Result<()> {
        self.check_pose(pose)?;
        for mesh in &mut self.meshes {
            skin_mesh(mesh, pose);
            upload(mesh, backend);
        }
        Ok(())
    }

    /// Skin and upload the working pose of the action at `index`
    pub fn apply_action(&mut self, index: usize, backend: &mut dyn RenderBackend) -> Result<()> {
        let Self { actions, meshes, .. } = self;
        let action = actions
            .get(index)
            .ok_or_else(|| Md5Error::Validation(format!("no action at index {index}")))?;
        for mesh in meshes.iter_mut() {
            skin_mesh(mesh, action.pose());
            upload(mesh, backend);
        }
        Ok(())
    }

    /// Advance every playing action by `time_step` seconds
    ///
    /// Returns `true` when at least one working pose changed.
    pub fn update_actions(&mut self, time_step: f32) -> bool {
        let mut updated = false;
        for action in &mut self.actions {
            updated |= action.update(time_step);
        }
        updated
    }

    /// Layer the action at `secondary` over the one at `primary`
    pub fn add_pose(
        &self,
        primary: usize,
        secondary: usize,
        method: InterpolationMethod,
        weight: f32,
    ) -> Option<Vec<JointTransform>> {
        let primary = self.actions.get(primary)?;
        let secondary = self.actions.get(secondary)?;
        let mut pose = Vec::with_capacity(self.joints.len());
        add_pose(&mut pose, primary, secondary, method, weight);
        Some(pose)
    }

    /// Draw every visible, built mesh
    ///
    /// Returns the number of indices submitted.
    pub fn draw(&self, backend: &mut dyn RenderBackend) -> usize {
        if !self.visible || self.distance == 0.0 {
            return 0;
        }

        let mut submitted = 0;
        for mesh in self.meshes.iter().filter(|m| m.visible) {
            let Some(buffers) = mesh.buffers else {
                log::debug!("mesh '{}' has no buffers, skipping draw", mesh.shader);
                continue;
            };
            if let Some(material) = &mesh.material {
                material.bind(backend);
            }
            backend.draw_indexed(&DrawCall {
                buffers,
                layout: mesh.vertex_data.layout(),
                mode: mesh.mode,
                index_count: mesh.index_count,
            });
            submitted += mesh.index_count;
        }
        submitted
    }

    /// Convert the index list of every unbuilt mesh into a triangle strip
    ///
    /// A strip is kept only when it is shorter than the list it replaces.
    /// Returns the number of meshes converted.
    pub fn optimize(&mut self, vertex_cache_size: usize) -> usize {
        let cache_size = if vertex_cache_size == 0 {
            DEFAULT_VERTEX_CACHE_SIZE
        } else {
            vertex_cache_size
        };

        let mut converted = 0;
        for mesh in &mut self.meshes {
            if mesh.mode == PrimitiveMode::TriangleStrip || mesh.indices.is_empty() {
                continue;
            }
            if mesh.buffers.is_some() {
                log::warn!(
                    "mesh '{}' is already built, strip conversion skipped",
                    mesh.shader
                );
                continue;
            }

            let strip = build_strip(&mesh.indices, cache_size);
            if strip.len() < mesh.index_count {
                log::debug!(
                    "mesh '{}': strip of {} indices replaces {}",
                    mesh.shader,
                    strip.len(),
                    mesh.index_count
                );
                mesh.index_count = strip.len();
                mesh.indices = strip;
                mesh.mode = PrimitiveMode::TriangleStrip;
                converted += 1;
            }
        }
        converted
    }

    /// Drop triangles and CPU side indices of every mesh
    ///
    /// Index counts are kept so built meshes still draw. The preprocessor
    /// cannot run afterwards.
    pub fn free_mesh_data(&mut self) {
        for mesh in &mut self.meshes {
            mesh.triangles = Vec::new();
            mesh.indices = Vec::new();
        }
        self.mesh_data_released = true;
    }

    fn check_pose(&self, pose: &[JointTransform]) -> Result<()> {
        if pose.len() != self.joints.len() {
            return Err(Md5Error::JointCountMismatch {
                expected: self.joints.len(),
                actual: pose.len(),
            });
        }
        Ok(())
    }
}

fn name_matches(candidate: &str, name: &str, exact: bool) -> bool {
    if exact {
        candidate == name
    } else {
        candidate.contains(name)
    }
}

fn upload(mesh: &Mesh, backend: &mut dyn RenderBackend) {
    if let Some(buffers) = mesh.buffers {
        backend.update_vertex_buffer(buffers.vertex, &mesh.vertex_data.to_bytes());
    }
}

fn read_joints(reader: &mut LineReader<'_>) -> Result<Vec<Joint>> {
    let mut joints = Vec::new();
    loop {
        let line = reader.next_in_block("joints")?;
        if line.is_block_end() {
            return Ok(joints);
        }
        line.expect_tokens(8, "joint")?;

        let parent: i32 = line.field(1, "parent index")?;
        let parent = match parent {
            -1 => None,
            p if p >= 0 => Some(p as usize),
            p => {
                return Err(Md5Error::parse(
                    line.number,
                    format!("invalid parent index {p}"),
                ));
            }
        };

        joints.push(Joint {
            name: line.tokens[0].clone(),
            parent,
            transform: JointTransform::from_components(
                line.vec3(2, "joint location")?,
                line.vec3(5, "joint rotation")?,
            ),
        });
    }
}

/// Number of `vert`, `tri` and `weight` records actually read in a mesh block
#[derive(Debug, Clone, Copy, Default)]
struct RecordCounts {
    vertices: usize,
    triangles: usize,
    weights: usize,
}

fn read_mesh(reader: &mut LineReader<'_>) -> Result<(Mesh, RecordCounts)> {
    let mut shader = String::new();
    let mut vertices = Vec::new();
    let mut triangles = Vec::new();
    let mut weights = Vec::new();
    let mut counts = RecordCounts::default();

    loop {
        let line = reader.next_in_block("mesh")?;
        match line.keyword() {
            "}" => break,
            "shader" => shader = line.field(1, "shader name")?,
            "numverts" => vertices = vec![Vertex::default(); line.field(1, "vertex count")?],
            "numtris" => triangles = vec![Triangle::default(); line.field(1, "triangle count")?],
            "numweights" => weights = vec![Weight::default(); line.field(1, "weight count")?],
            "vert" => {
                line.expect_tokens(6, "vert")?;
                *record_slot(&mut vertices, &line, "vertex")? = Vertex {
                    uv: Vec2::new(line.field(2, "u")?, line.field(3, "v")?),
                    start: line.field(4, "weight start")?,
                    count: line.field(5, "weight count")?,
                    ..Default::default()
                };
                counts.vertices += 1;
            }
            "tri" => {
                line.expect_tokens(5, "tri")?;
                *record_slot(&mut triangles, &line, "triangle")? = Triangle::from_file_order(
                    line.field(2, "vertex index")?,
                    line.field(3, "vertex index")?,
                    line.field(4, "vertex index")?,
                );
                counts.triangles += 1;
            }
            "weight" => {
                line.expect_tokens(7, "weight")?;
                *record_slot(&mut weights, &line, "weight")? = Weight {
                    joint: line.field(2, "joint index")?,
                    bias: line.field(3, "bias")?,
                    location: line.vec3(4, "weight location")?.into(),
                    ..Default::default()
                };
                counts.weights += 1;
            }
            other => log::trace!("line {}: skipping '{other}' in mesh", line.number),
        }
    }

    Ok((Mesh::new(shader, vertices, triangles, weights), counts))
}

fn record_slot<'r, T>(records: &'r mut [T], line: &Line, what: &str) -> Result<&'r mut T> {
    let index: usize = line.field(1, &format!("{what} index"))?;
    let declared = records.len();
    records.get_mut(index).ok_or_else(|| {
        Md5Error::parse(
            line.number,
            format!("{what} {index} outside of the declared count {declared}"),
        )
    })
}

fn validate(
    joints: &[Joint],
    declared_joints: Option<usize>,
    meshes: &[Mesh],
    declared_meshes: Option<usize>,
    record_counts: &[RecordCounts],
) -> Result<()> {
    if let Some(declared) = declared_joints
        && declared != joints.len()
    {
        return Err(Md5Error::Validation(format!(
            "numJoints is {declared} but {} joints were read",
            joints.len()
        )));
    }
    if let Some(declared) = declared_meshes
        && declared != meshes.len()
    {
        return Err(Md5Error::Validation(format!(
            "numMeshes is {declared} but {} meshes were read",
            meshes.len()
        )));
    }

    let mut seen = HashSet::with_capacity(joints.len());
    for (index, joint) in joints.iter().enumerate() {
        if !seen.insert(joint.name.as_str()) {
            return Err(Md5Error::Validation(format!(
                "joint {index} reuses the name '{}'",
                joint.name
            )));
        }
        if let Some(parent) = joint.parent
            && parent >= index
        {
            return Err(Md5Error::Validation(format!(
                "joint {index} '{}' has parent {parent}, parents must precede children",
                joint.name
            )));
        }
    }

    for (mesh, counts) in meshes.iter().zip(record_counts) {
        let shader = &mesh.shader;
        for (what, read, declared) in [
            ("vert", counts.vertices, mesh.vertices.len()),
            ("tri", counts.triangles, mesh.triangles.len()),
            ("weight", counts.weights, mesh.weights.len()),
        ] {
            if read != declared {
                return Err(Md5Error::Validation(format!(
                    "mesh '{shader}': {read} {what} records for a declared count of {declared}"
                )));
            }
        }

        if let Some((i, weight)) = mesh
            .weights
            .iter()
            .enumerate()
            .find(|(_, w)| w.joint >= joints.len())
        {
            return Err(Md5Error::Validation(format!(
                "mesh '{shader}': weight {i} references joint {} of {}",
                weight.joint,
                joints.len()
            )));
        }

        if let Some(i) = mesh.vertices.iter().position(|v| {
            v.checked_weight_end()
                .is_none_or(|end| end > mesh.weights.len())
        }) {
            return Err(Md5Error::Validation(format!(
                "mesh '{shader}': vertex {i} weight range exceeds {} weights",
                mesh.weights.len()
            )));
        }

        if let Some(i) = mesh.triangles.iter().position(|t| {
            t.indices
                .iter()
                .any(|&index| usize::from(index) >= mesh.vertices.len())
        }) {
            return Err(Md5Error::Validation(format!(
                "mesh '{shader}': triangle {i} references a vertex outside of {}",
                mesh.vertices.len()
            )));
        }
    }

    Ok(())
}

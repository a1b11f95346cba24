//! MD5 mesh command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use md5_model::skeleton::DEFAULT_VERTEX_CACHE_SIZE;
use md5_model::{BuildOptions, LoadOptions, MD5_VERSION, RecordingBackend, Skeleton};

use crate::utils::tree::{NodeType, TreeNode, TreeOptions, render_tree};
use crate::utils::{format_vec3, joint_table, mesh_table};

/// Bias sums further than this from one are reported by `validate`
const BIAS_TOLERANCE: f32 = 1e-3;

#[derive(Subcommand)]
pub enum MeshCommands {
    /// Display information about a .md5mesh file
    Info {
        /// Path to the .md5mesh file
        file: PathBuf,

        /// Show the joint table as well
        #[arg(short, long)]
        detailed: bool,
    },

    /// Display the joint hierarchy and meshes as a tree
    Tree {
        /// Path to the .md5mesh file
        file: PathBuf,

        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Hide joint locations and mesh counts
        #[arg(long)]
        no_metadata: bool,
    },

    /// Check a .md5mesh file for structural problems
    Validate {
        /// Path to the .md5mesh file
        file: PathBuf,

        /// Report every offending vertex instead of a summary
        #[arg(short, long)]
        warnings: bool,
    },
}

pub fn execute(cmd: MeshCommands) -> Result<()> {
    match cmd {
        MeshCommands::Info { file, detailed } => handle_info(&file, detailed),
        MeshCommands::Tree {
            file,
            depth,
            no_color,
            no_metadata,
        } => handle_tree(&file, depth, no_color, no_metadata),
        MeshCommands::Validate { file, warnings } => handle_validate(&file, warnings),
    }
}

/// Load and build a skeleton against a recording backend so bounds are known
pub(crate) fn load_built(path: &Path) -> Result<Skeleton> {
    let mut skeleton = Skeleton::load(path)
        .with_context(|| format!("Failed to load MD5 mesh from {}", path.display()))?;
    skeleton
        .build(&mut RecordingBackend::new())
        .with_context(|| format!("Failed to build {}", skeleton.name))?;
    Ok(skeleton)
}

fn handle_info(path: &Path, detailed: bool) -> Result<()> {
    println!("Loading MD5 mesh: {}", path.display());
    let skeleton = load_built(path)?;

    let meshes = skeleton.meshes();
    let vertices: usize = meshes.iter().map(|m| m.vertices.len()).sum();
    let triangles: usize = meshes.iter().map(|m| m.triangles.len()).sum();
    let weights: usize = meshes.iter().map(|m| m.weights.len()).sum();
    let bounds = skeleton.bounds();

    println!("\n=== MD5 Mesh Information ===");
    println!("Name:       {}", skeleton.name);
    println!("Version:    {MD5_VERSION}");
    println!("Joints:     {}", skeleton.joints().len());
    println!("Meshes:     {}", meshes.len());
    println!("Vertices:   {vertices}");
    println!("Triangles:  {triangles}");
    println!("Weights:    {weights}");

    println!("\n=== Bounds (bind pose) ===");
    println!("Min:        {}", format_vec3(bounds.min));
    println!("Max:        {}", format_vec3(bounds.max));
    println!("Dimension:  {}", format_vec3(bounds.dimension));
    println!("Radius:     {:.3}", bounds.radius);

    if !meshes.is_empty() {
        println!("\n=== Meshes ===");
        mesh_table(meshes).printstd();
    }

    if detailed {
        println!("\n=== Joints ===");
        joint_table(skeleton.joints()).printstd();
    }

    Ok(())
}

fn handle_tree(path: &Path, depth: Option<usize>, no_color: bool, no_metadata: bool) -> Result<()> {
    let skeleton = load_built(path)?;

    let tree = build_tree(&skeleton);
    let options = TreeOptions {
        max_depth: depth,
        no_color,
        show_metadata: !no_metadata,
    };
    print!("{}", render_tree(&tree, &options));

    Ok(())
}

fn build_tree(skeleton: &Skeleton) -> TreeNode {
    let joints = skeleton.joints();

    let mut joint_group = TreeNode::new(format!("Joints ({})", joints.len()), NodeType::Group);
    for (i, joint) in joints.iter().enumerate() {
        if joint.is_root() {
            joint_group = joint_group.add_child(joint_node(skeleton, i));
        }
    }

    let mut mesh_group = TreeNode::new(
        format!("Meshes ({})", skeleton.meshes().len()),
        NodeType::Group,
    );
    for mesh in skeleton.meshes() {
        mesh_group = mesh_group.add_child(
            TreeNode::new(mesh.shader.clone(), NodeType::Mesh)
                .with_size(mesh.vertex_data().layout().size as u64)
                .with_metadata("vertices", mesh.vertices.len().to_string())
                .with_metadata("triangles", mesh.triangles.len().to_string())
                .with_metadata("weights", mesh.weights.len().to_string()),
        );
    }

    TreeNode::new(skeleton.name.clone(), NodeType::Root)
        .with_metadata("version", MD5_VERSION.to_string())
        .with_metadata("radius", format!("{:.3}", skeleton.bounds().radius))
        .add_child(joint_group)
        .add_child(mesh_group)
}

/// Children always follow their parent, so one forward scan finds them
fn joint_node(skeleton: &Skeleton, index: usize) -> TreeNode {
    let joint = &skeleton.joints()[index];
    let mut node = TreeNode::new(joint.name.clone(), NodeType::Joint)
        .with_metadata("location", format_vec3(joint.transform.location));
    for (child, candidate) in skeleton.joints().iter().enumerate().skip(index + 1) {
        if candidate.parent == Some(index) {
            node = node.add_child(joint_node(skeleton, child));
        }
    }
    node
}

fn handle_validate(path: &Path, warnings: bool) -> Result<()> {
    println!("Validating MD5 mesh: {}", path.display());

    let mut skeleton = Skeleton::load_with(path, LoadOptions { validate: true })
        .with_context(|| format!("Failed to load MD5 mesh from {}", path.display()))?;

    let mut issues = 0usize;
    for mesh in skeleton.meshes() {
        let off: Vec<(usize, f32)> = mesh
            .bias_sums()
            .into_iter()
            .enumerate()
            .filter(|(_, sum)| (sum - 1.0).abs() > BIAS_TOLERANCE)
            .collect();
        if off.is_empty() {
            continue;
        }
        issues += off.len();
        println!(
            "⚠ mesh '{}': {} vertices have weight biases not summing to 1",
            mesh.shader,
            off.len()
        );
        if warnings {
            for (vertex, sum) in off {
                println!("    vertex {vertex}: bias sum {sum:.4}");
            }
        }
    }

    let mut referenced = vec![false; skeleton.joints().len()];
    for weight in skeleton.meshes().iter().flat_map(|m| &m.weights) {
        if let Some(slot) = referenced.get_mut(weight.joint) {
            *slot = true;
        }
    }
    let unweighted = referenced.iter().filter(|r| !**r).count();
    if unweighted > 0 {
        println!("ℹ {unweighted} joints carry no vertex weights");
    }

    let before: usize = skeleton.meshes().iter().map(|m| m.index_count()).sum();
    let options = BuildOptions {
        optimize: true,
        vertex_cache_size: DEFAULT_VERTEX_CACHE_SIZE,
        release_mesh_data: false,
    };
    skeleton
        .build_with(&mut RecordingBackend::new(), &options)
        .with_context(|| format!("Failed to build {}", skeleton.name))?;
    let after: usize = skeleton.meshes().iter().map(|m| m.index_count()).sum();
    println!("Index count: {before} as lists, {after} after strip conversion");

    if issues == 0 {
        println!("✓ {} is valid", skeleton.name);
    } else {
        println!("✓ {} loaded with {issues} warnings", skeleton.name);
    }

    Ok(())
}

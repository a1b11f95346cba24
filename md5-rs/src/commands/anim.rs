//! MD5 animation command implementations

use anyhow::{Context, Result, ensure};
use clap::Subcommand;
use glam::Vec3;
use serde::Serialize;
use std::path::{Path, PathBuf};

use md5_model::{Action, ActionState, InterpolationMethod, JointTransform, RecordingBackend, Skeleton};

use crate::commands::mesh::load_built;
use crate::utils::{format_seconds, frame_bounds_table, pose_table, position_table};

/// Upper bound on the number of updates `anim pose` runs
const MAX_STEPS: u64 = 10_000_000;

#[derive(Subcommand)]
pub enum AnimCommands {
    /// Display information about a .md5anim file
    Info {
        /// Skeleton the animation targets
        mesh: PathBuf,

        /// Path to the .md5anim file
        anim: PathBuf,

        /// Show per-frame bounds
        #[arg(short, long)]
        detailed: bool,
    },

    /// Play an animation for a while and print the resulting pose
    Pose {
        /// Skeleton the animation targets
        mesh: PathBuf,

        /// Path to the .md5anim file
        anim: PathBuf,

        /// Playback time in seconds
        #[arg(short, long, default_value = "0")]
        time: f32,

        /// Interpolation between frames (frame, lerp or slerp)
        #[arg(short, long, default_value = "frame")]
        method: InterpolationMethod,

        /// Wrap around at the end of the animation
        #[arg(short = 'l', long = "loop")]
        looping: bool,

        /// Update step in seconds
        #[arg(long, default_value_t = 1.0 / 60.0)]
        step: f32,

        /// Print the pose as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(cmd: AnimCommands) -> Result<()> {
    match cmd {
        AnimCommands::Info {
            mesh,
            anim,
            detailed,
        } => handle_info(&mesh, &anim, detailed),
        AnimCommands::Pose {
            mesh,
            anim,
            time,
            method,
            looping,
            step,
            json,
        } => handle_pose(&mesh, &anim, time, method, looping, step, json),
    }
}

fn load_with_action(mesh: &Path, anim: &Path) -> Result<(Skeleton, usize)> {
    let mut skeleton = load_built(mesh)?;
    let name = anim
        .file_stem()
        .map_or_else(|| "action".to_string(), |s| s.to_string_lossy().into_owned());
    let index = skeleton
        .load_action(&name, anim)
        .with_context(|| format!("Failed to load MD5 animation from {}", anim.display()))?;
    Ok((skeleton, index))
}

/// Joints whose transform differs from frame 0 in at least one frame
fn animated_joints(action: &Action) -> usize {
    let Some(first) = action.frame(0) else {
        return 0;
    };
    (0..first.len())
        .filter(|&j| {
            action
                .frames()
                .iter()
                .skip(1)
                .any(|frame| !frame[j].bits_eq(&first[j]))
        })
        .count()
}

fn handle_info(mesh: &Path, anim: &Path, detailed: bool) -> Result<()> {
    println!("Loading MD5 animation: {}", anim.display());
    let (skeleton, index) = load_with_action(mesh, anim)?;
    let action = &skeleton.actions()[index];

    println!("\n=== MD5 Animation Information ===");
    println!("Name:       {}", action.name());
    println!("Skeleton:   {}", skeleton.name);
    println!("Frames:     {}", action.frame_count());
    println!("Frame rate: {:.1} fps", action.fps());
    println!("Duration:   {}", format_seconds(action.duration()));
    println!(
        "Animated:   {} of {} joints",
        animated_joints(action),
        skeleton.joints().len()
    );
    println!("Bounds:     {} frames", action.frame_bounds().len());

    if detailed && !action.frame_bounds().is_empty() {
        println!("\n=== Frame Bounds ===");
        frame_bounds_table(action.frame_bounds()).printstd();
    }

    Ok(())
}

#[derive(Serialize)]
struct PoseReport<'a> {
    action: &'a str,
    time: f32,
    method: InterpolationMethod,
    state: ActionState,
    current_frame: usize,
    next_frame: usize,
    joints: Vec<JointReport<'a>>,
    meshes: Vec<MeshReport<'a>>,
}

#[derive(Serialize)]
struct JointReport<'a> {
    name: &'a str,
    #[serde(flatten)]
    transform: JointTransform,
}

#[derive(Serialize)]
struct MeshReport<'a> {
    shader: &'a str,
    positions: &'a [Vec3],
}

fn handle_pose(
    mesh: &Path,
    anim: &Path,
    time: f32,
    method: InterpolationMethod,
    looping: bool,
    step: f32,
    json: bool,
) -> Result<()> {
    ensure!(time.is_finite() && time >= 0.0, "time must be a non-negative number");
    ensure!(step.is_finite() && step > 0.0, "step must be a positive number");

    let (mut skeleton, index) = load_with_action(mesh, anim)?;
    let mut backend = RecordingBackend::new();

    skeleton.actions_mut()[index].play(method, looping);
    // Full steps, then one partial step for the remainder
    let steps = (f64::from(time) / f64::from(step)).ceil();
    ensure!(
        steps <= MAX_STEPS as f64,
        "{time} s at a step of {step} s needs {steps} updates, the limit is {MAX_STEPS}; use a larger --step"
    );
    let steps = steps as u64;
    for i in 0..steps {
        let dt = if i + 1 == steps {
            (f64::from(time) - f64::from(step) * (steps - 1) as f64) as f32
        } else {
            step
        };
        skeleton.update_actions(dt);
    }
    skeleton.apply_action(index, &mut backend)?;
    log::debug!("pose uploaded with {} backend commands", backend.commands().len());

    let action = &skeleton.actions()[index];
    let report = PoseReport {
        action: action.name(),
        time,
        method,
        state: action.state(),
        current_frame: action.current_frame(),
        next_frame: action.next_frame(),
        joints: skeleton
            .joints()
            .iter()
            .zip(action.pose())
            .map(|(joint, transform)| JointReport {
                name: &joint.name,
                transform: *transform,
            })
            .collect(),
        meshes: skeleton
            .meshes()
            .iter()
            .map(|m| MeshReport {
                shader: &m.shader,
                positions: &m.vertex_data().positions,
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Action:     {} ({})", report.action, report.state);
    println!("Time:       {}", format_seconds(report.time));
    println!("Method:     {}", report.method);
    println!("Frames:     {} -> {}", report.current_frame, report.next_frame);

    println!("\n=== Joints ===");
    pose_table(report.joints.iter().map(|j| (j.name, &j.transform))).printstd();

    for mesh in &report.meshes {
        println!("\n=== Mesh '{}' ===", mesh.shader);
        position_table(mesh.positions).printstd();
    }

    Ok(())
}

//! End-to-end tests for the md5-rs binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const ARM_MESH: &str = r#"MD5Version 10
commandline "fixture"

numJoints 2
numMeshes 1

joints {
	"root"	-1 ( 0 0 0 ) ( 0 0 0 )
	"hand"	0 ( 0 0 1 ) ( 0 0 0 )
}

mesh {
	shader "arm"

	numverts 3
	vert 0 ( 0 0 ) 0 1
	vert 1 ( 1 0 ) 1 1
	vert 2 ( 0 1 ) 2 1

	numtris 1
	tri 0 0 1 2

	numweights 3
	weight 0 1 1.0 ( 0 0 0 )
	weight 1 1 1.0 ( 1 0 0 )
	weight 2 1 0.5 ( 0 1 0 )
}
"#;

const ARM_RAISE: &str = r#"MD5Version 10
numFrames 2
numJoints 2
frameRate 24

frame 0 {
	0 0 0 0 0 0
	0 0 1 0 0 0
}

frame 1 {
	0 0 0 0 0 0
	0 0 2 0 0 0
}
"#;

fn fixture(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("arm")
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn md5_rs() -> Command {
    Command::cargo_bin("md5-rs").unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    md5_rs()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mesh"))
        .stdout(predicate::str::contains("anim"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_mesh_info() {
    let mesh = fixture(ARM_MESH, ".md5mesh");

    md5_rs()
        .args(["mesh", "info", "--detailed"])
        .arg(mesh.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Joints:     2"))
        .stdout(predicate::str::contains("Triangles:  1"))
        .stdout(predicate::str::contains("hand"))
        .stdout(predicate::str::contains("132 B"));
}

#[test]
fn test_mesh_tree_nests_joints() {
    let mesh = fixture(ARM_MESH, ".md5mesh");

    md5_rs()
        .args(["mesh", "tree", "--no-color"])
        .arg(mesh.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("├── 📁 Joints (2)"))
        .stdout(predicate::str::contains("│   └── ● root"))
        .stdout(predicate::str::contains("│       └── ● hand"))
        .stdout(predicate::str::contains("└── 📁 Meshes (1)"));
}

#[test]
fn test_mesh_validate_reports_bias_sums() {
    let mesh = fixture(ARM_MESH, ".md5mesh");

    md5_rs()
        .args(["mesh", "validate", "--warnings"])
        .arg(mesh.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 vertices have weight biases"))
        .stdout(predicate::str::contains("vertex 2: bias sum 0.5000"))
        .stdout(predicate::str::contains("1 joints carry no vertex weights"));
}

#[test]
fn test_mesh_validate_rejects_broken_file() {
    let broken = ARM_MESH.replace("MD5Version 10", "MD5Version 6");
    let mesh = fixture(&broken, ".md5mesh");

    md5_rs()
        .args(["mesh", "validate"])
        .arg(mesh.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load MD5 mesh"));
}

#[test]
fn test_missing_file_fails() {
    md5_rs()
        .args(["mesh", "info", "does/not/exist.md5mesh"])
        .assert()
        .failure();
}

#[test]
fn test_anim_info() {
    let mesh = fixture(ARM_MESH, ".md5mesh");
    let anim = fixture(ARM_RAISE, ".md5anim");

    md5_rs()
        .args(["anim", "info"])
        .arg(mesh.path())
        .arg(anim.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Frames:     2"))
        .stdout(predicate::str::contains("Frame rate: 24.0 fps"))
        .stdout(predicate::str::contains("Animated:   1 of 2 joints"));
}

fn pose_json(extra: &[&str]) -> serde_json::Value {
    let mesh = fixture(ARM_MESH, ".md5mesh");
    let anim = fixture(ARM_RAISE, ".md5anim");

    let output = md5_rs()
        .args(["anim", "pose", "--json"])
        .arg(mesh.path())
        .arg(anim.path())
        .args(extra)
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_anim_pose_halfway_lerp() {
    let report = pose_json(&["--time", "0.0208333", "--step", "1", "--method", "lerp"]);

    assert_eq!(report["state"], "Playing");
    assert_eq!(report["current_frame"], 0);
    assert_eq!(report["next_frame"], 1);

    let z = report["meshes"][0]["positions"][0][2].as_f64().unwrap();
    assert!((z - 1.5).abs() < 1e-3, "z = {z}");
    assert_eq!(report["joints"][1]["name"], "hand");
}

#[test]
fn test_anim_pose_frame_mode_stops_on_last_frame() {
    let report = pose_json(&["--time", "1"]);

    assert_eq!(report["state"], "Stopped");
    let z = report["meshes"][0]["positions"][0][2].as_f64().unwrap();
    assert!((z - 2.0).abs() < 1e-6, "z = {z}");
}

#[test]
fn test_anim_pose_long_looping_playback_finishes() {
    let report = pose_json(&["--time", "1000", "--step", "0.25", "--loop"]);

    assert_eq!(report["state"], "Playing");
}

#[test]
fn test_anim_pose_rejects_too_many_updates() {
    let mesh = fixture(ARM_MESH, ".md5mesh");
    let anim = fixture(ARM_RAISE, ".md5anim");

    md5_rs()
        .args(["anim", "pose", "--time", "1e6"])
        .arg(mesh.path())
        .arg(anim.path())
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .failure()
        .stderr(predicate::str::contains("use a larger --step"));
}

#[test]
fn test_anim_pose_rejects_unknown_method() {
    let mesh = fixture(ARM_MESH, ".md5mesh");
    let anim = fixture(ARM_RAISE, ".md5anim");

    md5_rs()
        .args(["anim", "pose", "--method", "cubic"])
        .arg(mesh.path())
        .arg(anim.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown interpolation method"));
}

#[test]
fn test_completions() {
    md5_rs()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("md5-rs"));
}

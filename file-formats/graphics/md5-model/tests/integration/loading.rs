//! Loading skeletons and actions from text and from disk

use md5_model::{LoadOptions, Md5Error, Skeleton};
use pretty_assertions::assert_eq;
use test_case::test_case;

use crate::common::{ARM_MESH, ARM_RAISE, ARM_SWEEP, init_logging, write_fixture};

#[test]
fn test_parents_precede_children() {
    let skeleton = Skeleton::parse("arm", ARM_MESH).unwrap();
    for (index, joint) in skeleton.joints().iter().enumerate() {
        if let Some(parent) = joint.parent {
            assert!(parent < index, "joint {index} has parent {parent}");
        }
    }
}

#[test]
fn test_reconstructed_w_is_non_positive() {
    let skeleton = Skeleton::parse("arm", ARM_MESH).unwrap();
    for joint in skeleton.joints() {
        let q = joint.transform.rotation;
        assert!(q.w <= 0.0);
        assert!((q.length_squared() - 1.0).abs() < 1e-6);
    }
}

#[test]
fn test_load_from_file_uses_stem_as_name() {
    let file = write_fixture(ARM_MESH, ".md5mesh");
    let skeleton = Skeleton::load(file.path()).unwrap();
    let stem = file.path().file_stem().unwrap().to_string_lossy();
    assert_eq!(skeleton.name, stem);
    assert_eq!(skeleton.meshes()[0].vertices.len(), 3);
}

#[test]
fn test_from_reader() {
    let mut reader = std::io::Cursor::new(ARM_MESH.as_bytes());
    let skeleton = Skeleton::from_reader("arm", &mut reader, LoadOptions::default()).unwrap();
    assert_eq!(skeleton.joints()[1].name, "hand");
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Skeleton::load(dir.path().join("missing.md5mesh"));
    assert!(matches!(result, Err(Md5Error::Io(_))));
}

#[test]
fn test_load_action_returns_index() {
    let mut skeleton = Skeleton::parse("arm", ARM_MESH).unwrap();
    let raise = write_fixture(ARM_RAISE, ".md5anim");

    assert_eq!(skeleton.load_action("raise", raise.path()).unwrap(), 0);
    assert_eq!(skeleton.parse_action("sweep", ARM_SWEEP).unwrap(), 1);
    assert_eq!(skeleton.action_index("sweep", true), Some(1));
    assert_eq!(skeleton.action("rai", false).map(|a| a.frame_count()), Some(2));
    assert!(skeleton.action("rai", true).is_none());
}

#[test_case("numJoints 2", "numJoints 5" ; "joint count")]
#[test_case("MD5Version 10", "MD5Version 9" ; "version")]
#[test_case("numFrames 2", "numFrames 0" ; "no frames")]
#[test_case("frame 1 {", "frame 7 {" ; "frame index")]
fn test_rejected_action_leaves_list_unchanged(from: &str, to: &str) {
    init_logging();
    let mut skeleton = Skeleton::parse("arm", ARM_MESH).unwrap();
    skeleton.parse_action("raise", ARM_RAISE).unwrap();

    let broken = ARM_RAISE.replace(from, to);
    assert!(skeleton.parse_action("broken", &broken).is_err());
    assert_eq!(skeleton.actions().len(), 1);
}

#[test]
fn test_joint_count_mismatch_reports_both_counts() {
    let mut skeleton = Skeleton::parse("arm", ARM_MESH).unwrap();
    let broken = ARM_RAISE.replace("numJoints 2", "numJoints 3");
    match skeleton.parse_action("broken", &broken) {
        Err(Md5Error::JointCountMismatch { expected, actual }) => {
            assert_eq!((expected, actual), (2, 3));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_missing_action_file_leaves_list_unchanged() {
    let mut skeleton = Skeleton::parse("arm", ARM_MESH).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let result = skeleton.load_action("ghost", dir.path().join("ghost.md5anim"));
    assert!(matches!(result, Err(Md5Error::Io(_))));
    assert!(skeleton.actions().is_empty());
}

#[test]
fn test_malformed_line_reports_line_number() {
    let broken = ARM_MESH.replace("numverts 3", "numverts three");
    match Skeleton::parse("arm", &broken) {
        Err(Md5Error::Parse { line, message }) => {
            assert_eq!(line, 15);
            assert!(message.contains("vertex count"), "{message}");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

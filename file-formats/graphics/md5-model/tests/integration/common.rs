//! Shared fixtures

use std::io::Write;

use tempfile::NamedTempFile;

/// Root joint at the origin with one child one unit up Z, and a single
/// triangle whose vertices are fully weighted to the child
pub const ARM_MESH: &str = r#"MD5Version 10
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
	weight 2 1 1.0 ( 0 1 0 )
}
"#;

/// Two frames: the bind pose, then the hand moved one unit further up Z
pub const ARM_RAISE: &str = r#"MD5Version 10
commandline "fixture"

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

/// Four frames moving the hand along X by the frame index
pub const ARM_SWEEP: &str = r#"MD5Version 10
numFrames 4
numJoints 2
frameRate 4

frame 0 {
	0 0 0 0 0 0
	0 0 1 0 0 0
}
frame 1 {
	0 0 0 0 0 0
	1 0 1 0 0 0
}
frame 2 {
	0 0 0 0 0 0
	2 0 1 0 0 0
}
frame 3 {
	0 0 0 0 0 0
	3 0 1 0 0 0
}
"#;

/// A clip that animates only the root joint
pub const ROOT_BOB: &str = r#"MD5Version 10
numFrames 2
numJoints 2
frameRate 24

frame 0 {
	0 0 0 0 0 0
	0 0 1 0 0 0
}
frame 1 {
	0 0 0.5 0 0 0
	0 0 1 0 0 0
}
"#;

/// Write `content` to a temporary file with the given extension
pub fn write_fixture(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("arm")
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(content.as_bytes()).expect("write fixture");
    file
}

/// Route library logging through the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

use std::io;
use thiserror::Error;

/// Error types for MD5 mesh and animation loading
#[derive(Error, Debug)]
pub enum Md5Error {
    /// I/O Error during reading (missing or unreadable file)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The `MD5Version` token is present but not the supported version
    #[error("Unsupported MD5 version: expected {expected}, got {actual}")]
    UnsupportedVersion { expected: i32, actual: i32 },

    /// An animation declares a different joint count than the skeleton it targets
    #[error("Joint count mismatch: skeleton has {expected} joints, animation declares {actual}")]
    JointCountMismatch { expected: usize, actual: usize },

    /// An animation hierarchy entry disagrees with the skeleton joint at the same index
    #[error("Hierarchy mismatch at joint {index}: {reason}")]
    HierarchyMismatch { index: usize, reason: String },

    /// A recognized line could not be parsed
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The file parsed but its content is structurally inconsistent
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Md5Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Result type using Md5Error
pub type Result<T> = std::result::Result<T, Md5Error>;

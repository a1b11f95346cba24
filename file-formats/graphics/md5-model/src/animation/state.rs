//! Playback state and interpolation settings of an action

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Playback state of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum ActionState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl ActionState {
    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Playing => write!(f, "playing"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

/// How poses are produced between two frames of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum InterpolationMethod {
    /// Snap to each frame in turn, no blending
    #[default]
    Frame,
    /// Linear blend of locations and rotations
    Lerp,
    /// Linear blend of locations, spherical blend of rotations
    Slerp,
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame => write!(f, "frame"),
            Self::Lerp => write!(f, "lerp"),
            Self::Slerp => write!(f, "slerp"),
        }
    }
}

impl FromStr for InterpolationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "frame" | "step" => Ok(Self::Frame),
            "lerp" | "linear" => Ok(Self::Lerp),
            "slerp" | "spherical" => Ok(Self::Slerp),
            other => Err(format!("unknown interpolation method '{other}'")),
        }
    }
}

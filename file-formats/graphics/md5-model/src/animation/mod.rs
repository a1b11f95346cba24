//! Animation playback and pose blending
//!
//! An [`Action`] owns the reconstructed frames of one clip and a working
//! pose. [`Action::update`] advances its playback state machine and writes the
//! working pose, either by snapping to frames or by interpolating between the
//! current and next frame. [`add_pose`] layers a second action over a first
//! one for the joints the second action animates.

pub mod action;
pub mod blend;
pub mod interpolation;
pub mod state;

pub use action::{Action, DEFAULT_FPS};
pub use blend::{add_pose, blend_joint, blend_pose};
pub use interpolation::{lerp_quat, lerp_vec3, slerp_quat};
pub use state::{ActionState, InterpolationMethod};

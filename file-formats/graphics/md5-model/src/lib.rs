//! Loader, skinner and animation blender for MD5 models
//!
//! ```rust,no_run
//! use md5_model::{InterpolationMethod, RecordingBackend, Skeleton};
//!
//! let mut backend = RecordingBackend::new();
//! let mut skeleton = Skeleton::load("models/hero.md5mesh")?;
//! let walk = skeleton.load_action("walk", "models/hero_walk.md5anim")?;
//! skeleton.build(&mut backend)?;
//!
//! skeleton.actions_mut()[walk].play(InterpolationMethod::Slerp, true);
//! if skeleton.update_actions(1.0 / 60.0) {
//!     skeleton.apply_action(walk, &mut backend)?;
//! }
//! let indices = skeleton.draw(&mut backend);
//! println!("submitted {indices} indices");
//! # Ok::<(), md5_model::Md5Error>(())
//! ```

mod anim;
pub mod animation;
pub mod bind_pose;
pub mod bounds;
pub mod error;
pub mod joint;
pub mod mesh;
mod parser;
pub mod render;
pub mod skeleton;
pub mod skinning;
pub mod strip;

// Re-export common types
pub use animation::{Action, ActionState, InterpolationMethod};
pub use bounds::Bounds;
pub use error::{Md5Error, Result};
pub use joint::{Joint, JointTransform};
pub use mesh::{Mesh, Triangle, Vertex, Weight};
pub use render::{MaterialBinding, PrimitiveMode, RecordingBackend, RenderBackend};
pub use skeleton::{BuildOptions, LoadOptions, MD5_VERSION, Skeleton};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

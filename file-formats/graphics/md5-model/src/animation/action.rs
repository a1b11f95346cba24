//! Animation clip playback

use crate::bounds::Bounds;
use crate::joint::JointTransform;

use super::blend::blend_pose;
use super::state::{ActionState, InterpolationMethod};

/// Default playback rate used when a clip does not declare one
pub const DEFAULT_FPS: f32 = 24.0;

/// A named animation clip bound to one skeleton
///
/// Frames hold absolute joint transforms. `pose` is the working pose written
/// by [`Action::update`] and read by skinning and additive blending.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    name: String,
    frames: Vec<Vec<JointTransform>>,
    frame_bounds: Vec<Bounds>,
    pose: Vec<JointTransform>,
    current_frame: usize,
    next_frame: usize,
    state: ActionState,
    method: InterpolationMethod,
    looping: bool,
    frame_time: f32,
    seconds_per_frame: f32,
}

impl Action {
    /// Create a stopped action from reconstructed frames
    ///
    /// `fps` must be positive; non-positive rates fall back to [`DEFAULT_FPS`].
    pub fn new(name: impl Into<String>, frames: Vec<Vec<JointTransform>>, fps: f32) -> Self {
        let pose = frames.first().cloned().unwrap_or_default();
        let mut action = Self {
            name: name.into(),
            frames,
            frame_bounds: Vec::new(),
            pose,
            current_frame: 0,
            next_frame: 0,
            state: ActionState::Stopped,
            method: InterpolationMethod::Frame,
            looping: false,
            frame_time: 0.0,
            seconds_per_frame: 1.0 / DEFAULT_FPS,
        };
        action.set_fps(fps);
        action.next_frame = action.initial_next_frame();
        action
    }

    pub(crate) fn with_frame_bounds(mut self, bounds: Vec<Bounds>) -> Self {
        self.frame_bounds = bounds;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[Vec<JointTransform>] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&[JointTransform]> {
        self.frames.get(index).map(Vec::as_slice)
    }

    /// Per-frame bounds declared by the clip, empty when absent
    pub fn frame_bounds(&self) -> &[Bounds] {
        &self.frame_bounds
    }

    /// Working pose produced by the last update
    pub fn pose(&self) -> &[JointTransform] {
        &self.pose
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn next_frame(&self) -> usize {
        self.next_frame
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    pub fn method(&self) -> InterpolationMethod {
        self.method
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Time accumulated toward the next frame, in seconds
    pub fn frame_time(&self) -> f32 {
        self.frame_time
    }

    pub fn seconds_per_frame(&self) -> f32 {
        self.seconds_per_frame
    }

    pub fn fps(&self) -> f32 {
        1.0 / self.seconds_per_frame
    }

    /// Total clip length in seconds
    pub fn duration(&self) -> f32 {
        self.frames.len() as f32 * self.seconds_per_frame
    }

    /// Change the playback rate
    pub fn set_fps(&mut self, fps: f32) {
        if fps > 0.0 && fps.is_finite() {
            self.seconds_per_frame = 1.0 / fps;
        } else {
            log::warn!(
                "action '{}': ignoring invalid frame rate {fps}, using {DEFAULT_FPS}",
                self.name
            );
            self.seconds_per_frame = 1.0 / DEFAULT_FPS;
        }
    }

    /// Start or resume playback
    ///
    /// In frame-stepped mode a fresh action is primed with one full frame
    /// period so that the first update shows the current frame immediately.
    pub fn play(&mut self, method: InterpolationMethod, looping: bool) {
        self.method = method;
        self.looping = looping;
        self.state = ActionState::Playing;

        if self.frame_time == 0.0 && method == InterpolationMethod::Frame {
            self.frame_time = self.seconds_per_frame;
        }
    }

    /// Suspend playback, keeping frame indices and accumulated time
    pub fn pause(&mut self) {
        self.state = ActionState::Paused;
    }

    /// Stop playback and rewind to the first frame
    pub fn stop(&mut self) {
        self.current_frame = 0;
        self.next_frame = self.initial_next_frame();
        self.state = ActionState::Stopped;
        self.frame_time = 0.0;
    }

    /// Advance playback by `time_step` seconds
    ///
    /// Returns `true` when the working pose was rewritten.
    pub fn update(&mut self, time_step: f32) -> bool {
        if self.state != ActionState::Playing || self.frames.is_empty() {
            return false;
        }

        self.frame_time += time_step;

        match self.method {
            InterpolationMethod::Frame => self.update_stepped(),
            InterpolationMethod::Lerp | InterpolationMethod::Slerp => self.update_blended(),
        }
    }

    fn update_stepped(&mut self) -> bool {
        if self.frame_time < self.seconds_per_frame {
            return false;
        }

        self.pose.clone_from(&self.frames[self.current_frame]);

        let frame_count = self.frames.len();
        self.current_frame += 1;

        if self.current_frame == frame_count {
            if self.looping {
                self.current_frame = 0;
            } else {
                self.stop();
                return false;
            }
        }

        self.next_frame = self.current_frame + 1;
        if self.next_frame == frame_count {
            self.next_frame = 0;
        }

        self.frame_time -= self.seconds_per_frame;
        true
    }

    fn update_blended(&mut self) -> bool {
        let t = (self.frame_time / self.seconds_per_frame).clamp(0.0, 1.0);

        blend_pose(
            &mut self.pose,
            &self.frames[self.current_frame],
            &self.frames[self.next_frame],
            self.method,
            t,
        );

        if t >= 1.0 {
            let frame_count = self.frames.len();
            self.current_frame += 1;
            self.next_frame = self.current_frame + 1;

            if self.looping {
                if self.current_frame == frame_count {
                    self.current_frame = 0;
                    self.next_frame = self.initial_next_frame();
                }
                if self.next_frame == frame_count {
                    self.next_frame = 0;
                }
            } else if self.next_frame >= frame_count {
                self.stop();
                return true;
            }

            self.frame_time -= self.seconds_per_frame;
        }

        true
    }

    fn initial_next_frame(&self) -> usize {
        usize::from(self.frames.len() > 1)
    }
}

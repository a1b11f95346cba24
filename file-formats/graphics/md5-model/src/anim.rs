//! `.md5anim` reader
//!
//! Two frame layouts are accepted:
//!
//! - **Dense**: every frame lists `x y z qx qy qz` for each joint, relative
//!   to its parent.
//! - **Channel**: a `hierarchy` block assigns each joint a flag mask and a
//!   start offset, a `baseframe` block holds default values, and each frame
//!   is a stream of `numAnimatedComponents` floats. Flag bits select which
//!   of `tx ty tz qx qy qz` a joint reads from the stream, in that order.
//!
//! The dense layout behaves as the channel layout with every flag set, joint
//! `i` starting at `6 * i` and a zero baseframe.
//!
//! Frames are converted to object space in joint order, using the parent
//! indices of the target skeleton.

use crate::animation::{Action, DEFAULT_FPS};
use crate::bounds::Bounds;
use crate::error::{Md5Error, Result};
use crate::joint::{Joint, JointTransform};
use crate::parser::{Line, LineReader};
use crate::skeleton::LoadOptions;

/// Components per joint in a dense frame
const DENSE_COMPONENTS: usize = 6;
/// Mask with every component flag set
const ALL_COMPONENTS: u8 = 0b11_1111;

/// Which animated components a joint reads and where they start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Channel {
    flags: u8,
    start: usize,
}

impl Channel {
    fn dense(joint: usize) -> Self {
        Self {
            flags: ALL_COMPONENTS,
            start: joint * DENSE_COMPONENTS,
        }
    }

    fn end(&self) -> usize {
        self.start.saturating_add(self.flags.count_ones() as usize)
    }
}

/// Parse an animation clip for a skeleton with the given joints
pub(crate) fn parse_action(
    name: &str,
    content: &str,
    joints: &[Joint],
    options: &LoadOptions,
) -> Result<Action> {
    let mut reader = LineReader::new(content);

    let mut frame_count: Option<usize> = None;
    let mut fps = DEFAULT_FPS;
    let mut component_count: Option<usize> = None;
    let mut channels: Option<Vec<Channel>> = None;
    let mut baseframe: Option<Vec<[f32; 6]>> = None;
    let mut frame_bounds = Vec::new();
    let mut raw_frames: Vec<Option<Vec<f32>>> = Vec::new();

    while let Some(line) = reader.next() {
        match line.keyword() {
            "MD5Version" => line.check_version()?,
            "commandline" => {}
            "numFrames" => {
                let count: usize = line.field(1, "frame count")?;
                if count == 0 {
                    return Err(Md5Error::Validation(format!(
                        "animation '{name}' declares no frames"
                    )));
                }
                frame_count = Some(count);
                raw_frames = vec![None; count];
            }
            "numJoints" => {
                let count: usize = line.field(1, "joint count")?;
                if count != joints.len() {
                    return Err(Md5Error::JointCountMismatch {
                        expected: joints.len(),
                        actual: count,
                    });
                }
            }
            "frameRate" => {
                fps = line.field(1, "frame rate")?;
                if !(fps > 0.0 && fps.is_finite()) {
                    return Err(Md5Error::parse(
                        line.number,
                        format!("frame rate must be positive, got {fps}"),
                    ));
                }
            }
            "numAnimatedComponents" => {
                component_count = Some(line.field(1, "animated component count")?);
            }
            "hierarchy" => channels = Some(read_hierarchy(&mut reader, joints)?),
            "bounds" => frame_bounds = read_bounds(&mut reader)?,
            "baseframe" => baseframe = Some(read_baseframe(&mut reader)?),
            "frame" => {
                let index: usize = line.field(1, "frame index")?;
                let expected = match &channels {
                    Some(channels) => component_count
                        .unwrap_or_else(|| channels.iter().map(Channel::end).max().unwrap_or(0)),
                    None => joints.len() * DENSE_COMPONENTS,
                };
                let slot = raw_frames.get_mut(index).ok_or_else(|| {
                    Md5Error::parse(
                        line.number,
                        format!("frame {index} outside of the declared frame count"),
                    )
                })?;
                *slot = Some(read_frame_values(&mut reader, &line, expected)?);
            }
            other => log::trace!("line {}: skipping '{other}'", line.number),
        }
    }

    let frame_count = frame_count.ok_or_else(|| {
        Md5Error::Validation(format!("animation '{name}' is missing numFrames"))
    })?;

    let channels = channels.unwrap_or_else(|| (0..joints.len()).map(Channel::dense).collect());
    let baseframe = baseframe.unwrap_or_else(|| vec![[0.0; 6]; joints.len()]);
    if baseframe.len() != joints.len() {
        return Err(Md5Error::Validation(format!(
            "baseframe has {} joints, skeleton has {}",
            baseframe.len(),
            joints.len()
        )));
    }

    if !frame_bounds.is_empty() && frame_bounds.len() != frame_count {
        if options.validate {
            return Err(Md5Error::Validation(format!(
                "bounds block has {} entries for {frame_count} frames",
                frame_bounds.len()
            )));
        }
        log::warn!(
            "animation '{name}': {} bounds for {frame_count} frames",
            frame_bounds.len()
        );
    }

    let frames = raw_frames
        .into_iter()
        .enumerate()
        .map(|(index, values)| {
            let values = values
                .ok_or_else(|| Md5Error::Validation(format!("frame {index} is missing")))?;
            build_frame(index, &values, &channels, &baseframe, joints)
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!(
        "Loaded action '{name}': {frame_count} frames, {} joints, {fps} fps",
        joints.len()
    );

    Ok(Action::new(name, frames, fps).with_frame_bounds(frame_bounds))
}

fn read_hierarchy(reader: &mut LineReader<'_>, joints: &[Joint]) -> Result<Vec<Channel>> {
    let mut channels = Vec::with_capacity(joints.len());

    loop {
        let line = reader.next_in_block("hierarchy")?;
        if line.is_block_end() {
            break;
        }
        line.expect_tokens(4, "hierarchy entry")?;

        let index = channels.len();
        let parent: i32 = line.field(1, "parent index")?;
        let flags: u8 = line.field(2, "component flags")?;
        let start: usize = line.field(3, "start index")?;

        if flags > ALL_COMPONENTS {
            return Err(Md5Error::parse(
                line.number,
                format!("component flags {flags} use undefined bits"),
            ));
        }

        if let Some(joint) = joints.get(index) {
            if joint.parent_index() != parent {
                return Err(Md5Error::HierarchyMismatch {
                    index,
                    reason: format!(
                        "parent is {parent} in the animation but {} in the skeleton",
                        joint.parent_index()
                    ),
                });
            }
            if joint.name != line.tokens[0] {
                log::warn!(
                    "hierarchy joint {index} is named '{}', skeleton joint is '{}'",
                    line.tokens[0],
                    joint.name
                );
            }
        }

        channels.push(Channel { flags, start });
    }

    if channels.len() != joints.len() {
        return Err(Md5Error::JointCountMismatch {
            expected: joints.len(),
            actual: channels.len(),
        });
    }
    Ok(channels)
}

fn read_baseframe(reader: &mut LineReader<'_>) -> Result<Vec<[f32; 6]>> {
    let mut base = Vec::new();
    loop {
        let line = reader.next_in_block("baseframe")?;
        if line.is_block_end() {
            return Ok(base);
        }
        let [x, y, z] = line.vec3(0, "base location")?;
        let [qx, qy, qz] = line.vec3(3, "base rotation")?;
        base.push([x, y, z, qx, qy, qz]);
    }
}

fn read_bounds(reader: &mut LineReader<'_>) -> Result<Vec<Bounds>> {
    let mut bounds = Vec::new();
    loop {
        let line = reader.next_in_block("bounds")?;
        if line.is_block_end() {
            return Ok(bounds);
        }
        let min = line.vec3(0, "bounds minimum")?;
        let max = line.vec3(3, "bounds maximum")?;
        bounds.push(Bounds::from_corners(min.into(), max.into()));
    }
}

/// Collect `expected` floats following a `frame` line
///
/// Values may be spread over any number of lines. When the frame opens a
/// block the closing brace must follow the last value.
fn read_frame_values(reader: &mut LineReader<'_>, header: &Line, expected: usize) -> Result<Vec<f32>> {
    let mut values = Vec::with_capacity(expected);
    let mut in_block = header.opens_block();

    while values.len() < expected {
        let line = reader.next_in_block("frame")?;
        if line.tokens == ["{"] {
            in_block = true;
            continue;
        }
        if line.is_block_end() {
            return Err(Md5Error::parse(
                line.number,
                format!("frame has {} values, expected {expected}", values.len()),
            ));
        }
        values.extend(line.floats()?);
    }

    if values.len() > expected {
        return Err(Md5Error::parse(
            header.number,
            format!("frame has {} values, expected {expected}", values.len()),
        ));
    }

    if in_block {
        let end = reader.next_in_block("frame")?;
        if !end.is_block_end() {
            return Err(Md5Error::parse(
                end.number,
                format!("expected '}}' after {expected} frame values"),
            ));
        }
    }

    Ok(values)
}

fn build_frame(
    index: usize,
    values: &[f32],
    channels: &[Channel],
    baseframe: &[[f32; 6]],
    joints: &[Joint],
) -> Result<Vec<JointTransform>> {
    let mut pose = Vec::with_capacity(joints.len());

    for (joint, (channel, base)) in channels.iter().zip(baseframe).enumerate() {
        let mut components = *base;
        let mut cursor = channel.start;

        for (bit, component) in components.iter_mut().enumerate() {
            if channel.flags & (1 << bit) == 0 {
                continue;
            }
            *component = *values.get(cursor).ok_or_else(|| {
                Md5Error::Validation(format!(
                    "frame {index}: joint {joint} reads component {cursor} of {}",
                    values.len()
                ))
            })?;
            cursor += 1;
        }

        let [x, y, z, qx, qy, qz] = components;
        pose.push(JointTransform::from_components([x, y, z], [qx, qy, qz]));
    }

    to_object_space(&mut pose, joints);
    Ok(pose)
}

/// Convert parent-relative transforms to object space, in joint order
pub(crate) fn to_object_space(pose: &mut [JointTransform], joints: &[Joint]) {
    for (index, joint) in joints.iter().enumerate().take(pose.len()) {
        let Some(parent) = joint.parent.filter(|&p| p < index) else {
            continue;
        };
        let parent = pose[parent];
        let local = pose[index];
        pose[index] = JointTransform::new(
            parent.rotation * local.location + parent.location,
            (parent.rotation * local.rotation).normalize(),
        );
    }
}

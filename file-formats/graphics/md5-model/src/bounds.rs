//! Axis aligned bounds

use glam::Vec3;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Axis aligned bounding box with derived size information
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
    /// `max - min`
    pub dimension: Vec3,
    /// Half of the largest dimension component
    pub radius: f32,
}

impl Bounds {
    /// Bounds spanning two corners
    pub fn from_corners(min: Vec3, max: Vec3) -> Self {
        let dimension = max - min;
        Self {
            min,
            max,
            dimension,
            radius: dimension.max_element() * 0.5,
        }
    }

    /// Smallest bounds enclosing every point, all zero when there are none
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return Self::default();
        };
        let (min, max) = points.fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)));
        Self::from_corners(min, max)
    }

    /// Combine two bounds into one enclosing both
    pub fn union(&self, other: &Self) -> Self {
        Self::from_corners(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

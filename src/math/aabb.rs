//! Axis-aligned bounding box on the ground plane

use crate::core::types::Vec2;

/// Axis-aligned rectangle defined by min and max corners.
///
/// The x axis is world X and the y axis is world Z; terrain height is not
/// part of chunk bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Create AABB from center and full size
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Closest point inside the box to `p`
    fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }

    /// Squared distance from `p` to the nearest edge; zero when inside.
    pub fn sqr_distance(&self, p: Vec2) -> f32 {
        self.closest_point(p).distance_squared(p)
    }

    /// Distance from `p` to the nearest edge; zero when inside.
    pub fn distance(&self, p: Vec2) -> f32 {
        self.sqr_distance(p).sqrt()
    }
}

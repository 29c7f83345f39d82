//! Vector math helpers for the simulation.
//!
//! World space is right-handed with +Y up; the ground plane is XZ.
//! Screen space is in pixels with the origin at the bottom-left corner.

use std::f32::consts::{PI, TAU};

use rand::Rng;
use serde::{Deserialize, Serialize};

pub use glam::{Vec2, Vec3};

/// Axis-aligned rectangle in screen pixels.
///
/// Containment is inclusive on the min edges and exclusive on the max edges,
/// so two rectangles sharing an edge never both contain a point on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    /// Bottom-left corner.
    pub min: Vec2,
    /// Top-right corner.
    pub max: Vec2,
}

impl ScreenRect {
    /// Build a rectangle from two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Check whether a screen point lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x < self.max.x && point.y >= self.min.y && point.y < self.max.y
    }

    /// Width and height of the rectangle.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Project a world vector onto the ground plane.
#[must_use]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Sample a point uniformly inside a disk of `radius` on the ground plane.
///
/// The returned offset has a zero Y component.
pub fn random_ground_offset<R: Rng>(rng: &mut R, radius: f32) -> Vec3 {
    if radius <= 0.0 {
        return Vec3::ZERO;
    }
    let angle = rng.gen_range(0.0..TAU);
    // uniform over area, not radius
    let r = radius * rng.gen::<f32>().sqrt();
    Vec3::new(angle.cos() * r, 0.0, angle.sin() * r)
}

/// Heading (radians around +Y) that faces along `direction` on the ground plane.
///
/// Returns `None` for a direction with no meaningful horizontal component.
#[must_use]
pub fn yaw_of(direction: Vec3) -> Option<f32> {
    let flat = flatten(direction);
    if flat.length_squared() <= 0.001 {
        return None;
    }
    Some(flat.x.atan2(flat.z))
}

/// Interpolate a heading toward `target` along the shortest arc.
///
/// `t` is clamped to `[0, 1]`; `t = 1` snaps to the target.
#[must_use]
pub fn turn_towards(current: f32, target: f32, t: f32) -> f32 {
    let mut delta = (target - current) % TAU;
    if delta > PI {
        delta -= TAU;
    } else if delta < -PI {
        delta += TAU;
    }
    current + delta * t.clamp(0.0, 1.0)
}

/// Replace a negative or non-finite tuning value with zero.
#[must_use]
pub(crate) fn non_negative(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

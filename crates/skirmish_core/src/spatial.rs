//! Spatial query capability.
//!
//! The simulation never owns a camera or a physics scene. Raycasts, sphere
//! overlaps and screen projection are consumed through [`SpatialQuery`],
//! which an engine adapter implements. [`TopDownCamera`] is a brute-force
//! reference implementation over the registry, used by tests and the
//! headless runner.

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::math::{Vec2, Vec3};
use crate::registry::EntityRegistry;

/// Maximum distance a pick ray travels.
pub const MAX_RAY_DISTANCE: f32 = 1000.0;

/// A half-line in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    /// Start point.
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray; `direction` is normalized (zero stays zero).
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at distance `t` along the ray.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance along the ray to the first intersection with a sphere.
    ///
    /// A ray starting inside the sphere hits at its exit point.
    #[must_use]
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let near = -b - root;
        let t = if near >= 0.0 { near } else { -b + root };
        (t >= 0.0).then_some(t)
    }
}

/// Scene queries the core consumes from the engine.
pub trait SpatialQuery {
    /// Ray through a screen pixel, from the camera into the world.
    fn screen_point_to_ray(&self, screen: Vec2) -> Ray;

    /// First live selectable entity hit by `ray`.
    fn raycast_selectable(&self, registry: &EntityRegistry, ray: &Ray) -> Option<EntityId>;

    /// Point where `ray` meets the ground.
    fn raycast_ground(&self, ray: &Ray) -> Option<Vec3>;

    /// Live entities whose bodies overlap the sphere, in a stable order.
    fn overlap_sphere(&self, registry: &EntityRegistry, center: Vec3, radius: f32)
        -> Vec<EntityId>;

    /// Project a world point to `(x, y, depth)`; negative depth is behind
    /// the camera.
    fn world_to_screen(&self, point: Vec3) -> Vec3;
}

/// Orthographic camera looking straight down at the ground plane.
///
/// Screen `x` follows world `+X`, screen `y` follows world `+Z`, and the
/// viewport center is directly under `eye`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopDownCamera {
    /// Camera position; `eye.y` is its height above the ground.
    pub eye: Vec3,
    /// Zoom: screen pixels per world unit.
    pub pixels_per_unit: f32,
    /// Viewport size in pixels.
    pub viewport: Vec2,
}

impl Default for TopDownCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 30.0, 0.0),
            pixels_per_unit: 20.0,
            viewport: Vec2::new(1280.0, 720.0),
        }
    }
}

impl TopDownCamera {
    fn scale(&self) -> f32 {
        if self.pixels_per_unit.is_finite() && self.pixels_per_unit > 0.0 {
            self.pixels_per_unit
        } else {
            1.0
        }
    }

    /// Screen pixel directly above a world point (ignores depth).
    #[must_use]
    pub fn screen_point_of(&self, point: Vec3) -> Vec2 {
        let projected = self.world_to_screen(point);
        Vec2::new(projected.x, projected.y)
    }
}

impl SpatialQuery for TopDownCamera {
    fn screen_point_to_ray(&self, screen: Vec2) -> Ray {
        let scale = self.scale();
        let half = self.viewport * 0.5;
        let origin = Vec3::new(
            self.eye.x + (screen.x - half.x) / scale,
            self.eye.y,
            self.eye.z + (screen.y - half.y) / scale,
        );
        Ray::new(origin, Vec3::NEG_Y)
    }

    fn raycast_selectable(&self, registry: &EntityRegistry, ray: &Ray) -> Option<EntityId> {
        let mut best: Option<(EntityId, f32)> = None;
        for entity in registry.iter().filter(|entity| entity.is_alive()) {
            let Some(t) = ray.intersect_sphere(entity.position(), entity.radius) else {
                continue;
            };
            if t <= MAX_RAY_DISTANCE && best.map_or(true, |(_, nearest)| t < nearest) {
                best = Some((entity.id, t));
            }
        }
        best.map(|(id, _)| id)
    }

    fn raycast_ground(&self, ray: &Ray) -> Option<Vec3> {
        if ray.direction.y.abs() <= f32::EPSILON {
            return None;
        }
        let t = -ray.origin.y / ray.direction.y;
        (0.0..=MAX_RAY_DISTANCE).contains(&t).then(|| ray.at(t))
    }

    fn overlap_sphere(
        &self,
        registry: &EntityRegistry,
        center: Vec3,
        radius: f32,
    ) -> Vec<EntityId> {
        registry
            .iter()
            .filter(|entity| entity.is_alive())
            .filter(|entity| entity.position().distance(center) <= radius + entity.radius)
            .map(|entity| entity.id)
            .collect()
    }

    fn world_to_screen(&self, point: Vec3) -> Vec3 {
        let scale = self.scale();
        let half = self.viewport * 0.5;
        Vec3::new(
            (point.x - self.eye.x) * scale + half.x,
            (point.z - self.eye.z) * scale + half.y,
            self.eye.y - point.y,
        )
    }
}

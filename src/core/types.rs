//! Core type definitions used throughout the codebase

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Unique identifier for entities
///
/// Ids are handed out in increasing order by the entity store, so ordering
/// ids is the same as ordering by insertion.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
)]
#[display(fmt = "#{}", _0)]
pub struct EntityId(pub u32);

/// Simulation step counter
pub type Tick = u64;

/// Simulated time, in game hours
pub type Hours = f64;

/// Resources that can be gathered, carried, stored and requested
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
pub enum ResourceType {
    Food,
    Wood,
}

/// 2D position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0001 {
            Self { x: self.x / len, y: self.y / len }
        } else {
            Self::default()
        }
    }

    /// Shortest vector from `self` to `other` on a map that wraps at
    /// `width` x `height`.
    pub fn wrapped_delta(&self, other: &Self, width: f32, height: f32) -> Self {
        Self {
            x: wrap_axis(other.x - self.x, width),
            y: wrap_axis(other.y - self.y, height),
        }
    }

    pub fn wrapped_distance(&self, other: &Self, width: f32, height: f32) -> f32 {
        self.wrapped_delta(other, width, height).length()
    }

    /// Bring a position back inside `[0, width) x [0, height)`.
    pub fn wrap(&self, width: f32, height: f32) -> Self {
        Self {
            x: self.x.rem_euclid(width),
            y: self.y.rem_euclid(height),
        }
    }

    pub fn clamp_to(&self, width: f32, height: f32) -> Self {
        Self {
            x: self.x.clamp(0.0, width),
            y: self.y.clamp(0.0, height),
        }
    }
}

#[inline]
fn wrap_axis(delta: f32, extent: f32) -> f32 {
    if extent <= 0.0 {
        return delta;
    }
    let half = extent / 2.0;
    if delta > half {
        delta - extent
    } else if delta < -half {
        delta + extent
    } else {
        delta
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_ordering_follows_assignment() {
        assert!(EntityId(1) < EntityId(2));
        assert_eq!(EntityId(7).to_string(), "#7");
    }

    #[test]
    fn test_wrapped_distance_takes_short_way_round() {
        let a = Vec2::new(1.0, 50.0);
        let b = Vec2::new(99.0, 50.0);
        assert!((a.distance(&b) - 98.0).abs() < 0.001);
        assert!((a.wrapped_distance(&b, 100.0, 100.0) - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_wrapped_delta_direction() {
        let a = Vec2::new(99.0, 0.0);
        let b = Vec2::new(1.0, 0.0);
        let d = a.wrapped_delta(&b, 100.0, 100.0);
        assert!((d.x - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_wrap_position() {
        let p = Vec2::new(-1.0, 101.0).wrap(100.0, 100.0);
        assert!((p.x - 99.0).abs() < 0.001);
        assert!((p.y - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
    }
}

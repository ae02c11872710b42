//! Positions and axis-aligned volumes.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// A point or direction in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Straight-line distance between two points.
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Unit vector in the same direction, or [`Vec3::ZERO`] for a
    /// zero-length input.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            Self::ZERO
        } else {
            self.scale(1.0 / len)
        }
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// An axis-aligned bounding box. Both corners are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Builds a box, rejecting one whose `min` exceeds `max` on any axis.
    pub fn new(min: Vec3, max: Vec3) -> Result<Self, ProtocolError> {
        let aabb = Self { min, max };
        aabb.validate()?;
        Ok(aabb)
    }

    /// Checks the corner ordering of a box that was built field-by-field
    /// (e.g. deserialized straight from configuration).
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z {
            return Err(ProtocolError::InvalidValue(format!(
                "bounding box min {:?} exceeds max {:?}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max).scale(0.5)
    }

    /// Extent along X, Y and Z.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

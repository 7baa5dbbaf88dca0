//! Small vector and interpolation helpers used across the behavior core.

use std::ops::{Add, Mul, Sub};

/// World-space vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len <= f32::EPSILON {
            Vec3::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Scale down to `max` length if longer.
    pub fn clamp_magnitude(self, max: f32) -> Vec3 {
        let len = self.length();
        if len > max && len > f32::EPSILON {
            self * (max / len)
        } else {
            self
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Linear interpolation.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Frame-rate-independent exponential approach of `current` toward
/// `target` with the given rate (per second).
pub fn exp_lerp(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    lerp(current, target, (rate * dt).clamp(0.0, 1.0))
}

/// Yaw (degrees) facing from `(x, z)` toward `(tx, tz)`.
pub fn yaw_toward(x: f32, z: f32, tx: f32, tz: f32) -> f32 {
    let dx = tx - x;
    let dz = tz - z;
    dx.atan2(dz).to_degrees()
}

/// Signed XZ-plane angle (degrees) from `from` to `to`, positive
/// counter-clockwise when viewed from above.
pub fn signed_angle_xz(from: Vec3, to: Vec3) -> f32 {
    let cross = from.x * to.z - from.z * to.x;
    let dot = from.x * to.x + from.z * to.z;
    cross.atan2(dot).to_degrees()
}

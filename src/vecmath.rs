use serde::{Deserialize, Serialize};

// Basic 3D vector type, coordinates in mm
#[derive(Copy, Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    #[inline(always)]
    pub fn new(x: f64, y: f64, z: f64) -> Self { Self { x, y, z } }
    #[inline(always)]
    pub fn zero() -> Self { Self::new(0.0, 0.0, 0.0) }
    #[inline(always)]
    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
    #[inline(always)]
    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
    #[inline(always)]
    pub fn scale(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
    #[inline(always)]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
    #[inline(always)]
    pub fn length_squared(self) -> f64 { self.dot(self) }
    #[inline(always)]
    pub fn length(self) -> f64 { self.length_squared().sqrt() }

    /// Rotation about the y-axis by `theta` radians:
    /// x' = x cos(theta) + z sin(theta), z' = -x sin(theta) + z cos(theta).
    #[inline(always)]
    pub fn rotated_y(self, theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self::new(self.x * cos + self.z * sin, self.y, -self.x * sin + self.z * cos)
    }

    /// Rotation about the x-axis by `theta` radians:
    /// y' = y cos(theta) - z sin(theta), z' = y sin(theta) + z cos(theta).
    #[inline(always)]
    pub fn rotated_x(self, theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self::new(self.x, self.y * cos - self.z * sin, self.y * sin + self.z * cos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_y_quarter_turn() {
        let v = Vec3::new(1.0, 0.5, 0.0).rotated_y(std::f64::consts::FRAC_PI_2);
        assert!((v.x - 0.0).abs() < 1e-12);
        assert!((v.y - 0.5).abs() < 1e-12);
        assert!((v.z - -1.0).abs() < 1e-12);
    }

    #[test]
    fn rotation_preserves_length() {
        let v = Vec3::new(0.3, -1.2, 7.5);
        let r = v.rotated_y(0.025).rotated_x(1e-4);
        assert!((r.length() - v.length()).abs() < 1e-12);
    }
}

//! Rigid transformation types
//!
//! IGES expresses placement as a 3x3 matrix plus a translation vector
//! (`x' = R x + T`). Transforms compose along the chain formed by the
//! Directory Entry transform pointers of Transformation Matrix entities.

use crate::types::Vector3;
use std::ops::Mul;

/// 3x3 matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3 {
    /// Matrix elements stored in row-major order
    pub m: [[f64; 3]; 3],
}

impl Matrix3 {
    /// Create identity matrix
    pub fn identity() -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
        }
    }

    /// Create zero matrix
    pub fn zero() -> Self {
        Self { m: [[0.0; 3]; 3] }
    }

    /// Create rotation matrix around Z axis
    pub fn rotation_z(angle: f64) -> Self {
        let cos = angle.cos();
        let sin = angle.sin();
        Self {
            m: [
                [cos, -sin, 0.0],
                [sin, cos, 0.0],
                [0.0, 0.0, 1.0],
            ],
        }
    }

    /// Multiply a vector by this matrix
    pub fn transform_point(&self, v: Vector3) -> Vector3 {
        Vector3::new(
            self.m[0][0] * v.x + self.m[0][1] * v.y + self.m[0][2] * v.z,
            self.m[1][0] * v.x + self.m[1][1] * v.y + self.m[1][2] * v.z,
            self.m[2][0] * v.x + self.m[2][1] * v.y + self.m[2][2] * v.z,
        )
    }
}

impl Mul for Matrix3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        let mut result = Self::zero();
        for i in 0..3 {
            for j in 0..3 {
                for k in 0..3 {
                    result.m[i][j] += self.m[i][k] * rhs.m[k][j];
                }
            }
        }
        result
    }
}

impl Mul<Vector3> for Matrix3 {
    type Output = Vector3;

    fn mul(self, v: Vector3) -> Self::Output {
        self.transform_point(v)
    }
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::identity()
    }
}

/// Matrix plus translation, as stored by a Transformation Matrix entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Rotation (or general linear) part
    pub rotation: Matrix3,
    /// Translation part
    pub translation: Vector3,
}

impl Transform {
    /// Create identity transform
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::ZERO,
        }
    }

    /// Create transform from its two parts
    pub fn new(rotation: Matrix3, translation: Vector3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Create translation transform
    pub fn from_translation(translation: Vector3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// Apply transform to a point
    pub fn apply(&self, point: Vector3) -> Vector3 {
        self.rotation.transform_point(point) + self.translation
    }

    /// Combine with another transform (this transform applied first)
    pub fn then(&self, other: &Transform) -> Transform {
        Transform {
            rotation: other.rotation * self.rotation,
            translation: other.rotation.transform_point(self.translation) + other.translation,
        }
    }

}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Transform {
    type Output = Self;

    /// `a * b` applies `b` first, then `a`
    fn mul(self, rhs: Self) -> Self::Output {
        rhs.then(&self)
    }
}

//! Quaternion for 3D rotations

use super::Vec3;

/// Quaternion for representing 3D rotations
///
/// Quaternions avoid gimbal lock and interpolate smoothly.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    /// Identity quaternion (no rotation)
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Create a new quaternion
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Create from Euler angles (radians) applied in Y-X-Z order
    ///
    /// Yaw about Y first, then pitch about X, then roll about Z. This is the
    /// order a camera uses for look-around offsets.
    pub fn from_euler_yxz(x: f32, y: f32, z: f32) -> Self {
        let (s1, c1) = (x * 0.5).sin_cos();
        let (s2, c2) = (y * 0.5).sin_cos();
        let (s3, c3) = (z * 0.5).sin_cos();

        Self {
            x: s1 * c2 * c3 + c1 * s2 * s3,
            y: c1 * s2 * c3 - s1 * c2 * s3,
            z: c1 * c2 * s3 - s1 * s2 * c3,
            w: c1 * c2 * c3 + s1 * s2 * s3,
        }
    }

    /// Create from axis-angle representation
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let len = axis.length();
        if len < 1e-6 {
            return Self::IDENTITY;
        }

        let (s, c) = (angle * 0.5).sin_cos();
        let inv_len = 1.0 / len;
        Self {
            x: axis.x * inv_len * s,
            y: axis.y * inv_len * s,
            z: axis.z * inv_len * s,
            w: c,
        }
    }

    /// Rotation that points the local forward axis (-Z) along `direction`
    ///
    /// Falls back to the Z axis as "up" when `direction` is parallel to `up`.
    /// Returns identity for a zero direction.
    pub fn look_rotation(direction: Vec3, up: Vec3) -> Self {
        let back = -direction.normalize();
        if back.length_squared() < 1e-12 {
            return Self::IDENTITY;
        }

        let mut right = up.cross(back);
        if right.length_squared() < 1e-12 {
            // Looking straight along up; nudge the up vector
            right = Vec3::new(0.0, 0.0, 1.0).cross(back);
        }
        let right = right.normalize();
        let true_up = back.cross(right);

        Self::from_basis(right, true_up, back)
    }

    /// Build from orthonormal basis columns (x, y, z)
    fn from_basis(x_axis: Vec3, y_axis: Vec3, z_axis: Vec3) -> Self {
        let (m00, m10, m20) = (x_axis.x, x_axis.y, x_axis.z);
        let (m01, m11, m21) = (y_axis.x, y_axis.y, y_axis.z);
        let (m02, m12, m22) = (z_axis.x, z_axis.y, z_axis.z);

        let trace = m00 + m11 + m22;

        let q = if trace > 0.0 {
            let s = 0.5 / (trace + 1.0).sqrt();
            Self {
                w: 0.25 / s,
                x: (m21 - m12) * s,
                y: (m02 - m20) * s,
                z: (m10 - m01) * s,
            }
        } else if m00 > m11 && m00 > m22 {
            let s = 2.0 * (1.0 + m00 - m11 - m22).sqrt();
            Self {
                w: (m21 - m12) / s,
                x: 0.25 * s,
                y: (m01 + m10) / s,
                z: (m02 + m20) / s,
            }
        } else if m11 > m22 {
            let s = 2.0 * (1.0 + m11 - m00 - m22).sqrt();
            Self {
                w: (m02 - m20) / s,
                x: (m01 + m10) / s,
                y: 0.25 * s,
                z: (m12 + m21) / s,
            }
        } else {
            let s = 2.0 * (1.0 + m22 - m00 - m11).sqrt();
            Self {
                w: (m10 - m01) / s,
                x: (m02 + m20) / s,
                y: (m12 + m21) / s,
                z: 0.25 * s,
            }
        };

        q.normalize()
    }

    /// Normalize the quaternion
    pub fn normalize(&self) -> Self {
        let len = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if len < 1e-6 {
            return Self::IDENTITY;
        }
        let inv_len = 1.0 / len;
        Self {
            x: self.x * inv_len,
            y: self.y * inv_len,
            z: self.z * inv_len,
            w: self.w * inv_len,
        }
    }

    /// Get the conjugate (inverse for unit quaternions)
    pub fn conjugate(&self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
            w: self.w,
        }
    }

    /// Dot product of two quaternions
    pub fn dot(&self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Multiply two quaternions (`self` applied after `other`)
    pub fn mul(&self, other: &Self) -> Self {
        Self {
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
        }
    }

    /// Rotate a vector by this quaternion
    pub fn rotate_vec3(&self, v: Vec3) -> Vec3 {
        let qv = Self::new(v.x, v.y, v.z, 0.0);
        let result = self.mul(&qv).mul(&self.conjugate());
        Vec3::new(result.x, result.y, result.z)
    }
}

impl std::ops::Mul for Quat {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Quat::mul(&self, &rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    // q and -q encode the same rotation
    fn same_rotation(a: Quat, b: Quat) -> bool {
        let s = if a.dot(b) < 0.0 { -1.0 } else { 1.0 };
        (a.x - s * b.x).abs() < 1e-5
            && (a.y - s * b.y).abs() < 1e-5
            && (a.z - s * b.z).abs() < 1e-5
            && (a.w - s * b.w).abs() < 1e-5
    }

    #[test]
    fn test_identity() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert!(Quat::IDENTITY.rotate_vec3(v).approx_eq(v, 1e-5));
    }

    #[test]
    fn test_from_axis_angle() {
        // Rotate 90 degrees around Y axis
        let q = Quat::from_axis_angle(Vec3::UP, PI / 2.0);
        let rotated = q.rotate_vec3(Vec3::new(1.0, 0.0, 0.0));
        assert!(rotated.approx_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5));
    }

    #[test]
    fn test_euler_yxz_matches_axis_angle_for_single_axis() {
        let a = Quat::from_euler_yxz(0.0, PI / 2.0, 0.0);
        let b = Quat::from_axis_angle(Vec3::UP, PI / 2.0);
        assert!(same_rotation(a, b));

        let a = Quat::from_euler_yxz(0.3, 0.0, 0.0);
        let b = Quat::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), 0.3);
        assert!(same_rotation(a, b));
    }

    #[test]
    fn test_euler_yxz_applies_yaw_before_pitch() {
        // Y-X-Z intrinsic order composes as qY * qX * qZ
        let q = Quat::from_euler_yxz(0.4, 0.7, 0.2);
        let expected = Quat::from_axis_angle(Vec3::UP, 0.7)
            * Quat::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), 0.4)
            * Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), 0.2);
        assert!(same_rotation(q, expected));
    }

    #[test]
    fn test_look_rotation_points_forward_along_direction() {
        let dirs = [
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.3, -0.5, 0.8),
            Vec3::new(0.0, -1.0, 0.0),
        ];
        for dir in dirs {
            let q = Quat::look_rotation(dir, Vec3::UP);
            let forward = q.rotate_vec3(Vec3::FORWARD);
            assert!(
                forward.approx_eq(dir.normalize(), 1e-4),
                "dir {:?} -> forward {:?}",
                dir,
                forward
            );
        }
    }

    #[test]
    fn test_look_rotation_zero_direction_is_identity() {
        assert_eq!(Quat::look_rotation(Vec3::ZERO, Vec3::UP), Quat::IDENTITY);
    }
}

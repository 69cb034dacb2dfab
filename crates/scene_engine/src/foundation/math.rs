//! Math utilities and types
//!
//! nalgebra aliases plus the handful of TRS helpers the transform hierarchy
//! needs: composition, dominant-axis scale and matrix decomposition.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Rotation3, Unit, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Scale magnitudes below this are treated as collapsed axes during decomposition
const DEGENERATE_SCALE: f32 = 1e-8;

/// Position, rotation and scale triple
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform from its three parts
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Translation and rotation only, `translate(position) * rotation`
    pub fn rigid_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position) * self.rotation.to_homogeneous()
    }

    /// Convert to a transformation matrix (TRS order)
    pub fn to_matrix(&self) -> Mat4 {
        self.rigid_matrix() * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// TRS matrix whose scale is the dominant axis applied on all three axes
    pub fn to_uniform_scale_matrix(&self) -> Mat4 {
        self.rigid_matrix() * Mat4::new_scaling(dominant_axis(&self.scale))
    }

    /// Decompose an affine transformation matrix into position, rotation and scale
    ///
    /// A negative determinant is folded into the scale so the rotation stays proper.
    /// Collapsed axes keep an identity rotation instead of producing NaNs.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        let mut columns = [
            Vec3::new(matrix.m11, matrix.m21, matrix.m31),
            Vec3::new(matrix.m12, matrix.m22, matrix.m32),
            Vec3::new(matrix.m13, matrix.m23, matrix.m33),
        ];
        let mut scale = Vec3::new(
            columns[0].magnitude(),
            columns[1].magnitude(),
            columns[2].magnitude(),
        );

        if scale.iter().any(|s| *s < DEGENERATE_SCALE) {
            return Self {
                position,
                rotation: Quat::identity(),
                scale,
            };
        }

        for (column, s) in columns.iter_mut().zip(scale.iter()) {
            *column /= *s;
        }

        // mirrored basis: flip everything so the rotation part has det = +1
        if columns[0].dot(&columns[1].cross(&columns[2])) < 0.0 {
            scale = -scale;
            for column in &mut columns {
                *column = -*column;
            }
        }

        let rotation_matrix = Mat3::from_columns(&columns);
        let rotation =
            Quat::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rotation_matrix));

        Self {
            position,
            rotation,
            scale,
        }
    }
}

/// Largest of the three scale components
pub fn dominant_axis(scale: &Vec3) -> f32 {
    scale.x.max(scale.y).max(scale.z)
}

/// Build a unit quaternion from `[x, y, z, w]` components
///
/// Zero-length input falls back to identity.
pub fn quat_from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Quat {
    Quat::try_new(Quaternion::new(w, x, y, z), f32::EPSILON).unwrap_or_else(Quat::identity)
}

/// `[x, y, z, w]` components of a quaternion
pub fn quat_to_xyzw(rotation: &Quat) -> [f32; 4] {
    [rotation.i, rotation.j, rotation.k, rotation.w]
}

/// Inverse of the transposed matrix, used to carry normals into world space
///
/// Returns `None` when the matrix is singular.
pub fn inverse_transpose(matrix: &Mat4) -> Option<Mat4> {
    if approx::abs_diff_eq!(matrix.determinant(), 0.0, epsilon = f32::EPSILON) {
        return None;
    }
    matrix.transpose().try_inverse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_dominant_axis_picks_largest_component() {
        assert_relative_eq!(dominant_axis(&Vec3::new(1.0, 3.0, 2.0)), 3.0);
        assert_relative_eq!(dominant_axis(&Vec3::new(-1.0, -3.0, -2.0)), -1.0);
    }

    #[test]
    fn test_uniform_scale_matrix_uses_dominant_axis() {
        let transform = Transform::new(Vec3::zeros(), Quat::identity(), Vec3::new(1.0, 4.0, 2.0));
        let matrix = transform.to_uniform_scale_matrix();
        assert_relative_eq!(matrix.m11, 4.0);
        assert_relative_eq!(matrix.m22, 4.0);
        assert_relative_eq!(matrix.m33, 4.0);
    }

    #[test]
    fn test_matrix_decomposition_roundtrip() {
        let original = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(&Unit::new_normalize(Vec3::new(1.0, 1.0, 1.0)), 0.5),
            Vec3::new(2.0, 1.5, 0.8),
        );

        let decomposed = Transform::from_matrix(&original.to_matrix());

        assert_relative_eq!(decomposed.position, original.position, epsilon = 1e-5);
        assert_relative_eq!(decomposed.scale, original.scale, epsilon = 1e-5);
        let dot = original.rotation.coords.dot(&decomposed.rotation.coords);
        assert!(dot.abs() > 0.999, "Quaternion rotation mismatch: dot product = {}", dot);
    }

    #[test]
    fn test_decomposition_of_mirrored_matrix_keeps_proper_rotation() {
        let matrix = Mat4::new_nonuniform_scaling(&Vec3::new(-1.0, 1.0, 1.0));
        let decomposed = Transform::from_matrix(&matrix);
        let rotation = decomposed.rotation.to_rotation_matrix();
        assert_relative_eq!(rotation.matrix().determinant(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(decomposed.to_matrix(), matrix, epsilon = 1e-5);
    }

    #[test]
    fn test_decomposition_of_collapsed_axis_is_finite() {
        let matrix = Mat4::new_nonuniform_scaling(&Vec3::new(0.0, 1.0, 1.0));
        let decomposed = Transform::from_matrix(&matrix);
        assert!(decomposed.rotation.coords.iter().all(|c| c.is_finite()));
        assert_relative_eq!(decomposed.scale.x, 0.0);
    }

    #[test]
    fn test_quaternion_component_order() {
        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), FRAC_PI_2);
        let [x, y, z, w] = quat_to_xyzw(&rotation);
        let rebuilt = quat_from_xyzw(x, y, z, w);
        assert_relative_eq!(rebuilt, rotation, epsilon = 1e-6);
        assert_eq!(quat_from_xyzw(0.0, 0.0, 0.0, 0.0), Quat::identity());
    }

    #[test]
    fn test_inverse_transpose_of_singular_matrix() {
        assert!(inverse_transpose(&Mat4::zeros()).is_none());
        let scaled = Mat4::new_scaling(2.0);
        let inv = inverse_transpose(&scaled).unwrap();
        assert_relative_eq!(inv.m11, 0.5);
    }
}

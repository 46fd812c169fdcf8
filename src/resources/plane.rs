use glam::{Mat3, Mat4, Vec3, Vec4};

/// A plane in Hessian normal form: `normal · p + constant = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub constant: f32,
}

impl Default for Plane {
    fn default() -> Self {
        Self {
            normal: Vec3::X,
            constant: 0.0,
        }
    }
}

impl Plane {
    #[must_use]
    pub const fn new(normal: Vec3, constant: f32) -> Self {
        Self { normal, constant }
    }

    #[must_use]
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        Self {
            normal,
            constant: -point.dot(normal),
        }
    }

    #[inline]
    #[must_use]
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }

    #[inline]
    #[must_use]
    pub fn coplanar_point(&self) -> Vec3 {
        self.normal * -self.constant
    }

    /// Transforms the plane by `matrix`, with `normal_matrix` the inverse
    /// transpose of its upper 3x3.
    #[must_use]
    pub fn apply_matrix4(&self, matrix: &Mat4, normal_matrix: &Mat3) -> Self {
        let point = matrix.transform_point3(self.coplanar_point());
        let normal = (*normal_matrix * self.normal).normalize_or_zero();
        Self::from_normal_and_point(normal, point)
    }

    /// Packs as `(nx, ny, nz, constant)`.
    #[inline]
    #[must_use]
    pub fn to_vec4(&self) -> Vec4 {
        self.normal.extend(self.constant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_moves_the_constant() {
        let plane = Plane::new(Vec3::Y, -1.0);
        let m = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
        let n = Mat3::from_mat4(m).inverse().transpose();
        let moved = plane.apply_matrix4(&m, &n);
        assert!((moved.normal - Vec3::Y).length() < 1e-6);
        assert!((moved.constant + 3.0).abs() < 1e-6);
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Affine3A, Mat3, Mat4, Vec3};

static NEXT_CAMERA_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionType {
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone)]
pub struct Camera {
    id: u64,
    pub name: String,

    // === Projection ===
    pub projection_type: ProjectionType,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub ortho_size: f32,

    // Cached matrices, read-only for the renderer
    world_matrix: Affine3A,
    view_matrix: Mat4,
    projection_matrix: Mat4,
    view_projection_matrix: Mat4,
}

impl Camera {
    /// `fov` is the vertical field of view in degrees.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self::blank(ProjectionType::Perspective, aspect, near, far);
        cam.fov = fov.to_radians();
        cam.update_projection_matrix();
        cam
    }

    /// `size` is the half height of the view volume.
    #[must_use]
    pub fn new_orthographic(size: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self::blank(ProjectionType::Orthographic, aspect, near, far);
        cam.ortho_size = size;
        cam.update_projection_matrix();
        cam
    }

    fn blank(projection_type: ProjectionType, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            id: NEXT_CAMERA_ID.fetch_add(1, Ordering::Relaxed),
            name: "Camera".to_string(),
            projection_type,
            fov: 50f32.to_radians(),
            aspect,
            near,
            far,
            ortho_size: 10.0,
            world_matrix: Affine3A::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = match self.projection_type {
            ProjectionType::Perspective => {
                Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
            }
            ProjectionType::Orthographic => {
                let w = self.ortho_size * self.aspect;
                let h = self.ortho_size;
                Mat4::orthographic_rh(-w, w, -h, h, self.near, self.far)
            }
        };
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    pub fn update_view_projection(&mut self, world_transform: &Affine3A) {
        self.world_matrix = *world_transform;
        self.view_matrix = Mat4::from(*world_transform).inverse();
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    /// Places the camera at `eye` looking at `target`.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        let view = Mat4::look_at_rh(eye, target, up);
        let world = Affine3A::from_mat4(view.inverse());
        self.update_view_projection(&world);
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    /// World-to-view transform (the inverse world matrix).
    #[inline]
    #[must_use]
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Inverse transpose of the view matrix's upper 3x3, for normals.
    #[must_use]
    pub fn view_normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(self.view_matrix).inverse().transpose()
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    #[inline]
    #[must_use]
    pub fn view_projection_matrix(&self) -> &Mat4 {
        &self.view_projection_matrix
    }

    /// Normalized-device depth of a world-space point.
    #[must_use]
    pub fn project_depth(&self, point: Vec3) -> f32 {
        self.view_projection_matrix.project_point3(point).z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn farther_points_project_deeper() {
        let mut camera = Camera::new_perspective(60.0, 1.0, 0.1, 100.0);
        camera.look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let near = camera.project_depth(Vec3::new(0.0, 0.0, 5.0));
        let far = camera.project_depth(Vec3::new(0.0, 0.0, -5.0));
        assert!(near < far);
    }
}

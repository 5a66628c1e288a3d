use glam::{EulerRot, Mat4, Quat, Vec3};
use std::cell::{Cell, Ref, RefCell};

/// Local TRS transform with lazily computed local and world matrices.
///
/// World matrices are written by [`crate::scene_graph::scene::Scene`] during
/// its late update, which is why they live behind interior mutability.
#[derive(Debug, Clone)]
pub struct Transform {
    translation: Vec3,
    rotation: Quat,

    local_matrix: RefCell<Mat4>,
    world_matrix: RefCell<Mat4>,
    normal_matrix: RefCell<Mat4>,
    local_dirty: Cell<bool>,
    world_dirty: Cell<bool>,
    has_changed_since_last_update: Cell<bool>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_translation(Vec3::ZERO)
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
            local_matrix: RefCell::new(Mat4::IDENTITY),
            world_matrix: RefCell::new(Mat4::IDENTITY),
            normal_matrix: RefCell::new(Mat4::IDENTITY),
            local_dirty: Cell::new(true),
            world_dirty: Cell::new(true),
            has_changed_since_last_update: Cell::new(true),
        }
    }

    /// Rotation from intrinsic X, then Y, then Z Euler angles.
    pub fn from_euler_xyz(x: f32, y: f32, z: f32) -> Self {
        let mut transform = Self::default();
        transform.set_euler_xyz(x, y, z);
        transform
    }

    pub fn get_local_matrix(&self) -> Ref<Mat4> {
        if self.local_dirty.get() {
            let matrix = Mat4::from_rotation_translation(self.rotation, self.translation);

            self.local_matrix.replace(matrix);
            self.local_dirty.set(false);
        }

        self.local_matrix.borrow()
    }

    pub fn get_world_matrix(&self) -> Ref<Mat4> {
        self.world_matrix.borrow()
    }

    /// Inverse transpose of the world matrix, for transforming normals.
    pub fn get_normal_matrix(&self) -> Ref<Mat4> {
        self.normal_matrix.borrow()
    }

    pub fn set_world_matrix(&self, world_matrix: Mat4) {
        self.world_matrix.replace(world_matrix);
        self.world_dirty.set(false);
        self.has_changed_since_last_update.set(true);
        self.normal_matrix
            .replace(world_matrix.inverse().transpose());
    }

    pub fn invalidate_local(&self) {
        self.local_dirty.set(true);
        self.world_dirty.set(true);
        self.has_changed_since_last_update.set(true);
    }

    pub fn invalidate_world(&self) {
        self.world_dirty.set(true);
    }

    pub fn is_world_dirty(&self) -> bool {
        self.world_dirty.get()
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.invalidate_local();
    }

    pub fn set_euler_xyz(&mut self, x: f32, y: f32, z: f32) {
        self.set_rotation(Quat::from_euler(EulerRot::XYZ, x, y, z));
    }

    #[allow(dead_code)]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn reset_flags(&self) {
        self.has_changed_since_last_update.set(false);
    }

    pub fn has_changed(&self) -> bool {
        self.has_changed_since_last_update.get()
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn local_matrix_tracks_setters() {
        let mut transform = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let point = transform.get_local_matrix().transform_point3(Vec3::X);
        assert!(point.abs_diff_eq(Vec3::new(2.0, 2.0, 3.0), 1e-6));

        transform.set_rotation(Quat::from_rotation_z(FRAC_PI_2));
        let point = transform.get_local_matrix().transform_point3(Vec3::X);
        assert!(point.abs_diff_eq(Vec3::new(1.0, 3.0, 3.0), 1e-6), "{:?}", point);
    }

    #[test]
    fn euler_xyz_applies_z_first() {
        // Intrinsic XYZ: a vector is rotated by Z, then Y, then X.
        let transform = Transform::from_euler_xyz(FRAC_PI_2, 0.0, FRAC_PI_2);
        let rotated = transform.rotation() * Vec3::X;
        // Z turns +X into +Y, X then turns +Y into +Z.
        assert!(rotated.abs_diff_eq(Vec3::Z, 1e-6), "{:?}", rotated);
    }

    #[test]
    fn change_flags() {
        let mut transform = Transform::default();
        assert!(transform.has_changed());
        transform.reset_flags();
        assert!(!transform.has_changed());

        transform.set_rotation(Quat::from_rotation_y(0.5));
        assert!(transform.has_changed());
        assert!(transform.is_world_dirty());

        transform.set_world_matrix(*transform.get_local_matrix());
        assert!(!transform.is_world_dirty());
    }
}

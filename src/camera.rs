use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::config::CameraConfig;

#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            eye: config.eye,
            target: config.target,
            up: Vec3::Y,
            fovy: config.fovy,
            aspect,
            znear: config.near,
            zfar: config.far,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy.to_radians(), self.aspect, self.znear, self.zfar)
    }

    pub fn get_vp_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Ignores degenerate sizes, e.g. a minimized window.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Distance along the view direction, used to sort transparent objects.
    pub fn view_depth(&self, point: Vec3) -> f32 {
        -self.view_matrix().transform_point3(point).z
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct CameraUniform {
    view_proj: Mat4,
    position: [f32; 4],
}

impl CameraUniform {
    pub fn update(&mut self, camera: &Camera) {
        self.view_proj = camera.get_vp_matrix();
        self.position = camera.eye.extend(1.0).to_array();
    }

    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    pub fn update_buffer(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[*self]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;

    #[test]
    fn starts_at_configured_eye() {
        let camera = Camera::from_config(&SceneConfig::default().camera, 16.0 / 9.0);
        assert_eq!(camera.eye, Vec3::new(12.0, 3.0, 12.0));
        assert_eq!(camera.target, Vec3::ZERO);

        // The target projects to the center of the screen.
        let clip = camera.get_vp_matrix() * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!((0.0..1.0).contains(&ndc.z));
    }

    #[test]
    fn viewport_updates_aspect() {
        let mut camera = Camera::from_config(&SceneConfig::default().camera, 1.0);
        camera.set_viewport(1920, 1080);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);

        camera.set_viewport(0, 1080);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn view_depth_is_positive_in_front() {
        let camera = Camera::from_config(&SceneConfig::default().camera, 1.0);
        let distance = camera.eye.length();
        assert!((camera.view_depth(Vec3::ZERO) - distance).abs() < 1e-4);
        assert!(camera.view_depth(camera.eye * 2.0) < 0.0);
    }
}

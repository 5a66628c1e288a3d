//! Mouse-driven orbit camera: left drag orbits around the target, right drag
//! pans, middle drag and the wheel dolly towards or away from the target.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use winit::event::MouseButton;

use crate::camera::Camera;

const POLAR_EPSILON: f32 = 1e-6;
const DOLLY_SCALE: f32 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Rotate,
    Dolly,
    Pan,
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    radius: f32,
    /// Azimuth around +Y, measured from +Z towards +X.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,
    fovy: f32,

    drag: Option<DragMode>,
    cursor: Option<Vec2>,
}

impl OrbitControls {
    pub fn new(camera: &Camera) -> Self {
        let offset = camera.eye - camera.target;
        let radius = offset.length();
        let (theta, phi) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, PI / 2.0)
        };

        Self {
            target: camera.target,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            radius,
            theta,
            phi,
            fovy: camera.fovy,
            drag: None,
            cursor: None,
        }
    }

    #[allow(dead_code)]
    pub fn distance(&self) -> f32 {
        self.radius
    }

    pub fn eye(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        self.target
            + self.radius
                * Vec3::new(
                    sin_phi * self.theta.sin(),
                    self.phi.cos(),
                    sin_phi * self.theta.cos(),
                )
    }

    /// Writes the orbit position into `camera`.
    pub fn apply(&self, camera: &mut Camera) {
        camera.eye = self.eye();
        camera.target = self.target;
        camera.up = Vec3::Y;
    }

    pub fn on_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if !pressed {
            self.drag = None;
            return;
        }

        self.drag = match button {
            MouseButton::Left => Some(DragMode::Rotate),
            MouseButton::Middle => Some(DragMode::Dolly),
            MouseButton::Right => Some(DragMode::Pan),
            _ => self.drag,
        };
    }

    /// Feeds a cursor position in physical pixels. Returns true when the
    /// camera moved.
    pub fn on_cursor_moved(&mut self, position: Vec2, viewport_height: f32) -> bool {
        let previous = self.cursor.replace(position);

        let (Some(mode), Some(previous)) = (self.drag, previous) else {
            return false;
        };

        let delta = position - previous;
        if delta == Vec2::ZERO {
            return false;
        }

        match mode {
            DragMode::Rotate => self.rotate(delta, viewport_height),
            DragMode::Dolly => {
                if delta.y > 0.0 {
                    self.dolly(1.0 / self.zoom_scale(1.0));
                } else if delta.y < 0.0 {
                    self.dolly(self.zoom_scale(1.0));
                }
            }
            DragMode::Pan => self.pan(delta, viewport_height),
        }

        true
    }

    pub fn on_cursor_left(&mut self) {
        self.cursor = None;
    }

    /// Positive `notches` scroll away from the user and move the camera closer.
    pub fn on_scroll(&mut self, notches: f32) {
        if notches > 0.0 {
            self.dolly(self.zoom_scale(notches));
        } else if notches < 0.0 {
            self.dolly(1.0 / self.zoom_scale(-notches));
        }
    }

    /// Orbits by a drag of `delta` pixels; a drag the height of the viewport
    /// is one full turn.
    pub fn rotate(&mut self, delta: Vec2, viewport_height: f32) {
        let viewport_height = viewport_height.max(1.0);
        let angle = TAU * delta * self.rotate_speed / viewport_height;

        self.theta -= angle.x;
        self.phi = (self.phi - angle.y).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
    }

    /// Moves the target in the camera plane so the point under the cursor
    /// follows it at the target's depth.
    pub fn pan(&mut self, delta: Vec2, viewport_height: f32) {
        let viewport_height = viewport_height.max(1.0);
        let target_distance = self.radius * (self.fovy.to_radians() / 2.0).tan();

        let forward = (self.target - self.eye()).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);

        let scale = 2.0 * target_distance * self.pan_speed / viewport_height;
        self.target += -right * delta.x * scale + up * delta.y * scale;
    }

    fn dolly(&mut self, scale: f32) {
        self.radius = (self.radius * scale).clamp(self.min_distance, self.max_distance);
    }

    fn zoom_scale(&self, notches: f32) -> f32 {
        DOLLY_SCALE.powf(self.zoom_speed * notches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;

    fn controls() -> (Camera, OrbitControls) {
        let camera = Camera::from_config(&SceneConfig::default().camera, 1.0);
        let controls = OrbitControls::new(&camera);
        (camera, controls)
    }

    #[test]
    fn starts_at_camera_eye() {
        let (camera, controls) = controls();
        assert!(controls.eye().abs_diff_eq(camera.eye, 1e-4), "{:?}", controls.eye());
        assert!((controls.distance() - 297.0_f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn rotate_keeps_distance() {
        let (mut camera, mut controls) = controls();
        let before = controls.eye();

        controls.rotate(Vec2::new(100.0, 0.0), 1000.0);
        controls.apply(&mut camera);

        assert!((camera.eye.length() - controls.distance()).abs() < 1e-4);
        assert!((camera.eye.y - before.y).abs() < 1e-4);
        assert!(!camera.eye.abs_diff_eq(before, 1e-3));
    }

    #[test]
    fn polar_angle_is_clamped() {
        let (_, mut controls) = controls();
        controls.rotate(Vec2::new(0.0, 100_000.0), 100.0);
        let eye = controls.eye();
        assert!(eye.y > 0.0 && eye.y <= controls.distance());

        controls.rotate(Vec2::new(0.0, -200_000.0), 100.0);
        let eye = controls.eye();
        assert!(eye.y < 0.0 && eye.y >= -controls.distance());
    }

    #[test]
    fn scroll_dollies() {
        let (_, mut controls) = controls();
        let start = controls.distance();

        controls.on_scroll(1.0);
        assert!((controls.distance() - start * 0.95).abs() < 1e-4);

        controls.on_scroll(-1.0);
        assert!((controls.distance() - start).abs() < 1e-4);
    }

    #[test]
    fn dolly_respects_limits() {
        let (_, mut controls) = controls();
        controls.min_distance = 5.0;
        controls.max_distance = 20.0;

        controls.on_scroll(100.0);
        assert_eq!(controls.distance(), 5.0);

        controls.on_scroll(-100.0);
        assert_eq!(controls.distance(), 20.0);
    }

    #[test]
    fn pan_moves_target_and_eye_together() {
        let (_, mut controls) = controls();
        let offset_before = controls.eye() - controls.target;

        controls.pan(Vec2::new(50.0, -20.0), 800.0);

        assert!(controls.target.length() > 0.0);
        let offset_after = controls.eye() - controls.target;
        assert!(offset_after.abs_diff_eq(offset_before, 1e-4));
    }

    #[test]
    fn drag_requires_pressed_button() {
        let (_, mut controls) = controls();
        let start = controls.eye();

        assert!(!controls.on_cursor_moved(Vec2::new(10.0, 10.0), 600.0));
        assert!(!controls.on_cursor_moved(Vec2::new(60.0, 10.0), 600.0));
        assert!(controls.eye().abs_diff_eq(start, 1e-6));

        controls.on_mouse_button(MouseButton::Left, true);
        assert!(controls.on_cursor_moved(Vec2::new(120.0, 10.0), 600.0));
        assert!(!controls.eye().abs_diff_eq(start, 1e-3));

        controls.on_mouse_button(MouseButton::Left, false);
        assert!(!controls.on_cursor_moved(Vec2::new(180.0, 10.0), 600.0));
    }
}

use std::f32::consts::FRAC_PI_2;

use glam::{EulerRot, Quat, Vec2};
use winit::event::MouseButton;

use crate::{
    camera::Camera,
    config::SceneConfig,
    geometry,
    lights::Lights,
    material::{Color, PhysicalMaterial, Side},
    orbit_controls::OrbitControls,
    planet_texture::PlanetTexture,
    scene_graph::{
        object3d::{Object3D, ObjectId},
        scene::Scene,
        scene_model::SceneModel,
        transform::Transform,
    },
};

/// The ringed planet scene plus everything that animates or moves it.
pub struct DemoState {
    pub camera: Camera,
    pub controls: OrbitControls,
    pub lights: Lights,
    pub background: Color,
    pub start_time: std::time::Instant,
    pub scene: Scene,

    config: SceneConfig,
    frame_count: u64,
    planet_group: ObjectId,
    planet: ObjectId,
    rings: Vec<ObjectId>,
    planet_yaw: f32,
    ring_spin: f32,
    viewport_height: f32,
}

impl DemoState {
    pub fn new(config: SceneConfig) -> Self {
        let surface = PlanetTexture::default().paint(&mut rand::thread_rng());
        Self::with_surface(config, surface)
    }

    /// Builds the scene around an already painted planet surface.
    pub fn with_surface(config: SceneConfig, surface: image::RgbaImage) -> Self {
        let camera = Camera::from_config(&config.camera, 1.0);
        let controls = OrbitControls::new(&camera);

        let mut scene = Scene::new();

        let planet_group = scene.add_object(Object3D::group(
            "Saturn",
            Transform::from_euler_xyz(config.group_pitch, config.group_yaw, 0.0),
        ));

        let planet_config = &config.planet;
        let surface = scene.add_texture("Planet surface", surface);
        let mut planet_material =
            PhysicalMaterial::new("Planet", Color::from_hex(planet_config.color));
        planet_material.map = Some(surface);
        planet_material.roughness = planet_config.roughness;
        planet_material.metalness = planet_config.metalness;
        planet_material.clearcoat = planet_config.clearcoat;
        planet_material.clearcoat_roughness = planet_config.clearcoat_roughness;

        let planet_model = scene.add_model(SceneModel::new(geometry::sphere(
            "Planet",
            planet_config.radius,
            planet_config.width_segments,
            planet_config.height_segments,
        )));
        let planet_material = scene.add_material(planet_material);

        let planet = scene.add_child(
            planet_group,
            Object3D::mesh(
                "Planet",
                Transform::from_euler_xyz(0.0, 0.0, config.axial_tilt),
                planet_model,
                planet_material,
            ),
        );

        let ring_material = &config.ring_material;
        let rings = config
            .rings
            .iter()
            .enumerate()
            .map(|(i, ring)| {
                let name = format!("Ring {}", i + 1);

                let model = scene.add_model(SceneModel::new(geometry::ring(
                    name.clone(),
                    ring.inner_radius,
                    ring.outer_radius,
                    ring_material.theta_segments,
                    ring_material.phi_segments,
                )));

                let mut material = PhysicalMaterial::new(name.clone(), Color::from_hex(ring.color));
                material.roughness = ring_material.roughness;
                material.metalness = ring_material.metalness;
                material.clearcoat = ring_material.clearcoat;
                material.clearcoat_roughness = ring_material.clearcoat_roughness;
                material.opacity = ring.opacity;
                material.transparent = true;
                material.side = Side::Double;
                let material = scene.add_material(material);

                scene.add_child(
                    planet_group,
                    Object3D::mesh(
                        name,
                        Transform::from_euler_xyz(FRAC_PI_2, 0.0, config.axial_tilt),
                        model,
                        material,
                    ),
                )
            })
            .collect::<Vec<_>>();

        scene.late_update();

        log::info!(
            "Scene built: {} objects, {} rings",
            scene.objects.len(),
            rings.len()
        );

        Self {
            camera,
            controls,
            lights: Lights::from_config(&config.lighting),
            background: Color::from_hex(config.background),
            start_time: std::time::Instant::now(),
            scene,
            frame_count: 0,
            planet_group,
            planet,
            rings,
            planet_yaw: config.group_yaw,
            ring_spin: 0.0,
            viewport_height: 1.0,
            config,
        }
    }

    /// Advances the animation by one frame.
    pub fn update(&mut self) {
        let animation = &self.config.animation;
        self.planet_yaw += animation.planet_yaw_per_frame;
        self.ring_spin += animation.ring_spin_per_frame;
        self.frame_count += 1;

        self.scene.set_object_rotation(
            self.planet_group,
            Quat::from_euler(EulerRot::XYZ, self.config.group_pitch, self.planet_yaw, 0.0),
        );

        let ring_rotation = Quat::from_euler(
            EulerRot::XYZ,
            FRAC_PI_2,
            0.0,
            self.config.axial_tilt + self.ring_spin,
        );
        for &ring in &self.rings {
            self.scene.set_object_rotation(ring, ring_rotation);
        }

        self.controls.apply(&mut self.camera);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
        if height > 0 {
            self.viewport_height = height as f32;
        }
    }

    pub fn on_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        self.controls.on_mouse_button(button, pressed);
    }

    pub fn on_cursor_moved(&mut self, position: Vec2) {
        if self.controls.on_cursor_moved(position, self.viewport_height) {
            log::trace!("Camera moved to {:?}", self.controls.eye());
        }
    }

    pub fn on_cursor_left(&mut self) {
        self.controls.on_cursor_left();
    }

    pub fn on_scroll(&mut self, notches: f32) {
        self.controls.on_scroll(notches);
    }
}

#[allow(dead_code)]
impl DemoState {
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn planet(&self) -> ObjectId {
        self.planet
    }

    pub fn planet_group(&self) -> ObjectId {
        self.planet_group
    }

    pub fn rings(&self) -> &[ObjectId] {
        &self.rings
    }

    pub fn planet_yaw(&self) -> f32 {
        self.planet_yaw
    }

    pub fn ring_spin(&self) -> f32 {
        self.ring_spin
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use image::RgbaImage;

    use super::*;
    use crate::engine;

    fn demo() -> DemoState {
        DemoState::with_surface(SceneConfig::default(), RgbaImage::new(4, 2))
    }

    #[test]
    fn builds_one_planet_and_five_rings() {
        let demo = demo();
        let scene = &demo.scene;

        assert_eq!(scene.renderables().count(), 6);
        assert_eq!(demo.rings().len(), 5);

        let group = scene.get_object(demo.planet_group()).unwrap();
        assert_eq!(group.name, "Saturn");
        assert_eq!(group.children(scene).count(), 6);

        let names: Vec<&str> = group.children(scene).map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Planet", "Ring 1", "Ring 2", "Ring 3", "Ring 4", "Ring 5"]
        );
    }

    #[test]
    fn planet_is_opaque_and_rings_are_transparent() {
        let demo = demo();
        let scene = &demo.scene;

        let material_of = |id: ObjectId| {
            let material_id = scene.get_object(id).unwrap().material_id.unwrap();
            scene.get_material(material_id).unwrap()
        };

        let planet = material_of(demo.planet());
        assert!(!planet.transparent);
        assert!(planet.map.is_some());
        assert_eq!(planet.side, Side::Front);

        let opacities: Vec<f32> = demo
            .rings()
            .iter()
            .map(|&ring| {
                let material = material_of(ring);
                assert!(material.transparent);
                assert_eq!(material.side, Side::Double);
                assert!(material.map.is_none());
                material.opacity
            })
            .collect();
        assert_eq!(opacities, vec![0.9, 0.8, 0.7, 0.6, 0.4]);
    }

    #[test]
    fn animation_advances_per_frame() {
        let mut demo = demo();
        for _ in 0..100 {
            engine::update(&mut demo);
        }

        assert_eq!(demo.frame_count(), 100);
        assert!((demo.planet_yaw() - (FRAC_PI_2 + 0.2)).abs() < 1e-4);
        assert!((demo.ring_spin() - 0.1).abs() < 1e-4);
    }

    #[test]
    fn rings_stay_flat_in_the_group_plane() {
        let mut demo = demo();
        for _ in 0..50 {
            engine::update(&mut demo);
        }

        let scene = &demo.scene;
        let group_world = *scene
            .get_object_transform(demo.planet_group())
            .unwrap()
            .get_world_matrix();
        let group_up = group_world.transform_vector3(Vec3::Y).normalize();

        // Tilt and spin both turn the ring about its own normal.
        for &ring in demo.rings() {
            let ring_world = *scene.get_object_transform(ring).unwrap().get_world_matrix();
            let ring_normal = ring_world.transform_vector3(Vec3::Z).normalize();
            assert!(
                ring_normal.abs_diff_eq(-group_up, 1e-4),
                "{:?} vs {:?}",
                ring_normal,
                group_up
            );
        }

        let planet_world = *scene
            .get_object_transform(demo.planet())
            .unwrap()
            .get_world_matrix();
        let planet_axis = planet_world.transform_vector3(Vec3::Y).normalize();
        let tilt = planet_axis.dot(group_up).clamp(-1.0, 1.0).acos();
        assert!((tilt - 15.0_f32.to_radians()).abs() < 1e-4);
    }

    #[test]
    fn scrolling_moves_camera_closer() {
        let mut demo = demo();
        let before = demo.camera.eye.length();

        demo.on_scroll(3.0);
        engine::update(&mut demo);

        assert!(demo.camera.eye.length() < before);
    }

    #[test]
    fn dragging_orbits_the_camera() {
        let mut demo = demo();
        demo.resize(800, 600);
        let before = demo.camera.eye;

        demo.on_cursor_moved(Vec2::new(100.0, 100.0));
        demo.on_mouse_button(MouseButton::Left, true);
        demo.on_cursor_moved(Vec2::new(160.0, 100.0));
        demo.on_mouse_button(MouseButton::Left, false);
        engine::update(&mut demo);

        assert!(!demo.camera.eye.abs_diff_eq(before, 1e-3));
        assert!((demo.camera.eye.length() - before.length()).abs() < 1e-3);
    }
}

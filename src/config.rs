use std::f32::consts::PI;

use glam::Vec3;

#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub eye: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone)]
pub struct DirectionalLightConfig {
    pub color: u32,
    pub intensity: f32,
    /// The light shines from here towards the origin.
    pub position: Vec3,
}

#[derive(Debug, Clone)]
pub struct LightingConfig {
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    pub directional: Vec<DirectionalLightConfig>,
}

#[derive(Debug, Clone)]
pub struct PlanetConfig {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub color: u32,
    pub roughness: f32,
    pub metalness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
}

#[derive(Debug, Clone)]
pub struct RingConfig {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub color: u32,
    pub opacity: f32,
}

#[derive(Debug, Clone)]
pub struct RingMaterialConfig {
    pub theta_segments: u32,
    pub phi_segments: u32,
    pub roughness: f32,
    pub metalness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
}

#[derive(Debug, Clone)]
pub struct AnimationConfig {
    /// Radians added to the planet group's yaw every frame.
    pub planet_yaw_per_frame: f32,
    /// Radians added to the rings' spin every frame.
    pub ring_spin_per_frame: f32,
}

/// Everything needed to build the scene. Angles are in radians unless noted.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub background: u32,
    pub camera: CameraConfig,
    pub lighting: LightingConfig,
    pub planet: PlanetConfig,
    pub rings: Vec<RingConfig>,
    pub ring_material: RingMaterialConfig,
    pub axial_tilt: f32,
    pub group_pitch: f32,
    pub group_yaw: f32,
    pub animation: AnimationConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: 0x000000,
            camera: CameraConfig {
                eye: Vec3::new(12.0, 3.0, 12.0),
                target: Vec3::ZERO,
                fovy: 45.0,
                near: 0.1,
                far: 1000.0,
            },
            lighting: LightingConfig {
                ambient_color: 0xffffff,
                ambient_intensity: 0.1,
                directional: vec![
                    DirectionalLightConfig {
                        color: 0xffffff,
                        intensity: 1.0,
                        position: Vec3::new(10.0, 5.0, 10.0),
                    },
                    DirectionalLightConfig {
                        color: 0xffffff,
                        intensity: 0.3,
                        position: Vec3::new(-5.0, -2.0, -5.0),
                    },
                    DirectionalLightConfig {
                        color: 0xffffff,
                        intensity: 0.2,
                        position: Vec3::new(0.0, -5.0, -10.0),
                    },
                ],
            },
            planet: PlanetConfig {
                radius: 1.5,
                width_segments: 128,
                height_segments: 128,
                color: 0xf4e4bc,
                roughness: 0.5,
                metalness: 0.1,
                clearcoat: 0.3,
                clearcoat_roughness: 0.4,
            },
            rings: vec![
                RingConfig {
                    inner_radius: 2.0,
                    outer_radius: 2.3,
                    color: 0x3c3c3c,
                    opacity: 0.9,
                },
                RingConfig {
                    inner_radius: 2.3,
                    outer_radius: 2.8,
                    color: 0xb0a89b,
                    opacity: 0.8,
                },
                RingConfig {
                    inner_radius: 2.8,
                    outer_radius: 3.2,
                    color: 0x8b7355,
                    opacity: 0.7,
                },
                RingConfig {
                    inner_radius: 3.2,
                    outer_radius: 3.5,
                    color: 0x6d6152,
                    opacity: 0.6,
                },
                RingConfig {
                    inner_radius: 3.5,
                    outer_radius: 3.7,
                    color: 0x4a4a4a,
                    opacity: 0.4,
                },
            ],
            ring_material: RingMaterialConfig {
                theta_segments: 256,
                phi_segments: 1,
                roughness: 0.6,
                metalness: 0.2,
                clearcoat: 0.3,
                clearcoat_roughness: 0.5,
            },
            axial_tilt: 15.0_f32.to_radians(),
            group_pitch: PI * 0.05,
            group_yaw: PI * 0.5,
            animation: AnimationConfig {
                planet_yaw_per_frame: 0.002,
                ring_spin_per_frame: 0.001,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rings_are_contiguous_and_ordered() {
        let config = SceneConfig::default();
        assert_eq!(config.rings.len(), 5);

        for pair in config.rings.windows(2) {
            assert_eq!(pair[0].outer_radius, pair[1].inner_radius);
        }

        for ring in &config.rings {
            assert!(ring.inner_radius < ring.outer_radius);
            assert!(ring.inner_radius > config.planet.radius);
        }
    }

    #[test]
    fn ring_opacity_fades_outwards() {
        let config = SceneConfig::default();
        let opacities: Vec<f32> = config.rings.iter().map(|ring| ring.opacity).collect();
        assert!(opacities.windows(2).all(|pair| pair[0] > pair[1]));
    }
}

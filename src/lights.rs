use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::config::LightingConfig;
use crate::material::Color;

pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

#[derive(Debug, Clone)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl DirectionalLight {
    /// Unit vector from the surface towards the light.
    pub fn to_light(&self) -> Vec3 {
        (self.position - self.target).normalize_or_zero()
    }
}

#[derive(Debug, Clone)]
pub struct Lights {
    pub ambient: Color,
    pub ambient_intensity: f32,
    pub directional: Vec<DirectionalLight>,
}

impl Lights {
    pub fn from_config(config: &LightingConfig) -> Self {
        if config.directional.len() > MAX_DIRECTIONAL_LIGHTS {
            log::warn!(
                "{} directional lights configured, only the first {} are used",
                config.directional.len(),
                MAX_DIRECTIONAL_LIGHTS
            );
        }

        Self {
            ambient: Color::from_hex(config.ambient_color),
            ambient_intensity: config.ambient_intensity,
            directional: config
                .directional
                .iter()
                .map(|light| DirectionalLight {
                    color: Color::from_hex(light.color),
                    intensity: light.intensity,
                    position: light.position,
                    target: Vec3::ZERO,
                })
                .collect(),
        }
    }

    pub fn to_uniform(&self) -> LightsUniform {
        let mut uniform = LightsUniform {
            ambient: self
                .ambient
                .scaled(self.ambient_intensity)
                .0
                .extend(0.0)
                .to_array(),
            ..Default::default()
        };

        for (slot, light) in uniform
            .directional
            .iter_mut()
            .zip(self.directional.iter())
        {
            *slot = DirectionalLightUniform {
                direction: light.to_light().extend(0.0).to_array(),
                color: light.color.scaled(light.intensity).0.extend(0.0).to_array(),
            };
        }

        uniform.count = self.directional.len().min(MAX_DIRECTIONAL_LIGHTS) as u32;
        uniform
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct DirectionalLightUniform {
    pub direction: [f32; 4],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct LightsUniform {
    pub ambient: [f32; 4],
    pub directional: [DirectionalLightUniform; MAX_DIRECTIONAL_LIGHTS],
    pub count: u32,
    _padding: [u32; 3],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;

    #[test]
    fn default_rig_has_three_directional_lights() {
        let lights = Lights::from_config(&SceneConfig::default().lighting);
        let uniform = lights.to_uniform();

        assert_eq!(uniform.count, 3);
        assert!((uniform.ambient[0] - 0.1).abs() < 1e-6);

        let main = uniform.directional[0];
        let expected = Vec3::new(10.0, 5.0, 10.0).normalize();
        assert!(Vec3::from_slice(&main.direction[..3]).abs_diff_eq(expected, 1e-6));
        assert!((main.color[0] - 1.0).abs() < 1e-5);

        let fill = uniform.directional[1];
        assert!((fill.color[1] - 0.3).abs() < 1e-5);

        assert_eq!(uniform.directional[3].color, [0.0; 4]);
    }

    #[test]
    fn uniform_matches_shader_layout() {
        assert_eq!(std::mem::size_of::<LightsUniform>(), 16 + 4 * 32 + 16);
    }
}

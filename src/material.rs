use glam::Vec3;
use id_arena::Id;

use crate::scene_graph::scene::TextureId;

pub type MaterialId = Id<PhysicalMaterial>;

/// Linear RGB color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub Vec3);

impl Color {
    /// Builds a linear color from an sRGB `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
        Color(Vec3::new(channel(16), channel(8), channel(0)))
    }

    pub fn scaled(self, intensity: f32) -> Self {
        Color(self.0 * intensity)
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Double,
}

#[derive(Debug, Clone)]
pub struct PhysicalMaterial {
    pub name: String,
    pub color: Color,
    /// Multiplied with `color` when present.
    pub map: Option<TextureId>,
    pub roughness: f32,
    pub metalness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub opacity: f32,
    pub transparent: bool,
    pub side: Side,
}

impl PhysicalMaterial {
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
            map: None,
            roughness: 1.0,
            metalness: 0.0,
            clearcoat: 0.0,
            clearcoat_roughness: 0.0,
            opacity: 1.0,
            transparent: false,
            side: Side::Front,
        }
    }

    /// Opacity as seen by the blender. Opaque materials ignore `opacity`.
    pub fn effective_opacity(&self) -> f32 {
        if self.transparent {
            self.opacity
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_extremes_map_to_unit_range() {
        assert!(Color::from_hex(0xffffff).0.abs_diff_eq(Vec3::ONE, 1e-5));
        assert_eq!(Color::from_hex(0x000000).0, Vec3::ZERO);
    }

    #[test]
    fn hex_channels_are_linearized() {
        let color = Color::from_hex(0x808080);
        // sRGB 0.5 is roughly 0.214 in linear space
        assert!((color.0.x - 0.2158).abs() < 1e-3, "{:?}", color);
        assert_eq!(color.0.x, color.0.y);
        assert_eq!(color.0.y, color.0.z);

        let red = Color::from_hex(0xff0000);
        assert!(red.0.abs_diff_eq(Vec3::X, 1e-5), "{:?}", red);
    }

    #[test]
    fn opaque_materials_ignore_opacity() {
        let mut material = PhysicalMaterial::new("Test", Color::from_hex(0xffffff));
        material.opacity = 0.25;
        assert_eq!(material.effective_opacity(), 1.0);

        material.transparent = true;
        assert_eq!(material.effective_opacity(), 0.25);
    }
}

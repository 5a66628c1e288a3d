//! Procedural banded surface texture for the planet.
//!
//! The image is a flat base color, darkened by thin vertical stripes of random
//! thickness and strength, with a horizontal fade towards the left and right
//! edges. Because every row is identical, a single row is painted and then
//! replicated over the whole image.

use image::RgbaImage;
use rand::Rng;
use rayon::prelude::*;

const BASE_COLOR: [f32; 3] = [244.0, 228.0, 188.0];
const FADE_COLOR: [f32; 3] = [200.0, 180.0, 160.0];

/// `(offset, alpha)` stops of the edge fade, linearly interpolated.
const FADE_STOPS: [(f32, f32); 4] = [(0.0, 0.4), (0.3, 0.0), (0.7, 0.0), (1.0, 0.4)];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stripe {
    pub x: f32,
    pub thickness: f32,
    pub alpha: f32,
}

#[derive(Debug, Clone)]
pub struct PlanetTexture {
    pub width: u32,
    pub height: u32,
    pub stripe_count: u32,
}

impl Default for PlanetTexture {
    fn default() -> Self {
        Self {
            width: 2048,
            height: 1024,
            stripe_count: 200,
        }
    }
}

impl PlanetTexture {
    /// Evenly spaced stripes, each 1–3 px thick and 10–20 % opaque black.
    pub fn stripes<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Stripe> {
        (0..self.stripe_count)
            .map(|i| Stripe {
                x: i as f32 / self.stripe_count as f32 * self.width as f32,
                thickness: rng.gen_range(1.0..3.0),
                alpha: rng.gen_range(0.1..0.2),
            })
            .collect()
    }

    pub fn paint<R: Rng + ?Sized>(&self, rng: &mut R) -> RgbaImage {
        let stripes = self.stripes(rng);
        self.paint_with_stripes(&stripes)
    }

    pub fn paint_with_stripes(&self, stripes: &[Stripe]) -> RgbaImage {
        let row = paint_row(self.width, stripes);
        let row_bytes = row
            .iter()
            .flat_map(|pixel| {
                let [r, g, b] = pixel.map(|c| c.round().clamp(0.0, 255.0) as u8);
                [r, g, b, 255]
            })
            .collect::<Vec<u8>>();

        let mut image = RgbaImage::new(self.width, self.height);
        if !row_bytes.is_empty() {
            image
                .par_chunks_mut(row_bytes.len())
                .for_each(|dst| dst.copy_from_slice(&row_bytes));
        }

        log::debug!(
            "Painted {}x{} planet texture with {} stripes",
            self.width,
            self.height,
            stripes.len()
        );

        image
    }
}

/// Alpha of the edge fade at a normalized horizontal position.
pub fn fade_alpha(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);

    for pair in FADE_STOPS.windows(2) {
        let (start, start_alpha) = pair[0];
        let (end, end_alpha) = pair[1];

        if t <= end {
            let span = end - start;
            let f = if span > 0.0 { (t - start) / span } else { 1.0 };
            return start_alpha + (end_alpha - start_alpha) * f;
        }
    }

    FADE_STOPS[FADE_STOPS.len() - 1].1
}

/// Paints a single row in 0..=255 float RGB, blending fractional stripe edges
/// by pixel coverage.
fn paint_row(width: u32, stripes: &[Stripe]) -> Vec<[f32; 3]> {
    let mut row = vec![BASE_COLOR; width as usize];

    for stripe in stripes {
        let start = stripe.x.max(0.0);
        let end = (stripe.x + stripe.thickness).min(width as f32);
        if end <= start {
            continue;
        }

        for column in (start.floor() as usize)..(end.ceil() as usize) {
            let coverage = (end.min(column as f32 + 1.0) - start.max(column as f32)).max(0.0);
            let keep = 1.0 - stripe.alpha * coverage;
            for channel in row[column].iter_mut() {
                *channel *= keep;
            }
        }
    }

    for (column, pixel) in row.iter_mut().enumerate() {
        let alpha = fade_alpha((column as f32 + 0.5) / width as f32);
        for (channel, fade) in pixel.iter_mut().zip(FADE_COLOR) {
            *channel = fade * alpha + *channel * (1.0 - alpha);
        }
    }

    row
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn base_pixel() -> [u8; 4] {
        [244, 228, 188, 255]
    }

    #[test]
    fn has_expected_dimensions() {
        let image = PlanetTexture::default().paint(&mut StdRng::seed_from_u64(1));
        assert_eq!(image.dimensions(), (2048, 1024));
    }

    #[test]
    fn fade_alpha_follows_stops() {
        assert!((fade_alpha(0.0) - 0.4).abs() < 1e-6);
        assert!((fade_alpha(0.15) - 0.2).abs() < 1e-6);
        assert_eq!(fade_alpha(0.3), 0.0);
        assert_eq!(fade_alpha(0.5), 0.0);
        assert_eq!(fade_alpha(0.7), 0.0);
        assert!((fade_alpha(0.85) - 0.2).abs() < 1e-6);
        assert!((fade_alpha(1.0) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn stripes_are_evenly_spaced_with_random_weight() {
        let texture = PlanetTexture::default();
        let stripes = texture.stripes(&mut StdRng::seed_from_u64(7));
        assert_eq!(stripes.len(), 200);

        for (i, stripe) in stripes.iter().enumerate() {
            assert!((stripe.x - i as f32 * 10.24).abs() < 1e-3);
            assert!((1.0..3.0).contains(&stripe.thickness));
            assert!((0.1..0.2).contains(&stripe.alpha));
        }
    }

    #[test]
    fn gaps_between_stripes_keep_base_color() {
        let image = PlanetTexture::default().paint(&mut StdRng::seed_from_u64(3));
        // Stripe 100 starts at x = 1024 and is at most 3 px wide; stripe 101
        // starts at x = 1034.24. The fade is fully transparent here.
        for x in 1028..1034 {
            assert_eq!(image.get_pixel(x, 0).0, base_pixel(), "column {}", x);
        }
    }

    #[test]
    fn stripes_darken_the_base() {
        let image = PlanetTexture::default().paint(&mut StdRng::seed_from_u64(3));
        let striped = image.get_pixel(1024, 0).0;
        let base = base_pixel();
        for channel in 0..3 {
            assert!(striped[channel] < base[channel]);
        }
    }

    #[test]
    fn edges_fade_towards_fade_color() {
        let texture = PlanetTexture {
            width: 100,
            height: 4,
            stripe_count: 0,
        };
        let image = texture.paint_with_stripes(&[]);
        let edge = image.get_pixel(0, 0).0;
        let middle = image.get_pixel(50, 0).0;

        assert_eq!(middle, base_pixel());
        // Red and green move towards 200 and 180, blue is pulled down to 160.
        assert!(edge[0] < middle[0]);
        assert!(edge[1] < middle[1]);
        assert!(edge[2] < middle[2]);
        assert!(edge[0] > 200);
    }

    #[test]
    fn fractional_stripe_edges_blend_by_coverage() {
        let texture = PlanetTexture {
            width: 10,
            height: 1,
            stripe_count: 0,
        };
        let stripe = Stripe {
            x: 4.5,
            thickness: 1.0,
            alpha: 0.5,
        };
        let row = paint_row(texture.width, &[stripe]);
        // Half of column 4 and half of column 5 are covered.
        let expected = BASE_COLOR[0] * (1.0 - 0.25);
        assert!((row[4][0] - expected).abs() < 1e-3);
        assert!((row[5][0] - expected).abs() < 1e-3);
        assert_eq!(row[3][0], BASE_COLOR[0]);
        assert_eq!(row[6][0], BASE_COLOR[0]);
    }

    #[test]
    fn rows_are_identical() {
        let image = PlanetTexture::default().paint(&mut StdRng::seed_from_u64(11));
        for x in (0..2048).step_by(97) {
            assert_eq!(image.get_pixel(x, 0), image.get_pixel(x, 1023));
        }
    }

    #[test]
    fn same_seed_same_texture() {
        let texture = PlanetTexture::default();
        let a = texture.paint(&mut StdRng::seed_from_u64(42));
        let b = texture.paint(&mut StdRng::seed_from_u64(42));
        assert_eq!(a.as_raw(), b.as_raw());
    }
}

//! Procedural sphere and ring meshes.
//!
//! Both follow the usual UV-sphere / annulus layouts: vertices are laid out on a
//! `(columns + 1) x (rows + 1)` grid so the seam column is duplicated, and
//! front faces wind counter-clockwise.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use itertools::iproduct;

use crate::model::{Model, Vertex};

/// UV sphere centered on the origin with the poles on the Y axis.
///
/// Texture row 0 maps to the north pole. Pole rows only emit one triangle per
/// quad, so there are no degenerate triangles.
pub fn sphere(
    name: impl Into<String>,
    radius: f32,
    width_segments: u32,
    height_segments: u32,
) -> Model {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let vertices = iproduct!(0..=height_segments, 0..=width_segments)
        .map(|(iy, ix)| {
            let v = iy as f32 / height_segments as f32;
            let u = ix as f32 / width_segments as f32;

            let phi = u * TAU;
            let theta = v * PI;

            let normal = Vec3::new(
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            );

            Vertex {
                position: normal * radius,
                normal,
                tex_coords: Vec2::new(u, v),
            }
        })
        .collect::<Vec<Vertex>>();

    let row = width_segments + 1;
    let mut indices = Vec::with_capacity((width_segments * (height_segments - 1) * 6) as usize);

    for (iy, ix) in iproduct!(0..height_segments, 0..width_segments) {
        let a = iy * row + ix + 1;
        let b = iy * row + ix;
        let c = (iy + 1) * row + ix;
        let d = (iy + 1) * row + ix + 1;

        if iy != 0 {
            indices.extend_from_slice(&[a, b, d]);
        }
        if iy != height_segments - 1 {
            indices.extend_from_slice(&[b, c, d]);
        }
    }

    Model::from_primitive(name, vertices, indices)
}

/// Flat annulus in the XY plane facing +Z.
pub fn ring(
    name: impl Into<String>,
    inner_radius: f32,
    outer_radius: f32,
    theta_segments: u32,
    phi_segments: u32,
) -> Model {
    let theta_segments = theta_segments.max(3);
    let phi_segments = phi_segments.max(1);
    let radius_step = (outer_radius - inner_radius) / phi_segments as f32;

    let vertices = iproduct!(0..=phi_segments, 0..=theta_segments)
        .map(|(j, i)| {
            let radius = inner_radius + j as f32 * radius_step;
            let segment = i as f32 / theta_segments as f32 * TAU;
            let position = Vec3::new(radius * segment.cos(), radius * segment.sin(), 0.0);

            Vertex {
                position,
                normal: Vec3::Z,
                tex_coords: Vec2::new(
                    (position.x / outer_radius + 1.0) / 2.0,
                    (position.y / outer_radius + 1.0) / 2.0,
                ),
            }
        })
        .collect::<Vec<Vertex>>();

    let row = theta_segments + 1;
    let indices = iproduct!(0..phi_segments, 0..theta_segments)
        .flat_map(|(j, i)| {
            let a = j * row + i;
            let b = a + row;
            let c = a + row + 1;
            let d = a + 1;
            [a, b, d, b, c, d]
        })
        .collect::<Vec<u32>>();

    Model::from_primitive(name, vertices, indices)
}

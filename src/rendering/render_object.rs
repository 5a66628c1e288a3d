use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::{
    material::{PhysicalMaterial, Side},
    rendering::{render_model::RenderModelId, texture::Texture},
    scene_graph::object3d::ObjectId,
};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: Mat4,
    pub normal_matrix: Mat4,
    /// Linear RGB and opacity.
    pub color: [f32; 4],
    /// Roughness, metalness, clearcoat, clearcoat roughness.
    pub pbr: [f32; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, normal_matrix: Mat4, material: &PhysicalMaterial) -> Self {
        Self {
            model,
            normal_matrix,
            color: material
                .color
                .0
                .extend(material.effective_opacity())
                .to_array(),
            pbr: [
                material.roughness,
                material.metalness,
                material.clearcoat,
                material.clearcoat_roughness,
            ],
        }
    }
}

/// GPU side of one drawable scene object.
pub struct RenderObject {
    pub object_id: ObjectId,
    pub render_model: RenderModelId,
    pub transparent: bool,
    pub side: Side,
    /// World-space origin, refreshed every frame for depth sorting.
    pub position: Vec3,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    uploaded: bool,
}

impl RenderObject {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        name: &str,
        object_id: ObjectId,
        render_model: RenderModelId,
        material: &PhysicalMaterial,
        texture: &Texture,
    ) -> Self {
        let uniform = ObjectUniform::new(Mat4::IDENTITY, Mat4::IDENTITY, material);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Object uniform buffer ({})", name)),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("Object bind group ({})", name)),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });

        Self {
            object_id,
            render_model,
            transparent: material.transparent,
            side: material.side,
            position: Vec3::ZERO,
            buffer,
            bind_group,
            uploaded: false,
        }
    }

    /// The first upload always happens; later ones only when the transform moved.
    pub fn needs_upload(&self, transform_changed: bool) -> bool {
        !self.uploaded || transform_changed
    }

    pub fn update(&mut self, queue: &wgpu::Queue, uniform: ObjectUniform) {
        self.position = uniform.model.w_axis.truncate();
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
        self.uploaded = true;
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

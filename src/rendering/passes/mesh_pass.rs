use std::sync::Arc;

use wgpu::{
    DepthBiasState, Device, MultisampleState, PipelineCompilationOptions, RenderPassDescriptor,
    ShaderSource, StencilState,
};

use crate::{
    material::Side,
    rendering::{
        render_common::RenderCommon,
        render_model::{RenderModel, RENDER_MODEL_VBL},
        shader_loader::{PipelineCache, PipelineCacheBuilder, PipelineId, ShaderDefinition},
        texture::DepthTexture,
    },
};

const MESH_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Mesh Shader",
    path: "mesh.wgsl",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineVariant {
    pub transparent: bool,
    pub side: Side,
}

impl PipelineVariant {
    const ALL: [PipelineVariant; 4] = [
        PipelineVariant {
            transparent: false,
            side: Side::Front,
        },
        PipelineVariant {
            transparent: false,
            side: Side::Double,
        },
        PipelineVariant {
            transparent: true,
            side: Side::Front,
        },
        PipelineVariant {
            transparent: true,
            side: Side::Double,
        },
    ];

    fn label(&self) -> &'static str {
        match (self.transparent, self.side) {
            (false, Side::Front) => "Mesh pipeline (opaque)",
            (false, Side::Double) => "Mesh pipeline (opaque, double sided)",
            (true, Side::Front) => "Mesh pipeline (transparent)",
            (true, Side::Double) => "Mesh pipeline (transparent, double sided)",
        }
    }
}

pub struct MeshPassTextureViews<'a> {
    pub color: &'a wgpu::TextureView,
    pub resolve_target: Option<&'a wgpu::TextureView>,
    pub depth: &'a wgpu::TextureView,
}

pub struct MeshDraw<'a> {
    pub variant: PipelineVariant,
    pub bind_group: &'a wgpu::BindGroup,
    pub model: &'a RenderModel,
}

/// Forward pass drawing every mesh with the physical material shader.
pub struct MeshPass {
    common: Arc<RenderCommon>,
    pipelines: Vec<(PipelineVariant, PipelineId)>,
}

impl MeshPass {
    pub fn create(
        device: &Device,
        common: Arc<RenderCommon>,
        cache_builder: &mut PipelineCacheBuilder,
    ) -> Self {
        let pipeline_layout = Arc::new(device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[
                &common.camera_bind_group_layout,
                &common.global_uniform.bind_group_layout,
                &common.object_bind_group_layout,
            ],
            push_constant_ranges: &[],
        }));

        let format = common.output_format;
        let sample_count = common.config.msaa_samples;

        let pipelines = PipelineVariant::ALL
            .into_iter()
            .map(|variant| {
                let layout = Arc::clone(&pipeline_layout);
                let pipeline_id = cache_builder.add_shader(
                    MESH_SHADER,
                    Box::new(
                        move |device: &Device, shader_def: &ShaderDefinition, source: &str| {
                            Ok(create_pipeline(
                                device,
                                shader_def,
                                source,
                                &layout,
                                format,
                                sample_count,
                                variant,
                            ))
                        },
                    ),
                );
                (variant, pipeline_id)
            })
            .collect();

        Self { common, pipelines }
    }

    fn pipeline_id(&self, variant: PipelineVariant) -> Option<PipelineId> {
        self.pipelines
            .iter()
            .find(|(v, _)| *v == variant)
            .map(|(_, id)| *id)
    }

    /// Clears the targets and draws `draws` in order. Callers sort opaque
    /// draws before transparent ones.
    pub fn render(
        &self,
        texture_views: &MeshPassTextureViews,
        encoder: &mut wgpu::CommandEncoder,
        pipeline_cache: &PipelineCache,
        clear_color: wgpu::Color,
        draws: &[MeshDraw],
    ) {
        let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("Mesh Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: texture_views.color,
                resolve_target: texture_views.resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: texture_views.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_bind_group(0, &self.common.camera_bind_group, &[]);
        render_pass.set_bind_group(1, &self.common.global_uniform.bind_group, &[]);

        let mut current_variant = None;

        for draw in draws {
            if current_variant != Some(draw.variant) {
                let Some(pipeline) = self
                    .pipeline_id(draw.variant)
                    .and_then(|id| pipeline_cache.get(id))
                else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                current_variant = Some(draw.variant);
            }

            render_pass.set_bind_group(2, draw.bind_group, &[]);
            draw.model.draw(&mut render_pass);
        }
    }
}

fn create_pipeline(
    device: &Device,
    shader_def: &ShaderDefinition,
    source: &str,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    sample_count: u32,
    variant: PipelineVariant,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(shader_def.name),
        source: ShaderSource::Wgsl(source.into()),
    });

    let blend = if variant.transparent {
        wgpu::BlendState::ALPHA_BLENDING
    } else {
        wgpu::BlendState::REPLACE
    };

    let cull_mode = match variant.side {
        Side::Front => Some(wgpu::Face::Back),
        Side::Double => None,
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(variant.label()),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[RENDER_MODEL_VBL],
            compilation_options: PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthTexture::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState {
            count: sample_count,
            ..Default::default()
        },
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_distinct_label() {
        let mut labels: Vec<&str> = PipelineVariant::ALL.iter().map(|v| v.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), PipelineVariant::ALL.len());
    }
}

use std::{collections::HashMap, sync::Arc};

use anyhow::Context;
use id_arena::Arena;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    camera::{Camera, CameraUniform},
    demo::DemoState,
    material::Color,
    rendering::{
        config::RenderConfig,
        global_uniform::GlobalUniformState,
        passes::mesh_pass::{MeshDraw, MeshPass, MeshPassTextureViews, PipelineVariant},
        render_common::RenderCommon,
        render_model::RenderModel,
        render_object::{ObjectUniform, RenderObject},
        shader_loader::{PipelineCacheBuilder, ShaderLoader},
        texture::{DepthTexture, MultisampleTexture, Texture},
    },
    scene_graph::scene::{Scene, TextureId},
};

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    common: Arc<RenderCommon>,
    depth_texture: DepthTexture,
    msaa_texture: MultisampleTexture,

    camera_uniform: CameraUniform,

    render_models: Arena<RenderModel>,
    textures: HashMap<TextureId, Texture>,
    white_texture: Texture,
    render_objects: Vec<RenderObject>,

    shader_loader: ShaderLoader,
    mesh_pass: MeshPass,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, config: RenderConfig) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter")?;

        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let common = Arc::new(RenderCommon::new(
            &device, &adapter, &surface, size, config,
        )?);

        let sample_count = common.config.msaa_samples;
        let depth_texture = DepthTexture::new(&device, size, sample_count, "Depth Texture");
        let msaa_texture =
            MultisampleTexture::new(&device, size, common.output_format, sample_count);

        let mut cache_builder = PipelineCacheBuilder::new();
        let mesh_pass = MeshPass::create(&device, common.clone(), &mut cache_builder);
        let shader_loader = ShaderLoader::new(device.clone(), cache_builder)?;

        let white_texture = Texture::white(&device, &queue);

        Ok(Self {
            window,
            size,
            surface,
            device,
            queue,
            common,
            depth_texture,
            msaa_texture,
            camera_uniform: CameraUniform::default(),
            render_models: Arena::new(),
            textures: HashMap::new(),
            white_texture,
            render_objects: Vec::new(),
            shader_loader,
            mesh_pass,
        })
    }

    /// Uploads every model and texture in the scene and creates the GPU side
    /// of each renderable object.
    pub fn load_models(&mut self, scene: &mut Scene) -> anyhow::Result<()> {
        for (_id, scene_model) in &mut scene.models {
            let render_model = RenderModel::from_model(&self.device, &scene_model.model);
            let render_model_id = self.render_models.alloc(render_model);
            scene_model.render_model = Some(render_model_id);
            log::info!(
                "Loaded model {} with {} vertices and {} triangles",
                scene_model.name(),
                scene_model.model.vertex_count(),
                scene_model.model.triangle_count()
            );
        }

        for (id, texture) in scene.textures.iter() {
            let (width, height) = texture.image.dimensions();
            self.textures.insert(
                id,
                Texture::from_image(
                    &self.device,
                    &self.queue,
                    &texture.image,
                    &texture.name,
                    Texture::DATA_FORMAT,
                ),
            );
            log::info!("Loaded texture {} ({}x{})", texture.name, width, height);
        }

        self.render_objects.clear();

        for (object_id, object) in scene.renderables() {
            let (Some(model_id), Some(material_id)) = (object.model_id, object.material_id) else {
                continue;
            };

            let render_model = scene
                .models
                .get(model_id)
                .and_then(|model| model.render_model)
                .with_context(|| format!("Model of {} was not uploaded", object.name))?;

            let material = scene
                .get_material(material_id)
                .with_context(|| format!("Material of {} not found", object.name))?;

            let texture = match material.map {
                Some(texture_id) => self
                    .textures
                    .get(&texture_id)
                    .with_context(|| format!("Texture of {} not found", material.name))?,
                None => &self.white_texture,
            };

            self.render_objects.push(RenderObject::new(
                &self.device,
                &self.common.object_bind_group_layout,
                &object.name,
                object_id,
                render_model,
                material,
                texture,
            ));
        }

        log::info!("Created {} render objects", self.render_objects.len());

        Ok(())
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        let Ok(mut config) = self.common.output_surface_config.write() else {
            log::error!("Surface configuration lock poisoned");
            return;
        };

        self.size = new_size;
        config.width = new_size.width;
        config.height = new_size.height;
        self.surface.configure(&self.device, &config);
        self.depth_texture.resize(&self.device, new_size);
        self.msaa_texture.resize(&self.device, new_size);
    }

    pub fn render(&mut self, demo_state: &DemoState) -> Result<(), wgpu::SurfaceError> {
        self.shader_loader.load_pending_shaders();

        self.camera_uniform.update(&demo_state.camera);
        self.camera_uniform
            .update_buffer(&self.queue, &self.common.camera_uniform_buffer);

        self.common.global_uniform.update(
            &self.queue,
            GlobalUniformState::new(
                self.size,
                demo_state.start_time.elapsed().as_secs_f32(),
                demo_state.lights.to_uniform(),
            ),
        );

        self.update_objects(&demo_state.scene);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let draws = self.sorted_draws(&demo_state.camera);
        let (color, resolve_target) = self.msaa_texture.attachments(&view);

        self.mesh_pass.render(
            &MeshPassTextureViews {
                color,
                resolve_target,
                depth: self.depth_texture.view(),
            },
            &mut encoder,
            &self.shader_loader.cache,
            clear_color(demo_state.background),
            &draws,
        );

        self.queue.submit([encoder.finish()]);

        output.present();

        Ok(())
    }

    fn update_objects(&mut self, scene: &Scene) {
        for render_object in &mut self.render_objects {
            let Some(object) = scene.get_object(render_object.object_id) else {
                continue;
            };
            if !render_object.needs_upload(object.transform.has_changed()) {
                continue;
            }
            let Some(material) = object.material_id.and_then(|id| scene.get_material(id)) else {
                continue;
            };

            let uniform = ObjectUniform::new(
                *object.transform.get_world_matrix(),
                *object.transform.get_normal_matrix(),
                material,
            );
            render_object.update(&self.queue, uniform);
        }
    }

    /// Opaque objects in scene order, then transparent objects back to front.
    fn sorted_draws(&self, camera: &Camera) -> Vec<MeshDraw<'_>> {
        let (opaque, mut transparent): (Vec<&RenderObject>, Vec<&RenderObject>) = self
            .render_objects
            .iter()
            .partition(|object| !object.transparent);

        sort_back_to_front(&mut transparent, |object| {
            camera.view_depth(object.position)
        });

        opaque
            .into_iter()
            .chain(transparent)
            .filter_map(|object| {
                let model = self.render_models.get(object.render_model)?;
                Some(MeshDraw {
                    variant: PipelineVariant {
                        transparent: object.transparent,
                        side: object.side,
                    },
                    bind_group: object.bind_group(),
                    model,
                })
            })
            .collect()
    }
}

/// Stable sort by descending view depth, so ties keep their scene order.
fn sort_back_to_front<T>(items: &mut [T], depth: impl Fn(&T) -> f32) {
    items.sort_by(|a, b| depth(b).total_cmp(&depth(a)));
}

fn clear_color(color: Color) -> wgpu::Color {
    wgpu::Color {
        r: color.0.x as f64,
        g: color.0.y as f64,
        b: color.0.z as f64,
        a: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn far_objects_sort_first() {
        let mut depths = vec![(0, 3.0), (1, 10.0), (2, 3.0), (3, -1.0)];
        sort_back_to_front(&mut depths, |(_, depth)| *depth);
        let order: Vec<i32> = depths.iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec![1, 0, 2, 3]);
    }

    #[test]
    fn black_background_clears_to_black() {
        let color = clear_color(Color::from_hex(0x000000));
        assert_eq!((color.r, color.g, color.b, color.a), (0.0, 0.0, 0.0, 1.0));
    }
}

use std::{
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, channel},
        Arc, RwLock,
    },
    time::Duration,
};

use anyhow::Context;
use id_arena::{Arena, Id};
use naga::{
    back::wgsl::WriterFlags,
    valid::{Capabilities, ValidationFlags},
};
use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor, ShaderLanguage,
};
use notify_debouncer_mini::{
    new_debouncer_opt, notify::*, DebounceEventResult, DebouncedEventKind, Debouncer,
};
use pollster::block_on;
use wgpu::{PollType, RenderPipeline};

pub const SHADER_FOLDER: &str = "assets/shaders";
const SHARED_SHADER_MODULES_FOLDER: &str = "assets/shaders/shared";

type PipelineFactory = Box<
    dyn Sync
        + Send
        + Fn(&wgpu::Device, &ShaderDefinition, &str) -> anyhow::Result<wgpu::RenderPipeline>,
>;

#[derive(Debug, Clone)]
pub(crate) struct ShaderDefinition {
    pub name: &'static str,
    pub path: &'static str,
}

pub struct ShaderEntry {
    pipeline_id: PipelineId,
    def: ShaderDefinition,
    factory: PipelineFactory,
}

pub type PipelineId = Id<PipelineCacheEntry>;

#[derive(Default)]
pub struct PipelineCacheEntry(Option<wgpu::RenderPipeline>);

impl PipelineCacheEntry {
    pub fn set_pipeline(&mut self, pipeline: wgpu::RenderPipeline) {
        self.0 = Some(pipeline);
    }
}

pub struct PipelineCacheBuilder {
    shaders: Arena<ShaderEntry>,
    pipelines: Arena<PipelineCacheEntry>,
}

impl PipelineCacheBuilder {
    pub fn new() -> Self {
        Self {
            shaders: Arena::new(),
            pipelines: Arena::new(),
        }
    }

    /// Registers a pipeline built from `shader_def`. Several pipelines may
    /// share one shader file; all of them are rebuilt when it changes.
    pub(crate) fn add_shader(
        &mut self,
        shader_def: ShaderDefinition,
        factory: PipelineFactory,
    ) -> PipelineId {
        let pipeline_id = self.pipelines.alloc(PipelineCacheEntry::default());
        self.shaders.alloc(ShaderEntry {
            pipeline_id,
            def: shader_def,
            factory,
        });
        pipeline_id
    }

    pub fn build(self) -> PipelineCache {
        PipelineCache {
            shaders: Arc::new(self.shaders),
            pipelines: self.pipelines,
        }
    }
}

pub struct PipelineCache {
    shaders: Arc<Arena<ShaderEntry>>,
    pipelines: Arena<PipelineCacheEntry>,
}

impl PipelineCache {
    pub fn get(&self, id: PipelineId) -> Option<&RenderPipeline> {
        self.pipelines.get(id).and_then(|entry| entry.0.as_ref())
    }

    fn get_entry_mut(&mut self, id: PipelineId) -> Option<&mut PipelineCacheEntry> {
        self.pipelines.get_mut(id)
    }
}

type CompiledPipeline = (&'static str, PipelineId, wgpu::RenderPipeline);

// Loads and compiles shaders to pipelines; changed files are recompiled on the watcher thread.
pub(crate) struct ShaderLoader {
    pub cache: PipelineCache,
    receiver: mpsc::Receiver<CompiledPipeline>,
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl ShaderLoader {
    pub fn new(device: wgpu::Device, cache_builder: PipelineCacheBuilder) -> anyhow::Result<Self> {
        let mut cache = cache_builder.build();

        let composer = create_composer().context("Failed to create shader composer")?;
        let composer = Arc::new(RwLock::new(composer));

        for (_, shader) in cache.shaders.clone().iter() {
            let pipeline = compile_file(&device, &shader.def, &shader.factory, &composer)
                .with_context(|| format!("Failed to compile shader: {}", shader.def.name))?;
            if let Some(entry) = cache.get_entry_mut(shader.pipeline_id) {
                entry.set_pipeline(pipeline);
            }
        }

        let (send_new_pipelines, recv_new_pipelines) = channel();
        let shaders = cache.shaders.clone();
        let shared_folder = canonical(SHARED_SHADER_MODULES_FOLDER)?;

        let mut debouncer = new_debouncer_opt(
            notify_debouncer_mini::Config::default().with_timeout(Duration::from_millis(100)),
            move |res: DebounceEventResult| {
                let events = match res {
                    Ok(events) => events,
                    Err(e) => {
                        log::error!("Error debouncing shader changes: {}", e);
                        return;
                    }
                };

                for event in events {
                    if event.kind != DebouncedEventKind::Any {
                        continue;
                    }

                    let shared_changed = event.path.starts_with(&shared_folder);
                    if shared_changed {
                        match create_composer() {
                            Ok(new_composer) => {
                                if let Ok(mut composer) = composer.write() {
                                    *composer = new_composer;
                                }
                            }
                            Err(e) => {
                                log::error!("Failed to reload shared shader modules: {:?}", e);
                                continue;
                            }
                        }
                    }

                    let affected = shaders
                        .iter()
                        .map(|(_, entry)| entry)
                        .filter(|entry| shared_changed || event.path.ends_with(entry.def.path));

                    for entry in affected {
                        match compile_file(&device, &entry.def, &entry.factory, &composer) {
                            Ok(pipeline) => {
                                let message = (entry.def.name, entry.pipeline_id, pipeline);
                                if send_new_pipelines.send(message).is_err() {
                                    return;
                                }
                            }
                            Err(e) => log::error!("Failed to reload shader: {:?}", e),
                        }
                    }
                }
            },
        )
        .context("Failed to create shader watcher")?;

        debouncer
            .watcher()
            .watch(&canonical(SHADER_FOLDER)?, RecursiveMode::Recursive)
            .context("Failed to watch shader folder")?;

        Ok(Self {
            cache,
            receiver: recv_new_pipelines,
            _debouncer: debouncer,
        })
    }

    /// Swaps in pipelines rebuilt by the watcher since the last call.
    pub(crate) fn load_pending_shaders(&mut self) {
        while let Ok((name, pipeline_id, pipeline)) = self.receiver.try_recv() {
            if let Some(entry) = self.cache.get_entry_mut(pipeline_id) {
                log::info!("Shader reloaded: {}", name);
                entry.set_pipeline(pipeline);
            }
        }
    }
}

fn canonical(folder: &str) -> anyhow::Result<PathBuf> {
    Path::new(folder)
        .canonicalize()
        .with_context(|| format!("Shader folder not found: {}", folder))
}

/// Resolves imports and re-emits the shader as plain WGSL.
pub(crate) fn compose_shader(
    composer: &mut Composer,
    file_path: &str,
    source: &str,
) -> anyhow::Result<String> {
    let module = composer
        .make_naga_module(NagaModuleDescriptor {
            file_path,
            source,
            ..Default::default()
        })
        .context("Failed to create Naga module from shader code")?;

    // We don't need to validate, because wgpu runs the validator internally.
    let info = naga::valid::Validator::new(ValidationFlags::empty(), Capabilities::all())
        .validate(&module)
        .context("Failed to validate Naga module")?;

    naga::back::wgsl::write_string(&module, &info, WriterFlags::empty())
        .context("Failed to convert Naga module to WGSL string")
}

fn compile_file(
    device: &wgpu::Device,
    shader_def: &ShaderDefinition,
    factory: &PipelineFactory,
    composer: &RwLock<Composer>,
) -> anyhow::Result<wgpu::RenderPipeline> {
    let path = Path::new(SHADER_FOLDER).join(shader_def.path);
    let shader_code = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read shader file {}", path.display()))?;

    let file_path = path.to_string_lossy().to_string();

    let shader_code = {
        let mut composer = composer
            .write()
            .map_err(|_| anyhow::anyhow!("Shader composer lock poisoned"))?;
        compose_shader(&mut composer, &file_path, &shader_code)?
    };

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let pipeline = factory(device, shader_def, &shader_code);

    device
        .poll(PollType::Wait)
        .context("Failed to poll device after shader compilation.")?;

    if let Some(error) = block_on(device.pop_error_scope()) {
        return Err(anyhow::anyhow!(
            "Shader compilation failed for {}: {}",
            shader_def.name,
            error
        ));
    };

    pipeline
}

pub(crate) fn create_composer() -> anyhow::Result<Composer> {
    let shared_files = std::fs::read_dir(SHARED_SHADER_MODULES_FOLDER)
        .context("Failed to read shared shader modules directory")?;
    let mut composer = Composer::default();

    let mut paths = Vec::new();
    for entry in shared_files {
        let path = entry
            .context("Failed to read entry in shared shader modules directory")?
            .path();

        if path.is_file() && path.extension().is_some_and(|ext| ext == "wgsl") {
            paths.push(path);
        }
    }
    // Deterministic order so modules that import each other resolve the same way every run.
    paths.sort();

    for path in paths {
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_path = path.to_string_lossy().to_string();

        composer
            .add_composable_module(ComposableModuleDescriptor {
                source: &source,
                file_path: &file_path,
                language: ShaderLanguage::Wgsl,
                ..Default::default()
            })
            .with_context(|| format!("Failed to add shared shader module: {}", file_path))?;
    }

    Ok(composer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_shader_composes_and_validates() {
        let mut composer = create_composer().unwrap();
        let path = Path::new(SHADER_FOLDER).join("mesh.wgsl");
        let source = std::fs::read_to_string(&path).unwrap();

        let wgsl = compose_shader(&mut composer, &path.to_string_lossy(), &source).unwrap();

        let module = naga::front::wgsl::parse_str(&wgsl).unwrap();
        naga::valid::Validator::new(ValidationFlags::all(), Capabilities::default())
            .validate(&module)
            .unwrap();

        for entry_point in ["vs_main", "fs_main"] {
            assert!(
                module.entry_points.iter().any(|e| e.name == entry_point),
                "missing {}",
                entry_point
            );
        }
    }

    #[test]
    fn unresolved_import_fails_to_compose() {
        let mut composer = create_composer().unwrap();
        let source = "#import saturn::missing::{nothing}\n\n@fragment\nfn fs_main() -> @location(0) vec4<f32> {\n    return vec4<f32>(1.0);\n}\n";

        assert!(compose_shader(&mut composer, "broken_import.wgsl", source).is_err());
    }

    #[test]
    fn type_error_fails_to_compose() {
        let mut composer = create_composer().unwrap();
        let source = "@fragment\nfn fs_main() -> @location(0) vec4<f32> {\n    let x: f32 = vec3<f32>(1.0);\n    return vec4<f32>(x);\n}\n";

        assert!(compose_shader(&mut composer, "broken_types.wgsl", source).is_err());
    }

    #[test]
    fn composer_recovers_after_a_failed_shader() {
        let mut composer = create_composer().unwrap();
        assert!(compose_shader(&mut composer, "broken.wgsl", "fn (").is_err());

        let path = Path::new(SHADER_FOLDER).join("mesh.wgsl");
        let source = std::fs::read_to_string(&path).unwrap();
        assert!(compose_shader(&mut composer, &path.to_string_lossy(), &source).is_ok());
    }
}

pub mod config;
pub mod global_uniform;
pub mod passes;
pub mod render_common;
pub mod render_model;
pub mod render_object;
pub mod renderer;
pub mod shader_loader;
pub mod texture;

use anyhow::Result;

mod camera;
mod config;
mod demo;
mod engine;
mod geometry;
mod lights;
mod material;
mod model;
mod orbit_controls;
mod planet_texture;
mod rendering;
mod scene_graph;
mod window;

fn main() -> Result<()> {
    pretty_env_logger::init();

    pollster::block_on(window::run())?;

    Ok(())
}

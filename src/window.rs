use std::sync::Arc;

use anyhow::Context;
use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    config::SceneConfig,
    demo::DemoState,
    engine,
    rendering::{config::RenderConfig, renderer::Renderer},
};

/// Pixels of a precise scroll that count as one wheel notch.
const PIXELS_PER_SCROLL_NOTCH: f32 = 100.0;

struct App {
    renderer: Option<Renderer>,
    demo_state: DemoState,
    render_config: RenderConfig,
}

impl App {
    fn new(demo_state: DemoState, render_config: RenderConfig) -> Self {
        Self {
            renderer: None,
            demo_state,
            render_config,
        }
    }

    fn create_renderer(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<Renderer> {
        let window_attributes = Window::default_attributes()
            .with_title("Saturn")
            .with_inner_size(LogicalSize::new(1280.0, 720.0));
        let window = event_loop
            .create_window(window_attributes)
            .context("Failed to create window")?;

        let mut renderer = pollster::block_on(Renderer::new(
            Arc::new(window),
            self.render_config.clone(),
        ))?;
        renderer.load_models(&mut self.demo_state.scene)?;

        let size = renderer.size;
        self.demo_state.resize(size.width, size.height);

        Ok(renderer)
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        match self.create_renderer(event_loop) {
            Ok(renderer) => {
                renderer.window.request_redraw();
                self.renderer = Some(renderer);
            }
            Err(e) => {
                log::error!("Failed to initialize renderer: {:?}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                renderer.resize(new_size);
                self.demo_state.resize(new_size.width, new_size.height);
            }
            WindowEvent::RedrawRequested => {
                renderer.window.request_redraw();

                engine::update(&mut self.demo_state);

                match renderer.render(&self.demo_state) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        renderer.resize(renderer.size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory");
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        log::warn!("Timeout");
                    }
                    Err(other) => {
                        log::error!("Unexpected error: {:?}", other);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.demo_state
                    .on_mouse_button(button, state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.demo_state
                    .on_cursor_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::CursorLeft { .. } => {
                self.demo_state.on_cursor_left();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => {
                        position.y as f32 / PIXELS_PER_SCROLL_NOTCH
                    }
                };
                self.demo_state.on_scroll(notches);
            }
            _ => (),
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let demo_state = DemoState::new(SceneConfig::default());
    let mut app = App::new(demo_state, RenderConfig::default());
    event_loop.run_app(&mut app)?;

    Ok(())
}

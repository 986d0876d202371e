extern crate derive_more;

use std::sync::Arc;

use config::EngineConfig;
use core::tasks::Tasks;
use error::EngineError;
use fly_camera::FlyCamera;
use input::Input;
use render::{context::RenderContext, renderer::Renderer};
use time::{TargetFrameRate, Time};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};
use world::World;

mod block;
mod chunk;
mod config;
mod core;
mod error;
mod fly_camera;
mod input;
mod mesher;
mod noise;
mod raycast;
mod render;
mod terrain_gen;
mod time;
mod util;
mod world;

const WINDOW_TITLE: &str = "\"minecraft\"";

/// Directory containing the block/water PNG tiles composited into the texture atlas at startup.
const TILES_DIR: &str = "assets/tiles";

struct State {
    window: Arc<Window>,
    render_context: RenderContext,
    time: Time,
    input: Input,
    world: World,
    renderer: Renderer,
    tasks: Tasks,
    fly_camera: FlyCamera,
    fly_camera_active: bool,
    close_requested: bool,
}

impl State {
    fn new(window: Arc<Window>, config: EngineConfig) -> Result<Self, EngineError> {
        let render_context = RenderContext::new(window.clone());
        let input = Input::new();
        let time = Time::new(TargetFrameRate::UnlimitedOrVsync);
        let world = World::new(config.world_seed, config.render_distance);
        let renderer = Renderer::new(&render_context, TILES_DIR, config)?;
        let tasks = Tasks::new(config.worker_count);
        let fly_camera = FlyCamera::default();

        Ok(Self {
            window,
            render_context,
            time,
            input,
            world,
            renderer,
            tasks,
            fly_camera,
            fly_camera_active: true,
            close_requested: false,
        })
    }

    fn frame(&mut self) {
        self.time.begin_frame();
        self.update();
        self.render();
        self.time.update_frame_count();
        self.time.wait_for_next_frame();
    }

    fn resized(&mut self, new_size: PhysicalSize<u32>) {
        self.render_context.resized(new_size);
        self.renderer.resized(&self.render_context);
    }

    fn update(&mut self) {
        self.window.set_title(&format!(
            "{} ({} fps)",
            WINDOW_TITLE,
            self.time.get_frames_last_second()
        ));

        if self.fly_camera_active {
            self.fly_camera.update(&self.input, &self.time);
        }
        self.renderer.camera_mut().transform = self.fly_camera.get_transform();

        self.handle_edit_input();

        self.renderer.update(&mut self.tasks, &mut self.world);

        self.input.reset();
    }

    /// Left click removes the first block the camera is looking at; right click places Stone
    /// just in front of it.
    fn handle_edit_input(&mut self) {
        let camera = self.renderer.camera();
        let origin = camera.pos();
        let direction = camera.look_dir();

        if self.input.is_mouse_button_just_pressed(MouseButton::Left) {
            raycast::remove(&mut self.world, origin, direction);
        }
        if self.input.is_mouse_button_just_pressed(MouseButton::Right) {
            raycast::place(&mut self.world, origin, direction, block::STONE);
        }
    }

    fn render(&mut self) {
        let Some(surface_texture) = self.render_context.get_surface_texture() else {
            log::warn!("couldn't acquire surface texture");
            return;
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer
            .render(&self.render_context, &self.world, &surface_texture_view);

        surface_texture.present();
    }
}

struct WinitApplicationHandler {
    state: Option<State>,
    config: EngineConfig,
    /// Set and the event loop exited if initialization fails; surfaced to `main` once
    /// `run_app` returns, per the engine's fatal-initialization-error policy.
    init_error: Option<EngineError>,
}

impl WinitApplicationHandler {
    fn new(config: EngineConfig) -> Self {
        Self {
            state: None,
            config,
            init_error: None,
        }
    }
}

impl ApplicationHandler<()> for WinitApplicationHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_none() {
            let window_attributes = Window::default_attributes().with_title(WINDOW_TITLE);
            let window = match event_loop.create_window(window_attributes) {
                Ok(window) => Arc::new(window),
                Err(err) => {
                    self.init_error = Some(EngineError::from(err));
                    event_loop.exit();
                    return;
                }
            };

            match State::new(window, self.config) {
                Ok(state) => self.state = Some(state),
                Err(err) => {
                    self.init_error = Some(err);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(&mut self, _: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => state.close_requested = true,
            WindowEvent::Resized(new_size) => state.resized(new_size),
            _ => {
                state.input.handle_window_event(&event);
            }
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: DeviceId, event: DeviceEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.input.handle_device_event(&event);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        match self.state.as_mut() {
            Some(state) => {
                if state.close_requested {
                    event_loop.exit();
                }
                state.frame();
                event_loop.set_control_flow(ControlFlow::Poll);
            }
            None => (),
        }
    }
}

fn main() -> Result<(), EngineError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info,wgpu=warn"))
        .init();

    let config = EngineConfig::default();
    let mut app = WinitApplicationHandler::new(config);
    EventLoop::new()?.run_app(&mut app)?;

    match app.init_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

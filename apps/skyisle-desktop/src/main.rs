use anyhow::{Context, Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec3;
use skyisle_input::{InputEvent, InputState, Key};
use skyisle_persist::PersistedState;
use skyisle_render::{FrameClock, SceneResources, Viewport, plan_frame};
use skyisle_render_wgpu::{GpuResources, WgpuRenderer};
use skyisle_scene::{SceneLayout, ViewerConfig, ViewerState, WindowRequest};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

/// Pixel scroll is converted to lines at this rate.
const PIXELS_PER_LINE: f32 = 20.0;

#[derive(Parser)]
#[command(name = "skyisle-desktop", about = "Floating island scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON viewer config; every field is optional
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resource root holding textures/ and objects/
    #[arg(long)]
    resources: Option<PathBuf>,

    /// Program state file read at startup and written at exit
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Window width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Window height in pixels
    #[arg(long)]
    height: Option<u32>,
}

impl Cli {
    /// Config file values with command-line overrides applied.
    fn viewer_config(&self) -> Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ViewerConfig::default(),
        };
        if let Some(resources) = &self.resources {
            config.resources_dir = resources.clone();
        }
        if let Some(state_file) = &self.state_file {
            config.state_file = state_file.clone();
        }
        if let Some(width) = self.width {
            config.window_width = width;
        }
        if let Some(height) = self.height {
            config.window_height = height;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Application state.
struct AppState {
    viewer: ViewerState,
    input: InputState,
    /// Input records queued since the last frame.
    pending: Vec<InputEvent>,
    config: ViewerConfig,
    start: Instant,
    clock: FrameClock,
    /// Accumulated raw mouse motion while the cursor is captured.
    virtual_cursor: (f64, f64),
}

impl AppState {
    fn new(config: ViewerConfig) -> Self {
        let persisted = PersistedState::load_or_default(&config.state_file);
        let layout = SceneLayout::generate(&mut rand::rng());
        let viewer = ViewerState::from_persisted(&persisted, config.camera, layout);
        Self {
            viewer,
            input: InputState::new(),
            pending: Vec::new(),
            config,
            start: Instant::now(),
            clock: FrameClock::default(),
            virtual_cursor: (0.0, 0.0),
        }
    }

    fn seconds(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Drain queued input, then advance camera and light for this frame.
    fn update(&mut self) -> Vec<WindowRequest> {
        let mut requests = Vec::new();
        for event in std::mem::take(&mut self.pending) {
            if let Some(action) = self.input.handle(event) {
                requests.extend(self.viewer.apply(action));
            }
        }

        let now = self.seconds();
        let elapsed = self.clock.tick(now);
        self.viewer.move_camera(self.input.held_directions(), elapsed);
        self.viewer.advance_light(now);
        requests
    }

    fn save(&self) {
        let path = &self.config.state_file;
        if let Err(e) = self.viewer.persisted().save_to_file(path) {
            tracing::error!("failed to save program state to {}: {e}", path.display());
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.viewer.overlay_enabled {
            return;
        }

        egui::Window::new("Scene")
            .default_pos([10.0, 10.0])
            .show(ctx, |ui| {
                let mut color = self.viewer.clear_color.to_array();
                ui.horizontal(|ui| {
                    ui.label("Clear color");
                    if ui.color_edit_button_rgb(&mut color).changed() {
                        self.viewer.clear_color = Vec3::from_array(color);
                    }
                });
                ui.separator();

                ui.label("Point light");
                let light = &mut self.viewer.light;
                ui.add(
                    egui::DragValue::new(&mut light.constant)
                        .prefix("constant: ")
                        .speed(0.05)
                        .range(0.0..=10.0),
                );
                ui.add(
                    egui::DragValue::new(&mut light.linear)
                        .prefix("linear: ")
                        .speed(0.005)
                        .range(0.0..=1.0),
                );
                ui.add(
                    egui::DragValue::new(&mut light.quadratic)
                        .prefix("quadratic: ")
                        .speed(0.001)
                        .range(0.0..=1.0),
                );
                let p = light.position;
                ui.label(format!("Position: ({:.1}, {:.1}, {:.1})", p.x, p.y, p.z));
            });

        egui::Window::new("Camera info")
            .default_pos([10.0, 220.0])
            .show(ctx, |ui| {
                let camera = &self.viewer.camera;
                let p = camera.position;
                let f = camera.front();
                ui.label(format!("Position: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z));
                ui.label(format!("(Yaw, Pitch): ({:.1}, {:.1})", camera.yaw(), camera.pitch()));
                ui.label(format!("Front: ({:.2}, {:.2}, {:.2})", f.x, f.y, f.z));
                ui.label(format!("Zoom: {:.1}", camera.zoom()));
                ui.checkbox(&mut self.viewer.camera_mouse_enabled, "Camera mouse update");
                ui.separator();
                ui.small("F1: Toggle overlay | WASD: Move | Ctrl: Hold look | Esc: Quit");
            });
    }
}

/// Window and GPU objects, created once the event loop is running.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    resources: GpuResources,
    scene: SceneResources,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(
        event_loop: &ActiveEventLoop,
        state: &AppState,
        egui_ctx: &EguiContext,
    ) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(state.config.title.clone())
            .with_inner_size(PhysicalSize::new(
                state.config.window_width,
                state.config.window_height,
            ));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no compatible GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("skyisle_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        // Colors are authored for a linear framebuffer.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut resources = GpuResources::new(&device, &queue);
        let scene = SceneResources::load(
            &mut resources.loader(&device, &queue),
            &state.config.resources_dir,
        );
        let renderer =
            WgpuRenderer::new(&device, surface_format, config.width, config.height, &resources);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend, surface format {surface_format:?}",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            resources,
            scene,
            egui_winit,
            egui_renderer,
        })
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.config.width, self.config.height)
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    /// Grab and hide the cursor, or release it.
    fn set_cursor_captured(&self, captured: bool) {
        let result = if captured {
            self.window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            self.window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(e) = result {
            tracing::warn!("cursor grab failed: {e}");
        }
        self.window.set_cursor_visible(!captured);
    }

    fn draw_overlay(
        &mut self,
        view: &wgpu::TextureView,
        egui_ctx: &EguiContext,
        state: &mut AppState,
    ) {
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });

        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    /// Startup failure reported from `main` after the loop exits.
    fatal: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(config: ViewerConfig) -> Self {
        Self {
            state: AppState::new(config),
            gpu: None,
            egui_ctx: EguiContext::default(),
            fatal: None,
        }
    }

    fn apply_request(&mut self, event_loop: &ActiveEventLoop, request: WindowRequest) {
        match request {
            WindowRequest::Exit => event_loop.exit(),
            WindowRequest::CaptureCursor(captured) => {
                self.state.input.reset_pointer();
                if let Some(gpu) = &self.gpu {
                    gpu.set_cursor_captured(captured);
                }
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        for request in self.state.update() {
            self.apply_request(event_loop, request);
        }

        let Some(gpu) = &mut self.gpu else {
            return;
        };
        let viewport = gpu.viewport();
        if viewport.is_empty() {
            return;
        }
        let plan = plan_frame(&self.state.viewer, &gpu.scene, viewport);

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.renderer
            .render(&gpu.device, &gpu.queue, &view, &plan, &gpu.resources);
        gpu.draw_overlay(&view, &self.egui_ctx, &mut self.state);

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() || self.fatal.is_some() {
            return;
        }

        match Gpu::new(event_loop, &self.state, &self.egui_ctx) {
            Ok(gpu) => {
                gpu.set_cursor_captured(self.state.viewer.cursor_captured());
                self.gpu = Some(gpu);
                self.state.clock = FrameClock::starting_at(self.state.seconds());
            }
            Err(e) => {
                tracing::error!("startup failed: {e:#}");
                self.fatal = Some(e);
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
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            let swallowed = response.consumed && self.state.viewer.overlay_enabled;
            if swallowed && !releases_input(&event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.state.pending.push(InputEvent::CloseRequested);
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                }
            }
            WindowEvent::Focused(false) => {
                self.state.pending.push(InputEvent::FocusLost);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.state.pending.push(InputEvent::Key {
                    key: map_key(code),
                    pressed: key_state == ElementState::Pressed,
                });
            }
            WindowEvent::CursorMoved { position, .. } => {
                // Absolute positions drive look only while the cursor is free.
                if !self.state.viewer.cursor_captured() {
                    self.state.pending.push(InputEvent::PointerMoved {
                        x: position.x,
                        y: position.y,
                    });
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                self.state.pending.push(InputEvent::Scroll { dy });
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.viewer.cursor_captured() {
                let cursor = &mut self.state.virtual_cursor;
                cursor.0 += delta.0;
                cursor.1 += delta.1;
                self.state.pending.push(InputEvent::PointerMoved {
                    x: cursor.0,
                    y: cursor.1,
                });
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if self.fatal.is_none() {
            self.state.save();
        }
        self.gpu = None;
    }
}

/// Events that reach the input queue even when egui consumed them, so a
/// key held before the overlay took focus is still released.
fn releases_input(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::KeyboardInput {
            event: KeyEvent {
                state: ElementState::Released,
                ..
            },
            ..
        } | WindowEvent::Focused(false)
    )
}

fn map_key(code: KeyCode) -> Key {
    match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::Escape => Key::Escape,
        KeyCode::F1 => Key::F1,
        KeyCode::ControlLeft => Key::LeftControl,
        _ => Key::Other,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!(
        "skyisle-desktop starting ({}, {})",
        skyisle_render::crate_info(),
        skyisle_render_wgpu::crate_info()
    );
    let config = cli.viewer_config()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyisle_input::Action;

    fn state_in(dir: &std::path::Path) -> AppState {
        let config = ViewerConfig {
            state_file: dir.join("program_state.txt"),
            ..ViewerConfig::default()
        };
        AppState::new(config)
    }

    #[test]
    fn wasd_and_controls_map_to_keys() {
        assert_eq!(map_key(KeyCode::KeyW), Key::W);
        assert_eq!(map_key(KeyCode::ControlLeft), Key::LeftControl);
        assert_eq!(map_key(KeyCode::ControlRight), Key::Other);
        assert_eq!(map_key(KeyCode::F1), Key::F1);
    }

    #[test]
    fn queued_f1_toggles_overlay_once_per_press() {
        let dir = std::env::temp_dir().join("skyisle-desktop-f1");
        let mut state = state_in(&dir);
        let press = InputEvent::Key {
            key: Key::F1,
            pressed: true,
        };
        state.pending.extend([press, press, press]);
        let requests = state.update();
        assert_eq!(requests, vec![WindowRequest::CaptureCursor(false)]);
        assert!(state.viewer.overlay_enabled);
        assert!(state.pending.is_empty());
    }

    #[test]
    fn escape_and_close_request_exit() {
        let dir = std::env::temp_dir().join("skyisle-desktop-esc");
        let mut state = state_in(&dir);
        state.pending.push(InputEvent::CloseRequested);
        assert_eq!(state.update(), vec![WindowRequest::Exit]);
        assert_eq!(
            state.viewer.apply(Action::Quit),
            Some(WindowRequest::Exit)
        );
    }

    #[test]
    fn focus_loss_is_ordered_after_queued_presses() {
        let dir = std::env::temp_dir().join("skyisle-desktop-focus");
        let mut state = state_in(&dir);
        state.pending.extend([
            InputEvent::Key {
                key: Key::W,
                pressed: true,
            },
            InputEvent::FocusLost,
        ]);
        state.update();
        assert!(!state.input.is_held(Key::W));
        assert_eq!(state.input.held_directions().count(), 0);
    }

    #[test]
    fn focus_loss_is_never_swallowed_by_the_overlay() {
        assert!(releases_input(&WindowEvent::Focused(false)));
        assert!(!releases_input(&WindowEvent::Focused(true)));
        assert!(!releases_input(&WindowEvent::CloseRequested));
    }

    #[test]
    fn cli_overrides_config_values() {
        let cli = Cli::parse_from([
            "skyisle-desktop",
            "--width",
            "800",
            "--state-file",
            "/tmp/state.txt",
        ]);
        let config = cli.viewer_config().unwrap();
        assert_eq!(config.window_width, 800);
        assert_eq!(config.window_height, 900);
        assert_eq!(config.state_file, PathBuf::from("/tmp/state.txt"));
    }
}

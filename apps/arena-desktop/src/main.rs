use anyhow::{Context, Result};
use arena_common::Side;
use arena_input::{FireMode, InputMapper, Key, KeyboardState};
use arena_render::{
    ArenaAssets, ArenaScene, Light, Material, MaterialTextures, PassStats, Renderer,
    default_lights, report_light_issues,
};
use arena_render_wgpu::{GpuError, MeshData, TextureData, WgpuDevice};
use arena_sim::{
    ArenaPreset, FIXED_DT, GameConfig, ProjectilePolicy, SimEvent, Simulation, SpawnOrigin,
};
use clap::{Parser, ValueEnum};
use egui::Context as EguiContext;
use glam::{Vec3, Vec4};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "arena-desktop", about = "Split-screen two-player arena")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON game configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Arena size preset
    #[arg(long, value_enum)]
    arena: Option<ArenaArg>,

    /// Keep every projectile for the whole session
    #[arg(long)]
    unbounded_projectiles: bool,

    /// Spawn projectiles at the firing vehicle instead of its opponent
    #[arg(long)]
    spawn_at_firer: bool,

    /// How a held fire key repeats
    #[arg(long, value_enum)]
    fire_mode: Option<FireModeArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ArenaArg {
    Small,
    Large,
}

impl From<ArenaArg> for ArenaPreset {
    fn from(arg: ArenaArg) -> Self {
        match arg {
            ArenaArg::Small => Self::Small,
            ArenaArg::Large => Self::Large,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FireModeArg {
    Edge,
    Held,
}

impl From<FireModeArg> for FireMode {
    fn from(arg: FireModeArg) -> Self {
        match arg {
            FireModeArg::Edge => Self::Edge,
            FireModeArg::Held => Self::Held,
        }
    }
}

impl Cli {
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => GameConfig::default(),
        };
        if let Some(arena) = self.arena {
            config.sim.arena_bound = ArenaPreset::from(arena).bound();
        }
        if self.unbounded_projectiles {
            config.sim.projectile_policy = ProjectilePolicy::Unbounded;
        }
        if self.spawn_at_firer {
            config.sim.spawn_origin = SpawnOrigin::Firer;
        }
        if let Some(mode) = self.fire_mode {
            config.input.fire_mode = mode.into();
        }
        config.sim.validate()?;
        Ok(config)
    }
}

/// Translate a physical key into the arena's logical key set.
fn map_key(code: KeyCode) -> Option<Key> {
    Some(match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::Space => Key::Space,
        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,
        KeyCode::ShiftRight => Key::ShiftRight,
        KeyCode::ShiftLeft => Key::ShiftLeft,
        KeyCode::ControlRight => Key::ControlRight,
        KeyCode::Enter => Key::Enter,
        _ => return None,
    })
}

/// Application state.
struct AppState {
    sim: Simulation,
    mapper: InputMapper,
    keys: KeyboardState,
    lights: Vec<Light>,
    show_hud: bool,
    last_stats: PassStats,
    shots: [u64; 2],
    last_frame: Instant,
    // Fixed timestep
    tick_accumulator: f32,
}

impl AppState {
    fn new(config: GameConfig) -> Self {
        let lights = default_lights(config.sim.arena_bound);
        let issues = report_light_issues(&lights);
        if issues > 0 {
            tracing::warn!(issues, "light rig has setup problems");
        }
        if config.sim.projectile_policy == ProjectilePolicy::Unbounded {
            tracing::warn!("projectiles are never removed; the list grows for the whole session");
        }
        Self {
            sim: Simulation::new(config.sim),
            mapper: InputMapper::new(config.input),
            keys: KeyboardState::new(),
            lights,
            show_hud: true,
            last_stats: PassStats::default(),
            shots: [0; 2],
            last_frame: Instant::now(),
            tick_accumulator: 0.0,
        }
    }

    /// Run as many fixed steps as the elapsed time covers. Input is polled
    /// once per step.
    fn update(&mut self, dt: f32) {
        self.tick_accumulator += dt;
        while self.tick_accumulator >= FIXED_DT {
            let input = self.mapper.poll(&self.keys);
            self.sim.step(&input, FIXED_DT);
            self.tick_accumulator -= FIXED_DT;
        }
        for event in self.sim.drain_events() {
            if let SimEvent::Fired { owner, .. } = event {
                self.shots[owner.index()] += 1;
            }
        }
    }

    fn handle_key(&mut self, code: KeyCode, pressed: bool, event_loop: &ActiveEventLoop) {
        if let Some(key) = map_key(code) {
            self.keys.set(key, pressed);
            return;
        }
        if !pressed {
            return;
        }
        match code {
            KeyCode::Digit1 | KeyCode::Digit2 | KeyCode::Digit3 | KeyCode::Digit4 => {
                let index = match code {
                    KeyCode::Digit1 => 0,
                    KeyCode::Digit2 => 1,
                    KeyCode::Digit3 => 2,
                    _ => 3,
                };
                if let Some(light) = self.lights.get_mut(index) {
                    light.set_enabled(!light.is_enabled());
                    tracing::info!(
                        light = light.kind().label(),
                        enabled = light.is_enabled(),
                        "light toggled"
                    );
                }
            }
            KeyCode::F1 => {
                self.show_hud = !self.show_hud;
            }
            KeyCode::F2 => {
                self.reset();
            }
            KeyCode::Escape => {
                event_loop.exit();
            }
            _ => {}
        }
    }

    fn reset(&mut self) {
        self.sim.reset();
        self.shots = [0; 2];
        self.tick_accumulator = 0.0;
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_hud {
            return;
        }

        egui::Window::new("Arena")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("Tick: {}", self.sim.tick()));
                ui.label(format!("Separation: {:.2}", self.sim.separation()));
                for side in Side::BOTH {
                    let vehicle = self.sim.vehicle(side);
                    ui.label(format!(
                        "{}: ({:.1}, {:.1})  heading {:.0}°  shots {}",
                        side.label(),
                        vehicle.position.x,
                        vehicle.position.z,
                        vehicle.heading_y.to_degrees(),
                        self.shots[side.index()]
                    ));
                }
                ui.separator();

                let projectiles = self.sim.projectiles();
                ui.label(format!(
                    "Projectiles: {} live / {} fired",
                    projectiles.len(),
                    projectiles.total_spawned()
                ));
                match projectiles.policy() {
                    ProjectilePolicy::Unbounded => {
                        ui.colored_label(egui::Color32::YELLOW, "Policy: unbounded");
                    }
                    ProjectilePolicy::Bounded {
                        max_age_secs,
                        capacity,
                    } => {
                        ui.label(format!(
                            "Policy: {max_age_secs:.1}s max age, {capacity} max live"
                        ));
                    }
                }
                ui.separator();

                ui.heading("Lights");
                for (i, light) in self.lights.iter_mut().enumerate() {
                    let mut enabled = light.is_enabled();
                    let label = format!("{} ({})", light.kind().label(), i + 1);
                    if ui.checkbox(&mut enabled, label).changed() {
                        light.set_enabled(enabled);
                    }
                }
                ui.label(format!(
                    "Passes: {}  Draws: {}",
                    self.last_stats.light_passes, self.last_stats.draws
                ));
                ui.separator();

                if ui.button("Reset (F2)").clicked() {
                    self.reset();
                }
                ui.small("P1: WASD + Space | P2: Arrows + Right Shift | F1: HUD | 1-4: lights");
            });
    }
}

/// Window and GPU resources, created once the event loop resumes.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    backend: WgpuDevice,
    renderer: Renderer,
    arena: ArenaScene,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext, sim: &Simulation) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Split Arena")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("arena_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(GpuError::from)?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
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

        let mut backend = WgpuDevice::new(&device, surface_format, config.width, config.height)?;
        let programs = backend.create_programs(&device)?;
        let renderer = Renderer::new(programs)
            .context("shader programs are incomplete")?
            .with_clear_color(Vec4::new(0.02, 0.02, 0.03, 1.0));
        let assets = upload_assets(&mut backend, &device, &queue)?;
        let arena = ArenaScene::build(&assets, sim);

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
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            backend,
            renderer,
            arena,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.backend
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn render(&mut self, state: &mut AppState, egui_ctx: &EguiContext) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
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

        self.arena.sync(&state.sim);
        let views = self
            .arena
            .views(&state.sim, self.config.width, self.config.height);
        state.last_stats = self.renderer.render_split(
            &mut self.backend,
            &views,
            self.arena.scene(),
            state.sim.projectiles().as_slice(),
            &state.lights,
        );
        self.backend.submit(&self.device, &self.queue, &view);

        self.draw_hud(state, egui_ctx, &view);

        output.present();
        self.window.request_redraw();
    }

    fn draw_hud(&mut self, state: &mut AppState, egui_ctx: &EguiContext, view: &wgpu::TextureView) {
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

/// Meshes, textures and materials for the arena scene.
fn upload_assets(
    backend: &mut WgpuDevice,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Result<ArenaAssets, GpuError> {
    let white = backend.upload_texture(device, queue, &TextureData::solid([255; 4]))?;
    let black = backend.upload_texture(device, queue, &TextureData::solid([0, 0, 0, 255]))?;
    let rough = backend.upload_texture(device, queue, &TextureData::solid([160, 160, 160, 255]))?;
    let glossy = backend.upload_texture(device, queue, &TextureData::solid([40, 40, 40, 255]))?;
    let checker = backend.upload_texture(
        device,
        queue,
        &TextureData::checker(64, 2, [90, 90, 96, 255], [150, 150, 158, 255]),
    )?;

    let ground = Material::new(MaterialTextures {
        albedo: checker,
        specular: black,
        roughness: rough,
        emissive: black,
        ambient_occlusion: white,
    });
    let body = MaterialTextures {
        albedo: white,
        specular: white,
        roughness: glossy,
        emissive: black,
        ambient_occlusion: white,
    };
    let vehicle_materials = [
        Material::new(body).with_albedo_tint(Vec3::new(0.85, 0.2, 0.15)),
        Material::new(body).with_albedo_tint(Vec3::new(0.15, 0.35, 0.9)),
    ];
    let projectile_material = Material::new(MaterialTextures {
        emissive: white,
        ..body
    })
    .with_emissive_tint(Vec3::new(1.0, 0.7, 0.2));

    Ok(ArenaAssets {
        ground_mesh: backend.upload_mesh(device, &MeshData::plane(1.0)),
        ground_material: ground,
        vehicle_mesh: backend.upload_mesh(device, &MeshData::cuboid(0.6, 0.4, 1.0)),
        vehicle_materials,
        projectile_mesh: backend.upload_mesh(device, &MeshData::cuboid(0.15, 0.15, 0.15)),
        projectile_material,
    })
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    fatal: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(config: GameConfig) -> Self {
        Self {
            state: AppState::new(config),
            gpu: None,
            egui_ctx: EguiContext::default(),
            fatal: None,
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx, &self.state.sim) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
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
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size);
            }
            WindowEvent::Focused(false) => {
                // Release events are lost while unfocused.
                self.state.keys.clear();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat,
                        ..
                    },
                ..
            } => {
                if !repeat {
                    self.state
                        .handle_key(key, key_state == ElementState::Pressed, event_loop);
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
                self.state.last_frame = now;
                self.state.update(dt);
                gpu.render(&mut self.state, &self.egui_ctx);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = cli.game_config()?;
    tracing::info!(
        arena_bound = config.sim.arena_bound,
        policy = ?config.sim.projectile_policy,
        spawn_origin = ?config.sim.spawn_origin,
        fire_mode = ?config.input.fire_mode,
        "arena-desktop starting"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

use anyhow::{Context, Result, bail};
use arena_common::Side;
use arena_input::{FireMode, InputMapper, Key, KeyboardState};
use arena_render::{
    ArenaAssets, ArenaScene, Material, MaterialTextures, MeshHandle, ProgramId, ProgramTable,
    Renderer, TextureHandle, TraceDevice, default_lights, report_light_issues,
};
use arena_sim::{
    ArenaPreset, FIXED_DT, GameConfig, ProjectilePolicy, SimEvent, Simulation, SpawnOrigin,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arena-cli", about = "Headless tooling for the split-screen arena")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    session: SessionArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Configuration file plus the overrides the desktop app also accepts.
#[derive(Args, Default)]
struct SessionArgs {
    /// JSON game configuration; flags below override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Arena size preset
    #[arg(long, value_enum, global = true)]
    arena: Option<ArenaArg>,

    /// Keep every projectile for the whole run
    #[arg(long, global = true)]
    unbounded_projectiles: bool,

    /// Spawn projectiles at the firing vehicle instead of its opponent
    #[arg(long, global = true)]
    spawn_at_firer: bool,

    /// How a held fire key repeats
    #[arg(long, value_enum, global = true)]
    fire_mode: Option<FireModeArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ArenaArg {
    Small,
    Large,
}

#[derive(Clone, Copy, ValueEnum)]
enum FireModeArg {
    Edge,
    Held,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Run the simulation headless with scripted keys
    Simulate {
        /// Number of fixed steps to run
        #[arg(short, long, default_value = "600")]
        steps: u64,
        /// Keys held by the left player, comma separated (e.g. W,A,Space)
        #[arg(long, value_delimiter = ',')]
        left: Vec<String>,
        /// Keys held by the right player, comma separated (e.g. ArrowUp,ShiftRight)
        #[arg(long, value_delimiter = ',')]
        right: Vec<String>,
        /// Release every key after this many steps
        #[arg(long)]
        release_after: Option<u64>,
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the device calls of one split-screen frame
    Trace {
        /// Steps to simulate before the frame, with both players firing
        #[arg(short, long, default_value = "0")]
        steps: u64,
        #[arg(long, default_value = "1280")]
        width: u32,
        #[arg(long, default_value = "720")]
        height: u32,
        /// Disable a light by its index in the rig (0-3); repeatable
        #[arg(long = "disable-light")]
        disabled_lights: Vec<usize>,
    },
}

impl SessionArgs {
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => GameConfig::default(),
        };
        if let Some(arena) = self.arena {
            config.sim.arena_bound = match arena {
                ArenaArg::Small => ArenaPreset::Small,
                ArenaArg::Large => ArenaPreset::Large,
            }
            .bound();
        }
        if self.unbounded_projectiles {
            config.sim.projectile_policy = ProjectilePolicy::Unbounded;
        }
        if self.spawn_at_firer {
            config.sim.spawn_origin = SpawnOrigin::Firer;
        }
        if let Some(mode) = self.fire_mode {
            config.input.fire_mode = match mode {
                FireModeArg::Edge => FireMode::Edge,
                FireModeArg::Held => FireMode::Held,
            };
        }
        config.sim.validate()?;
        Ok(config)
    }
}

/// Parse key names as they appear in config files (`W`, `Space`, `ArrowUp`).
fn parse_keys(names: &[String]) -> Result<Vec<Key>> {
    names
        .iter()
        .map(|name| {
            serde_json::from_value(serde_json::Value::String(name.trim().to_string()))
                .with_context(|| format!("unknown key `{name}`"))
        })
        .collect()
}

/// Keys each player holds, and for how long.
struct Script {
    left: Vec<Key>,
    right: Vec<Key>,
    release_after: Option<u64>,
}

/// Summary of a scripted run.
struct RunReport {
    sim: Simulation,
    fired: [u64; 2],
    blocked: u64,
    clamped: u64,
    expired: u64,
}

/// Drive a fresh simulation through the same poll-then-step loop the desktop
/// app uses.
fn run_script(config: GameConfig, script: &Script, steps: u64) -> RunReport {
    let mut sim = Simulation::new(config.sim);
    let mut mapper = InputMapper::new(config.input);
    let mut keys = KeyboardState::new();
    for &key in script.left.iter().chain(&script.right) {
        keys.press(key);
    }

    let (mut fired, mut blocked, mut clamped, mut expired) = ([0; 2], 0, 0, 0);
    for step in 0..steps {
        if script.release_after == Some(step) {
            keys.clear();
        }
        let input = mapper.poll(&keys);
        sim.step(&input, FIXED_DT);
        for event in sim.drain_events() {
            match event {
                SimEvent::Fired { owner, .. } => fired[owner.index()] += 1,
                SimEvent::Blocked { .. } => blocked += 1,
                SimEvent::Clamped { .. } => clamped += 1,
                SimEvent::Expired { count, .. } => expired += count as u64,
            }
        }
    }
    RunReport {
        sim,
        fired,
        blocked,
        clamped,
        expired,
    }
}

/// Handles for a scene drawn into the trace device. Every slot gets its own
/// texture id so the trace shows which unit reads what.
fn trace_assets() -> ArenaAssets {
    let textures = MaterialTextures {
        albedo: TextureHandle(0),
        specular: TextureHandle(1),
        roughness: TextureHandle(2),
        emissive: TextureHandle(3),
        ambient_occlusion: TextureHandle(4),
    };
    let material = Material::new(textures);
    ArenaAssets {
        ground_mesh: MeshHandle(0),
        ground_material: material,
        vehicle_mesh: MeshHandle(1),
        vehicle_materials: [material, material],
        projectile_mesh: MeshHandle(2),
        projectile_material: material,
    }
}

fn trace_frame(
    config: GameConfig,
    steps: u64,
    width: u32,
    height: u32,
    disabled_lights: &[usize],
) -> Result<TraceDevice> {
    let mut lights = default_lights(config.sim.arena_bound);
    let rig_size = lights.len();
    for &index in disabled_lights {
        let Some(light) = lights.get_mut(index) else {
            bail!("no light at index {index}; the rig has {rig_size}");
        };
        light.set_enabled(false);
    }
    report_light_issues(&lights);

    let script = Script {
        left: vec![config.input.bindings.left.fire],
        right: vec![config.input.bindings.right.fire],
        release_after: None,
    };
    let report = run_script(config, &script, steps);

    let renderer = Renderer::new(ProgramTable::from_programs([
        ProgramId(0),
        ProgramId(1),
        ProgramId(2),
        ProgramId(3),
    ]))?;
    let mut arena = ArenaScene::build(&trace_assets(), &report.sim);
    arena.sync(&report.sim);

    let mut device = TraceDevice::new();
    let stats = renderer.render_split(
        &mut device,
        &arena.views(&report.sim, width, height),
        arena.scene(),
        report.sim.projectiles().as_slice(),
        &lights,
    );
    tracing::info!(
        light_passes = stats.light_passes,
        draws = stats.draws,
        "traced split frame"
    );
    Ok(device)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("arena-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", arena_common::crate_info());
            println!("input: {}", arena_input::crate_info());
            println!("sim: {}", arena_sim::crate_info());
            println!("render: {}", arena_render::crate_info());
        }
        Commands::Simulate {
            steps,
            left,
            right,
            release_after,
            json,
        } => {
            let config = cli.session.game_config()?;
            let script = Script {
                left: parse_keys(&left)?,
                right: parse_keys(&right)?,
                release_after,
            };
            let report = run_script(config, &script, steps);
            let sim = &report.sim;

            if json {
                let state = serde_json::json!({
                    "tick": sim.tick(),
                    "left": sim.vehicle(Side::Left),
                    "right": sim.vehicle(Side::Right),
                    "projectiles": sim.projectiles().len(),
                    "total_spawned": sim.projectiles().total_spawned(),
                    "fired": report.fired,
                    "blocked": report.blocked,
                    "clamped": report.clamped,
                    "expired": report.expired,
                    "state_hash": format!("{:#018x}", sim.state_hash()),
                });
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                println!("Simulated {} steps", sim.tick());
                for side in Side::BOTH {
                    let v = sim.vehicle(side);
                    println!(
                        "{}: position=({:.3}, {:.3}) heading={:.3} fired={}",
                        side.label(),
                        v.position.x,
                        v.position.z,
                        v.heading_y,
                        report.fired[side.index()]
                    );
                }
                println!("Separation: {:.3}", sim.separation());
                println!(
                    "Projectiles: live={} spawned={} expired={}",
                    sim.projectiles().len(),
                    sim.projectiles().total_spawned(),
                    report.expired
                );
                println!(
                    "Events: blocked={} clamped={}",
                    report.blocked, report.clamped
                );
                println!("State hash: {:#018x}", sim.state_hash());
            }
        }
        Commands::Trace {
            steps,
            width,
            height,
            disabled_lights,
        } => {
            let config = cli.session.game_config()?;
            let device = trace_frame(config, steps, width, height, &disabled_lights)?;
            print!("{}", device.render_text());
            println!("# {} draws", device.draw_count());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(left: &[Key], right: &[Key]) -> Script {
        Script {
            left: left.to_vec(),
            right: right.to_vec(),
            release_after: None,
        }
    }

    #[test]
    fn key_names_follow_config_spelling() {
        let keys = parse_keys(&["W".into(), " Space".into(), "ShiftRight".into()]).unwrap();
        assert_eq!(keys, vec![Key::W, Key::Space, Key::ShiftRight]);
        assert!(parse_keys(&["Shift".into()]).is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        let mut saved = GameConfig::default();
        saved.sim.collision_threshold = 2.5;
        saved.save(&path).unwrap();

        let args = SessionArgs {
            config: Some(path),
            arena: Some(ArenaArg::Large),
            unbounded_projectiles: true,
            spawn_at_firer: false,
            fire_mode: Some(FireModeArg::Held),
        };
        let config = args.game_config().unwrap();
        assert_eq!(config.sim.collision_threshold, 2.5);
        assert_eq!(config.sim.arena_bound, ArenaPreset::Large.bound());
        assert_eq!(config.sim.projectile_policy, ProjectilePolicy::Unbounded);
        assert_eq!(config.sim.spawn_origin, SpawnOrigin::Opponent);
        assert_eq!(config.input.fire_mode, FireMode::Held);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = SessionArgs {
            config: Some(dir.path().join("absent.json")),
            ..SessionArgs::default()
        };
        assert!(args.game_config().is_err());
    }

    #[test]
    fn held_fire_in_edge_mode_fires_once() {
        let report = run_script(GameConfig::default(), &script(&[Key::Space], &[]), 120);
        assert_eq!(report.fired, [1, 0]);
        assert_eq!(report.sim.tick(), 120);
    }

    #[test]
    fn held_fire_in_held_mode_fires_every_step() {
        let mut config = GameConfig::default();
        config.input.fire_mode = FireMode::Held;
        config.sim.projectile_policy = ProjectilePolicy::Unbounded;
        let report = run_script(config, &script(&[], &[Key::ShiftRight]), 30);
        assert_eq!(report.fired, [0, 30]);
        assert_eq!(report.sim.projectiles().len(), 30);
    }

    #[test]
    fn release_stops_motion() {
        let held = script(&[Key::W], &[]);
        let released = Script {
            release_after: Some(10),
            ..script(&[Key::W], &[])
        };
        let a = run_script(GameConfig::default(), &released, 10);
        let b = run_script(GameConfig::default(), &released, 50);
        let c = run_script(GameConfig::default(), &held, 50);
        assert_eq!(
            a.sim.vehicle(Side::Left).position,
            b.sim.vehicle(Side::Left).position
        );
        assert_ne!(
            b.sim.vehicle(Side::Left).position,
            c.sim.vehicle(Side::Left).position
        );
    }

    #[test]
    fn scripted_runs_are_deterministic() {
        let s = script(&[Key::W, Key::A, Key::Space], &[Key::ArrowUp, Key::ArrowRight]);
        let a = run_script(GameConfig::default(), &s, 400);
        let b = run_script(GameConfig::default(), &s, 400);
        assert_eq!(a.sim.state_hash(), b.sim.state_hash());
    }

    #[test]
    fn trace_draws_every_entry_per_light_per_half() {
        let device = trace_frame(GameConfig::default(), 0, 640, 360, &[]).unwrap();
        // Ground and two vehicles, four lights, two halves; no projectiles yet.
        assert_eq!(device.draw_count(), 3 * 4 * 2);
    }

    #[test]
    fn trace_with_projectiles_and_disabled_light() {
        let device = trace_frame(GameConfig::default(), 5, 640, 360, &[3]).unwrap();
        // Edge mode: one shot per side, so two projectiles join the three statics.
        assert_eq!(device.draw_count(), 5 * 3 * 2);
        assert!(trace_frame(GameConfig::default(), 0, 640, 360, &[9]).is_err());
    }
}

use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec3;
use tracing_subscriber::EnvFilter;
use tumble_physics::{RigidBody, WorldConfig};
use tumble_scene::{DebugTextRenderer, Geometry, Material, MeshNode};
use tumble_sync::{
    AppContext, FixedFrames, FrameLoop, FrameSource, GroundConfig, LoopSummary, RealtimeFrames,
    SceneConfig, StopToken,
};

#[derive(Parser)]
#[command(name = "tumble-cli", about = "Rigid bodies driving a scene graph")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Run the falling-objects scene
    ///
    /// With --realtime and neither --frames nor --timeout the scene runs until
    /// the process is interrupted.
    Run {
        /// YAML or JSON scene config; defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Stop after this many frames (required unless --realtime)
        #[arg(short, long)]
        frames: Option<u64>,
        /// Frame rate of the frame source
        #[arg(long, default_value = "60")]
        fps: f32,
        /// Pace frames against the wall clock instead of simulating time
        #[arg(long)]
        realtime: bool,
        /// Print the scene every K frames (0 = only the last frame)
        #[arg(long, default_value = "0")]
        dump_every: u64,
        /// Stop after this many wall-clock seconds
        #[arg(long)]
        timeout: Option<f64>,
    },
    /// Drop a sphere onto a static box and report where it settles
    Drop {
        #[arg(long, default_value = "40")]
        height: f32,
        #[arg(long, default_value = "4")]
        radius: f32,
        /// Simulated seconds
        #[arg(long, default_value = "10")]
        seconds: f32,
    },
    /// Print the default scene config
    Config {
        #[arg(long, value_enum, default_value = "yaml")]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

const DEFAULT_FRAMES: u64 = 600;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("tumble-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("physics: {}", tumble_physics::crate_info());
            println!("scene: {}", tumble_scene::crate_info());
            println!("sync: {}", tumble_sync::crate_info());
        }
        Commands::Run {
            config,
            frames,
            fps,
            realtime,
            dump_every,
            timeout,
        } => {
            let scene_config = match config {
                Some(path) => SceneConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => {
                    tracing::info!("no config given, using defaults");
                    SceneConfig::default()
                }
            };
            let stop = StopToken::new();
            let _deadline = match timeout {
                Some(secs) if secs.is_finite() && secs >= 0.0 => {
                    Some(stop_after(stop.clone(), Duration::from_secs_f64(secs)))
                }
                Some(secs) => anyhow::bail!("--timeout must be a non-negative number, got {secs}"),
                None => None,
            };
            let mut ctx = AppContext::new(&scene_config)?;
            println!(
                "Scene: {} bodies, {} pairings",
                ctx.physics().body_count(),
                ctx.objects().len()
            );

            let summary = if realtime {
                let source = RealtimeFrames::new(fps);
                match frames {
                    Some(n) => run_scene(&mut ctx, source.with_limit(n), stop, dump_every, Some(n))?,
                    None => run_scene(&mut ctx, source, stop, dump_every, None)?,
                }
            } else {
                let n = frames.unwrap_or(DEFAULT_FRAMES);
                let source = FixedFrames::new(fps).with_limit(n);
                run_scene(&mut ctx, source, stop, dump_every, Some(n))?
            };
            if summary.stopped {
                tracing::info!(frames = summary.frames, "stopped by timeout");
            }

            println!(
                "Done: frames={}, simulated={:.2}s, sub_steps={}, spawned={}, avg_frame={:?}, max_frame={:?}",
                summary.frames,
                summary.simulated_seconds,
                summary.sub_steps,
                ctx.spawner().spawned(),
                summary.average_frame_time,
                summary.max_frame_time
            );
        }
        Commands::Drop {
            height,
            radius,
            seconds,
        } => {
            let ground = GroundConfig::default();
            let mut ctx = AppContext::empty(WorldConfig::default())?;
            ctx.add_static(
                ground.body()?,
                MeshNode::new("ground", Geometry::Box { size: ground.size }, Material::default()),
            )?;
            let ball = ctx.add_physics_object(
                RigidBody::create_sphere(1.0, Vec3::new(0.0, height, 0.0), radius)?,
                MeshNode::new("ball", Geometry::Sphere { radius }, Material::default()),
            )?;

            let dt = ctx.physics().config().fixed_time_step;
            let steps = (seconds / dt).ceil().max(0.0) as u64;
            tracing::info!(steps, dt, "dropping sphere");
            for _ in 0..steps {
                ctx.step(dt)?;
            }

            let y = ctx.scene().get(ball.mesh)?.transform.position.y;
            let expected = ground.top() + radius;
            println!("Drop: height={height}, radius={radius}, seconds={seconds}");
            println!("Sphere rests at y={y:.3} (expected {expected:.3}, error {:.3})", (y - expected).abs());
        }
        Commands::Config { format } => {
            let config = SceneConfig::default();
            let text = match format {
                Format::Yaml => config.to_yaml_string()?,
                Format::Json => config.to_json_string()?,
            };
            println!("{text}");
        }
    }

    Ok(())
}

/// Trigger `stop` once `after` has elapsed.
fn stop_after(stop: StopToken, after: Duration) -> JoinHandle<()> {
    std::thread::spawn(move || {
        std::thread::sleep(after);
        stop.stop();
    })
}

/// Run the loop, printing the scene every `dump_every` frames and on the last one.
fn run_scene<S: FrameSource>(
    ctx: &mut AppContext,
    source: S,
    stop: StopToken,
    dump_every: u64,
    last_frame: Option<u64>,
) -> anyhow::Result<LoopSummary> {
    let renderer = DebugTextRenderer::with_max_meshes(16);
    let mut frame_loop = FrameLoop::new(source, stop);
    let summary = frame_loop.run(ctx, &renderer, |report, text| {
        let periodic = dump_every > 0 && report.frame % dump_every == 0;
        if periodic || Some(report.frame) == last_frame {
            println!("--- frame {} (dt={:.4}s) ---", report.frame, report.delta_seconds);
            print!("{text}");
        }
    })?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tumble_sync::ScriptedFrames;

    #[test]
    fn stop_after_triggers_the_token() {
        let stop = StopToken::new();
        stop_after(stop.clone(), Duration::from_millis(5)).join().unwrap();
        assert!(stop.is_stopped());
    }

    #[test]
    fn timeout_ends_an_unbounded_realtime_run() {
        let mut ctx = AppContext::new(&SceneConfig::default()).unwrap();
        let stop = StopToken::new();
        let _deadline = stop_after(stop.clone(), Duration::from_millis(100));
        let summary = run_scene(&mut ctx, RealtimeFrames::new(60.0), stop, 0, None).unwrap();
        assert!(summary.stopped);
        assert!(summary.frames > 0);
    }

    #[test]
    fn run_scene_ends_with_the_source() {
        let mut ctx = AppContext::empty(WorldConfig::default()).unwrap();
        let summary =
            run_scene(&mut ctx, ScriptedFrames::new([0.0, 16.0]), StopToken::new(), 0, Some(2))
                .unwrap();
        assert_eq!(summary.frames, 2);
        assert!(!summary.stopped);
    }
}

use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sandscape_input::{InputEvent, InputState, Intent};
use sandscape_kernel::{
    DeltaMode, FramePacer, Scene, SceneConfig, SceneHandles, aspect_ratio,
};
use sandscape_render::{DebugTextRenderer, DrawList, Renderer};
use sandscape_tools::FrameInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sandscape-cli", about = "Headless tools for the desert scene")]
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
    /// Run the scene headless at a fixed delta
    Simulate {
        /// Number of frames to update
        #[arg(short, long, default_value = "600")]
        frames: u64,
        /// RNG seed for flicker and rug jitter
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Intents held for the whole run, e.g. `move-forward`
        #[arg(long, value_delimiter = ',')]
        hold: Vec<String>,
        /// Print the draw listing of the last frame
        #[arg(long)]
        dump: bool,
    },
    /// Print the scene layout as JSON
    Scene,
    /// Show how long the pacer sleeps for a given amount of work
    Pace {
        /// Target frames per second
        #[arg(long, default_value = "60")]
        fps: f32,
        /// Work per frame in microseconds
        #[arg(long, value_delimiter = ',', default_values_t = [2_000u64, 16_000, 16_700, 20_000])]
        work_us: Vec<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let directive = log_directive(cli.verbose, std::env::var(EnvFilter::DEFAULT_ENV).ok());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(directive))
        .init();

    match cli.command {
        Commands::Info => {
            println!("sandscape-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: {}", sandscape_kernel::crate_info());
            println!("render: {}", sandscape_render::crate_info());
            println!("assets: {}", sandscape_assets::crate_info());
            println!("tools: {}", sandscape_tools::crate_info());
            println!("input: {}", sandscape_input::crate_info());
        }
        Commands::Simulate {
            frames,
            seed,
            hold,
            dump,
        } => simulate(frames, seed, &hold, dump)?,
        Commands::Scene => {
            let json = serde_json::to_string_pretty(&SceneConfig::desert())
                .context("failed to serialize scene")?;
            println!("{json}");
        }
        Commands::Pace { fps, work_us } => {
            if !fps.is_finite() || fps <= 0.0 {
                bail!("fps must be positive, got {fps}");
            }
            let pacer = FramePacer::new(fps, DeltaMode::FrameTime);
            println!("target frame time: {:?}", pacer.target_frame_time());
            for us in work_us {
                let work = Duration::from_micros(us);
                match pacer.sleep_request(work) {
                    Some(sleep) => println!("work {work:?} -> sleep {sleep:?}"),
                    None => println!("work {work:?} -> no sleep"),
                }
            }
        }
    }

    Ok(())
}

/// `--verbose` wins, then `RUST_LOG`, then `info`.
fn log_directive(verbose: bool, env: Option<String>) -> String {
    if verbose {
        return "debug".into();
    }
    env.filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| "info".into())
}

fn simulate(frames: u64, seed: u64, hold: &[String], dump: bool) -> anyhow::Result<()> {
    let mut input = InputState::new();
    for name in hold {
        let intent = Intent::from_name(name).with_context(|| {
            let known: Vec<_> = Intent::ALL.iter().map(|i| i.name()).collect();
            format!("unknown intent {name:?}, expected one of {}", known.join(", "))
        })?;
        input.apply(InputEvent::pressed(intent));
    }

    let config = SceneConfig::desert();
    let dt = 1.0 / config.pacing.target_fps;
    let aspect = aspect_ratio(config.window.width, config.window.height);
    let mut scene = Scene::new(config);
    let mut rng = StdRng::seed_from_u64(seed);
    let handles = SceneHandles::placeholder();
    let mut renderer = DebugTextRenderer::new();

    let mut outages = 0u64;
    let mut frame = DrawList::new();
    let mut listing = String::new();
    for _ in 0..frames {
        let report = scene.update(&input, dt, &mut rng);
        if !report.flicker.lit {
            outages += 1;
            tracing::debug!(frame = report.frame, sample = report.flicker.sample, "outage");
        }
        frame = scene.compose(&handles, aspect);
        listing = renderer.render(&frame);
    }

    println!("Simulated {frames} frames (seed={seed}, dt={dt:.4})");
    if frames > 0 {
        println!(
            "Outages: {outages} ({:.2}% of frames, expected {:.2}%)",
            outages as f64 / frames as f64 * 100.0,
            scene.lights().flicker_rule().outage_probability() * 100.0
        );
    }
    println!("{}", FrameInspector::summary(&scene, &frame, None));
    if dump {
        println!("{listing}");
    }
    Ok(())
}

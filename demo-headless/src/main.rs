//! Headless sandbox run: drops particles into a box and logs frame stats.

use std::path::PathBuf;

use clap::Parser;
use ftlog::{appender::FileAppender, LevelFilter};
use rand::prelude::*;

use verlet_sandbox::{
    Anchor, Constraint, FrameStats, NoPointer, Particle, Simulation, SimulationConfig,
    StepObserver, Vec2,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON file with a `SimulationConfig`; missing fields use defaults.
    #[arg(short('c'), long)]
    config: Option<PathBuf>,

    /// Frames to simulate.
    #[arg(short('f'), long, default_value_t = 1200)]
    frames: u64,

    /// Maximum number of particles to spawn.
    #[arg(short('n'), long, default_value_t = 400)]
    max_particles: usize,

    /// Spawn one particle every this many frames.
    #[arg(long, default_value_t = 2)]
    spawn_every: u64,

    /// Box width.
    #[arg(long, default_value_t = 800.0)]
    width: f64,

    /// Box height.
    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Particle radius.
    #[arg(short('r'), long, default_value_t = 6.0)]
    radius: f64,

    /// Swirl around a fixed point in the middle of the box.
    #[arg(long)]
    swirl: bool,

    /// The random seed to use for spawn jitter.
    #[arg(short('s'), long, default_value_t = 42)]
    seed: u64,

    /// Log a stats line every this many frames.
    #[arg(long, default_value_t = 60)]
    report_every: u64,

    /// Write logs to this file instead of stderr.
    #[arg(short('l'), long)]
    log_file: Option<PathBuf>,

    /// Enable debug logs from the sandbox.
    #[arg(short('v'), long)]
    verbose: bool,
}

/// Logs a summary line at a fixed frame cadence.
struct Reporter {
    every: u64,
    sweeps: usize,
}

impl StepObserver for Reporter {
    fn on_sweep(&mut self, removed: usize) {
        self.sweeps += 1;
        ftlog::debug!("sweep #{} removed {removed} buckets", self.sweeps);
    }

    fn on_frame_complete(&mut self, stats: &FrameStats) {
        if self.every != 0 && stats.frame % self.every == 0 {
            ftlog::info!(
                "frame {}: simulated {}, skipped {}, rebucketed {}",
                stats.frame,
                stats.simulated,
                stats.skipped,
                stats.rebucketed
            );
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SimulationConfig, String> {
    let Some(path) = path else {
        return Ok(SimulationConfig::new().with_iterations(2));
    };
    let text = std::fs::read_to_string(path).map_err(|e| format!("{path:?}: {e}"))?;
    serde_json::from_str(&text).map_err(|e| format!("{path:?}: {e}"))
}

fn main() -> Result<(), String> {
    let args = Args::parse();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let mut builder = ftlog::Builder::new().max_log_level(level);
    if let Some(path) = &args.log_file {
        builder = builder.root(FileAppender::new(path));
    }
    let _guard = builder.try_init().map_err(|e| e.to_string())?;

    let config = load_config(args.config.as_ref())?;
    ftlog::info!("config: {config:?}");

    let size = Vec2::new(args.width, args.height);
    let mut sim = Simulation::new(config).map_err(|e| e.to_string())?;
    let collide = sim.grid_collision();
    sim.add_single_pass(Constraint::gravity(0.5));
    if args.swirl {
        let center = Anchor::Fixed(size.scale(0.5));
        sim.add_single_pass(Constraint::rotational(0.4, args.height / 3.0, center, false));
    }
    sim.add_multi_pass(Constraint::screen(size));
    sim.add_multi_pass(Constraint::friction(0.95));
    sim.add_multi_pass(collide);

    let mut rng = rand::rngs::StdRng::seed_from_u64(args.seed);
    let mut reporter = Reporter { every: args.report_every, sweeps: 0 };
    let spawn_at = Vec2::new(args.width / 2.0, args.radius * 2.0);

    for frame in 0..args.frames {
        if sim.world().len() < args.max_particles && frame % args.spawn_every.max(1) == 0 {
            let jitter = Vec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0));
            let particle = Particle::at_rest(spawn_at + jitter).with_radius(args.radius);
            sim.spawn(particle).map_err(|e| e.to_string())?;
        }
        sim.step(&NoPointer, &mut reporter);
    }

    let world = sim.world();
    let lowest = world.iter().map(|(_, p)| p.position.y).fold(f64::NEG_INFINITY, f64::max);
    ftlog::info!(
        "done after {} frames: {} particles, {} grid buckets, lowest y {lowest:.2}",
        sim.frame(),
        world.len(),
        world.grid().bucket_count()
    );

    Ok(())
}

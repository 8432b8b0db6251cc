//! Hive Runtime
//!
//! Runs a particle simulation on the ECS and reports runtime statistics
//! from a background thread while it runs.

mod settings;
mod simulation;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anyhow::Result;
use clap::Parser;
use hive_core::ecs::StatisticsHandle;
use hive_metrics::FrameTimer;
use tracing::info;

use crate::settings::RuntimeSettings;
use crate::simulation::Simulation;

#[derive(Debug, Parser)]
#[command(author, version, about = "Hive ECS runtime")]
struct Cli {
    /// Path to a JSON settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Override the tick count
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the target population
    #[arg(long)]
    entities: Option<usize>,

    /// Print the final statistics as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => RuntimeSettings::load(path)?,
        None => RuntimeSettings::default(),
    };
    if let Some(ticks) = cli.ticks {
        settings.ticks = ticks;
    }
    if let Some(entities) = cli.entities {
        settings.entities = entities;
    }
    settings.validate()?;

    info!("Hive v{}", hive_core::VERSION);
    let ticks = settings.ticks;
    let report_interval = settings.report_interval();
    let mut simulation = Simulation::new(settings)?;
    let handle = simulation.ecs().statistics_handle();
    let mut frames = FrameTimer::new(120);
    let stop = AtomicBool::new(false);

    thread::scope(|scope| -> Result<()> {
        scope.spawn(|| {
            while !stop.load(Ordering::Relaxed) {
                thread::sleep(report_interval);
                report(&handle);
            }
        });

        let result = (|| -> Result<()> {
            for _ in 0..ticks {
                frames.begin();
                simulation.tick()?;
                frames.end();
            }
            Ok(())
        })();
        stop.store(true, Ordering::Relaxed);
        result
    })?;

    let (fastest, slowest) = frames.frame_time_range_ms();
    info!(
        ticks = frames.frames(),
        avg_ms = frames.frame_time_ms(),
        fastest_ms = fastest,
        slowest_ms = slowest,
        spawned = simulation.spawned(),
        expired = simulation.expired(),
        "simulation finished"
    );
    for (system, timing) in simulation.ecs().profiler().report() {
        info!(
            system = %system,
            passes = timing.passes,
            avg_us = timing.average.as_micros() as u64,
            "system timing"
        );
    }

    let statistics = simulation.ecs().statistics();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&statistics)?);
    }
    simulation.terminate()?;
    Ok(())
}

fn report(handle: &StatisticsHandle) {
    let stats = handle.snapshot();
    info!(
        updates = stats.updates,
        entities = stats.entities_active,
        components = stats.components_active,
        pooled = stats.components_pooled,
        refits = stats.container_refits + stats.pool_refits,
        "runtime statistics"
    );
}

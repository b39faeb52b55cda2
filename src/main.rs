//! Tribal Mind - headless runner
//!
//! Populates a world, runs the fixed-step loop for a number of simulated
//! hours and prints a summary.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use tribal_mind::core::config::SimulationConfig;
use tribal_mind::core::error::Result;
use tribal_mind::ecs::{Scenario, World};
use tribal_mind::entity::{EntityKind, Species};
use tribal_mind::simulation::{Simulation, SimulationEvent};

/// Headless tribal survival run
#[derive(Parser, Debug)]
#[command(name = "tribal-mind")]
#[command(about = "Run the tribal survival simulation headless and report what happened")]
struct Args {
    /// TOML file overriding the default configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated hours to run
    #[arg(long, default_value_t = 24.0)]
    hours: f64,

    #[arg(long, default_value_t = 2)]
    tribes: u32,

    /// Humans per tribe, leader included
    #[arg(long, default_value_t = 5)]
    tribe_size: u32,

    #[arg(long, default_value_t = 6)]
    boars: u32,

    #[arg(long, default_value_t = 20)]
    bushes: u32,

    /// Hand the first tribe's leader to the host (it stays idle)
    #[arg(long)]
    player: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    hours: f64,
    steps: u32,
    day: u64,
    humans: usize,
    boars: usize,
    tribe_food: Vec<(String, u32)>,
    transitions: usize,
    despawned: usize,
    game_over: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "tribal_mind=debug"
    } else {
        "tribal_mind=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate()?;

    let mut world = World::new(config);
    let scenario = Scenario {
        tribes: args.tribes,
        tribe_size: args.tribe_size,
        boars: args.boars,
        bushes: args.bushes,
        player_leader: args.player,
    };
    let leaders = scenario.populate(&mut world);

    tracing::info!(seed = world.config.seed, hours = args.hours, "starting run");
    let mut sim = Simulation::new(world);
    let report = sim.run_for_hours(args.hours);

    let world = &sim.world;
    let count_species = |species: Species| {
        world
            .entities
            .iter()
            .filter(|e| e.kind() == EntityKind::Actor && e.is_live())
            .filter(|e| e.actor().is_some_and(|a| a.species == species))
            .count()
    };
    let summary = RunSummary {
        seed: world.config.seed,
        hours: world.now(),
        steps: report.steps,
        day: world.clock.current_day(),
        humans: count_species(Species::Human),
        boars: count_species(Species::Boar),
        tribe_food: leaders
            .iter()
            .map(|&leader| (leader.to_string(), world.tribe_food_stock(leader)))
            .collect(),
        transitions: report
            .events
            .iter()
            .filter(|e| matches!(e, SimulationEvent::StateChanged { .. }))
            .count(),
        despawned: report
            .events
            .iter()
            .filter(|e| matches!(e, SimulationEvent::Despawned(_)))
            .count(),
        game_over: report.game_over,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!();
        println!("=== TRIBAL MIND (seed {}) ===", summary.seed);
        println!(
            "Ran {} steps, {:.1} hours (day {})",
            summary.steps, summary.hours, summary.day
        );
        println!("Humans alive: {}  Boars alive: {}", summary.humans, summary.boars);
        for (tribe, food) in &summary.tribe_food {
            println!("  Tribe {}: {} food stored", tribe, food);
        }
        println!(
            "{} state changes, {} despawns",
            summary.transitions, summary.despawned
        );
        if summary.game_over {
            println!("The player's leader died.");
        }
    }
    Ok(())
}

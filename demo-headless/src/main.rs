use clap::Parser;
use rescue_sim_core::{
    AgentType, FireScenario, FireStatistics, GridPos, Simulation, SimulationConfig,
};
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Emergency response simulation demo with configurable parameters
#[derive(Parser, Debug)]
#[command(name = "rescue-sim-demo")]
#[command(about = "Headless fire and rescue simulation demo", long_about = None)]
struct Args {
    /// Simulated duration in seconds
    #[arg(short, long, default_value_t = 60.0)]
    duration: f32,

    /// Fire scenario (electrical, chemical, ordinary, smoldering)
    #[arg(short, long, default_value = "ordinary")]
    scenario: String,

    /// Grid width in cells
    #[arg(long, default_value_t = 24)]
    width: usize,

    /// Grid height in cells
    #[arg(long, default_value_t = 24)]
    height: usize,

    /// Master random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Report interval in seconds
    #[arg(short, long, default_value_t = 5.0)]
    report_interval: f32,

    /// Run on the real-time scheduler instead of stepping by hand
    #[arg(long)]
    realtime: bool,

    /// Print the final grid
    #[arg(short, long)]
    map: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let scenario = FireScenario::from_name(&args.scenario).unwrap_or_else(|| {
        eprintln!("Unknown scenario '{}', using ordinary", args.scenario);
        FireScenario::ordinary()
    });
    let config = SimulationConfig {
        width: args.width,
        height: args.height,
        headquarters: GridPos::new(args.width as i32 / 2, args.height as i32 / 2),
        seed: args.seed,
        ..SimulationConfig::with_scenario(scenario)
    };

    println!("=== Emergency Response Simulation Demo ===\n");
    println!(
        "Grid {}x{}, HQ {}, scenario: {}",
        config.width, config.height, config.headquarters, config.scenario.description
    );
    println!(
        "Fire tick {} ms, agent tick {} ms, seed {}\n",
        config.fire_tick_interval_ms, config.agent_tick_interval_ms, config.seed
    );

    let mut sim = Simulation::new(config)?;
    let duration_ms = (args.duration.max(0.0) * 1000.0) as u64;
    let report_ms = ((args.report_interval.max(0.1)) * 1000.0) as u64;

    println!("Time(s) | Burning | Peak | Scouts | Firefighters | Active | Rescued | Dead");
    println!("--------|---------|------|--------|--------------|--------|---------|-----");

    if args.realtime {
        info!("Running on the real-time scheduler");
        sim.start()?;
        while sim.now() < duration_ms {
            thread::sleep(Duration::from_millis(report_ms));
            print_row(&sim);
        }
        sim.stop();
    } else {
        while sim.now() < duration_ms {
            sim.advance(report_ms.min(duration_ms - sim.now()));
            print_row(&sim);
        }
    }

    print_summary(&sim.statistics());
    println!(
        "Hottest cell: {:.1}",
        sim.snapshot_intensity().max_value()
    );
    if args.map {
        print_map(&sim);
    }
    Ok(())
}

fn print_row(sim: &Simulation) {
    let stats = sim.statistics();
    let agents = sim.snapshot_agents();
    let firefighters = agents
        .iter()
        .filter(|a| a.kind == AgentType::Firefighter)
        .count();
    println!(
        "{:7.1} | {:7} | {:4} | {:6} | {:12} | {:6} | {:7} | {:4}",
        sim.now() as f32 / 1000.0,
        stats.current_fire_cells,
        stats.max_fire_cells,
        agents.len() - firefighters,
        firefighters,
        stats.active,
        stats.rescued,
        stats.dead
    );
}

fn print_summary(stats: &FireStatistics) {
    println!("\n=== Simulation Complete ===");
    println!("Elapsed: {:.1}s", stats.elapsed_ms as f32 / 1000.0);
    println!(
        "Fire cells: initial {}, peak {}, final {}",
        stats.initial_fire_cells, stats.max_fire_cells, stats.current_fire_cells
    );
    println!("Fire control rate: {:.1}%", stats.fire_control_rate);
    println!(
        "Survivors: {} total, {} rescued, {} dead, {} active",
        stats.total_survivors, stats.rescued, stats.dead, stats.active
    );
    println!("Survival rate: {:.1}%", stats.survival_rate);
}

fn print_map(sim: &Simulation) {
    let grid = sim.snapshot_intensity();
    let config = sim.config();
    let max = config.scenario.max_intensity;
    let mut rows: Vec<Vec<char>> = grid
        .to_rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| {
                    if *v > max * 0.5 {
                        '#'
                    } else if config.scenario.is_burning(*v) {
                        '*'
                    } else {
                        '.'
                    }
                })
                .collect()
        })
        .collect();

    let mut mark = |x: i32, y: i32, c: char| {
        if let Some(cell) = rows
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
        {
            *cell = c;
        }
    };
    mark(config.headquarters.x, config.headquarters.y, 'H');
    for survivor in sim.snapshot_survivors() {
        mark(survivor.x, survivor.y, 'V');
    }
    for agent in sim.snapshot_agents() {
        let c = match agent.kind {
            AgentType::Scout => 'S',
            AgentType::Firefighter => 'F',
        };
        mark(agent.x, agent.y, c);
    }

    println!("\nH headquarters, S scout, F firefighter, V survivor, # intense fire, * fire\n");
    for row in rows {
        println!("{}", row.into_iter().collect::<String>());
    }
}

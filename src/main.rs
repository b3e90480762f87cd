//! Lattice Boltzmann CLI - run simulations from JSON configuration.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use lattice_flow::{
    compute::{Domain, FieldStats, PpmSink},
    schema::{BoundaryMask, SolverConfig},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [target_time] [frames_dir]", args[0]);
        eprintln!();
        eprintln!("Run a lattice Boltzmann simulation from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to solver configuration file");
        eprintln!("  target_time  Simulation end time (default: 100)");
        eprintln!("  frames_dir   Optional directory for PPM velocity frames");
        eprintln!();
        eprintln!("A boundary mask is read from <config>.mask.json if present.");
        eprintln!("Example configuration is printed with --example.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let target_time: f32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100.0);
    let frames_dir = args.get(3).map(PathBuf::from);

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });
    let config: SolverConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    // Load or create boundary mask
    let mask_path = config_path.with_extension("mask.json");
    let mask: BoundaryMask = if mask_path.exists() {
        let mask_str = fs::read_to_string(&mask_path).unwrap_or_else(|e| {
            eprintln!("Error reading mask file: {}", e);
            std::process::exit(1);
        });
        serde_json::from_str(&mask_str).unwrap_or_else(|e| {
            eprintln!("Error parsing mask: {}", e);
            std::process::exit(1);
        })
    } else {
        BoundaryMask::empty(&config.shape)
    };

    let mut domain = Domain::new(config, &mask).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    let config = domain.config();
    let (width, height, depth) = domain.shape();
    let num_steps = (target_time / config.dt).floor() as u64;

    println!("Lattice Boltzmann Simulation");
    println!("============================");
    println!(
        "Grid: {}x{}x{} ({:?}, {} component(s))",
        width,
        height,
        depth,
        config.scheme,
        config.viscosity.len()
    );
    println!("Collision: {:?}", config.collision);
    println!("dt: {}, target time: {} ({} steps)", config.dt, target_time, num_steps);
    println!();

    let initial = FieldStats::from_component(&domain.components()[0]);
    println!("Initial state:");
    println!("  Total mass: {:.6}", initial.total_mass);
    println!(
        "  Density range: [{:.6}, {:.6}]",
        initial.min_density, initial.max_density
    );
    println!();

    println!("Running simulation...");
    let start = Instant::now();

    if let Some(dir) = frames_dir {
        let mut sink = PpmSink::new(&dir).unwrap_or_else(|e| {
            eprintln!("Error creating frame directory: {}", e);
            std::process::exit(1);
        });
        match domain.run(target_time, Some(&mut sink)) {
            Ok(summary) => {
                println!(
                    "  {} step(s), {} frame(s) written to {}",
                    summary.steps_run,
                    sink.frames_written(),
                    dir.display()
                );
            }
            Err(e) => {
                eprintln!("Run failed: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        for i in 0..num_steps {
            if let Err(e) = domain.step() {
                eprintln!("Run failed: {}", e);
                std::process::exit(1);
            }

            // Print progress every 10%
            if (i + 1) % (num_steps / 10).max(1) == 0 {
                let stats = FieldStats::from_component(&domain.components()[0]);
                let elapsed = start.elapsed().as_secs_f32();
                let steps_per_sec = (i + 1) as f32 / elapsed;
                println!(
                    "  Step {}/{}: mass={:.6}, max |u|={:.6}, {:.1} steps/s",
                    i + 1,
                    num_steps,
                    stats.total_mass,
                    stats.max_speed,
                    steps_per_sec
                );
            }
        }
    }

    let elapsed = start.elapsed();
    let final_stats = FieldStats::from_component(&domain.components()[0]);

    println!();
    println!("Final state (t = {}):", domain.time());
    println!("  Total mass: {:.6}", final_stats.total_mass);
    println!(
        "  Density range: [{:.6}, {:.6}]",
        final_stats.min_density, final_stats.max_density
    );
    println!("  Max |u|: {:.6}", final_stats.max_speed);
    println!();
    println!(
        "Mass conservation: {:.4}%",
        (1.0 - (final_stats.total_mass - initial.total_mass).abs() / initial.total_mass) * 100.0
    );
    println!(
        "Time: {:.2}s ({:.1} steps/s)",
        elapsed.as_secs_f32(),
        domain.step_count() as f32 / elapsed.as_secs_f32()
    );
}

fn print_example_config() {
    let config = SolverConfig::default();
    let mask = BoundaryMask::empty(&config.shape);

    println!("Example configuration (config.json):");
    println!("{}", serde_json::to_string_pretty(&config).unwrap());
    println!();
    println!("Example boundary mask (config.mask.json):");
    println!("{}", serde_json::to_string_pretty(&mask).unwrap());
}

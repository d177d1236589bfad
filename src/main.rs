//! Plant simulator entry point: CLI wiring and config-driven engine construction.

use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use plant_sim::config::ScenarioConfig;
use plant_sim::io::export::export_csv;
use plant_sim::sim::engine::Simulation;
use plant_sim::sizing::{size_gensets, verify_availability};

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    hours_override: Option<usize>,
    seed_override: Option<u64>,
    mode_override: Option<String>,
    window: Option<usize>,
    export_out: Option<String>,
}

fn print_help() {
    eprintln!("plant-sim — Reliability and dispatch simulator for an on-site power plant");
    eprintln!();
    eprintln!("Usage: plant-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>     Load scenario from TOML config file");
    eprintln!("  --preset <name>     Use a built-in preset (baseline)");
    eprintln!("  --list-presets      List built-in presets and exit");
    eprintln!("  --hours <n>         Override simulated hours");
    eprintln!("  --seed <u64>        Override random seed");
    eprintln!("  --mode <mode>       Override failure mode (random, hybrid, schedule)");
    eprintln!("  --window <n>        Restrict diagnostics to the last n hours");
    eprintln!("  --export <path>     Export hourly timeseries to CSV");
    eprintln!("  --help              Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the baseline preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        preset: None,
        hours_override: None,
        seed_override: None,
        mode_override: None,
        window: None,
        export_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--list-presets" => {
                for name in ScenarioConfig::PRESETS {
                    println!("{name}");
                }
                process::exit(0);
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --config requires a path argument");
                    process::exit(2);
                }
                cli.config_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(2);
                }
                cli.preset = Some(args[i].clone());
            }
            "--hours" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --hours requires a positive integer argument");
                    process::exit(2);
                }
                if let Ok(h) = args[i].parse::<usize>() {
                    cli.hours_override = Some(h);
                } else {
                    eprintln!("error: --hours value \"{}\" is not a valid integer", args[i]);
                    process::exit(2);
                }
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(2);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(2);
                }
            }
            "--mode" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --mode requires a mode argument");
                    process::exit(2);
                }
                cli.mode_override = Some(args[i].clone());
            }
            "--window" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --window requires a positive integer argument");
                    process::exit(2);
                }
                if let Ok(w) = args[i].parse::<usize>() {
                    cli.window = Some(w);
                } else {
                    eprintln!("error: --window value \"{}\" is not a valid integer", args[i]);
                    process::exit(2);
                }
            }
            "--export" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --export requires a path argument");
                    process::exit(2);
                }
                cli.export_out = Some(args[i].clone());
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(2);
            }
        }
        i += 1;
    }

    cli
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = parse_args();

    // Load config: --config takes priority, then --preset, then baseline default
    let mut scenario = if let Some(ref path) = cli.config_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(2);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(2);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    // Apply CLI overrides
    if let Some(hours) = cli.hours_override {
        scenario.simulation.hours = hours;
    }
    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }
    if let Some(ref mode) = cli.mode_override {
        scenario.simulation.mode = mode.clone();
    }

    // Validate
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(2);
    }

    let arch = scenario.architecture.to_params();
    let unit_reliability = scenario.sizing.to_params();

    // Analytical sizing pass: how many engines this load would need
    let design = match size_gensets(
        arch.load_mw,
        scenario.sizing.target_availability,
        scenario.sizing.unit_mw,
        &unit_reliability,
    ) {
        Ok(design) => design,
        Err(e) => {
            eprintln!("config error: sizing — {e}");
            process::exit(2);
        }
    };
    println!("{design}");

    let report = verify_availability(
        &design,
        arch.pv_total_mw(),
        arch.bess_energy_mwh,
        arch.load_mw,
        &unit_reliability,
    );
    println!("\n{report}");

    // Scheduled outages: malformed entries are dropped with a warning
    let (schedule, _warnings) = scenario.ingest_schedule();
    let sim_config = scenario.simulation.to_sim_config(schedule);

    // Run the hourly simulation
    let mut sim = Simulation::new(arch, sim_config, scenario.reliability.clone());
    let result = sim.run();
    println!("\n{result}");

    if let Some(diagnostics) = sim.diagnostics(cli.window) {
        println!("\n{diagnostics}");
    }

    // Export CSV if requested
    if let Some(ref path) = cli.export_out {
        if let Err(e) = export_csv(&result.timeseries, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Timeseries written to {path}");
    }
}

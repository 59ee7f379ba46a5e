use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

use keyrando_core::{load_graph, run, stress, PlacementOverrides, RandomiserSettings};

#[derive(Debug, Parser)]
#[command(name = "keyrando", version, about = "Progression key placement randomiser")]
struct Args {
    /// Graph description with #ROOMS, #KEYS and #DOORS sections.
    #[arg(long)]
    graph: PathBuf,

    #[arg(long, required_unless_present = "stress_runs")]
    output: Option<PathBuf>,

    #[arg(long)]
    seed: u64,

    /// JSON file with pinned / restricted / early_access key rules.
    #[arg(long)]
    overrides: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    early_placement: bool,

    #[arg(long, default_value_t = false)]
    spoiler: bool,

    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Solve and validate this many consecutive seeds starting at --seed,
    /// without writing any files.
    #[arg(long, value_name = "N")]
    stress_runs: Option<u64>,
}

fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn stress_mode(args: &Args, runs: u64) -> keyrando_core::Result<bool> {
    let graph = load_graph(&args.graph)?;
    let overrides = match &args.overrides {
        Some(path) => PlacementOverrides::load(path)?,
        None => PlacementOverrides::default(),
    };
    let table = overrides.resolve(&graph, args.early_placement)?;

    let summary = stress(&graph, &table, args.seed, runs);
    for failure in &summary.failures {
        println!("seed {}: FAILED ({})", failure.seed, failure.reason);
    }
    if summary.passed() {
        println!("PASSED {} runs", summary.runs);
    } else {
        println!("FAILED {} of {} runs", summary.failures.len(), summary.runs);
    }
    Ok(summary.passed())
}

fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Some(runs) = args.stress_runs {
        match stress_mode(&args, runs) {
            Ok(true) => return,
            Ok(false) => std::process::exit(1),
            Err(err) => {
                eprintln!("Error: {err}");
                std::process::exit(1);
            }
        }
    }

    let settings = RandomiserSettings {
        seed: args.seed,
        graph_path: args.graph,
        // clap enforces --output whenever --stress-runs is absent, and the
        // stress path has already returned or exited.
        output_path: args
            .output
            .expect("output is required unless --stress-runs is used"),
        overrides_path: args.overrides,
        early_placement: args.early_placement,
        write_spoiler: args.spoiler,
        debug: args.debug,
    };

    match run(settings) {
        Ok(report) => {
            println!(
                "Placed {} keys for seed {}",
                report.placements.len(),
                report.seed
            );
        }
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}

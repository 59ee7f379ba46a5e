use log::info;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

pub mod engine;
pub mod graph;
pub mod loader;
pub mod overrides;
pub mod placement;
pub mod reachability;
pub mod report;
pub mod validate;

pub use engine::{solve, PlacementEngine, PlacementError};
pub use graph::{Door, Graph, GraphBuilder, GraphError, Key, KeyId, Room, RoomId};
pub use loader::{load_graph, parse_graph, ParseError};
pub use overrides::{OverrideTable, PlacementOverrides};
pub use placement::PlacementState;
pub use reachability::compute_reachable;
pub use report::{render_spoiler, PlacementReport};
pub use validate::{check_solution, validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomiserSettings {
    pub seed: u64,
    pub graph_path: PathBuf,
    pub output_path: PathBuf,
    #[serde(default)]
    pub overrides_path: Option<PathBuf>,
    #[serde(default)]
    pub early_placement: bool,
    #[serde(default)]
    pub write_spoiler: bool,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Error)]
pub enum RandomiserError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("graph error: {0}")]
    Parse(#[from] ParseError),
    #[error("key placement failed: {0}")]
    Placement(#[from] PlacementError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, RandomiserError>;

/// Solves one seed and checks the result. No retry on failure.
pub fn place_keys(graph: &Graph, overrides: &OverrideTable, seed: u64) -> Result<PlacementState> {
    let mut rng = StdRng::seed_from_u64(seed);
    let state = PlacementEngine::new(graph, overrides).solve(&mut rng)?;
    check_solution(graph, &state)?;
    Ok(state)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressFailure {
    pub seed: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StressSummary {
    pub runs: u64,
    pub failures: Vec<StressFailure>,
}

impl StressSummary {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs [`place_keys`] for `runs` consecutive seeds starting at
/// `first_seed` and collects the seeds that failed.
pub fn stress(graph: &Graph, overrides: &OverrideTable, first_seed: u64, runs: u64) -> StressSummary {
    let mut summary = StressSummary {
        runs,
        failures: Vec::new(),
    };

    for i in 0..runs {
        let seed = first_seed.wrapping_add(i);
        if let Err(err) = place_keys(graph, overrides, seed) {
            summary.failures.push(StressFailure {
                seed,
                reason: err.to_string(),
            });
        }
    }

    info!(
        "stress: {} runs from seed {}, {} failed",
        runs,
        first_seed,
        summary.failures.len()
    );
    summary
}

pub fn run(settings: RandomiserSettings) -> Result<PlacementReport> {
    if !settings.graph_path.exists() {
        return Err(RandomiserError::Config(format!(
            "Graph file does not exist: {}",
            settings.graph_path.display()
        )));
    }

    if !settings.output_path.exists() {
        fs::create_dir_all(&settings.output_path)?;
    }

    // Each seed gets its own folder so runs do not overwrite each other.
    let out_root = settings
        .output_path
        .join(format!("KeyRando_{}", settings.seed));
    if !out_root.exists() {
        fs::create_dir_all(&out_root)?;
    }

    let graph = load_graph(&settings.graph_path)?;

    let overrides = match &settings.overrides_path {
        Some(path) => {
            if !path.exists() {
                return Err(RandomiserError::Config(format!(
                    "Overrides file does not exist: {}",
                    path.display()
                )));
            }
            PlacementOverrides::load(path)?
        }
        None => PlacementOverrides::default(),
    };
    let table = overrides.resolve(&graph, settings.early_placement)?;

    info!(
        "seed {}: {} rooms, {} keys, {} doors, {} overrides",
        settings.seed,
        graph.room_count(),
        graph.key_count() - 1,
        graph.doors().len(),
        table.len()
    );

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let state = PlacementEngine::new(&graph, &table).solve(&mut rng)?;
    let report = PlacementReport::new(&graph, &state, settings.seed);

    let report_path = out_root.join("placement.json");
    fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;

    if settings.write_spoiler || settings.debug {
        let mut log = format!("Key placement seed: {}\n", settings.seed);
        log.push_str(&format!("graph: {}\n", settings.graph_path.display()));
        log.push_str(&format!("placement.json: {}\n", report_path.display()));
        log.push_str(&format!("early_placement: {}\n", settings.early_placement));
        log.push_str(&format!("valid: {}\n", report.valid));
        log.push_str(&render_spoiler(&graph, &state));
        fs::write(out_root.join("spoiler_log.txt"), log)?;
    }

    check_solution(&graph, &state)?;
    info!("seed {}: placement written to {}", settings.seed, out_root.display());
    Ok(report)
}

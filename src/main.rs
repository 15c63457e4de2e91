// ./src/main.rs
use landmask::logging::init_logging;
use landmask::pipeline::{Orchestrator, PipelineConfig, PipelineServices};
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    init_logging();

    let Some(config_path) = std::env::args().nth(1) else {
        error!("Usage: landmask <config.json>");
        return ExitCode::from(2);
    };

    let config = match PipelineConfig::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            error!(path = %config_path, "Could not load configuration: {}", err);
            return ExitCode::from(2);
        }
    };
    info!(
        sources = config.sources.len(),
        places = config.places.len(),
        bands = config.distance_bands,
        "Configuration loaded"
    );

    // Puffern ist ein externer Dienst; das Binary berechnet nur die Basisgeometrien
    let services = PipelineServices::new(config.grid_extent);
    let orchestrator = match Orchestrator::new(config, services) {
        Ok(orchestrator) => orchestrator,
        Err(err) => {
            error!("{}", err);
            return ExitCode::from(2);
        }
    };

    let summary = orchestrator.run();
    for report in summary.succeeded() {
        info!(
            unit = %report.name,
            output = %report.output.display(),
            polygons = report.polygons,
            cached = report.cached,
            "Unit succeeded"
        );
        for (stage, count) in report.counts.iter() {
            info!(unit = %report.name, %stage, count, "Dropped");
        }
    }

    let mut failed = false;
    for (unit, err) in summary.failed() {
        error!(%unit, "Unit failed: {}", err);
        failed = true;
    }
    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

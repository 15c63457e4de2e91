// src/pipeline/orchestrator.rs

use crate::geometry::error::{PipelineError, PipelineResult};
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::diagnostics::StageCounts;
use crate::pipeline::unit::{PipelineServices, ProcessingUnit, UnitOutcome, UnitReport};
use rayon::prelude::*;
use tracing::{error, info, warn};

/// Ergebnis einer einzelnen Einheit; ein Fehler betrifft nur diese Einheit.
#[derive(Debug)]
pub struct UnitResult {
    pub unit: String,
    pub result: PipelineResult<UnitReport>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub results: Vec<UnitResult>,
}

impl RunSummary {
    pub fn succeeded(&self) -> impl Iterator<Item = &UnitReport> {
        self.results.iter().filter_map(|r| r.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &PipelineError)> {
        self.results
            .iter()
            .filter_map(|r| r.result.as_ref().err().map(|err| (r.unit.as_str(), err)))
    }

    /// Verwerfungen je Stufe über alle erfolgreichen Einheiten.
    pub fn total_counts(&self) -> StageCounts {
        let mut total = StageCounts::default();
        for report in self.succeeded() {
            total.merge(&report.counts);
        }
        total
    }
}

/// Plant die unabhängigen Einheiten und führt sie parallel aus.
///
/// Phase 1: Rohdaten-Aufnahme je Ort. Phase 2: alle Distanzbänder aller Orte,
/// deren Basisgeometrie in Phase 1 entstanden ist.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    config: PipelineConfig,
    services: PipelineServices,
}

impl Orchestrator {
    pub fn new(config: PipelineConfig, services: PipelineServices) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self { config, services })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self) -> RunSummary {
        let config = &self.config;
        let services = &self.services;

        let ingested: Vec<(ProcessingUnit, PipelineResult<UnitOutcome>)> = config
            .places
            .par_iter()
            .map(|place| {
                let unit = ProcessingUnit::ingest(place, config);
                let outcome = unit.run(config, services, None);
                (unit, outcome)
            })
            .collect();

        let mut results = Vec::new();
        let mut bases = Vec::new();
        for (unit, outcome) in ingested {
            let name = unit.name();
            match outcome {
                Ok(outcome) => {
                    bases.push((unit.place, outcome.geometry));
                    results.push(UnitResult {
                        unit: name,
                        result: Ok(outcome.report),
                    });
                }
                Err(err) => {
                    error!(unit = %name, "Unit failed: {}", err);
                    results.push(UnitResult {
                        unit: name,
                        result: Err(err),
                    });
                }
            }
        }

        let distances = config.band_distances();
        if services.buffer.is_none() && !distances.is_empty() {
            warn!("No buffer service configured, skipping {} distance bands per place", distances.len());
        } else {
            let bands: Vec<UnitResult> = bases
                .par_iter()
                .flat_map(|(place, base)| {
                    distances
                        .par_iter()
                        .map(move |&distance| (ProcessingUnit::band(place, distance, config), base))
                })
                .map(|(unit, base)| {
                    let result = unit
                        .run(config, services, Some(base))
                        .map(|outcome| outcome.report);
                    if let Err(err) = &result {
                        error!(unit = %unit.name(), "Unit failed: {}", err);
                    }
                    UnitResult {
                        unit: unit.name(),
                        result,
                    }
                })
                .collect();
            results.extend(bands);
        }

        let summary = RunSummary { results };
        info!(
            succeeded = summary.succeeded().count(),
            failed = summary.failed().count(),
            dropped = summary.total_counts().total(),
            "Run finished"
        );
        summary
    }
}

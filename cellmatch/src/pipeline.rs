use std::path::Path;

use common::parallel::with_workers;

use crate::config::AssociationConfig;
use crate::corrector;
use crate::diagnostics::RunSummary;
use crate::error::AssociationResult;
use crate::matcher::SpatialMatcher;
use crate::model::{AssociationRecord, InputTables};
use crate::registry::GeoRegistry;
use crate::table::{self, InputPaths};

#[derive(Debug)]
pub struct PipelineOutput {
    /// Corrected records in measurement order.
    pub records: Vec<AssociationRecord>,
    pub summary: RunSummary,
}

/// Registry build, point-wise matching and majority correction for one run.
#[derive(Debug, Clone)]
pub struct AssociationPipeline {
    config: AssociationConfig,
}

impl AssociationPipeline {
    pub fn new(config: AssociationConfig) -> AssociationResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AssociationConfig {
        &self.config
    }

    /// Runs on already parsed tables. Measurements are used as given; load-time
    /// filtering only happens in [`Self::run_files`].
    pub fn run(&self, tables: InputTables) -> AssociationResult<PipelineOutput> {
        let InputTables {
            supports,
            antennas,
            transmitters,
            measurements,
        } = tables;

        let registry = GeoRegistry::build(supports, antennas, &transmitters, &self.config.region)?;
        let matcher = SpatialMatcher::new(&registry, self.config.matcher);

        tracing::info!("Matching {} measurements", measurements.len());
        let outcome = with_workers(self.config.workers, || matcher.match_all(&measurements))?;

        let mut records = outcome.records;
        let correction = corrector::correct(&mut records);

        let summary = RunSummary {
            registry: registry.stats().clone(),
            matching: outcome.stats,
            correction,
            records_emitted: records.len(),
            ..Default::default()
        };

        Ok(PipelineOutput { records, summary })
    }

    /// Loads the four tables, runs, and writes the output table. Nothing is
    /// written when the run fails.
    pub fn run_files(&self, inputs: &InputPaths, output: &Path) -> AssociationResult<RunSummary> {
        let (tables, load) = table::load_tables(inputs, &self.config)?;

        let PipelineOutput {
            records,
            mut summary,
        } = self.run(tables)?;
        summary.load = load;

        table::write_records_to_path(
            output,
            &records,
            &self.config.schema.output,
            self.config.output_delimiter_byte()?,
        )?;
        tracing::info!("Wrote {} records to {}", records.len(), output.display());

        summary.log();
        Ok(summary)
    }
}

use serde::Serialize;

use crate::corrector::CorrectionSummary;
use crate::matcher::MatchStats;
use crate::registry::RegistryStats;
use crate::table::LoadReport;

/// Counters describing one pipeline run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Empty when the tables were handed over already parsed.
    pub load: LoadReport,
    pub registry: RegistryStats,
    pub matching: MatchStats,
    pub correction: CorrectionSummary,
    pub records_emitted: usize,
}

impl RunSummary {
    /// Rows or measurements lost to data-quality problems.
    pub fn dropped(&self) -> usize {
        self.load.parse_errors() + self.matching.unmatchable()
    }

    pub fn log(&self) {
        tracing::info!(
            "Run complete: {} records emitted, {} reassigned by majority over {} cells",
            self.records_emitted,
            self.correction.reassigned,
            self.correction.groups
        );

        if self.load.parse_errors() > 0 {
            tracing::warn!(
                "Unparseable rows dropped: supports {}, antennas {}, transmitters {}, measurements {}",
                self.load.supports.parse_errors,
                self.load.antennas.parse_errors,
                self.load.transmitters.parse_errors,
                self.load.measurements.parse_errors
            );
        }
        if self.matching.unmatchable() > 0 {
            tracing::warn!(
                "{} measurements unmatchable ({} nearest support without antennas, {} without usable azimuth)",
                self.matching.unmatchable(),
                self.matching.no_antennas,
                self.matching.no_usable_azimuth
            );
        }
        if self.matching.missing_power > 0 {
            tracing::warn!(
                "{} records have no declared transmitter power",
                self.matching.missing_power
            );
        }
        if self.registry.antennas_without_azimuth > 0 || self.registry.orphan_antennas > 0 {
            tracing::warn!(
                "Antennas: {} without usable azimuth, {} on unknown supports",
                self.registry.antennas_without_azimuth,
                self.registry.orphan_antennas
            );
        }
        if self.registry.duplicate_transmitters > 0 {
            tracing::warn!(
                "{} duplicate transmitter rows, last one kept",
                self.registry.duplicate_transmitters
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_sums_parse_errors_and_unmatchable() {
        let mut summary = RunSummary::default();
        summary.load.antennas.parse_errors = 2;
        summary.load.measurements.parse_errors = 1;
        summary.matching.no_antennas = 1;
        summary.matching.no_usable_azimuth = 3;
        assert_eq!(summary.dropped(), 7);
    }

    #[test]
    fn serializes_as_nested_json() -> anyhow::Result<()> {
        let mut summary = RunSummary::default();
        summary.records_emitted = 4;
        summary.correction.reassigned = 1;

        let json = common::serde::serialize(&summary, common::FileFormat::Json)?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        assert_eq!(value["records_emitted"], 4);
        assert_eq!(value["correction"]["reassigned"], 1);
        assert_eq!(value["load"]["measurements"]["over_limit"], 0);
        Ok(())
    }
}

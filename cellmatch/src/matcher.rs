use serde::Serialize;

use common::float_ext::FloatExt;
use common::parallel::par_map_partitioned;

use crate::config::MatcherConfig;
use crate::error::{MissingPowerWarning, UnmatchableMeasurement};
use crate::geo::{angular_difference, haversine_km, planar_bearing};
use crate::model::{Antenna, AssociationRecord, Measurement};
use crate::power::PowerResolver;
use crate::registry::GeoRegistry;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MatchStats {
    pub matched: usize,
    pub no_antennas: usize,
    pub no_usable_azimuth: usize,
    pub missing_power: usize,
}

impl MatchStats {
    pub fn unmatchable(&self) -> usize {
        self.no_antennas + self.no_usable_azimuth
    }
}

#[derive(Debug, Default)]
pub struct MatchOutcome {
    /// Matched records in measurement order.
    pub records: Vec<AssociationRecord>,
    pub stats: MatchStats,
}

/// Attributes each measurement to the nearest support and the antenna there
/// whose azimuth points closest to the measurement.
#[derive(Debug)]
pub struct SpatialMatcher<'a> {
    registry: &'a GeoRegistry,
    config: MatcherConfig,
}

impl<'a> SpatialMatcher<'a> {
    pub fn new(registry: &'a GeoRegistry, config: MatcherConfig) -> Self {
        Self { registry, config }
    }

    pub fn match_measurement(
        &self,
        measurement_index: usize,
        measurement: &Measurement,
    ) -> Result<AssociationRecord, UnmatchableMeasurement> {
        let support = self
            .registry
            .nearest_support(measurement.latitude, measurement.longitude);

        let antennas = self.registry.antennas_of(&support.id);
        if antennas.is_empty() {
            return Err(UnmatchableMeasurement::NoAntennas {
                support_id: support.id.clone(),
            });
        }

        let bearing = planar_bearing(
            support.latitude,
            support.longitude,
            measurement.latitude,
            measurement.longitude,
        );
        let (antenna, azimuth) =
            best_aligned_antenna(antennas, bearing).ok_or_else(|| {
                UnmatchableMeasurement::NoUsableAzimuth {
                    support_id: support.id.clone(),
                }
            })?;

        let distance = haversine_km(
            measurement.latitude,
            measurement.longitude,
            support.latitude,
            support.longitude,
            self.config.earth_radius_km,
        )
        .round_to(self.config.distance_decimals);

        Ok(AssociationRecord {
            measurement_index,
            measurement: measurement.clone(),
            support_id: support.id.clone(),
            matched_support_id: support.id.clone(),
            antenna_id: antenna.antenna_id.clone(),
            antenna_azimuth: azimuth,
            bearing_deg: bearing,
            distance_km: distance,
            power: self.registry.power_of(&support.id, &antenna.antenna_id),
        })
    }

    /// Matches every measurement in parallel. Unmatchable measurements are
    /// counted and left out; the rest keep their input order.
    pub fn match_all(&self, measurements: &[Measurement]) -> MatchOutcome {
        let indices: Vec<usize> = (0..measurements.len()).collect();
        let results =
            par_map_partitioned(&indices, |&idx| self.match_measurement(idx, &measurements[idx]));

        let mut outcome = MatchOutcome {
            records: Vec::with_capacity(results.len()),
            stats: MatchStats::default(),
        };

        for result in results {
            match result {
                Ok(record) => {
                    if record.power.is_none() {
                        outcome.stats.missing_power += 1;
                        let warning = MissingPowerWarning {
                            support_id: record.support_id.clone(),
                            antenna_id: record.antenna_id.clone(),
                        };
                        tracing::trace!("Measurement {}: {}", record.measurement_index, warning);
                    }
                    outcome.stats.matched += 1;
                    outcome.records.push(record);
                }
                Err(reason) => {
                    match reason {
                        UnmatchableMeasurement::NoAntennas { .. } => outcome.stats.no_antennas += 1,
                        UnmatchableMeasurement::NoUsableAzimuth { .. } => {
                            outcome.stats.no_usable_azimuth += 1
                        }
                    }
                    tracing::debug!("Measurement dropped: {}", reason);
                }
            }
        }

        outcome
    }
}

/// The antenna with the smallest circular difference to `bearing`, skipping
/// antennas without an azimuth. The first one wins on ties.
fn best_aligned_antenna(antennas: &[Antenna], bearing: f64) -> Option<(&Antenna, f64)> {
    let mut best: Option<(&Antenna, f64, f64)> = None;
    for antenna in antennas {
        let Some(azimuth) = antenna.azimuth else {
            continue;
        };
        let diff = angular_difference(azimuth, bearing);
        match best {
            Some((_, _, best_diff)) if diff >= best_diff => {}
            _ => best = Some((antenna, azimuth, diff)),
        }
    }
    best.map(|(antenna, azimuth, _)| (antenna, azimuth))
}

use glam::DVec2;
use hashbrown::{HashMap, HashSet};
use serde::Serialize;

use crate::config::RegionBounds;
use crate::error::{AssociationError, AssociationResult};
use crate::model::{Antenna, AntennaId, Support, SupportId, Transmitter};
use crate::power::{PowerResolver, PowerTable};
use crate::spatial::KdTree;

/// Counts gathered while building the registry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub supports: usize,
    pub supports_out_of_region: usize,
    pub antennas: usize,
    pub antennas_without_azimuth: usize,
    /// Antennas whose support is not in the registry.
    pub orphan_antennas: usize,
    pub transmitters: usize,
    pub duplicate_transmitters: usize,
}

/// Read-only reference data for one run: supports with their spatial index,
/// antennas per support and declared transmitter powers.
#[derive(Debug)]
pub struct GeoRegistry {
    supports: Vec<Support>,
    tree: KdTree,
    antennas: HashMap<SupportId, Vec<Antenna>>,
    powers: PowerTable,
    stats: RegistryStats,
}

impl GeoRegistry {
    /// Builds the registry, discarding supports outside `region`.
    ///
    /// Antennas keep their input order per support. Fails with
    /// [`AssociationError::RegistryEmpty`] if no support survives.
    pub fn build(
        supports: Vec<Support>,
        antennas: Vec<Antenna>,
        transmitters: &[Transmitter],
        region: &RegionBounds,
    ) -> AssociationResult<Self> {
        let total_supports = supports.len();
        let supports: Vec<Support> = supports
            .into_iter()
            .filter(|support| region.contains(support.latitude, support.longitude))
            .collect();

        let mut stats = RegistryStats {
            supports: supports.len(),
            supports_out_of_region: total_supports - supports.len(),
            transmitters: transmitters.len(),
            ..Default::default()
        };

        let points: Vec<DVec2> = supports
            .iter()
            .map(|support| DVec2::new(support.latitude, support.longitude))
            .collect();
        let tree = KdTree::build_with_tie_ranks(&points, tie_ranks(&supports))
            .ok_or(AssociationError::RegistryEmpty { region: *region })?;

        let known: HashSet<&SupportId> = supports.iter().map(|support| &support.id).collect();
        let mut by_support: HashMap<SupportId, Vec<Antenna>> = HashMap::new();
        for antenna in antennas {
            stats.antennas += 1;
            if antenna.azimuth.is_none() {
                stats.antennas_without_azimuth += 1;
            }
            if !known.contains(&antenna.support_id) {
                stats.orphan_antennas += 1;
                continue;
            }
            by_support
                .entry(antenna.support_id.clone())
                .or_default()
                .push(antenna);
        }
        drop(known);

        let powers = PowerTable::new(transmitters);
        stats.duplicate_transmitters = powers.duplicates();

        tracing::info!(
            "Registry built: {} supports ({} outside {}), {} antennas on {} supports, {} transmitters",
            stats.supports,
            stats.supports_out_of_region,
            region,
            stats.antennas - stats.orphan_antennas,
            by_support.len(),
            powers.len()
        );
        if stats.orphan_antennas > 0 {
            tracing::debug!(
                "{} antennas reference supports missing from the registry",
                stats.orphan_antennas
            );
        }

        Ok(Self {
            supports,
            tree,
            antennas: by_support,
            powers,
            stats,
        })
    }

    /// Nearest support by planar distance in degree space. Exact ties go to
    /// the lexicographically smaller identifier, then to the earlier row.
    pub fn nearest_support(&self, latitude: f64, longitude: f64) -> &Support {
        let neighbor = self
            .tree
            .nearest(DVec2::new(latitude, longitude))
            .expect("registry holds at least one support");
        &self.supports[neighbor.index]
    }

    /// Antennas of a support in input order; empty if it has none.
    pub fn antennas_of(&self, support_id: &SupportId) -> &[Antenna] {
        self.antennas
            .get(support_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn supports(&self) -> &[Support] {
        &self.supports
    }

    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }
}

impl PowerResolver for GeoRegistry {
    fn power_of(&self, support_id: &SupportId, antenna_id: &AntennaId) -> Option<f64> {
        self.powers.power_of(support_id, antenna_id)
    }
}

/// Rank of each support when sorted by (identifier, input position).
fn tie_ranks(supports: &[Support]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..supports.len()).collect();
    order.sort_by(|&a, &b| supports[a].id.cmp(&supports[b].id).then(a.cmp(&b)));

    let mut ranks = vec![0; supports.len()];
    for (rank, idx) in order.into_iter().enumerate() {
        ranks[idx] = rank;
    }
    ranks
}

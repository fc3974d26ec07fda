//! Majority correction: every record of one cell identifier ends up on the
//! support most of that cell's measurements were matched to.
//!
//! Only `support_id` is rewritten. Antenna, bearing and distance stay those
//! computed against the point-wise match (`matched_support_id`).

use hashbrown::HashMap;
use rayon::prelude::*;
use serde::Serialize;

use crate::model::{AssociationRecord, CellId, SupportId};

/// Per-cell tally of point-wise matched supports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoteCounter {
    votes: HashMap<SupportId, usize>,
}

impl VoteCounter {
    pub fn add(&mut self, support_id: &SupportId) {
        *self.votes.entry(support_id.clone()).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: VoteCounter) {
        for (support_id, count) in other.votes {
            *self.votes.entry(support_id).or_insert(0) += count;
        }
    }

    pub fn count(&self, support_id: &SupportId) -> usize {
        self.votes.get(support_id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.votes.values().sum()
    }

    pub fn distinct(&self) -> usize {
        self.votes.len()
    }

    /// Most voted support; ties go to the smallest identifier.
    pub fn winner(&self) -> Option<&SupportId> {
        self.votes
            .iter()
            .max_by(|(a_id, a_count), (b_id, b_count)| {
                a_count.cmp(b_count).then_with(|| b_id.cmp(a_id))
            })
            .map(|(support_id, _)| support_id)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CorrectionSummary {
    /// Distinct non-empty cell identifiers.
    pub groups: usize,
    /// Groups whose records were matched to more than one support.
    pub contested_groups: usize,
    /// Records whose support changed.
    pub reassigned: usize,
    /// Records without a cell identifier, left as matched.
    pub ungrouped: usize,
}

/// Counts point-wise supports per cell identifier (parallel map-reduce).
/// Records with an empty cell identifier are not counted.
pub fn tally(records: &[AssociationRecord]) -> HashMap<CellId, VoteCounter> {
    records
        .par_iter()
        .filter(|record| !record.measurement.cell_id.is_empty())
        .fold(HashMap::new, |mut acc: HashMap<CellId, VoteCounter>, record| {
            acc.entry(record.measurement.cell_id.clone())
                .or_default()
                .add(&record.matched_support_id);
            acc
        })
        .reduce(HashMap::new, |mut acc, other| {
            for (cell_id, counter) in other {
                acc.entry(cell_id).or_default().merge(counter);
            }
            acc
        })
}

/// Dominant support of every cell identifier.
pub fn dominant_supports(tallies: &HashMap<CellId, VoteCounter>) -> HashMap<CellId, SupportId> {
    tallies
        .iter()
        .filter_map(|(cell_id, counter)| {
            counter
                .winner()
                .map(|support_id| (cell_id.clone(), support_id.clone()))
        })
        .collect()
}

/// Rewrites `support_id` of every record to its cell's dominant support.
///
/// The result depends only on the multiset of (cell, support) matches, not on
/// record order.
pub fn correct(records: &mut [AssociationRecord]) -> CorrectionSummary {
    let tallies = tally(records);
    let dominant = dominant_supports(&tallies);

    records.par_iter_mut().for_each(|record| {
        if let Some(support_id) = dominant.get(&record.measurement.cell_id) {
            record.support_id = support_id.clone();
        }
    });

    let summary = CorrectionSummary {
        groups: tallies.len(),
        contested_groups: tallies.values().filter(|c| c.distinct() > 1).count(),
        reassigned: records.iter().filter(|r| r.was_reassigned()).count(),
        ungrouped: records
            .iter()
            .filter(|r| r.measurement.cell_id.is_empty())
            .count(),
    };

    tracing::info!(
        "Majority correction: {} cell groups ({} contested), {} records reassigned",
        summary.groups,
        summary.contested_groups,
        summary.reassigned
    );

    summary
}

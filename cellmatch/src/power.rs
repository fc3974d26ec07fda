use hashbrown::HashMap;

use crate::model::{AntennaId, SupportId, Transmitter};

/// Resolves the declared transmitter power of a (support, antenna) pair.
pub trait PowerResolver {
    fn power_of(&self, support_id: &SupportId, antenna_id: &AntennaId) -> Option<f64>;
}

/// Declared power keyed by (support, antenna).
///
/// When the transmitter table lists a pair more than once, the last row in
/// input order wins.
#[derive(Debug, Default)]
pub struct PowerTable {
    powers: HashMap<(SupportId, AntennaId), f64>,
    duplicates: usize,
}

impl PowerTable {
    pub fn new(transmitters: &[Transmitter]) -> Self {
        let mut table = PowerTable {
            powers: HashMap::with_capacity(transmitters.len()),
            duplicates: 0,
        };
        for transmitter in transmitters {
            let key = (transmitter.support_id.clone(), transmitter.antenna_id.clone());
            if table.powers.insert(key, transmitter.power).is_some() {
                table.duplicates += 1;
            }
        }
        table
    }

    pub fn len(&self) -> usize {
        self.powers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.powers.is_empty()
    }

    /// Rows that overwrote an earlier row for the same pair.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

impl PowerResolver for PowerTable {
    fn power_of(&self, support_id: &SupportId, antenna_id: &AntennaId) -> Option<f64> {
        self.powers
            .get(&(support_id.clone(), antenna_id.clone()))
            .copied()
    }
}

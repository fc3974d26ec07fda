use serde::{Deserialize, Serialize};

use common::str_id_type;

str_id_type!(SupportId);
str_id_type!(AntennaId);
str_id_type!(CellId);

/// A tower or mast location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Support {
    pub id: SupportId,
    pub latitude: f64,
    pub longitude: f64,
}

/// A directional element mounted on a support.
///
/// `azimuth` is `None` when the source cell was empty or unparseable; such an
/// antenna is never a matching candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Antenna {
    pub support_id: SupportId,
    pub antenna_id: AntennaId,
    pub azimuth: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transmitter {
    pub support_id: SupportId,
    pub antenna_id: AntennaId,
    pub power: f64,
}

/// A field-collected signal report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub latitude: f64,
    pub longitude: f64,
    pub cell_id: CellId,
    pub received_power: f64,
    pub pci: String,
    pub band: String,
}

/// A measurement joined with the support and antenna it was attributed to.
///
/// Geometry (`bearing_deg`, `distance_km`, antenna fields) always refers to
/// `matched_support_id`. After majority correction `support_id` may differ
/// from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssociationRecord {
    pub measurement_index: usize,
    pub measurement: Measurement,
    pub support_id: SupportId,
    pub matched_support_id: SupportId,
    pub antenna_id: AntennaId,
    pub antenna_azimuth: f64,
    pub bearing_deg: f64,
    pub distance_km: f64,
    pub power: Option<f64>,
}

impl AssociationRecord {
    pub fn was_reassigned(&self) -> bool {
        self.support_id != self.matched_support_id
    }
}

/// Parsed reference and measurement tables, ready for a pipeline run.
#[derive(Clone, Debug, Default)]
pub struct InputTables {
    pub supports: Vec<Support>,
    pub antennas: Vec<Antenna>,
    pub transmitters: Vec<Transmitter>,
    pub measurements: Vec<Measurement>,
}

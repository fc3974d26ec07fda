use std::path::PathBuf;

use thiserror::Error;

use crate::config::{RegionBounds, TableKind};
use crate::model::{AntennaId, SupportId};

/// Fatal conditions. Any of these aborts the run before output is written.
#[derive(Debug, Error)]
pub enum AssociationError {
    #[error("No valid supports remain after filtering to {region}; nothing can be matched")]
    RegistryEmpty { region: RegionBounds },

    #[error("Table '{table}' has no column '{column}' for field '{field}'")]
    MissingColumn {
        table: TableKind,
        field: String,
        column: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {context}: {source}")]
    Csv { context: String, source: csv::Error },

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type AssociationResult<T> = Result<T, AssociationError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config '{path}': {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Region bounds are inverted or not finite: {0}")]
    InvalidRegion(RegionBounds),

    #[error("Earth radius must be positive, got {0}")]
    InvalidEarthRadius(f64),

    #[error("Distance decimals must be at most 12, got {0}")]
    InvalidDistanceDecimals(u32),

    #[error("Worker count must be at least 1")]
    ZeroWorkers,

    #[error("Delimiter {0:?} must be a single ASCII punctuation or whitespace character")]
    InvalidDelimiter(char),

    #[error("Empty column name for field '{field}' of table '{table}'")]
    EmptyColumnName { table: TableKind, field: String },
}

/// A single input row that could not be turned into a record. The row is
/// dropped and the run continues.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{table} line {line}: field '{field}' has unusable value {value:?}")]
pub struct RowParseError {
    pub table: TableKind,
    pub line: u64,
    pub field: String,
    pub value: String,
}

/// A measurement with no antenna it can be attributed to. The measurement is
/// dropped and the run continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnmatchableMeasurement {
    #[error("nearest support {support_id} has no antennas")]
    NoAntennas { support_id: SupportId },

    #[error("no antenna of nearest support {support_id} has a usable azimuth")]
    NoUsableAzimuth { support_id: SupportId },
}

/// A matched (support, antenna) pair without a declared transmitter power.
/// The record is kept with an empty power field.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("no transmitter power declared for support {support_id}, antenna {antenna_id}")]
pub struct MissingPowerWarning {
    pub support_id: SupportId,
    pub antenna_id: AntennaId,
}

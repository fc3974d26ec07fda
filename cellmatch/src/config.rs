//! Run configuration.
//!
//! Everything the engine needs besides the input tables: region bounds,
//! geometric constants, parallelism, delimiters, and the column schema mapping
//! logical fields to source column names. Every field has a default, so an
//! empty YAML/JSON document is a valid configuration.

use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::error::ConfigError;
use crate::geo::DEFAULT_EARTH_RADIUS_KM;

// ============================================================================
// Tables and logical fields
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum TableKind {
    Supports,
    Antennas,
    Transmitters,
    Measurements,
    Output,
}

/// A logical column of one input table.
pub trait TableField:
    Copy + Eq + Hash + Debug + Display + IntoEnumIterator + Serialize + DeserializeOwned + 'static
{
    const TABLE: TableKind;

    fn default_column(self) -> &'static str;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SupportField {
    Id,
    Latitude,
    Longitude,
}

impl TableField for SupportField {
    const TABLE: TableKind = TableKind::Supports;

    fn default_column(self) -> &'static str {
        match self {
            SupportField::Id => "STA_NM_ANFR",
            SupportField::Latitude => "LAT_DECIMAL",
            SupportField::Longitude => "LON_DECIMAL",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AntennaField {
    SupportId,
    AntennaId,
    Azimuth,
}

impl TableField for AntennaField {
    const TABLE: TableKind = TableKind::Antennas;

    fn default_column(self) -> &'static str {
        match self {
            AntennaField::SupportId => "STA_NM_ANFR",
            AntennaField::AntennaId => "AER_ID",
            AntennaField::Azimuth => "AER_NB_AZIMUT",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransmitterField {
    SupportId,
    AntennaId,
    Power,
}

impl TableField for TransmitterField {
    const TABLE: TableKind = TableKind::Transmitters;

    fn default_column(self) -> &'static str {
        match self {
            TransmitterField::SupportId => "STA_NM_ANFR",
            TransmitterField::AntennaId => "AER_ID",
            TransmitterField::Power => "EMR_NB_PUISSANCE",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MeasurementField {
    Latitude,
    Longitude,
    CellId,
    ReceivedPower,
    Pci,
    Band,
}

impl TableField for MeasurementField {
    const TABLE: TableKind = TableKind::Measurements;

    fn default_column(self) -> &'static str {
        match self {
            MeasurementField::Latitude => "latitude",
            MeasurementField::Longitude => "longitude",
            MeasurementField::CellId => "tm_cid",
            MeasurementField::ReceivedPower => "tm_dbm",
            MeasurementField::Pci => "pci",
            MeasurementField::Band => "band_table",
        }
    }
}

/// Columns of the association output, in the order they are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutputField {
    Latitude,
    Longitude,
    CellId,
    ReceivedPower,
    Pci,
    Band,
    SupportId,
    AntennaId,
    Azimuth,
    Bearing,
    Distance,
    Power,
}

impl TableField for OutputField {
    const TABLE: TableKind = TableKind::Output;

    fn default_column(self) -> &'static str {
        match self {
            OutputField::Latitude => "latitude",
            OutputField::Longitude => "longitude",
            OutputField::CellId => "tm_cid",
            OutputField::ReceivedPower => "tm_dbm",
            OutputField::Pci => "pci",
            OutputField::Band => "band_table",
            OutputField::SupportId => "STA_NM_ANFR",
            OutputField::AntennaId => "AER_ID",
            OutputField::Azimuth => "AER_NB_AZIMUT",
            OutputField::Bearing => "angle_vers_antenne",
            OutputField::Distance => "distance_to_support_km",
            OutputField::Power => "EMR_NB_PUISSANCE",
        }
    }
}

/// Logical field to source column name, for one table.
///
/// Only overrides are stored; unmapped fields use their default column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent, bound = "F: TableField")]
pub struct ColumnMap<F: TableField> {
    overrides: HashMap<F, String>,
}

impl<F: TableField> Default for ColumnMap<F> {
    fn default() -> Self {
        Self {
            overrides: HashMap::new(),
        }
    }
}

impl<F: TableField> ColumnMap<F> {
    pub fn with_column(mut self, field: F, column: &str) -> Self {
        self.overrides.insert(field, column.to_string());
        self
    }

    pub fn column(&self, field: F) -> &str {
        self.overrides
            .get(&field)
            .map_or_else(|| field.default_column(), String::as_str)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for field in F::iter() {
            if self.column(field).trim().is_empty() {
                return Err(ConfigError::EmptyColumnName {
                    table: F::TABLE,
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Schema {
    pub supports: ColumnMap<SupportField>,
    pub antennas: ColumnMap<AntennaField>,
    pub transmitters: ColumnMap<TransmitterField>,
    pub measurements: ColumnMap<MeasurementField>,
    pub output: ColumnMap<OutputField>,
}

impl Schema {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.supports.validate()?;
        self.antennas.validate()?;
        self.transmitters.validate()?;
        self.measurements.validate()?;
        self.output.validate()
    }
}

// ============================================================================
// Region and matcher parameters
// ============================================================================

/// Inclusive latitude/longitude box of the deployment region.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegionBounds {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl Default for RegionBounds {
    fn default() -> Self {
        Self {
            min_latitude: 42.0,
            max_latitude: 52.0,
            min_longitude: -5.0,
            max_longitude: 9.0,
        }
    }
}

impl RegionBounds {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&latitude)
            && (self.min_longitude..=self.max_longitude).contains(&longitude)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            self.min_latitude,
            self.max_latitude,
            self.min_longitude,
            self.max_longitude,
        ]
        .iter()
        .all(|v| v.is_finite());

        if !finite
            || self.min_latitude > self.max_latitude
            || self.min_longitude > self.max_longitude
        {
            return Err(ConfigError::InvalidRegion(*self));
        }
        Ok(())
    }
}

impl Display for RegionBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lat [{}, {}], lon [{}, {}]",
            self.min_latitude, self.max_latitude, self.min_longitude, self.max_longitude
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatcherConfig {
    pub earth_radius_km: f64,
    /// Decimal places kept in the reported distance.
    pub distance_decimals: u32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            earth_radius_km: DEFAULT_EARTH_RADIUS_KM,
            distance_decimals: 3,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.earth_radius_km.is_finite() || self.earth_radius_km <= 0.0 {
            return Err(ConfigError::InvalidEarthRadius(self.earth_radius_km));
        }
        if self.distance_decimals > 12 {
            return Err(ConfigError::InvalidDistanceDecimals(self.distance_decimals));
        }
        Ok(())
    }
}

// ============================================================================
// Top-level configuration
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssociationConfig {
    pub region: RegionBounds,
    pub matcher: MatcherConfig,
    /// Drop measurements outside `region` while loading.
    pub filter_measurements_by_region: bool,
    /// Process only the first N measurements that survive loading.
    pub max_measurements: Option<usize>,
    /// Matching threads; `None` uses the global rayon pool.
    pub workers: Option<usize>,
    pub input_delimiter: char,
    pub output_delimiter: char,
    pub schema: Schema,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            region: RegionBounds::default(),
            matcher: MatcherConfig::default(),
            filter_measurements_by_region: true,
            max_measurements: None,
            workers: None,
            input_delimiter: ';',
            output_delimiter: ',',
            schema: Schema::default(),
        }
    }
}

impl AssociationConfig {
    /// Loads a YAML or JSON file (by extension) and validates it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: AssociationConfig =
            common::serde::load_file(path).map_err(|err| ConfigError::Load {
                path: PathBuf::from(path),
                reason: format!("{err:#}"),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.region.validate()?;
        self.matcher.validate()?;
        if self.workers == Some(0) {
            return Err(ConfigError::ZeroWorkers);
        }
        delimiter_byte(self.input_delimiter)?;
        delimiter_byte(self.output_delimiter)?;
        self.schema.validate()
    }

    pub fn input_delimiter_byte(&self) -> Result<u8, ConfigError> {
        delimiter_byte(self.input_delimiter)
    }

    pub fn output_delimiter_byte(&self) -> Result<u8, ConfigError> {
        delimiter_byte(self.output_delimiter)
    }
}

fn delimiter_byte(delimiter: char) -> Result<u8, ConfigError> {
    if delimiter.is_ascii() && !delimiter.is_ascii_alphanumeric() && delimiter != '"' {
        Ok(delimiter as u8)
    } else {
        Err(ConfigError::InvalidDelimiter(delimiter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::FileFormat;

    #[test]
    fn defaults_are_valid() {
        AssociationConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_document_yields_defaults() -> anyhow::Result<()> {
        let config: AssociationConfig = common::serde::deserialize(b"{}", FileFormat::Json)?;
        assert_eq!(config, AssociationConfig::default());
        Ok(())
    }

    #[test]
    fn schema_overrides_from_yaml() -> anyhow::Result<()> {
        let yaml = "\
schema:
  supports:
    id: SUPPORT_ID
  measurements:
    cell_id: cid
region:
  min_latitude: 40.0
";
        let config: AssociationConfig = common::serde::deserialize(yaml.as_bytes(), FileFormat::Yaml)?;
        config.validate()?;

        assert_eq!(config.schema.supports.column(SupportField::Id), "SUPPORT_ID");
        assert_eq!(config.schema.supports.column(SupportField::Latitude), "LAT_DECIMAL");
        assert_eq!(config.schema.measurements.column(MeasurementField::CellId), "cid");
        assert_eq!(config.region.min_latitude, 40.0);
        assert_eq!(config.region.max_latitude, 52.0);
        Ok(())
    }

    #[test]
    fn output_columns_default_and_override() -> anyhow::Result<()> {
        let yaml = "schema:\n  output:\n    bearing: bearing_deg\n";
        let config: AssociationConfig = common::serde::deserialize(yaml.as_bytes(), FileFormat::Yaml)?;
        config.validate()?;

        assert_eq!(config.schema.output.column(OutputField::Bearing), "bearing_deg");
        assert_eq!(config.schema.output.column(OutputField::SupportId), "STA_NM_ANFR");
        assert_eq!(config.schema.output.column(OutputField::Power), "EMR_NB_PUISSANCE");
        Ok(())
    }

    #[test]
    fn unknown_logical_field_is_rejected() {
        let yaml = "schema:\n  supports:\n    height: H\n";
        let result: anyhow::Result<AssociationConfig> =
            common::serde::deserialize(yaml.as_bytes(), FileFormat::Yaml);
        assert!(result.is_err());
    }

    #[test]
    fn empty_column_name_is_rejected() {
        let mut config = AssociationConfig::default();
        config.schema.antennas = ColumnMap::default().with_column(AntennaField::Azimuth, "  ");
        match config.validate() {
            Err(ConfigError::EmptyColumnName { table, field }) => {
                assert_eq!(table, TableKind::Antennas);
                assert_eq!(field, "azimuth");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn inverted_region_is_rejected() {
        let mut config = AssociationConfig::default();
        config.region.min_longitude = 10.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRegion(_))));
    }

    #[test]
    fn bad_radius_workers_and_delimiters_are_rejected() {
        let mut config = AssociationConfig::default();
        config.matcher.earth_radius_km = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidEarthRadius(_))));

        let mut config = AssociationConfig::default();
        config.workers = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroWorkers)));

        let mut config = AssociationConfig::default();
        config.input_delimiter = 'é';
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDelimiter('é'))));
    }

    #[test]
    fn region_contains_is_inclusive() {
        let region = RegionBounds::default();
        assert!(region.contains(42.0, -5.0));
        assert!(region.contains(52.0, 9.0));
        assert!(!region.contains(41.999, 2.0));
        assert!(!region.contains(45.0, 9.001));
        assert!(!region.contains(f64::NAN, 2.0));
    }
}

//! Delimited-text input tables and the association output table.
//!
//! Input columns are located through the configured [`ColumnMap`]s: a missing
//! required column aborts the load, a malformed row is dropped and counted.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use hashbrown::HashMap;
use serde::Serialize;
use strum::IntoEnumIterator;

use common::locale_float::ParseLocaleFloat;

use crate::config::{
    AntennaField, AssociationConfig, ColumnMap, MeasurementField, OutputField, SupportField,
    TableField, TableKind, TransmitterField,
};
use crate::error::{AssociationError, AssociationResult, RowParseError};
use crate::model::{Antenna, AssociationRecord, InputTables, Measurement, Support, Transmitter};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub rows: usize,
    pub loaded: usize,
    pub parse_errors: usize,
    pub out_of_region: usize,
    /// Rows beyond the configured measurement limit.
    pub over_limit: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub supports: TableStats,
    pub antennas: TableStats,
    pub transmitters: TableStats,
    pub measurements: TableStats,
}

impl LoadReport {
    pub fn parse_errors(&self) -> usize {
        self.supports.parse_errors
            + self.antennas.parse_errors
            + self.transmitters.parse_errors
            + self.measurements.parse_errors
    }
}

#[derive(Debug)]
pub struct TableLoad<T> {
    pub rows: Vec<T>,
    pub stats: TableStats,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputPaths {
    pub supports: PathBuf,
    pub antennas: PathBuf,
    pub transmitters: PathBuf,
    pub measurements: PathBuf,
}

// ============================================================================
// Row access
// ============================================================================

/// One input row with its columns resolved against the schema.
pub struct RowView<'a, F: TableField> {
    record: &'a StringRecord,
    columns: &'a HashMap<F, usize>,
    line: u64,
}

impl<'a, F: TableField> RowView<'a, F> {
    /// Trimmed cell text; short rows read as empty.
    pub fn text(&self, field: F) -> &'a str {
        self.columns
            .get(&field)
            .and_then(|&idx| self.record.get(idx))
            .map_or("", str::trim)
    }

    pub fn required_text(&self, field: F) -> Result<&'a str, RowParseError> {
        let text = self.text(field);
        if text.is_empty() {
            return Err(self.error(field, text));
        }
        Ok(text)
    }

    pub fn float(&self, field: F) -> Result<f64, RowParseError> {
        let text = self.text(field);
        text.parse_locale_f64().ok_or_else(|| self.error(field, text))
    }

    pub fn optional_float(&self, field: F) -> Option<f64> {
        self.text(field).parse_locale_f64()
    }

    fn error(&self, field: F, value: &str) -> RowParseError {
        RowParseError {
            table: F::TABLE,
            line: self.line,
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

fn parse_support(row: &RowView<'_, SupportField>) -> Result<Support, RowParseError> {
    Ok(Support {
        id: row.required_text(SupportField::Id)?.into(),
        latitude: row.float(SupportField::Latitude)?,
        longitude: row.float(SupportField::Longitude)?,
    })
}

fn parse_antenna(row: &RowView<'_, AntennaField>) -> Result<Antenna, RowParseError> {
    Ok(Antenna {
        support_id: row.required_text(AntennaField::SupportId)?.into(),
        antenna_id: row.required_text(AntennaField::AntennaId)?.into(),
        azimuth: row.optional_float(AntennaField::Azimuth),
    })
}

fn parse_transmitter(row: &RowView<'_, TransmitterField>) -> Result<Transmitter, RowParseError> {
    Ok(Transmitter {
        support_id: row.required_text(TransmitterField::SupportId)?.into(),
        antenna_id: row.required_text(TransmitterField::AntennaId)?.into(),
        power: row.float(TransmitterField::Power)?,
    })
}

fn parse_measurement(row: &RowView<'_, MeasurementField>) -> Result<Measurement, RowParseError> {
    Ok(Measurement {
        latitude: row.float(MeasurementField::Latitude)?,
        longitude: row.float(MeasurementField::Longitude)?,
        cell_id: row.text(MeasurementField::CellId).into(),
        received_power: row.float(MeasurementField::ReceivedPower)?,
        pci: row.text(MeasurementField::Pci).to_string(),
        band: row.text(MeasurementField::Band).to_string(),
    })
}

// ============================================================================
// Reading
// ============================================================================

/// Maps every logical field to its index in `headers`.
pub fn resolve_columns<F: TableField>(
    headers: &StringRecord,
    columns: &ColumnMap<F>,
) -> AssociationResult<HashMap<F, usize>> {
    let mut resolved = HashMap::new();
    for field in F::iter() {
        let column = columns.column(field);
        let idx = headers
            .iter()
            .position(|header| header == column)
            .ok_or_else(|| AssociationError::MissingColumn {
                table: F::TABLE,
                field: field.to_string(),
                column: column.to_string(),
            })?;
        resolved.insert(field, idx);
    }
    Ok(resolved)
}

/// Reads one table, dropping and counting rows `parse_row` rejects.
pub fn read_table<R, F, T, P>(
    reader: R,
    delimiter: u8,
    columns: &ColumnMap<F>,
    parse_row: P,
) -> AssociationResult<TableLoad<T>>
where
    R: io::Read,
    F: TableField,
    P: Fn(&RowView<'_, F>) -> Result<T, RowParseError>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|source| AssociationError::Csv {
            context: format!("{} header", F::TABLE),
            source,
        })?
        .clone();
    let resolved = resolve_columns(&headers, columns)?;

    let mut load = TableLoad {
        rows: Vec::new(),
        stats: TableStats::default(),
    };

    for result in csv_reader.records() {
        load.stats.rows += 1;
        let record = match result {
            Ok(record) => record,
            Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => {
                return Err(AssociationError::Csv {
                    context: format!("{} rows", F::TABLE),
                    source: err,
                });
            }
            Err(err) => {
                load.stats.parse_errors += 1;
                tracing::debug!("{}: unreadable row: {}", F::TABLE, err);
                continue;
            }
        };

        let row = RowView {
            record: &record,
            columns: &resolved,
            line: record.position().map_or(0, |p| p.line()),
        };
        match parse_row(&row) {
            Ok(value) => load.rows.push(value),
            Err(err) => {
                load.stats.parse_errors += 1;
                tracing::debug!("Row dropped: {}", err);
            }
        }
    }

    load.stats.loaded = load.rows.len();
    Ok(load)
}

pub fn read_supports<R: io::Read>(
    reader: R,
    config: &AssociationConfig,
) -> AssociationResult<TableLoad<Support>> {
    read_table(
        reader,
        config.input_delimiter_byte()?,
        &config.schema.supports,
        parse_support,
    )
}

pub fn read_antennas<R: io::Read>(
    reader: R,
    config: &AssociationConfig,
) -> AssociationResult<TableLoad<Antenna>> {
    read_table(
        reader,
        config.input_delimiter_byte()?,
        &config.schema.antennas,
        parse_antenna,
    )
}

pub fn read_transmitters<R: io::Read>(
    reader: R,
    config: &AssociationConfig,
) -> AssociationResult<TableLoad<Transmitter>> {
    read_table(
        reader,
        config.input_delimiter_byte()?,
        &config.schema.transmitters,
        parse_transmitter,
    )
}

/// Reads measurements, then applies the region filter and the row limit.
pub fn read_measurements<R: io::Read>(
    reader: R,
    config: &AssociationConfig,
) -> AssociationResult<TableLoad<Measurement>> {
    let mut load = read_table(
        reader,
        config.input_delimiter_byte()?,
        &config.schema.measurements,
        parse_measurement,
    )?;

    if config.filter_measurements_by_region {
        let before = load.rows.len();
        load.rows
            .retain(|m| config.region.contains(m.latitude, m.longitude));
        load.stats.out_of_region = before - load.rows.len();
    }

    if let Some(limit) = config.max_measurements {
        if load.rows.len() > limit {
            load.stats.over_limit = load.rows.len() - limit;
            load.rows.truncate(limit);
        }
    }

    load.stats.loaded = load.rows.len();
    Ok(load)
}

fn open(path: &Path) -> AssociationResult<File> {
    File::open(path).map_err(|source| AssociationError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads all four tables from disk.
pub fn load_tables(
    paths: &InputPaths,
    config: &AssociationConfig,
) -> AssociationResult<(InputTables, LoadReport)> {
    let supports = read_supports(open(&paths.supports)?, config)?;
    let antennas = read_antennas(open(&paths.antennas)?, config)?;
    let transmitters = read_transmitters(open(&paths.transmitters)?, config)?;
    let measurements = read_measurements(open(&paths.measurements)?, config)?;

    for (table, stats) in [
        (TableKind::Supports, &supports.stats),
        (TableKind::Antennas, &antennas.stats),
        (TableKind::Transmitters, &transmitters.stats),
        (TableKind::Measurements, &measurements.stats),
    ] {
        tracing::info!(
            "Loaded {}: {} of {} rows ({} unparseable)",
            table,
            stats.loaded,
            stats.rows,
            stats.parse_errors
        );
    }

    let report = LoadReport {
        supports: supports.stats,
        antennas: antennas.stats,
        transmitters: transmitters.stats,
        measurements: measurements.stats,
    };
    let tables = InputTables {
        supports: supports.rows,
        antennas: antennas.rows,
        transmitters: transmitters.rows,
        measurements: measurements.rows,
    };
    Ok((tables, report))
}

// ============================================================================
// Writing
// ============================================================================

/// One output line. Field order follows [`OutputField`]; column names come
/// from the schema, so serde only supplies the values.
#[derive(Serialize)]
struct OutputRow<'a> {
    latitude: f64,
    longitude: f64,
    cell_id: &'a str,
    received_power: f64,
    pci: &'a str,
    band: &'a str,
    support_id: &'a str,
    antenna_id: &'a str,
    azimuth: f64,
    bearing: f64,
    distance: f64,
    power: Option<f64>,
}

impl<'a> From<&'a AssociationRecord> for OutputRow<'a> {
    fn from(record: &'a AssociationRecord) -> Self {
        let m = &record.measurement;
        OutputRow {
            latitude: m.latitude,
            longitude: m.longitude,
            cell_id: m.cell_id.as_str(),
            received_power: m.received_power,
            pci: &m.pci,
            band: &m.band,
            support_id: record.support_id.as_str(),
            antenna_id: record.antenna_id.as_str(),
            azimuth: record.antenna_azimuth,
            bearing: record.bearing_deg,
            distance: record.distance_km,
            power: record.power,
        }
    }
}

/// Writes the header line, then one line per record. The header is written
/// even when `records` is empty.
pub fn write_records<W: io::Write>(
    writer: W,
    records: &[AssociationRecord],
    columns: &ColumnMap<OutputField>,
    delimiter: u8,
) -> AssociationResult<()> {
    let csv_error = |source| AssociationError::Csv {
        context: "association output".to_string(),
        source,
    };

    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(writer);
    csv_writer
        .write_record(OutputField::iter().map(|field| columns.column(field)))
        .map_err(csv_error)?;
    for record in records {
        csv_writer
            .serialize(OutputRow::from(record))
            .map_err(csv_error)?;
    }
    csv_writer.flush().map_err(|source| AssociationError::Io {
        path: PathBuf::from("<output>"),
        source,
    })
}

pub fn write_records_to_path(
    path: &Path,
    records: &[AssociationRecord],
    columns: &ColumnMap<OutputField>,
    delimiter: u8,
) -> AssociationResult<()> {
    let file = File::create(path).map_err(|source| AssociationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_records(io::BufWriter::new(file), records, columns, delimiter)
}

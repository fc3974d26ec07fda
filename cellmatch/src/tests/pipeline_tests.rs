use crate::config::{AntennaField, AssociationConfig, ColumnMap, RegionBounds};
use crate::error::AssociationError;
use crate::model::{Antenna, InputTables, Measurement, Support, Transmitter};
use crate::pipeline::AssociationPipeline;
use crate::table;

fn support(id: &str, latitude: f64, longitude: f64) -> Support {
    Support {
        id: id.into(),
        latitude,
        longitude,
    }
}

fn antenna(support: &str, id: &str, azimuth: f64) -> Antenna {
    Antenna {
        support_id: support.into(),
        antenna_id: id.into(),
        azimuth: Some(azimuth),
    }
}

fn transmitter(support: &str, antenna: &str, power: f64) -> Transmitter {
    Transmitter {
        support_id: support.into(),
        antenna_id: antenna.into(),
        power,
    }
}

fn measurement(latitude: f64, longitude: f64, cell: &str) -> Measurement {
    Measurement {
        latitude,
        longitude,
        cell_id: cell.into(),
        received_power: -90.0,
        pci: "7".to_string(),
        band: "LTE 800".to_string(),
    }
}

fn two_supports(measurements: Vec<Measurement>) -> InputTables {
    InputTables {
        supports: vec![support("S1", 45.0, 2.0), support("S2", 45.0, 2.01)],
        antennas: vec![
            antenna("S1", "A1", 0.0),
            antenna("S1", "A2", 180.0),
            antenna("S2", "B1", 90.0),
            antenna("S2", "B2", 270.0),
        ],
        transmitters: vec![transmitter("S1", "A1", 33.0), transmitter("S2", "B1", 40.0)],
        measurements,
    }
}

fn pipeline() -> AssociationPipeline {
    AssociationPipeline::new(AssociationConfig::default()).unwrap()
}

#[test]
fn nearest_support_and_aligned_antenna() -> anyhow::Result<()> {
    let output = pipeline().run(two_supports(vec![measurement(45.0, 2.0001, "C7")]))?;

    assert_eq!(output.records.len(), 1);
    let record = &output.records[0];
    assert_eq!(record.support_id.as_str(), "S1");
    assert_eq!(record.antenna_id.as_str(), "A1");
    assert_eq!(record.bearing_deg, 0.0);
    assert_eq!(record.distance_km, 0.008);
    assert_eq!(record.power, Some(33.0));
    assert!(!record.was_reassigned());
    Ok(())
}

#[test]
fn majority_of_seven_against_three() -> anyhow::Result<()> {
    let mut measurements: Vec<Measurement> = (0..7)
        .map(|i| measurement(45.0001 + i as f64 * 1e-5, 2.0002, "C9"))
        .collect();
    measurements.extend((0..3).map(|i| measurement(45.0005 + i as f64 * 1e-5, 2.0099, "C9")));

    let output = pipeline().run(two_supports(measurements))?;

    assert_eq!(output.records.len(), 10);
    assert!(output.records.iter().all(|r| r.support_id.as_str() == "S1"));
    let moved: Vec<_> = output.records.iter().filter(|r| r.was_reassigned()).collect();
    assert_eq!(moved.len(), 3);
    for record in moved {
        assert_eq!(record.matched_support_id.as_str(), "S2");
        assert_eq!(record.antenna_id.as_str(), "B1");
        assert_eq!(record.power, Some(40.0));
    }
    assert_eq!(output.summary.correction.reassigned, 3);
    Ok(())
}

#[test]
fn support_without_antennas_is_counted_once() -> anyhow::Result<()> {
    let mut tables = two_supports(vec![
        measurement(45.0, 2.0001, "C1"),
        measurement(48.0001, 2.0, "C2"),
        measurement(45.0, 2.0002, "C1"),
    ]);
    tables.supports.push(support("S3", 48.0, 2.0));

    let output = pipeline().run(tables)?;

    assert_eq!(output.summary.matching.no_antennas, 1);
    assert_eq!(output.summary.matching.unmatchable(), 1);
    assert_eq!(output.records.len(), 2);
    assert_eq!(output.summary.records_emitted, 2);
    Ok(())
}

#[test]
fn records_follow_measurement_order() -> anyhow::Result<()> {
    let measurements: Vec<Measurement> = (0..200)
        .map(|i| {
            let offset = (i % 17) as f64 * 1e-4;
            let longitude = if i % 2 == 0 { 2.0 + offset } else { 2.01 - offset };
            measurement(45.0 + (i % 5) as f64 * 1e-4, longitude, &format!("C{}", i % 11))
        })
        .collect();

    let output = pipeline().run(two_supports(measurements.clone()))?;

    assert_eq!(output.records.len(), measurements.len());
    for (idx, record) in output.records.iter().enumerate() {
        assert_eq!(record.measurement_index, idx);
        assert_eq!(record.measurement, measurements[idx]);
    }
    Ok(())
}

#[test]
fn repeated_runs_are_identical_across_worker_counts() -> anyhow::Result<()> {
    let measurements: Vec<Measurement> = (0..500)
        .map(|i| {
            let t = i as f64 / 500.0;
            measurement(44.999 + t * 0.002, 1.998 + t * 0.014, &format!("C{}", i % 7))
        })
        .collect();

    let run = |workers: Option<usize>| -> anyhow::Result<_> {
        let config = AssociationConfig {
            workers,
            ..Default::default()
        };
        let output = AssociationPipeline::new(config)?.run(two_supports(measurements.clone()))?;
        Ok(output.records)
    };

    let baseline = run(Some(1))?;
    for workers in [Some(1), Some(4), None] {
        assert_eq!(run(workers)?, baseline);
    }
    Ok(())
}

#[test]
fn empty_registry_aborts() {
    let mut tables = two_supports(vec![measurement(45.0, 2.0, "C1")]);
    tables.supports = vec![support("FAR", 10.0, 2.0)];

    let result = pipeline().run(tables);
    assert!(matches!(result, Err(AssociationError::RegistryEmpty { .. })));
}

#[test]
fn narrow_region_drops_supports() -> anyhow::Result<()> {
    let config = AssociationConfig {
        region: RegionBounds {
            min_latitude: 44.0,
            max_latitude: 46.0,
            min_longitude: 2.005,
            max_longitude: 3.0,
        },
        ..Default::default()
    };
    let output = AssociationPipeline::new(config)?
        .run(two_supports(vec![measurement(45.0, 2.0001, "C1")]))?;

    assert_eq!(output.records[0].support_id.as_str(), "S2");
    assert_eq!(output.summary.registry.supports_out_of_region, 1);
    Ok(())
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let config = AssociationConfig {
        workers: Some(0),
        ..Default::default()
    };
    assert!(matches!(
        AssociationPipeline::new(config),
        Err(AssociationError::Config(_))
    ));
}

#[test]
fn renamed_column_missing_from_header() {
    let mut config = AssociationConfig::default();
    config.schema.antennas = ColumnMap::default().with_column(AntennaField::Azimuth, "AZIMUTH");

    let csv = "STA_NM_ANFR;AER_ID;AER_NB_AZIMUT\nS1;A1;0\n";
    match table::read_antennas(csv.as_bytes(), &config) {
        Err(err @ AssociationError::MissingColumn { .. }) => {
            assert_eq!(
                err.to_string(),
                "Table 'antennas' has no column 'AZIMUTH' for field 'azimuth'"
            );
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

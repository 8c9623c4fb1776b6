//! Tests for ACS population counts

use std::collections::{BTreeMap, BTreeSet};

use acs_refiner::algorithm::acs_count::{AcsPopulationTable, acs_row};
use acs_refiner::models::acs::AcsExtract;
use acs_refiner::models::categories::RaceEthnicity;
use acs_refiner::{RefinerError, Result};
use arrow::array::{Array, Float64Array, UInt32Array};

fn extract() -> AcsExtract {
    let columns: BTreeSet<String> = ["EST_18_OVER", "POP_18_M", "POP_18_F"]
        .into_iter()
        .map(String::from)
        .collect();
    let rows = vec![
        acs_row(
            RaceEthnicity::WhiteNH,
            36,
            2012,
            &[("EST_18_OVER", 1_000.0), ("POP_18_M", 48.3), ("POP_18_F", 51.7)],
        ),
        acs_row(
            RaceEthnicity::BlackNH,
            36,
            2012,
            &[("EST_18_OVER", 200.0), ("POP_18_M", 45.5), ("POP_18_F", 54.5)],
        ),
        acs_row(
            RaceEthnicity::WhiteNH,
            48,
            2012,
            &[("EST_18_OVER", 500.0), ("POP_18_M", 50.0), ("POP_18_F", 50.0)],
        ),
    ];
    AcsExtract::new(columns, rows)
}

fn renames() -> BTreeMap<String, String> {
    BTreeMap::from([("EST_18_OVER".to_string(), "POP_18_OVER".to_string())])
}

#[test]
fn test_counts_and_pivot() -> Result<()> {
    let table = AcsPopulationTable::build(extract(), &renames())?;
    assert_eq!(table.rows.len(), 2);

    let ny = &table.rows[0];
    assert_eq!((ny.year, ny.fips), (2012, 36));
    assert_eq!(ny.values["POP_18_OVER_W"], 1_000.0);
    assert_eq!(ny.values["POP_18_M_W"], 483.0);
    assert_eq!(ny.values["POP_18_F_W"], 517.0);
    assert_eq!(ny.values["POP_18_M_B"], 91.0);
    assert_eq!(ny.values["POP_18_F_B"], 109.0);

    // Texas has no BlackNH row, so its BlackNH columns are zero
    let tx = &table.rows[1];
    assert_eq!(tx.values["POP_18_M_W"], 250.0);
    assert_eq!(tx.values["POP_18_OVER_B"], 0.0);
    Ok(())
}

#[test]
fn test_record_batch_layout() -> Result<()> {
    let table = AcsPopulationTable::build(extract(), &renames())?;
    let batch = table.to_record_batch()?;

    assert_eq!(batch.num_rows(), 2);
    assert_eq!(batch.schema().field(0).name(), "YEAR");
    assert_eq!(batch.schema().field(1).name(), "ID2");
    assert_eq!(batch.num_columns(), 2 + 6);

    let fips = batch
        .column(1)
        .as_any()
        .downcast_ref::<UInt32Array>()
        .expect("ID2 is UInt32");
    assert_eq!(fips.values().to_vec(), vec![36, 48]);

    let index = batch.schema().index_of("POP_18_F_B").expect("column exists");
    let black_women = batch
        .column(index)
        .as_any()
        .downcast_ref::<Float64Array>()
        .expect("counts are Float64");
    assert_eq!(black_women.value(1), 0.0);
    assert!(!black_women.is_null(1));
    Ok(())
}

#[test]
fn test_extract_without_age_group_is_rejected() {
    // Without the rename the total column of the only group is missing
    let result = AcsPopulationTable::build(extract(), &BTreeMap::new());
    assert!(matches!(result, Err(RefinerError::MissingColumn { .. })));
}

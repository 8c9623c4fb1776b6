//! End-to-end tests through Parquet files and a run manifest

use std::path::Path;
use std::sync::Arc;

use acs_refiner::algorithm::pipeline::Pipeline;
use acs_refiner::models::output::{AgeCrossTabRow, ArrowSchema};
use acs_refiner::models::record::RawRecord;
use acs_refiner::models::totals::PublishedTotals;
use acs_refiner::utils::io::output::{AGE_TABLE, INCOME_TABLE};
use acs_refiner::utils::io::{OutputWriter, RunInputs, RunManifest, read_parquet, write_parquet};
use acs_refiner::utils::test::{synthetic_totals, synthetic_unit};
use acs_refiner::utils::io::input::load_pums_unit;
use acs_refiner::utils::io::manifest::PumsInput;
use acs_refiner::{RefinerError, Result, UnitKey};
use arrow::array::{ArrayRef, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;

fn batch(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
        .collect();
    RecordBatch::try_new(
        Arc::new(Schema::new(fields)),
        columns.into_iter().map(|(_, array)| array).collect(),
    )
    .unwrap()
}

/// PUMS-style batch with integer codes, as in the published files
fn pums_batch(records: &[RawRecord]) -> RecordBatch {
    let codes = |f: fn(&RawRecord) -> f64| -> ArrayRef {
        Arc::new(Int32Array::from_iter_values(records.iter().map(|r| f(r) as i32)))
    };
    batch(vec![
        ("SERIALNO", Arc::new(Int64Array::from_iter_values(0..records.len() as i64)) as ArrayRef),
        ("PWGTP", codes(|r| r.weight)),
        ("AGEP", codes(|r| r.age)),
        ("SEX", codes(|r| r.sex)),
        ("RAC1P", codes(|r| r.race)),
        ("HISP", codes(|r| r.hispanic)),
        (
            "SCHL",
            Arc::new(Int32Array::from_iter(
                records.iter().map(|r| r.schooling.map(|v| v as i32)),
            )) as ArrayRef,
        ),
        (
            "PINCP",
            Arc::new(Float64Array::from_iter(records.iter().map(|r| r.income))) as ArrayRef,
        ),
    ])
}

fn marginal_batch(rows: &[PublishedTotals]) -> RecordBatch {
    let mut columns: Vec<(&str, ArrayRef)> = vec![
        (
            "GEO2",
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.state.as_str())))
                as ArrayRef,
        ),
        (
            "ID2",
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.fips as i32)))
                as ArrayRef,
        ),
    ];
    for column in rows[0].values.keys() {
        columns.push((
            column.as_str(),
            Arc::new(Float64Array::from_iter_values(
                rows.iter().map(|r| r.values[column]),
            )) as ArrayRef,
        ));
    }
    batch(columns)
}

fn write(path: &Path, batch: RecordBatch) -> Result<()> {
    write_parquet(path, batch.schema(), &[batch])?;
    Ok(())
}

#[tokio::test]
async fn test_manifest_run_end_to_end() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let root = dir.path();

    let ny = synthetic_unit("NY", 2010, 21, 1_500);
    let tx = synthetic_unit("TX", 2010, 22, 1_500);
    write(&root.join("pums/ss10pny.parquet"), pums_batch(&ny.records))?;
    write(&root.join("pums/texas.parquet"), pums_batch(&tx.records))?;
    write(
        &root.join("marginals_10.parquet"),
        marginal_batch(&[
            synthetic_totals("NY", 36, 19_000_000.0),
            synthetic_totals("TX", 48, 25_000_000.0),
        ]),
    )?;
    std::fs::write(
        root.join("run.json"),
        r#"{
            "pums": [{ "path": "pums/ss10pny.parquet" },
                     { "path": "pums/texas.parquet", "state": "TX", "year": 2010 }],
            "marginals": [{ "path": "marginals_10.parquet" }],
            "output_dir": "out",
            "config": { "show_progress": false, "partition_output": true }
        }"#,
    )?;

    let manifest = RunManifest::from_json_file(&root.join("run.json"))?;
    let inputs = RunInputs::load(&manifest).await?;
    assert_eq!(inputs.units.len(), 2);
    assert_eq!(inputs.marginals.len(), 2);
    assert_eq!(inputs.record_count(), ny.records.len() + tx.records.len());

    let loaded_ny = inputs
        .units
        .iter()
        .find(|unit| unit.key == UnitKey::parse("NY", 2010).unwrap())
        .expect("NY unit loaded");
    assert_eq!(loaded_ny.records, ny.records);

    let output = Pipeline::new(manifest.config.clone())?.run(inputs.units, &inputs.marginals)?;
    assert_eq!(output.units_completed, 2);
    assert!(output.failures.is_empty());

    let writer = OutputWriter::new(&manifest.output_dir, manifest.config.partition_output)?;
    let written = writer.write_refiner_output(&output)?;
    assert!(written.contains(&root.join("out").join(format!("{AGE_TABLE}.parquet"))));
    assert!(root.join("out").join(INCOME_TABLE).join("WhiteNH.parquet").exists());

    let batches = read_parquet(&root.join("out/ipf_age.parquet"), None, None)?;
    let rows: Vec<AgeCrossTabRow> = batches
        .iter()
        .map(AgeCrossTabRow::from_record_batch)
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(rows, output.age_rows);

    let income = read_parquet(&root.join("out/income.parquet"), Some(&["FIPS", "Median"]), None)?;
    assert_eq!(income[0].num_columns(), 2);
    assert_eq!(
        income.iter().map(RecordBatch::num_rows).sum::<usize>(),
        output.income_rows.len()
    );
    Ok(())
}

#[tokio::test]
async fn test_pums_file_missing_a_column_fails_to_load() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ss10pny.parquet");
    write(
        &path,
        batch(vec![("PWGTP", Arc::new(Int32Array::from(vec![10])) as ArrayRef)]),
    )?;

    let input = PumsInput {
        path,
        state: None,
        year: None,
    };
    assert!(matches!(
        load_pums_unit(&input, 1024).await,
        Err(RefinerError::MissingColumn { column, .. }) if column == "AGEP"
    ));
    Ok(())
}

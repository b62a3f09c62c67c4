//! End-to-end pipeline tests: raw fixture files → ingest → consolidated
//! catalog → Parquet artifact round-trip → queries.
//!
//! The fixtures under `tests/fixtures/` are small hand-built reference
//! tables whose LMS parameters make the expected z-scores analytic; the
//! full published WHO/INTERGROWTH tables are not embedded here.

use approx::assert_abs_diff_eq;
use growthstandards::prelude::*;
use polars::df;
use polars::prelude::ParquetWriter;
use std::fs;
use std::path::{Path, PathBuf};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("growthstandards-{tag}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn fixture_catalog() -> Catalog {
    Catalog::from_raw_dir(fixtures_dir()).expect("fixture catalog builds")
}

#[test]
fn test_sweep_ingests_good_files_and_skips_bad_ones() {
    let rows = ingest_dir(fixtures_dir()).unwrap();

    // 8 valid fixtures; the file with an out-of-vocabulary measurement is
    // skipped by the sweep without aborting it.
    let stature_rows = rows
        .iter()
        .filter(|r| r.measurement_type == MeasurementType::Stature)
        .count();
    assert_eq!(stature_rows, 16); // two sexes, eight samples each

    assert!(rows.iter().any(|r| r.table_name == TableName::Newborn));
    assert!(rows.iter().any(|r| r.table_name == TableName::VeryPretermNewborn));
    assert!(rows.iter().any(|r| r.measurement_type == MeasurementType::WeightVelocity));

    // Weight rows from SD columns are flagged as derived
    assert!(rows
        .iter()
        .filter(|r| r.measurement_type == MeasurementType::Weight
            && r.x_var_type == XVarType::Age)
        .all(|r| r.is_derived));
}

#[test]
fn test_reingest_is_deterministic() {
    // P8: the consolidated store is identical across runs
    let a = fixture_catalog();
    let b = fixture_catalog();
    assert!(a.dataframe().equals(b.dataframe()));
}

#[test]
fn test_artifact_round_trip_is_bit_identical() {
    // P5
    let catalog = fixture_catalog();
    let dir = scratch_dir("artifact");
    let path = catalog.write_artifact(&dir).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        format!("{ARTIFACT_STEM}_{ARTIFACT_VERSION}.parquet")
    );

    let reloaded = Catalog::load(&path).unwrap();
    assert!(catalog.dataframe().equals(reloaded.dataframe()));

    // The same query against both catalogs agrees bit-for-bit
    let query = |catalog: &Catalog| {
        zscore()
            .catalog(catalog)
            .measurement("stature")
            .value(80.0)
            .sex(Sex::M)
            .age_days(400)
            .call()
            .unwrap()
    };
    assert_eq!(query(&catalog).to_bits(), query(&reloaded).to_bits());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_incompatible_artifact_is_refused() {
    let dir = scratch_dir("stale-artifact");
    let mut frame = df! {
        "source" => ["who"],
        "name" => ["child_growth"],
        "age_group" => ["0-2"],
        "measurement_type" => ["weight"],
        "sex" => ["M"],
        "x_var_type" => ["age"],
        "x_var_unit" => ["day"],
        "x" => [0.0],
        "l" => [1.0],
        "m" => [3.3],
        "s" => [0.12],
        "is_derived" => [false],
        "version" => ["0.0.1"],
    }
    .unwrap();

    let path = dir.join("pygrowthstandards_0.0.1.parquet");
    let file = fs::File::create(&path).unwrap();
    ParquetWriter::new(file).finish(&mut frame).unwrap();

    assert!(matches!(
        Catalog::load(&path),
        Err(GrowthError::IncompatibleArtifact { .. })
    ));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_stature_zscore_at_exact_sample() {
    // 12-month boy at the fixture median: z = 0, percentile = 0.5
    let catalog = fixture_catalog();
    let z = zscore()
        .catalog(&catalog)
        .measurement("stature")
        .value(75.7)
        .sex(Sex::M)
        .age_days(365)
        .call()
        .unwrap();
    assert_abs_diff_eq!(z, 0.0, epsilon = 1e-9);

    let p = percentile()
        .catalog(&catalog)
        .measurement("lfa")
        .value(75.7)
        .sex(Sex::M)
        .age_days(365)
        .call()
        .unwrap();
    assert_abs_diff_eq!(p, 0.5, epsilon = 1e-9);

    // One coefficient of variation above the median with L = 1
    let z = zscore()
        .catalog(&catalog)
        .measurement("stature")
        .value(75.7 * 1.0341)
        .sex(Sex::M)
        .age_days(365)
        .call()
        .unwrap();
    assert_abs_diff_eq!(z, 1.0, epsilon = 1e-9);
}

#[test]
fn test_derived_weight_slice_recovers_median() {
    // The SD-column fixture was generated from L = 0.5, S = 0.12
    let catalog = fixture_catalog();
    let z = zscore()
        .catalog(&catalog)
        .measurement("weight")
        .value(9.6)
        .sex(Sex::M)
        .age_days(365)
        .call()
        .unwrap();
    assert_abs_diff_eq!(z, 0.0, epsilon = 1e-6);

    let table = catalog
        .get_table()
        .name(TableName::ChildGrowth)
        .measurement_type(MeasurementType::Weight)
        .sex(Sex::M)
        .call()
        .unwrap();
    let (l, m, s) = table.lms_at(365.0).unwrap();
    assert_abs_diff_eq!(m, 9.6);
    assert_abs_diff_eq!(l, 0.5, epsilon = 1e-5);
    assert_abs_diff_eq!(s, 0.12, epsilon = 1e-6);
    assert!(table.is_derived.iter().all(|&flag| flag));
}

#[test]
fn test_newborn_weight_by_gestational_age() {
    // 40-week boy at the fixture median weight
    let catalog = fixture_catalog();
    let z = zscore()
        .catalog(&catalog)
        .measurement("weight")
        .value(3.4)
        .sex(Sex::M)
        .gestational_age(280)
        .call()
        .unwrap();
    assert_abs_diff_eq!(z, 0.0, epsilon = 1e-9);

    // 27 weeks resolves to the very-preterm newborn standard
    let z = zscore()
        .catalog(&catalog)
        .measurement("weight")
        .value(1.02)
        .sex(Sex::M)
        .gestational_age(189)
        .call()
        .unwrap();
    assert_abs_diff_eq!(z, 0.0, epsilon = 1e-9);
}

#[test]
fn test_birth_day_stature_uses_gestational_axis() {
    // age 0 + gestational age routes to the newborn table; the fixture
    // pack has no newborn stature table, so the miss is a NoMatch rather
    // than a range error.
    let catalog = fixture_catalog();
    let err = zscore()
        .catalog(&catalog)
        .measurement("stature")
        .value(50.0)
        .sex(Sex::M)
        .age_days(0)
        .gestational_age(280)
        .call()
        .unwrap_err();
    assert!(matches!(err, GrowthError::NoMatch { .. }));
}

#[test]
fn test_bmi_of_teenager_interpolates() {
    // 15-year-old boy above the median: positive z, percentile > 0.5
    let catalog = fixture_catalog();
    let age = (15.0 * YEAR) as i64;
    let z = zscore()
        .catalog(&catalog)
        .measurement("bmi")
        .value(21.5)
        .sex(Sex::M)
        .age_days(age)
        .call()
        .unwrap();
    assert!(z > 0.0);

    let p = percentile()
        .catalog(&catalog)
        .measurement("body_mass_index")
        .value(21.5)
        .sex(Sex::M)
        .age_days(age)
        .call()
        .unwrap();
    assert!(p > 0.5 && p < 1.0);
}

#[test]
fn test_head_circumference_beyond_five_years() {
    let catalog = fixture_catalog();
    let err = zscore()
        .catalog(&catalog)
        .measurement("head_circumference")
        .value(50.0)
        .sex(Sex::F)
        .age_days((7.0 * YEAR) as i64)
        .call()
        .unwrap_err();
    assert!(matches!(err, GrowthError::NoReferenceForRange { .. }));
}

#[test]
fn test_weight_velocity_query() {
    let catalog = fixture_catalog();
    let z = zscore()
        .catalog(&catalog)
        .measurement("weight_velocity")
        .value(1.0)
        .sex(Sex::M)
        .age_days(14)
        .call()
        .unwrap();
    assert!(z.is_finite());
}

#[test]
fn test_weight_for_length_view() {
    let catalog = fixture_catalog();
    let mut table = catalog
        .get_table()
        .name(TableName::ChildGrowth)
        .age_group(AgeGroup::ZeroTwo)
        .measurement_type(MeasurementType::Weight)
        .sex(Sex::F)
        .x_var_type(XVarType::Stature)
        .call()
        .unwrap();

    assert_eq!(table.x_var_unit, XVarUnit::Cm);
    assert_abs_diff_eq!(table.min_x(), 45.0);
    assert_abs_diff_eq!(table.max_x(), 70.0);

    let (_, m, _) = table.lms_at(60.0).unwrap();
    assert_abs_diff_eq!(m, 5.73);

    // View operations never touch the catalog
    table.cut(50.0, 65.0);
    assert_eq!(table.x.len(), 4);
    table.add_child_data(&[52.0, 60.0], &[4.1, 5.9]).unwrap();
    let overlay = table.child.as_ref().unwrap();
    assert_eq!(overlay.x.len(), 5);
    assert_eq!(overlay.y.iter().filter(|y| y.is_some()).count(), 2);

    let again = catalog
        .get_table()
        .name(TableName::ChildGrowth)
        .age_group(AgeGroup::ZeroTwo)
        .measurement_type(MeasurementType::Weight)
        .sex(Sex::F)
        .x_var_type(XVarType::Stature)
        .call()
        .unwrap();
    assert_eq!(again.x.len(), 6);
}

#[test]
fn test_values_at_z_median_column() {
    let catalog = fixture_catalog();
    let table = catalog
        .get_table()
        .name(TableName::Newborn)
        .measurement_type(MeasurementType::Weight)
        .sex(Sex::M)
        .call()
        .unwrap();

    let frame = table.values_at_z(&[-2.0, 0.0, 2.0]).unwrap();
    assert_eq!(frame.height(), 10);
    let medians: Vec<f64> = frame
        .column("0")
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(medians, table.m);
}

#[test]
fn test_sex_u_matches_sex_f_through_the_pipeline() {
    // P7
    let catalog = fixture_catalog();
    let query = |sex: Sex| {
        zscore()
            .catalog(&catalog)
            .measurement("stature")
            .value(73.0)
            .sex(sex)
            .age_days(365)
            .call()
            .unwrap()
    };
    assert_eq!(query(Sex::F).to_bits(), query(Sex::U).to_bits());
}

#[test]
fn test_x_axes_strictly_increase() {
    // P6 over every slice of the fixture catalog
    let catalog = fixture_catalog();
    for (name, measurement, sex, x_kind) in [
        (TableName::ChildGrowth, MeasurementType::Stature, Sex::M, XVarType::Age),
        (TableName::ChildGrowth, MeasurementType::Weight, Sex::M, XVarType::Age),
        (TableName::Growth, MeasurementType::BodyMassIndex, Sex::M, XVarType::Age),
        (TableName::Newborn, MeasurementType::Weight, Sex::M, XVarType::GestationalAge),
        (TableName::VeryPretermNewborn, MeasurementType::Weight, Sex::M, XVarType::GestationalAge),
    ] {
        let table = catalog
            .get_table()
            .name(name)
            .measurement_type(measurement)
            .sex(sex)
            .x_var_type(x_kind)
            .call()
            .unwrap();
        assert!(
            table.x.windows(2).all(|w| w[0] < w[1]),
            "axis of {name}/{measurement} is not strictly increasing"
        );
    }
}

//! # Integration Tests for the Growthstandards Prelude
//!
//! Verifies that the prelude module properly re-exports all commonly used
//! types and functions from the crate, ensuring that users can import
//! everything they need with a single `use` statement.

use approx::assert_abs_diff_eq;
use growthstandards::prelude::*;

#[test]
fn test_prelude_imports_vocabulary_types() {
    // The controlled vocabularies are accessible and exhaustive
    let sex = Sex::U;
    assert_eq!(sex.normalized(), Sex::F);

    let table = TableName::ChildGrowth;
    assert_eq!(table.as_str(), "child_growth");

    let group = AgeGroup::ZeroTwo;
    assert_eq!(group.as_str(), "0-2");

    let measurement = MeasurementType::from_alias("lfa").unwrap();
    assert_eq!(measurement, MeasurementType::Stature);

    assert_eq!(Source::Who.as_str(), "who");
    assert_eq!(XVarType::GestationalAge.as_str(), "gestational_age");
    assert_eq!(XVarUnit::Day.as_str(), "day");

    // Day-count constants
    assert_abs_diff_eq!(WEEK, 7.0);
    assert_abs_diff_eq!(MONTH, 30.44);
    assert_abs_diff_eq!(YEAR, 365.25);
}

#[test]
fn test_prelude_imports_polars_types() {
    let df_type_name = std::any::type_name::<DataFrame>();
    let series_type_name = std::any::type_name::<Series>();
    let result_type_name = std::any::type_name::<PolarsResult<f64>>();

    assert!(df_type_name.contains("DataFrame"));
    assert!(series_type_name.contains("Series"));
    assert!(result_type_name.contains("PolarsError"));
    let _ = std::any::type_name::<LazyFrame>();
}

#[test]
fn test_prelude_imports_kernel_functions() {
    // Kernel functions are accessible through the prelude
    let y = value_for_z(1.5, 0.3, 10.0, 0.12).unwrap();
    let z = z_score(y, 0.3, 10.0, 0.12).unwrap();
    assert_abs_diff_eq!(z, 1.5, epsilon = 1e-12);

    let z = adjusted_z_score(y, 0.3, 10.0, 0.12).unwrap();
    assert_abs_diff_eq!(z, 1.5, epsilon = 1e-12);
    let _ = adjusted_value_for_z(4.0, 0.3, 10.0, 0.12).unwrap();

    assert_abs_diff_eq!(normal_cdf(0.0), 0.5);

    let axis = [0.0, 1.0, 2.0];
    let values = [10.0, 20.0, 30.0];
    assert_abs_diff_eq!(interpolate(&axis, &values, 0.5, 4).unwrap(), 15.0);

    let zs = [-3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0];
    let sds = [6.724, 7.744, 8.836, 10.0, 11.236, 12.544, 13.924];
    let (_, m, _) = estimate_lms_from_sd(&zs, &sds).unwrap();
    assert_abs_diff_eq!(m, 10.0);
}

#[test]
fn test_prelude_function_accessibility() {
    // The query builders and ingest entry points are accessible
    let _zscore_fn = zscore;
    let _percentile_fn = percentile;
    let _ingest_file_fn = |p: &str| ingest_file(p);
    let _ingest_dir_fn = |p: &str| ingest_dir(p);
    let _ingest_url_fn = ingest_url;

    // Error and result types resolve
    let _err_type = std::any::type_name::<GrowthError>();
    let _result_type = std::any::type_name::<GrowthResult<f64>>();
    let _age = AgeInput::Chronological(365);
    let _overlay_type = std::any::type_name::<ChildOverlay>();
}

#[test]
fn test_prelude_with_synthetic_rows() {
    // Build a minimal catalog through public prelude types only
    let rows: Vec<CanonicalRow> = (0..5)
        .map(|i| CanonicalRow {
            source: Source::Who,
            table_name: TableName::ChildGrowth,
            age_group: AgeGroup::ZeroTwo,
            sex: Sex::M,
            measurement_type: MeasurementType::Weight,
            x_var_type: XVarType::Age,
            x_var_unit: XVarUnit::Day,
            x: (i * 100) as f64,
            l: 1.0,
            m: 3.3 + i as f64,
            s: 0.12,
            is_derived: false,
        })
        .collect();

    let catalog = Catalog::from_rows(rows).unwrap();
    assert_eq!(catalog.version(), ARTIFACT_VERSION);
    assert_eq!(catalog.len(), 5);
    assert!(
        catalog
            .artifact_path(std::path::Path::new("data"))
            .to_str()
            .unwrap()
            .contains(ARTIFACT_STEM)
    );

    let table: GrowthTable = catalog
        .get_table()
        .name(TableName::ChildGrowth)
        .measurement_type(MeasurementType::Weight)
        .sex(Sex::M)
        .call()
        .unwrap();
    assert_eq!(table.len(), 5);

    let z = zscore()
        .catalog(&catalog)
        .measurement("wfa")
        .value(4.3)
        .sex(Sex::M)
        .age_days(100)
        .call()
        .unwrap();
    assert_abs_diff_eq!(z, 0.0, epsilon = 1e-12);
}

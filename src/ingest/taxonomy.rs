//! Filename taxonomy: the only place raw file paths carry meaning.
//!
//! A raw file's basename encodes `source-table-measurement-sex[-variant]`
//! with `-` as the separator, e.g. `who-child_growth-weight-m.xlsx` or
//! `intergrowth-very_preterm_birth-head_circumference-f.csv`. Velocity
//! files append an interval variant (`-1mon`, `-2mon`).

use crate::error::GrowthError;
use crate::vocab::{MeasurementType, Sex, Source, TableName, XVarType};
use crate::GrowthResult;
use std::path::Path;

/// Everything a raw file's name declares about its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FileTaxonomy {
    pub source: Source,
    pub table: TableName,
    pub measurement: MeasurementType,
    pub sex: Sex,
    /// `GestationalAge` for birth-size files, `Age` otherwise. The first
    /// data column can still override this to a stature axis.
    pub x_var_type: XVarType,
}

/// Parse the `source-table-measurement-sex[-variant]` basename.
pub(crate) fn parse_taxonomy(path: &Path) -> GrowthResult<FileTaxonomy> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| GrowthError::invalid_taxonomy(format!("unreadable file name {path:?}")))?;

    let mut parts: Vec<&str> = stem.split('-').collect();
    if parts.len() > 5 {
        return Err(GrowthError::invalid_taxonomy(format!(
            "'{stem}' has {} segments, expected source-table-measurement-sex[-variant]",
            parts.len()
        )));
    }
    if parts.len() == 5 {
        parts.pop(); // interval variant such as 1mon / 2mon
    }
    if parts.len() != 4 {
        return Err(GrowthError::invalid_taxonomy(format!(
            "'{stem}' has {} segments, expected source-table-measurement-sex[-variant]",
            parts.len()
        )));
    }

    let sex: Sex = parts.pop().unwrap().parse().map_err(|_| {
        GrowthError::invalid_taxonomy(format!("'{stem}' does not end in a sex of M, F or U"))
    })?;

    let measurement = parse_measurement_token(parts.pop().unwrap(), stem)?;

    let table_token = parts.pop().unwrap().replace("birth", "newborn");
    let table: TableName = table_token.parse().map_err(|_| {
        GrowthError::invalid_taxonomy(format!("'{stem}' names unknown table '{table_token}'"))
    })?;

    let source: Source = parts.pop().unwrap().parse().map_err(|_| {
        GrowthError::invalid_taxonomy(format!("'{stem}' names an unknown source"))
    })?;

    let x_var_type = if stem.contains("birth") {
        XVarType::GestationalAge
    } else {
        XVarType::Age
    };

    Ok(FileTaxonomy {
        source,
        table,
        measurement,
        sex,
        x_var_type,
    })
}

/// Measurement tokens admitted in file names. `weight_length` and
/// `weight_height` name weight-for-stature sources and canonicalize to
/// `weight` (the x axis carries the stature); the `weight_stature` token
/// is the weight-to-length-ratio measurement.
fn parse_measurement_token(token: &str, stem: &str) -> GrowthResult<MeasurementType> {
    match token {
        "weight_length" | "weight_height" => Ok(MeasurementType::Weight),
        "weight_stature" => Ok(MeasurementType::WeightStatureRatio),
        other => other.parse().map_err(|_| {
            GrowthError::invalid_taxonomy(format!(
                "'{stem}' names unknown measurement '{other}'"
            ))
        }),
    }
}

// ================================================
// UNIT TESTS
// ================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str) -> GrowthResult<FileTaxonomy> {
        parse_taxonomy(Path::new(name))
    }

    #[test]
    fn test_plain_who_file() {
        let tax = parse("data/raw/who-child_growth-weight-m.xlsx").unwrap();
        assert_eq!(tax.source, Source::Who);
        assert_eq!(tax.table, TableName::ChildGrowth);
        assert_eq!(tax.measurement, MeasurementType::Weight);
        assert_eq!(tax.sex, Sex::M);
        assert_eq!(tax.x_var_type, XVarType::Age);
    }

    #[test]
    fn test_birth_alias_and_gestational_axis() {
        let tax = parse("intergrowth-birth-weight-f.csv").unwrap();
        assert_eq!(tax.table, TableName::Newborn);
        assert_eq!(tax.x_var_type, XVarType::GestationalAge);

        let tax = parse("intergrowth-very_preterm_birth-head_circumference-m.csv").unwrap();
        assert_eq!(tax.table, TableName::VeryPretermNewborn);
        assert_eq!(tax.x_var_type, XVarType::GestationalAge);
    }

    #[test]
    fn test_velocity_variant_suffix() {
        let tax = parse("who-child_growth-weight_velocity-f-1mon.xlsx").unwrap();
        assert_eq!(tax.measurement, MeasurementType::WeightVelocity);
        assert_eq!(tax.sex, Sex::F);
    }

    #[test]
    fn test_weight_for_stature_tokens() {
        let tax = parse("who-child_growth-weight_length-f.xlsx").unwrap();
        assert_eq!(tax.measurement, MeasurementType::Weight);

        let tax = parse("intergrowth-very_preterm_birth-weight_stature-m.csv").unwrap();
        assert_eq!(tax.measurement, MeasurementType::WeightStatureRatio);
    }

    #[test]
    fn test_rejected_taxonomies() {
        assert!(matches!(
            parse("who-child_growth-armspan-m.csv"),
            Err(GrowthError::InvalidTaxonomy { .. })
        ));
        assert!(matches!(
            parse("nhanes-child_growth-weight-m.csv"),
            Err(GrowthError::InvalidTaxonomy { .. })
        ));
        assert!(matches!(
            parse("who-toddler_growth-weight-m.csv"),
            Err(GrowthError::InvalidTaxonomy { .. })
        ));
        assert!(matches!(
            parse("who-child_growth-weight-x.csv"),
            Err(GrowthError::InvalidTaxonomy { .. })
        ));
        assert!(matches!(
            parse("who-child_growth.csv"),
            Err(GrowthError::InvalidTaxonomy { .. })
        ));
    }
}

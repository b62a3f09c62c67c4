//! # Ingest Pipeline
//!
//! Reads raw reference files (per-sex CSV/XLSX tables published with
//! either native L/M/S triples or tabulated SD columns) and normalizes
//! them into a stream of canonical rows for the [`crate::catalog`].
//!
//! The filename taxonomy (`source-table-measurement-sex[-variant]`) is
//! the only place paths carry meaning; everything else is decided by the
//! sheet's first column and the presence of `l`/`m`/`s` versus `sd*`
//! columns.
//!
//! Failure semantics: one bad row rejects its whole file with a
//! descriptive error; one bad file in a directory sweep is logged and
//! skipped without aborting the sweep.

mod sheet;
mod taxonomy;

use crate::error::GrowthError;
use crate::lms::estimate_lms_from_sd;
use crate::vocab::{
    AgeGroup, MeasurementType, Sex, Source, TableName, XVarType, XVarUnit, MONTH, WEEK,
};
use crate::GrowthResult;
use sheet::RawSheet;
use std::fs;
use std::path::{Path, PathBuf};
use taxonomy::{parse_taxonomy, FileTaxonomy};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// SD column names and the z-score each tabulates. `sd3neg` through `sd3`
/// are required; the ±4 and ±5 columns are used when present.
const SD_COLUMNS: [(&str, f64); 11] = [
    ("sd5neg", -5.0),
    ("sd4neg", -4.0),
    ("sd3neg", -3.0),
    ("sd2neg", -2.0),
    ("sd1neg", -1.0),
    ("sd0", 0.0),
    ("sd1", 1.0),
    ("sd2", 2.0),
    ("sd3", 3.0),
    ("sd4", 4.0),
    ("sd5", 5.0),
];

const REQUIRED_SD_COLUMNS: [&str; 7] = ["sd3neg", "sd2neg", "sd1neg", "sd0", "sd1", "sd2", "sd3"];

/// One normalized reference point: the unit stored in the catalog.
///
/// `x` is in days for age and gestational axes, centimeters for the
/// stature axis. `is_derived` is true iff the LMS triple was fit from SD
/// columns rather than read directly.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRow {
    pub source: Source,
    pub table_name: TableName,
    pub age_group: AgeGroup,
    pub sex: Sex,
    pub measurement_type: MeasurementType,
    pub x_var_type: XVarType,
    pub x_var_unit: XVarUnit,
    pub x: f64,
    pub l: f64,
    pub m: f64,
    pub s: f64,
    pub is_derived: bool,
}

// ===============================================
// FILE INGEST
// ===============================================

/// Ingest one raw file into canonical rows.
///
/// Any unparseable row aborts the whole file.
pub fn ingest_file(path: impl AsRef<Path>) -> GrowthResult<Vec<CanonicalRow>> {
    let path = path.as_ref();
    let taxonomy = parse_taxonomy(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let sheet = match extension.as_str() {
        "csv" => RawSheet::from_csv(path)?,
        "xlsx" => RawSheet::from_xlsx(path)?,
        other => {
            return Err(GrowthError::invalid_taxonomy(format!(
                "unsupported raw file extension '{other}' for {path:?}"
            )));
        }
    };

    if sheet.headers.is_empty() || sheet.n_rows() == 0 {
        return Err(GrowthError::invalid_input(format!(
            "{path:?} contains no data rows"
        )));
    }

    let axis = classify_axis(&sheet)?;
    let rows = build_rows(&taxonomy, &sheet, &axis)?;
    debug!(file = ?path, rows = rows.len(), "ingested raw reference file");
    Ok(rows)
}

/// Ingest every `.csv`/`.xlsx` file under a directory, in sorted order.
///
/// Files that fail to ingest are logged and skipped; the sweep itself
/// only fails on an unreadable directory.
pub fn ingest_dir(dir: impl AsRef<Path>) -> GrowthResult<Vec<CanonicalRow>> {
    let dir = dir.as_ref();
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| {
            GrowthError::invalid_input(format!("failed to walk directory {dir:?}: {e}"))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_raw = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_ascii_lowercase().as_str(), "csv" | "xlsx"))
            .unwrap_or(false);
        if is_raw {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    let mut rows = Vec::new();
    for path in paths {
        match ingest_file(&path) {
            Ok(mut file_rows) => rows.append(&mut file_rows),
            Err(err) => warn!(file = ?path, error = %err, "skipping raw file"),
        }
    }
    Ok(rows)
}

/// Download one raw file and ingest it. The URL's final path segment must
/// follow the filename taxonomy.
pub fn ingest_url(url: &str) -> GrowthResult<Vec<CanonicalRow>> {
    let basename = url
        .split('/')
        .next_back()
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| GrowthError::invalid_taxonomy(format!("URL '{url}' has no file name")))?;

    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let bytes = response.bytes()?;

    let staging = std::env::temp_dir().join(format!("growthstandards-{}", std::process::id()));
    fs::create_dir_all(&staging)?;
    let path = staging.join(basename);
    fs::write(&path, &bytes)?;

    let result = ingest_file(&path);
    fs::remove_file(&path).ok();
    result
}

// ===============================================
// AXIS CLASSIFICATION
// ===============================================

/// What the sheet's first column turned out to be.
struct Axis {
    kind: AxisKind,
    /// Per-row x values, already normalized to days or centimeters.
    xs: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisKind {
    /// Weight-for-length table: x is stature in cm, age group 0-2.
    Length,
    /// Weight-for-height table: x is stature in cm, age group 2-5.
    Height,
    /// Velocity table: x is the interval's lower endpoint in days.
    Interval,
    /// Plain age/gestational axis in days.
    Days,
}

fn classify_axis(sheet: &RawSheet) -> GrowthResult<Axis> {
    let n = sheet.n_rows();
    let mut xs = Vec::with_capacity(n);

    let kind = match sheet.headers[0].as_str() {
        "length" => AxisKind::Length,
        "height" => AxisKind::Height,
        "interval" => AxisKind::Interval,
        _ => AxisKind::Days,
    };

    match kind {
        AxisKind::Length | AxisKind::Height => {
            for row in 0..n {
                xs.push(sheet.f64_cell(0, row)?);
            }
        }
        AxisKind::Interval => {
            for row in 0..n {
                let raw = sheet.columns[0][row].replace('\u{2013}', "-");
                xs.push(parse_interval_start(raw.trim())? as f64);
            }
        }
        AxisKind::Days => {
            // The header decides the day conversion: weeks, months, or a
            // plain integer day count.
            let to_days = |value: f64| -> f64 {
                match sheet.headers[0].as_str() {
                    "weeks" => (value * WEEK).round(),
                    "month" => (value * MONTH).round(),
                    _ => value.trunc(),
                }
            };
            for row in 0..n {
                xs.push(to_days(sheet.f64_cell(0, row)?));
            }
        }
    }

    Ok(Axis { kind, xs })
}

/// Lower endpoint of a velocity interval, in days. Endpoints ending in
/// `wks` are weeks, endpoints ending in `mo` are months, bare numbers are
/// months.
fn parse_interval_start(interval: &str) -> GrowthResult<i64> {
    let mut parts = interval.splitn(2, '-');
    let (Some(start), Some(end)) = (parts.next(), parts.next()) else {
        return Err(GrowthError::invalid_input(format!(
            "velocity interval '{interval}' is not of the form start-end"
        )));
    };

    // The upper endpoint is parsed for validation only; x is the lower one.
    parse_interval_endpoint(end)?;
    parse_interval_endpoint(start)
}

fn parse_interval_endpoint(part: &str) -> GrowthResult<i64> {
    let part = part.trim();
    let (number, factor) = if let Some(stripped) = part.strip_suffix("wks") {
        (stripped, WEEK)
    } else if let Some(stripped) = part.strip_suffix("mo") {
        (stripped, MONTH)
    } else {
        (part, MONTH)
    };

    let value: f64 = number.trim().parse().map_err(|_| {
        GrowthError::invalid_input(format!("cannot parse interval endpoint '{part}'"))
    })?;

    Ok((value * factor).round() as i64)
}

// ===============================================
// ROW CONSTRUCTION
// ===============================================

fn build_rows(
    taxonomy: &FileTaxonomy,
    sheet: &RawSheet,
    axis: &Axis,
) -> GrowthResult<Vec<CanonicalRow>> {
    // Sheets indexed by stature force the measurement to weight; the ratio
    // and velocity measurements keep their filename taxonomy.
    let measurement = match axis.kind {
        AxisKind::Length | AxisKind::Height => MeasurementType::Weight,
        _ => taxonomy.measurement,
    };

    let (x_var_type, x_var_unit) = match axis.kind {
        AxisKind::Length | AxisKind::Height => (XVarType::Stature, XVarUnit::Cm),
        _ => (taxonomy.x_var_type, XVarUnit::Day),
    };

    // No row is ever stored under sex U.
    let sex = taxonomy.sex.normalized();

    let lms = read_lms(sheet)?;

    let mut rows = Vec::with_capacity(axis.xs.len());
    for (row, &x) in axis.xs.iter().enumerate() {
        let age_group = age_group_for(taxonomy.table, axis.kind, x);
        let (l, m, s, is_derived) = lms.at(sheet, row)?;
        rows.push(CanonicalRow {
            source: taxonomy.source,
            table_name: taxonomy.table,
            age_group,
            sex,
            measurement_type: measurement,
            x_var_type,
            x_var_unit,
            x,
            l,
            m,
            s,
            is_derived,
        });
    }

    Ok(rows)
}

/// Canonical age band for one row. INTERGROWTH tables carry their
/// table-named group; WHO tables are split at the year boundaries.
fn age_group_for(table: TableName, axis: AxisKind, x: f64) -> AgeGroup {
    match table {
        TableName::Newborn => return AgeGroup::Newborn,
        TableName::VeryPretermNewborn => return AgeGroup::VeryPretermNewborn,
        TableName::VeryPretermGrowth => return AgeGroup::VeryPretermGrowth,
        TableName::Growth | TableName::ChildGrowth => {}
    }

    match axis {
        AxisKind::Length => AgeGroup::ZeroTwo,
        AxisKind::Height => AgeGroup::TwoFive,
        AxisKind::Interval => AgeGroup::ZeroOne,
        AxisKind::Days => AgeGroup::for_age_days(x),
    }
}

/// Where a sheet's LMS triples come from: native columns, or a fit over
/// its SD columns.
enum LmsColumns {
    Native { l: usize, m: usize, s: usize },
    Derived { columns: Vec<(usize, f64)> },
}

impl LmsColumns {
    fn at(&self, sheet: &RawSheet, row: usize) -> GrowthResult<(f64, f64, f64, bool)> {
        match self {
            LmsColumns::Native { l, m, s } => Ok((
                sheet.f64_cell(*l, row)?,
                sheet.f64_cell(*m, row)?,
                sheet.f64_cell(*s, row)?,
                false,
            )),
            LmsColumns::Derived { columns } => {
                let mut zs = Vec::with_capacity(columns.len());
                let mut values = Vec::with_capacity(columns.len());
                for &(col, z) in columns {
                    zs.push(z);
                    values.push(sheet.f64_cell(col, row)?);
                }
                let (l, m, s) = estimate_lms_from_sd(&zs, &values)?;
                Ok((l, m, s, true))
            }
        }
    }
}

fn read_lms(sheet: &RawSheet) -> GrowthResult<LmsColumns> {
    if let (Some(l), Some(m), Some(s)) = (
        sheet.column_index("l"),
        sheet.column_index("m"),
        sheet.column_index("s"),
    ) {
        return Ok(LmsColumns::Native { l, m, s });
    }

    if sheet.column_index("sd0").is_none() {
        return Err(GrowthError::MissingMedian {
            detail: format!(
                "no l/m/s columns and no sd0 column among {:?}",
                sheet.headers
            ),
        });
    }

    let missing: Vec<&str> = REQUIRED_SD_COLUMNS
        .iter()
        .copied()
        .filter(|name| sheet.column_index(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(GrowthError::invalid_taxonomy(format!(
            "SD columns {missing:?} are missing (sd3neg through sd3 are required)"
        )));
    }

    let columns: Vec<(usize, f64)> = SD_COLUMNS
        .iter()
        .filter_map(|&(name, z)| sheet.column_index(name).map(|col| (col, z)))
        .collect();

    Ok(LmsColumns::Derived { columns })
}

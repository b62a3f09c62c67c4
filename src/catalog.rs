//! # Reference Catalog
//!
//! Consolidates canonical rows into one indexed, read-only store and
//! persists it as a single columnar Parquet artifact. Lookups materialize
//! short-lived [`GrowthTable`] views; the catalog itself never mutates
//! after construction, so it is safely shareable across parallel readers.
//!
//! ## Quick Start
//! ```rust,ignore
//! # use growthstandards::prelude::*;
//! let rows = ingest_dir("data/raw")?;
//! let catalog = Catalog::from_rows(rows)?;
//! let table = catalog
//!     .get_table()
//!     .name(TableName::ChildGrowth)
//!     .measurement_type(MeasurementType::Weight)
//!     .sex(Sex::M)
//!     .call()?;
//! println!("axis: {} - {} days", table.min_x(), table.max_x());
//! # GrowthResult::Ok(())
//! ```

mod table;

pub use table::{ChildOverlay, GrowthTable};

use crate::error::GrowthError;
use crate::ingest::CanonicalRow;
use crate::vocab::{AgeGroup, MeasurementType, Sex, Source, TableName, XVarType, XVarUnit};
use crate::GrowthResult;
use bon::bon;
use polars::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Stem of the consolidated artifact file name, kept for compatibility
/// with artifacts produced by other implementations.
pub const ARTIFACT_STEM: &str = "pygrowthstandards";

/// Version stamped into (and required of) consolidated artifacts.
pub const ARTIFACT_VERSION: &str = env!("CARGO_PKG_VERSION");

const KEY_COLUMNS: [&str; 7] = [
    "source",
    "name",
    "age_group",
    "measurement_type",
    "sex",
    "x_var_type",
    "x_var_unit",
];

/// The consolidated reference store. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Catalog {
    version: String,
    data: DataFrame,
}

#[bon]
impl Catalog {
    /// Consolidate canonical rows: sort, deduplicate on the full row key,
    /// and verify that no slice mixes sources.
    pub fn from_rows(rows: Vec<CanonicalRow>) -> GrowthResult<Catalog> {
        if rows.is_empty() {
            return Err(GrowthError::invalid_input(
                "cannot build a catalog from zero canonical rows",
            ));
        }

        let mut rows = rows;
        rows.sort_by(|a, b| {
            (
                a.source,
                a.table_name,
                a.age_group,
                a.measurement_type,
                a.sex,
                a.x_var_type,
                a.x_var_unit,
            )
                .cmp(&(
                    b.source,
                    b.table_name,
                    b.age_group,
                    b.measurement_type,
                    b.sex,
                    b.x_var_type,
                    b.x_var_unit,
                ))
                .then(a.x.total_cmp(&b.x))
        });
        rows.dedup_by(|a, b| {
            a.source == b.source
                && a.table_name == b.table_name
                && a.age_group == b.age_group
                && a.measurement_type == b.measurement_type
                && a.sex == b.sex
                && a.x_var_type == b.x_var_type
                && a.x_var_unit == b.x_var_unit
                && a.x == b.x
        });

        // A slice key without the source must map to exactly one source.
        let mut slice_sources: HashMap<(TableName, AgeGroup, MeasurementType, Sex, XVarType, XVarUnit), Source> =
            HashMap::new();
        for row in &rows {
            let key = (
                row.table_name,
                row.age_group,
                row.measurement_type,
                row.sex,
                row.x_var_type,
                row.x_var_unit,
            );
            if let Some(existing) = slice_sources.insert(key, row.source) {
                if existing != row.source {
                    return Err(GrowthError::AmbiguousTable {
                        detail: format!(
                            "slice {}/{}/{}/{} is provided by both {existing} and {}",
                            row.table_name,
                            row.age_group,
                            row.measurement_type,
                            row.sex,
                            row.source
                        ),
                    });
                }
            }
        }

        let data = df! {
            "source" => rows.iter().map(|r| r.source.as_str()).collect::<Vec<_>>(),
            "name" => rows.iter().map(|r| r.table_name.as_str()).collect::<Vec<_>>(),
            "age_group" => rows.iter().map(|r| r.age_group.as_str()).collect::<Vec<_>>(),
            "measurement_type" => rows.iter().map(|r| r.measurement_type.as_str()).collect::<Vec<_>>(),
            "sex" => rows.iter().map(|r| r.sex.as_str()).collect::<Vec<_>>(),
            "x_var_type" => rows.iter().map(|r| r.x_var_type.as_str()).collect::<Vec<_>>(),
            "x_var_unit" => rows.iter().map(|r| r.x_var_unit.as_str()).collect::<Vec<_>>(),
            "x" => rows.iter().map(|r| r.x).collect::<Vec<_>>(),
            "l" => rows.iter().map(|r| r.l).collect::<Vec<_>>(),
            "m" => rows.iter().map(|r| r.m).collect::<Vec<_>>(),
            "s" => rows.iter().map(|r| r.s).collect::<Vec<_>>(),
            "is_derived" => rows.iter().map(|r| r.is_derived).collect::<Vec<_>>(),
        }?;

        Ok(Catalog {
            version: ARTIFACT_VERSION.to_string(),
            data,
        })
    }

    /// Ingest every raw file under `dir` and consolidate the result.
    pub fn from_raw_dir(dir: impl AsRef<Path>) -> GrowthResult<Catalog> {
        Catalog::from_rows(crate::ingest::ingest_dir(dir)?)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.height()
    }

    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }

    /// Path of the artifact this catalog writes under `dir`.
    pub fn artifact_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{ARTIFACT_STEM}_{}.parquet", self.version))
    }

    /// Persist the catalog as `pygrowthstandards_<version>.parquet` under
    /// `dir` (or at `dir` itself when it already names a parquet file).
    pub fn write_artifact(&self, dir: impl AsRef<Path>) -> GrowthResult<PathBuf> {
        let dir = dir.as_ref();
        let path = if dir.extension().and_then(|e| e.to_str()) == Some("parquet") {
            dir.to_path_buf()
        } else {
            self.artifact_path(dir)
        };

        let version = Series::new(
            "version".into(),
            vec![self.version.clone(); self.data.height()],
        );
        let mut frame = self.data.clone();
        frame.with_column(version)?;

        let file = File::create(&path)?;
        ParquetWriter::new(file).finish(&mut frame)?;
        Ok(path)
    }

    /// Load a consolidated artifact, refusing any version other than
    /// [`ARTIFACT_VERSION`].
    pub fn load(path: impl AsRef<Path>) -> GrowthResult<Catalog> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut frame = ParquetReader::new(file).finish()?;

        let versions: Vec<String> = frame
            .column("version")?
            .str()?
            .unique()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        let version = match versions.as_slice() {
            [v] => v.clone(),
            _ => {
                return Err(GrowthError::IncompatibleArtifact {
                    found: versions.join(", "),
                    expected: ARTIFACT_VERSION.to_string(),
                });
            }
        };
        if version != ARTIFACT_VERSION {
            return Err(GrowthError::IncompatibleArtifact {
                found: version,
                expected: ARTIFACT_VERSION.to_string(),
            });
        }

        let _ = frame.drop_in_place("version")?;

        for column in KEY_COLUMNS.into_iter().chain(["x", "l", "m", "s", "is_derived"]) {
            if frame.column(column).is_err() {
                return Err(GrowthError::IncompatibleArtifact {
                    found: format!("artifact without a '{column}' column"),
                    expected: ARTIFACT_VERSION.to_string(),
                });
            }
        }

        Ok(Catalog {
            version,
            data: frame,
        })
    }

    /// Resolve a lookup key to the unique growth table it identifies.
    ///
    /// At least one of `name` and `age_group` must be given. When the
    /// surviving slice carries several x-axis kinds, birth and
    /// very-preterm tables prefer the gestational axis and all others the
    /// chronological one; an explicit `x_var_type` overrides this.
    #[builder]
    pub fn get_table(
        &self,
        name: Option<TableName>,
        age_group: Option<AgeGroup>,
        measurement_type: MeasurementType,
        sex: Sex,
        x_var_type: Option<XVarType>,
    ) -> GrowthResult<GrowthTable> {
        if name.is_none() && age_group.is_none() {
            return Err(GrowthError::invalid_input(
                "get_table needs a table name and/or an age group",
            ));
        }

        let sex = sex.normalized();
        let describe = || {
            format!(
                "name = {:?}, age_group = {:?}, measurement = {measurement_type}, sex = {sex}, x_var_type = {:?}",
                name.map(|n| n.to_string()),
                age_group.map(|g| g.to_string()),
                x_var_type.map(|t| t.to_string()),
            )
        };

        let mut predicate = col("measurement_type")
            .eq(lit(measurement_type.as_str()))
            .and(col("sex").eq(lit(sex.as_str())));
        if let Some(name) = name {
            predicate = predicate.and(col("name").eq(lit(name.as_str())));
        }
        if let Some(age_group) = age_group {
            predicate = predicate.and(col("age_group").eq(lit(age_group.as_str())));
        }
        if let Some(x_var_type) = x_var_type {
            predicate = predicate.and(col("x_var_type").eq(lit(x_var_type.as_str())));
        }

        let mut filtered = self.data.clone().lazy().filter(predicate).collect()?;
        if filtered.height() == 0 {
            return Err(GrowthError::NoMatch { detail: describe() });
        }

        // The slice must identify one table of one source.
        let names = unique_strings(&filtered, "name")?;
        let [table_name] = names.as_slice() else {
            return Err(GrowthError::AmbiguousTable {
                detail: format!("{} matches tables {names:?}", describe()),
            });
        };
        let table_name = TableName::from_str(table_name)?;

        let sources = unique_strings(&filtered, "source")?;
        let [source] = sources.as_slice() else {
            return Err(GrowthError::AmbiguousTable {
                detail: format!("{} matches sources {sources:?}", describe()),
            });
        };
        let source = Source::from_str(source)?;

        // Disambiguate the x axis when several kinds survive.
        let mut x_kinds = unique_strings(&filtered, "x_var_type")?;
        if x_kinds.len() > 1 {
            let preferred = if table_name.prefers_gestational_axis() {
                XVarType::GestationalAge
            } else {
                XVarType::Age
            };
            if !x_kinds.iter().any(|kind| kind == preferred.as_str()) {
                return Err(GrowthError::AmbiguousTable {
                    detail: format!("{} matches x axes {x_kinds:?}", describe()),
                });
            }
            filtered = filtered
                .lazy()
                .filter(col("x_var_type").eq(lit(preferred.as_str())))
                .collect()?;
            x_kinds = vec![preferred.as_str().to_string()];
        }
        let resolved_x_kind = XVarType::from_str(&x_kinds[0])?;

        let units = unique_strings(&filtered, "x_var_unit")?;
        let [unit] = units.as_slice() else {
            return Err(GrowthError::AmbiguousTable {
                detail: format!("{} matches x units {units:?}", describe()),
            });
        };
        let unit = XVarUnit::from_str(unit)?;

        let groups = unique_strings(&filtered, "age_group")?;
        let view_group = match groups.as_slice() {
            [only] => Some(AgeGroup::from_str(only)?),
            _ => None,
        };

        // Materialize the parallel axes, sorted by x. Rows from adjacent
        // age groups of one table concatenate; an x shared at a group
        // boundary keeps its first occurrence.
        let filtered = filtered.sort(["x"], Default::default())?;
        let mut x: Vec<f64> = Vec::with_capacity(filtered.height());
        let mut l = Vec::with_capacity(filtered.height());
        let mut m = Vec::with_capacity(filtered.height());
        let mut s = Vec::with_capacity(filtered.height());
        let mut is_derived = Vec::with_capacity(filtered.height());

        let xs = filtered.column("x")?.f64()?;
        let ls = filtered.column("l")?.f64()?;
        let ms = filtered.column("m")?.f64()?;
        let ss = filtered.column("s")?.f64()?;
        let flags = filtered.column("is_derived")?.bool()?;
        for i in 0..filtered.height() {
            let xi = xs.get(i).ok_or_else(|| {
                GrowthError::invalid_input(format!("null x at catalog row {i}"))
            })?;
            if x.last() == Some(&xi) {
                continue;
            }
            x.push(xi);
            l.push(ls.get(i).unwrap_or(f64::NAN));
            m.push(ms.get(i).unwrap_or(f64::NAN));
            s.push(ss.get(i).unwrap_or(f64::NAN));
            is_derived.push(flags.get(i).unwrap_or(false));
        }

        GrowthTable::new(
            source,
            table_name,
            view_group,
            sex,
            measurement_type,
            resolved_x_kind,
            unit,
            x,
            l,
            m,
            s,
            is_derived,
        )
    }
}

fn unique_strings(frame: &DataFrame, column: &str) -> GrowthResult<Vec<String>> {
    let mut values: Vec<String> = frame
        .column(column)?
        .str()?
        .unique()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();
    values.sort();
    Ok(values)
}

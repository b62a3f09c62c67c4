//! # Growthstandards Prelude
//!
//! Conveniently re-exports the most common types and functions for growth-standard
//! calculations. Import this module to access all primary features with a single
//! `use` statement.
//!
//! ## Example
//!
//! ```rust,ignore
//! use growthstandards::prelude::*;
//!
//! let catalog = Catalog::load("data/pygrowthstandards_0.2.0.parquet")?;
//! let z = zscore()
//!     .catalog(&catalog)
//!     .measurement("wfa")
//!     .value(9.6)
//!     .sex(Sex::M)
//!     .age_days(365)
//!     .call()?;
//! println!("weight-for-age z: {z:.2}");
//! # GrowthResult::Ok(())
//! ```

// Package Result type and error taxonomy
pub use crate::GrowthResult;
pub use crate::error::GrowthError;

// Query functions and the age coordinate
pub use crate::query::{AgeInput, percentile, zscore};

// Consolidated catalog, artifact constants, and table views
pub use crate::catalog::{ARTIFACT_STEM, ARTIFACT_VERSION, Catalog, ChildOverlay, GrowthTable};

// Ingest pipeline
pub use crate::ingest::{CanonicalRow, ingest_dir, ingest_file, ingest_url};

// Kernel numerics
pub use crate::lms::{
    adjusted_value_for_z, adjusted_z_score, estimate_lms_from_sd, interpolate, normal_cdf,
    value_for_z, z_score,
};

// Controlled vocabularies
pub use crate::vocab::{
    AgeGroup, MeasurementType, Sex, Source, TableName, XVarType, XVarUnit, MONTH, WEEK, YEAR,
};

// Most commonly used Polars types for working with catalog data
pub use polars::prelude::{DataFrame, LazyFrame, PolarsError, PolarsResult, Series};

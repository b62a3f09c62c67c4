//! # Error Taxonomy
//!
//! Every fallible operation in the crate returns [`GrowthError`]. Lookup
//! errors carry the offending inputs (measurement, sex, x) so a caller can
//! tell "outside the table's range" apart from "no standard exists for
//! this combination". Ingest-time errors name the file or column that was
//! rejected.

use crate::vocab::{MeasurementType, Sex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrowthError {
    /// The measurement alias is not in the closed vocabulary.
    #[error("unknown measurement alias '{alias}'")]
    UnknownMeasurement { alias: String },

    /// Neither a chronological age nor a gestational age was supplied.
    #[error("either age_days or gestational_age must be provided")]
    MissingAge,

    /// Valid inputs, but no reference exists for this measurement at this
    /// age (e.g. body mass index below 28 weeks of gestation).
    #[error("no reference for {measurement} (sex {sex}) at x = {x}")]
    NoReferenceForAge {
        measurement: MeasurementType,
        sex: Sex,
        x: f64,
    },

    /// The age exceeds the measurement's supported upper bound (e.g. head
    /// circumference beyond 5 years).
    #[error("no reference covers {measurement} (sex {sex}) at x = {x}: outside the supported range")]
    NoReferenceForRange {
        measurement: MeasurementType,
        sex: Sex,
        x: f64,
    },

    /// The query x falls outside the resolved table's axis.
    #[error("x = {x} is out of bounds ({min} - {max})")]
    OutOfRange { x: f64, min: f64, max: f64 },

    /// The catalog filter matched more than one candidate table.
    #[error("ambiguous table selection: {detail}")]
    AmbiguousTable { detail: String },

    /// The catalog filter matched nothing.
    #[error("no table matches: {detail}")]
    NoMatch { detail: String },

    /// Ingest-time filename or vocabulary violation.
    #[error("invalid taxonomy: {detail}")]
    InvalidTaxonomy { detail: String },

    /// Ingest-time: SD columns were supplied without a z = 0 entry.
    #[error("SD columns are missing the median (z = 0) entry: {detail}")]
    MissingMedian { detail: String },

    /// Ingest-time: the LMS least-squares fit did not converge.
    #[error("LMS fit failed: {detail}")]
    BadLmsFit { detail: String },

    /// Malformed numeric input to a kernel function, or a malformed
    /// catalog lookup key.
    #[error("invalid input: {detail}")]
    InvalidInput { detail: String },

    /// Query parameter validation failure.
    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] garde::Report),

    /// The consolidated artifact was written by an incompatible version.
    #[error("incompatible artifact version '{found}' (this reader expects '{expected}')")]
    IncompatibleArtifact { found: String, expected: String },

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl GrowthError {
    pub(crate) fn invalid_taxonomy(detail: impl Into<String>) -> Self {
        GrowthError::InvalidTaxonomy {
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid_input(detail: impl Into<String>) -> Self {
        GrowthError::InvalidInput {
            detail: detail.into(),
        }
    }
}

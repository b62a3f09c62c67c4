//! # Query Resolver
//!
//! Maps a user query (measurement alias, sex, and a chronological and/or
//! gestational age) onto the unique reference table it requires, extracts
//! the LMS parameters at the query's x (interpolating between samples),
//! and returns either the z-score or the cumulative-normal percentile.
//!
//! The selection rules are deterministic and exhaustively matched over
//! [`AgeInput`]; the alias table at the boundary is the only place
//! free-form measurement strings are accepted.
//!
//! ## Quick Start
//! ```rust,ignore
//! # use growthstandards::prelude::*;
//! let catalog = Catalog::load("data/pygrowthstandards_0.2.0.parquet")?;
//! let z = zscore()
//!     .catalog(&catalog)
//!     .measurement("stature")
//!     .value(75.0)
//!     .sex(Sex::M)
//!     .age_days(365)
//!     .call()?;
//! println!("height-for-age z: {z:.2}");
//! # GrowthResult::Ok(())
//! ```

use crate::catalog::Catalog;
use crate::error::GrowthError;
use crate::lms;
use crate::params::QueryParams;
use crate::vocab::{MeasurementType, Sex, TableName, XVarType, WEEK, YEAR};
use crate::GrowthResult;
use bon::builder;

/// The subject's time coordinate. The selection rules pattern-match on
/// this, so the two day counts can never be cross-wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeInput {
    /// Days since birth.
    Chronological(i64),
    /// Days since the last menstrual period.
    Gestational(i64),
    /// Both coordinates are known (postnatal query with a known
    /// gestational age at birth).
    Both {
        age_days: i64,
        gestational_age_days: i64,
    },
}

impl AgeInput {
    /// Build from the optional public-API arguments.
    pub fn from_parts(
        age_days: Option<i64>,
        gestational_age: Option<i64>,
    ) -> GrowthResult<AgeInput> {
        match (age_days, gestational_age) {
            (Some(age), Some(gestational)) => Ok(AgeInput::Both {
                age_days: age,
                gestational_age_days: gestational,
            }),
            (Some(age), None) => Ok(AgeInput::Chronological(age)),
            (None, Some(gestational)) => Ok(AgeInput::Gestational(gestational)),
            (None, None) => Err(GrowthError::MissingAge),
        }
    }
}

/// The catalog key a query resolves to, plus the x to evaluate at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ResolvedQuery {
    pub name: TableName,
    pub measurement: MeasurementType,
    pub sex: Sex,
    pub x_var_type: XVarType,
    pub x: f64,
}

/// Deterministic table selection (measurement, sex, age kind) → key.
pub(crate) fn resolve(
    measurement: MeasurementType,
    sex: Sex,
    age: AgeInput,
) -> GrowthResult<ResolvedQuery> {
    let sex = sex.normalized();
    match age {
        AgeInput::Chronological(age_days) => resolve_chronological(measurement, sex, age_days, None),
        // A birth-day query with a known gestational age is a newborn
        // lookup on the gestational axis.
        AgeInput::Both {
            age_days: 0,
            gestational_age_days,
        } => resolve_gestational(measurement, sex, gestational_age_days),
        AgeInput::Both {
            age_days,
            gestational_age_days,
        } => resolve_chronological(measurement, sex, age_days, Some(gestational_age_days)),
        AgeInput::Gestational(gestational_age_days) => {
            resolve_gestational(measurement, sex, gestational_age_days)
        }
    }
}

fn resolve_chronological(
    measurement: MeasurementType,
    sex: Sex,
    age_days: i64,
    gestational_age_days: Option<i64>,
) -> GrowthResult<ResolvedQuery> {
    let x = age_days as f64;

    let over_five = x > 5.0 * YEAR;
    if over_five
        && matches!(
            measurement,
            MeasurementType::HeadCircumference | MeasurementType::WeightStatureRatio
        )
    {
        return Err(GrowthError::NoReferenceForRange {
            measurement,
            sex,
            x,
        });
    }
    if measurement == MeasurementType::Weight && x > 10.0 * YEAR {
        return Err(GrowthError::NoReferenceForRange {
            measurement,
            sex,
            x,
        });
    }

    let mut name = if over_five {
        TableName::Growth
    } else {
        TableName::ChildGrowth
    };

    // Very-preterm override: only with both coordinates supplied, a
    // gestational age under 28 weeks, and an age under 64 weeks.
    if let Some(gestational) = gestational_age_days {
        if (gestational as f64) < 28.0 * WEEK && x < 64.0 * WEEK {
            name = TableName::VeryPretermGrowth;
        }
    }

    Ok(ResolvedQuery {
        name,
        measurement,
        sex,
        x_var_type: XVarType::Age,
        x,
    })
}

fn resolve_gestational(
    measurement: MeasurementType,
    sex: Sex,
    gestational_age_days: i64,
) -> GrowthResult<ResolvedQuery> {
    let x = gestational_age_days as f64;
    let term_threshold = 28.0 * WEEK;

    if measurement == MeasurementType::BodyMassIndex && x < term_threshold {
        return Err(GrowthError::NoReferenceForAge {
            measurement,
            sex,
            x,
        });
    }
    if measurement == MeasurementType::WeightStatureRatio && x > term_threshold {
        return Err(GrowthError::NoReferenceForRange {
            measurement,
            sex,
            x,
        });
    }

    let name = if x > term_threshold {
        TableName::Newborn
    } else {
        TableName::VeryPretermNewborn
    };

    Ok(ResolvedQuery {
        name,
        measurement,
        sex,
        x_var_type: XVarType::GestationalAge,
        x,
    })
}

// ===============================================
// PUBLIC QUERY FUNCTIONS
// ===============================================

/// Z-score of a measured value against the applicable growth standard.
///
/// `measurement` accepts any alias from the closed alias table
/// (`"lfa"`, `"height"`, `"wfa"`, `"bmi"`, ...). Supply `age_days`,
/// `gestational_age`, or both; the extreme-tail correction is applied
/// beyond |z| = 3.
///
/// # Examples
/// ```rust,ignore
/// # use growthstandards::prelude::*;
/// # let catalog = Catalog::load("data/pygrowthstandards_0.2.0.parquet")?;
/// // 12-month-old boy, 75 cm
/// let z = zscore()
///     .catalog(&catalog)
///     .measurement("stature")
///     .value(75.0)
///     .sex(Sex::M)
///     .age_days(365)
///     .call()?;
///
/// // 40-week newborn boy, 3.4 kg
/// let z = zscore()
///     .catalog(&catalog)
///     .measurement("weight")
///     .value(3.4)
///     .sex(Sex::M)
///     .gestational_age(280)
///     .call()?;
/// # GrowthResult::Ok(())
/// ```
#[builder]
pub fn zscore(
    catalog: &Catalog,
    measurement: &str,
    value: f64,
    #[builder(default = Sex::U)] sex: Sex,
    age_days: Option<i64>,
    gestational_age: Option<i64>,
    #[builder(default = true)] validate: bool,
) -> GrowthResult<f64> {
    compute_zscore(
        catalog,
        measurement,
        value,
        sex,
        age_days,
        gestational_age,
        validate,
    )
}

/// Cumulative-normal percentile of a measured value, in [0, 1].
///
/// Φ of the (tail-corrected) z-score; see [`zscore`] for the argument
/// contract.
#[builder]
pub fn percentile(
    catalog: &Catalog,
    measurement: &str,
    value: f64,
    #[builder(default = Sex::U)] sex: Sex,
    age_days: Option<i64>,
    gestational_age: Option<i64>,
    #[builder(default = true)] validate: bool,
) -> GrowthResult<f64> {
    let z = compute_zscore(
        catalog,
        measurement,
        value,
        sex,
        age_days,
        gestational_age,
        validate,
    )?;
    Ok(lms::normal_cdf(z))
}

fn compute_zscore(
    catalog: &Catalog,
    measurement: &str,
    value: f64,
    sex: Sex,
    age_days: Option<i64>,
    gestational_age: Option<i64>,
    validate: bool,
) -> GrowthResult<f64> {
    if validate {
        let params = QueryParams {
            value,
            age_days,
            gestational_age,
        };
        params.validate_all()?;
    }

    let measurement = MeasurementType::from_alias(measurement)?;
    let age = AgeInput::from_parts(age_days, gestational_age)?;
    let resolved = resolve(measurement, sex, age)?;

    let table = catalog
        .get_table()
        .name(resolved.name)
        .measurement_type(resolved.measurement)
        .sex(resolved.sex)
        .x_var_type(resolved.x_var_type)
        .call()?;

    let (l, m, s) = table.lms_at(resolved.x)?;
    lms::adjusted_z_score(value, l, m, s)
}

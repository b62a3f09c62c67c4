//! # Controlled Vocabularies
//!
//! The closed sets that key every reference table: data source, table name,
//! age group, sex, measurement type, and the kind/unit of the x axis.
//! Each vocabulary is an exhaustive enum; the only place free-form strings
//! are accepted is [`MeasurementType::from_alias`] at the query boundary
//! and [`std::str::FromStr`] at the ingest boundary.

use crate::error::GrowthError;
use std::fmt;
use std::str::FromStr;

/// Days in a week.
pub const WEEK: f64 = 7.0;

/// Average days in a month.
pub const MONTH: f64 = 30.44;

/// Average days in a year.
pub const YEAR: f64 = 365.25;

// ===============================================
// SOURCE
// ===============================================

/// Publisher of a reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    /// WHO child growth standards (0-5y) and growth reference (5-19y).
    Who,

    /// INTERGROWTH-21st newborn size and very-preterm standards.
    Intergrowth,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Who => "who",
            Source::Intergrowth => "intergrowth",
        }
    }
}

impl FromStr for Source {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "who" => Ok(Source::Who),
            "intergrowth" => Ok(Source::Intergrowth),
            other => Err(GrowthError::invalid_taxonomy(format!(
                "unknown source '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===============================================
// SEX
// ===============================================

/// Subject sex. `U` is a boundary value only: it is coerced to `F` before
/// any row is stored or any catalog filter runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Sex {
    M,
    F,
    #[default]
    U,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::M => "M",
            Sex::F => "F",
            Sex::U => "U",
        }
    }

    /// The sex used for storage and lookup: `U` maps to `F`.
    pub fn normalized(&self) -> Sex {
        match self {
            Sex::U => Sex::F,
            other => *other,
        }
    }
}

impl FromStr for Sex {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "M" => Ok(Sex::M),
            "F" => Ok(Sex::F),
            "U" => Ok(Sex::U),
            other => Err(GrowthError::invalid_taxonomy(format!(
                "unknown sex '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===============================================
// TABLE NAME
// ===============================================

/// Reference table family.
///
/// `ChildGrowth` is the WHO 0-5y standard, `Growth` the WHO 5-19y
/// reference; `Newborn`/`VeryPretermNewborn` are INTERGROWTH birth-size
/// standards indexed by gestational age; `VeryPretermGrowth` is the
/// INTERGROWTH postnatal standard for very-preterm infants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableName {
    Growth,
    ChildGrowth,
    VeryPretermGrowth,
    VeryPretermNewborn,
    Newborn,
}

impl TableName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::Growth => "growth",
            TableName::ChildGrowth => "child_growth",
            TableName::VeryPretermGrowth => "very_preterm_growth",
            TableName::VeryPretermNewborn => "very_preterm_newborn",
            TableName::Newborn => "newborn",
        }
    }

    /// Tables indexed by gestational age rather than chronological age.
    /// The catalog prefers the gestational axis when disambiguating these.
    pub fn prefers_gestational_axis(&self) -> bool {
        matches!(
            self,
            TableName::Newborn | TableName::VeryPretermNewborn | TableName::VeryPretermGrowth
        )
    }
}

impl FromStr for TableName {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "growth" => Ok(TableName::Growth),
            "child_growth" => Ok(TableName::ChildGrowth),
            "very_preterm_growth" => Ok(TableName::VeryPretermGrowth),
            "very_preterm_newborn" => Ok(TableName::VeryPretermNewborn),
            "newborn" => Ok(TableName::Newborn),
            other => Err(GrowthError::invalid_taxonomy(format!(
                "unknown table name '{other}'"
            ))),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===============================================
// AGE GROUP
// ===============================================

/// Canonical age band of a catalog slice. WHO tables spanning several
/// bands are split at the 2y/5y/10y boundaries during ingest; INTERGROWTH
/// tables carry their table-named group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeGroup {
    ZeroOne,
    ZeroTwo,
    TwoFive,
    FiveTen,
    TenNineteen,
    Newborn,
    VeryPretermNewborn,
    VeryPretermGrowth,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::ZeroOne => "0-1",
            AgeGroup::ZeroTwo => "0-2",
            AgeGroup::TwoFive => "2-5",
            AgeGroup::FiveTen => "5-10",
            AgeGroup::TenNineteen => "10-19",
            AgeGroup::Newborn => "newborn",
            AgeGroup::VeryPretermNewborn => "very_preterm_newborn",
            AgeGroup::VeryPretermGrowth => "very_preterm_growth",
        }
    }

    /// Band for a chronological age axis value, split at the year
    /// boundaries 2y, 5y and 10y (365.25 days per year).
    pub fn for_age_days(x: f64) -> AgeGroup {
        if x < 2.0 * YEAR {
            AgeGroup::ZeroTwo
        } else if x < 5.0 * YEAR {
            AgeGroup::TwoFive
        } else if x < 10.0 * YEAR {
            AgeGroup::FiveTen
        } else {
            AgeGroup::TenNineteen
        }
    }
}

impl FromStr for AgeGroup {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0-1" => Ok(AgeGroup::ZeroOne),
            "0-2" => Ok(AgeGroup::ZeroTwo),
            "2-5" => Ok(AgeGroup::TwoFive),
            "5-10" => Ok(AgeGroup::FiveTen),
            "10-19" => Ok(AgeGroup::TenNineteen),
            "newborn" => Ok(AgeGroup::Newborn),
            "very_preterm_newborn" => Ok(AgeGroup::VeryPretermNewborn),
            "very_preterm_growth" => Ok(AgeGroup::VeryPretermGrowth),
            other => Err(GrowthError::invalid_taxonomy(format!(
                "unknown age group '{other}'"
            ))),
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===============================================
// MEASUREMENT TYPE
// ===============================================

/// Anthropometric measurement a reference table describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeasurementType {
    Stature,
    Weight,
    WeightStatureRatio,
    HeadCircumference,
    BodyMassIndex,
    WeightVelocity,
    LengthVelocity,
    HeadCircumferenceVelocity,
}

impl MeasurementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementType::Stature => "stature",
            MeasurementType::Weight => "weight",
            MeasurementType::WeightStatureRatio => "weight_stature_ratio",
            MeasurementType::HeadCircumference => "head_circumference",
            MeasurementType::BodyMassIndex => "body_mass_index",
            MeasurementType::WeightVelocity => "weight_velocity",
            MeasurementType::LengthVelocity => "length_velocity",
            MeasurementType::HeadCircumferenceVelocity => "head_circumference_velocity",
        }
    }

    /// Resolve a user-facing alias to its canonical measurement.
    ///
    /// Matching is case-insensitive and treats `-` as `_`. Velocity types
    /// have no aliases beyond their canonical names.
    pub fn from_alias(alias: &str) -> Result<MeasurementType, GrowthError> {
        let normalized = alias.to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "stature" | "lfa" | "hfa" | "lhfa" | "sfa" | "length" | "height" | "length_height"
            | "l" | "h" | "s" => Ok(MeasurementType::Stature),
            "weight" | "wfa" | "w" => Ok(MeasurementType::Weight),
            "head_circumference" | "hcfa" | "hc" => Ok(MeasurementType::HeadCircumference),
            "body_mass_index" | "bmi" | "bfa" => Ok(MeasurementType::BodyMassIndex),
            "weight_stature_ratio" | "wfs" | "wfl" | "wfh" | "weight_length" | "weight_height"
            | "weight_stature" | "weight_for_stature" | "weight_for_length"
            | "weight_for_height" => Ok(MeasurementType::WeightStatureRatio),
            "weight_velocity" => Ok(MeasurementType::WeightVelocity),
            "length_velocity" => Ok(MeasurementType::LengthVelocity),
            "head_circumference_velocity" => Ok(MeasurementType::HeadCircumferenceVelocity),
            _ => Err(GrowthError::UnknownMeasurement {
                alias: alias.to_string(),
            }),
        }
    }
}

impl FromStr for MeasurementType {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stature" => Ok(MeasurementType::Stature),
            "weight" => Ok(MeasurementType::Weight),
            "weight_stature_ratio" => Ok(MeasurementType::WeightStatureRatio),
            "head_circumference" => Ok(MeasurementType::HeadCircumference),
            "body_mass_index" => Ok(MeasurementType::BodyMassIndex),
            "weight_velocity" => Ok(MeasurementType::WeightVelocity),
            "length_velocity" => Ok(MeasurementType::LengthVelocity),
            "head_circumference_velocity" => Ok(MeasurementType::HeadCircumferenceVelocity),
            other => Err(GrowthError::invalid_taxonomy(format!(
                "unknown measurement type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===============================================
// X VARIABLE
// ===============================================

/// Kind of the table's x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum XVarType {
    Age,
    GestationalAge,
    Stature,
}

impl XVarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            XVarType::Age => "age",
            XVarType::GestationalAge => "gestational_age",
            XVarType::Stature => "stature",
        }
    }
}

impl FromStr for XVarType {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "age" => Ok(XVarType::Age),
            "gestational_age" => Ok(XVarType::GestationalAge),
            "stature" => Ok(XVarType::Stature),
            other => Err(GrowthError::invalid_taxonomy(format!(
                "unknown x variable type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for XVarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of the table's x axis: days for age axes, centimeters for
/// stature-as-x (weight-for-stature only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum XVarUnit {
    Day,
    Cm,
}

impl XVarUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            XVarUnit::Day => "day",
            XVarUnit::Cm => "cm",
        }
    }
}

impl FromStr for XVarUnit {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(XVarUnit::Day),
            "cm" => Ok(XVarUnit::Cm),
            other => Err(GrowthError::invalid_taxonomy(format!(
                "unknown x variable unit '{other}'"
            ))),
        }
    }
}

impl fmt::Display for XVarUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! # Growthstandards
//!
//! A type-safe Rust library for pediatric anthropometric z-scores and percentiles.
//!
//! ## Features
//! - **LMS method**: Box-Cox power / median / coefficient-of-variation transforms with the WHO extreme-tail correction
//! - **Published references**: WHO child growth standards (0-5y), WHO growth reference (5-19y), INTERGROWTH-21st newborn and very-preterm standards
//! - **Reference compiler**: ingest raw per-sex CSV/XLSX tables (native LMS or tabulated SD columns) into one consolidated Parquet artifact
//! - **Deterministic selection**: measurement alias + sex + age resolve to exactly one reference table, or a descriptive error
//! - **Builder Pattern**: query functions use builder pattern with automatic parameter validation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use growthstandards::prelude::*;
//!
//! // Load the consolidated reference artifact
//! let catalog = Catalog::load("data/pygrowthstandards_0.2.0.parquet")?;
//!
//! // 12-month-old boy measuring 75 cm
//! let z = zscore()
//!     .catalog(&catalog)
//!     .measurement("stature")
//!     .value(75.0)
//!     .sex(Sex::M)
//!     .age_days(365)
//!     .call()?;
//!
//! // 40-week newborn boy weighing 3.4 kg
//! let p = percentile()
//!     .catalog(&catalog)
//!     .measurement("weight")
//!     .value(3.4)
//!     .sex(Sex::M)
//!     .gestational_age(280)
//!     .call()?;
//!
//! println!("height-for-age z: {z:.2}");
//! println!("weight-for-gestational-age percentile: {p:.3}");
//! # GrowthResult::Ok(())
//! ```
//!
//! ## Components
//!
//! - **Kernel** ([`lms`]): z ↔ value transforms, standard-normal CDF, sorted-axis interpolation, SD-column LMS estimation
//! - **Ingest** ([`ingest`]): raw reference files → canonical rows (bad files are logged and skipped, bad rows reject their file)
//! - **Catalog** ([`catalog`]): consolidated row store, Parquet artifact round-trip, indexed [`catalog::GrowthTable`] views
//! - **Query** ([`query`]): alias normalization, deterministic table selection, [`query::zscore`] and [`query::percentile`]
//!
//! ## Notes
//! - Ages are day counts: chronological since birth, gestational since the last menstrual period
//! - Sex `U` is treated as `F` throughout (storage and lookup)
//! - The catalog is immutable after load and safely shareable across threads

pub type GrowthResult<T> = Result<T, error::GrowthError>;

pub mod catalog;
pub mod error;
pub mod ingest;
pub mod lms;
pub mod params;
pub mod prelude;
pub mod query;
pub mod vocab;

//! The growth-table view: four parallel numeric axes (x, L, M, S) plus a
//! parallel derived-flag, strictly increasing in x, with the metadata that
//! identifies the slice. Views are short-lived derivatives built per query
//! and never mutate the catalog they came from.

use crate::error::GrowthError;
use crate::lms;
use crate::vocab::{AgeGroup, MeasurementType, Sex, Source, TableName, XVarType, XVarUnit};
use crate::GrowthResult;
use polars::prelude::*;

/// Per-subject observations aligned to a reference curve's axis: the
/// union of the reference x values and the observation x values, with
/// nulls where the subject has no observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildOverlay {
    pub x: Vec<f64>,
    pub y: Vec<Option<f64>>,
}

/// One resolved reference table.
#[derive(Debug, Clone)]
pub struct GrowthTable {
    pub source: Source,
    pub name: TableName,
    /// The slice's age band; `None` when the view spans several bands of
    /// one table (e.g. the 5-19y reference).
    pub age_group: Option<AgeGroup>,
    pub sex: Sex,
    pub measurement_type: MeasurementType,
    pub x_var_type: XVarType,
    pub x_var_unit: XVarUnit,
    pub x: Vec<f64>,
    pub l: Vec<f64>,
    pub m: Vec<f64>,
    pub s: Vec<f64>,
    pub is_derived: Vec<bool>,
    pub child: Option<ChildOverlay>,
}

impl GrowthTable {
    /// Build a view, checking the parallel-axis and monotonicity
    /// invariants.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        source: Source,
        name: TableName,
        age_group: Option<AgeGroup>,
        sex: Sex,
        measurement_type: MeasurementType,
        x_var_type: XVarType,
        x_var_unit: XVarUnit,
        x: Vec<f64>,
        l: Vec<f64>,
        m: Vec<f64>,
        s: Vec<f64>,
        is_derived: Vec<bool>,
    ) -> GrowthResult<GrowthTable> {
        if x.is_empty() {
            return Err(GrowthError::NoMatch {
                detail: format!("{name}/{measurement_type}/{sex} produced an empty view"),
            });
        }
        if x.len() != l.len()
            || x.len() != m.len()
            || x.len() != s.len()
            || x.len() != is_derived.len()
        {
            return Err(GrowthError::invalid_input(format!(
                "axes of {name}/{measurement_type}/{sex} are not parallel"
            )));
        }
        if x.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GrowthError::invalid_input(format!(
                "x axis of {name}/{measurement_type}/{sex} is not strictly increasing"
            )));
        }

        Ok(GrowthTable {
            source,
            name,
            age_group,
            sex,
            measurement_type,
            x_var_type,
            x_var_unit,
            x,
            l,
            m,
            s,
            is_derived,
            child: None,
        })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn min_x(&self) -> f64 {
        self.x[0]
    }

    pub fn max_x(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    /// LMS parameters at `x`: the stored sample on an exact hit, linear
    /// interpolation between the nearest samples otherwise.
    pub fn lms_at(&self, x: f64) -> GrowthResult<(f64, f64, f64)> {
        if let Some(i) = self.x.iter().position(|&sample| sample == x) {
            return Ok((self.l[i], self.m[i], self.s[i]));
        }

        let n = lms::DEFAULT_INTERP_POINTS;
        Ok((
            lms::interpolate(&self.x, &self.l, x, n)?,
            lms::interpolate(&self.x, &self.m, x, n)?,
            lms::interpolate(&self.x, &self.s, x, n)?,
        ))
    }

    /// Narrow the view to x ∈ [lo, hi].
    pub fn cut(&mut self, lo: f64, hi: f64) {
        let keep: Vec<bool> = self.x.iter().map(|&x| x >= lo && x <= hi).collect();

        retain_by_mask(&mut self.x, &keep);
        retain_by_mask(&mut self.l, &keep);
        retain_by_mask(&mut self.m, &keep);
        retain_by_mask(&mut self.s, &keep);
        retain_by_mask(&mut self.is_derived, &keep);

        if let Some(overlay) = &mut self.child {
            let keep: Vec<bool> = overlay.x.iter().map(|&x| x >= lo && x <= hi).collect();
            retain_by_mask(&mut overlay.x, &keep);
            retain_by_mask(&mut overlay.y, &keep);
        }
    }

    /// Align per-subject observations to this curve's axis: the overlay
    /// axis is the sorted, unique union of the reference x values and the
    /// observation x values, with null y wherever the subject has no
    /// observation.
    pub fn add_child_data(&mut self, xs: &[f64], ys: &[f64]) -> GrowthResult<()> {
        if xs.len() != ys.len() {
            return Err(GrowthError::invalid_input(format!(
                "child observations must be parallel ({} x values, {} y values)",
                xs.len(),
                ys.len()
            )));
        }

        let mut union: Vec<f64> = self.x.iter().chain(xs.iter()).copied().collect();
        union.sort_by(f64::total_cmp);
        union.dedup();

        let y = union
            .iter()
            .map(|&ux| {
                xs.iter()
                    .position(|&ox| ox == ux)
                    .map(|i| ys[i])
            })
            .collect();

        self.child = Some(ChildOverlay { x: union, y });
        Ok(())
    }

    /// Reference values at each requested z-score, one row per axis
    /// sample: columns `x`, `is_derived`, and one column per z (named by
    /// the z value). Tail z-scores use the linear SD2-SD3 extrapolation.
    pub fn values_at_z(&self, z_scores: &[f64]) -> GrowthResult<DataFrame> {
        let mut columns: Vec<Column> = vec![
            Series::new("x".into(), self.x.clone()).into_column(),
            Series::new("is_derived".into(), self.is_derived.clone()).into_column(),
        ];

        for &z in z_scores {
            let mut values = Vec::with_capacity(self.len());
            for i in 0..self.len() {
                values.push(lms::adjusted_value_for_z(z, self.l[i], self.m[i], self.s[i])?);
            }
            columns.push(Series::new(z.to_string().into(), values).into_column());
        }

        Ok(DataFrame::new(columns)?)
    }
}

fn retain_by_mask<T>(values: &mut Vec<T>, keep: &[bool]) {
    let mut i = 0;
    values.retain(|_| {
        let k = keep[i];
        i += 1;
        k
    });
}

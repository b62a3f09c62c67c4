//! # LMS Kernel
//!
//! Pure numerics for the LMS (Box-Cox power / median / coefficient of
//! variation) method: z-score from value and value from z-score with the
//! WHO extreme-tail correction, the standard-normal CDF, sorted-axis
//! interpolation, and the bounded least-squares estimator used when a
//! source publishes SD columns instead of L/M/S triples.
//!
//! No I/O and no catalog awareness; everything here operates on plain
//! floats and slices.

use crate::GrowthResult;
use crate::error::GrowthError;

/// Number of nearest samples used by [`interpolate`] by default.
pub const DEFAULT_INTERP_POINTS: usize = 4;

// Bounds and starting point of the (L, S) fit. Frozen so re-ingesting the
// same sources reproduces the consolidated artifact bit-for-bit.
const FIT_L_BOUNDS: (f64, f64) = (-1.1, 1.1);
const FIT_S_BOUNDS: (f64, f64) = (1e-8, 1.0);
const FIT_L_START: f64 = 0.1;
const FIT_MAX_ITER: usize = 200;

// ===============================================
// Z-SCORE AND VALUE TRANSFORMS
// ===============================================

/// Z-score of a measurement `value` under LMS parameters, interior form.
///
/// # Formula
/// ```text
/// L ≠ 0:  z = ((Y/M)^L − 1) / (L·S)
/// L = 0:  z = ln(Y/M) / S
/// ```
///
/// Most callers want [`adjusted_z_score`], which applies the extreme-tail
/// correction beyond |z| = 3.
pub fn z_score(value: f64, l: f64, m: f64, s: f64) -> GrowthResult<f64> {
    check_lms(l, m, s)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(GrowthError::invalid_input(format!(
            "measurement value must be a positive finite number, got {value}"
        )));
    }

    if l == 0.0 {
        return Ok((value / m).ln() / s);
    }

    Ok(((value / m).powf(l) - 1.0) / (l * s))
}

/// Measurement value at z-score `z` under LMS parameters, interior form.
///
/// # Formula
/// ```text
/// L ≠ 0:  Y = M · (1 + L·S·z)^(1/L)
/// L = 0:  Y = M · exp(S·z)
/// ```
pub fn value_for_z(z: f64, l: f64, m: f64, s: f64) -> GrowthResult<f64> {
    check_lms(l, m, s)?;
    if !z.is_finite() {
        return Err(GrowthError::invalid_input(format!(
            "z-score must be finite, got {z}"
        )));
    }

    if l == 0.0 {
        return Ok(m * (s * z).exp());
    }

    let base = 1.0 + l * s * z;
    if base <= 0.0 {
        return Err(GrowthError::invalid_input(format!(
            "1 + L·S·z = {base} is not positive for z = {z} (L = {l}, S = {s})"
        )));
    }

    Ok(m * base.powf(1.0 / l))
}

/// Z-score with the extreme-tail correction beyond |z| = 3.
///
/// Past three standard deviations the Box-Cox transform is replaced by a
/// linear continuation with the SD2-SD3 step, per the WHO computation
/// guidance for the 5-19y reference:
///
/// ```text
/// z > 3:   z* = 3 + (Y − SD3) / (SD3 − SD2)
/// z < −3:  z* = −3 + (Y − SD3neg) / (SD2neg − SD3neg)
/// ```
///
/// No correction is applied when L = 1 (the transform is already linear).
pub fn adjusted_z_score(value: f64, l: f64, m: f64, s: f64) -> GrowthResult<f64> {
    let z = z_score(value, l, m, s)?;

    if l == 1.0 || (-3.0..=3.0).contains(&z) {
        return Ok(z);
    }

    if z > 3.0 {
        let sd3 = value_for_z(3.0, l, m, s)?;
        let sd2 = value_for_z(2.0, l, m, s)?;
        Ok(3.0 + (value - sd3) / (sd3 - sd2))
    } else {
        let sd3neg = value_for_z(-3.0, l, m, s)?;
        let sd2neg = value_for_z(-2.0, l, m, s)?;
        Ok(-3.0 + (value - sd3neg) / (sd2neg - sd3neg))
    }
}

/// Measurement value at z-score `z`, extrapolating linearly with the
/// SD2-SD3 step beyond |z| = 3. Inverse of [`adjusted_z_score`].
pub fn adjusted_value_for_z(z: f64, l: f64, m: f64, s: f64) -> GrowthResult<f64> {
    if l == 1.0 || (-3.0..=3.0).contains(&z) {
        return value_for_z(z, l, m, s);
    }

    if z > 3.0 {
        let sd3 = value_for_z(3.0, l, m, s)?;
        let sd2 = value_for_z(2.0, l, m, s)?;
        Ok(sd3 + (sd3 - sd2) * (z - 3.0))
    } else {
        let sd3neg = value_for_z(-3.0, l, m, s)?;
        let sd2neg = value_for_z(-2.0, l, m, s)?;
        Ok(sd3neg + (sd2neg - sd3neg) * (z + 3.0))
    }
}

fn check_lms(l: f64, m: f64, s: f64) -> GrowthResult<()> {
    if !l.is_finite() || !m.is_finite() || !s.is_finite() {
        return Err(GrowthError::invalid_input(format!(
            "LMS parameters must be finite, got L = {l}, M = {m}, S = {s}"
        )));
    }
    if m <= 0.0 {
        return Err(GrowthError::invalid_input(format!(
            "median M must be positive, got {m}"
        )));
    }
    if s <= 0.0 {
        return Err(GrowthError::invalid_input(format!(
            "coefficient of variation S must be positive, got {s}"
        )));
    }
    Ok(())
}

// ===============================================
// STANDARD-NORMAL CDF
// ===============================================

/// Standard-normal cumulative distribution function Φ(z), in [0, 1].
///
/// Hart's double-precision rational approximation (as published by West),
/// absolute error on the order of 1e-15 over the full double range.
pub fn normal_cdf(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }

    let x = z.abs();
    let cum = if x > 37.0 {
        0.0
    } else {
        let e = (-x * x / 2.0).exp();
        if x < 7.071_067_811_865_475 {
            let n = (((((3.526_249_659_989_11e-2 * x + 0.700_383_064_443_688) * x
                + 6.373_962_203_531_65)
                * x
                + 33.912_866_078_383)
                * x
                + 112.079_291_497_871)
                * x
                + 221.213_596_169_931)
                * x
                + 220.206_867_912_376;
            let d = ((((((8.838_834_764_831_84e-2 * x + 1.755_667_163_182_64) * x
                + 16.064_177_579_207)
                * x
                + 86.780_732_202_946_1)
                * x
                + 296.564_248_779_674)
                * x
                + 637.333_633_378_831)
                * x
                + 793.826_512_519_948)
                * x
                + 440.413_735_824_752;
            e * n / d
        } else {
            let b = x + 1.0 / (x + 2.0 / (x + 3.0 / (x + 4.0 / (x + 0.65))));
            e / (b * 2.506_628_274_631)
        }
    };

    if z > 0.0 { 1.0 - cum } else { cum }
}

// ===============================================
// SORTED-AXIS INTERPOLATION
// ===============================================

/// Piecewise-linear interpolation of `ys` over the strictly increasing
/// axis `xs` at query `q`, restricted to the `n_points` samples nearest
/// to `q`.
///
/// An exact axis hit returns the stored sample. A query outside
/// `[xs[0], xs[last]]` is an error.
pub fn interpolate(xs: &[f64], ys: &[f64], q: f64, n_points: usize) -> GrowthResult<f64> {
    if xs.is_empty() || xs.len() != ys.len() {
        return Err(GrowthError::invalid_input(format!(
            "interpolation axes must be non-empty and parallel ({} vs {})",
            xs.len(),
            ys.len()
        )));
    }

    let (min, max) = (xs[0], xs[xs.len() - 1]);
    if q < min || q > max {
        return Err(GrowthError::OutOfRange { x: q, min, max });
    }

    if let Some(i) = xs.iter().position(|&x| x == q) {
        return Ok(ys[i]);
    }

    // Indices of the n_points samples closest to q, in axis order.
    // Ties break toward the lower index so the selection is deterministic.
    let n_points = n_points.max(2).min(xs.len());
    let mut by_distance: Vec<usize> = (0..xs.len()).collect();
    by_distance.sort_by(|&a, &b| {
        (xs[a] - q)
            .abs()
            .total_cmp(&(xs[b] - q).abs())
            .then(a.cmp(&b))
    });
    let mut selected = by_distance[..n_points].to_vec();
    selected.sort_unstable();

    // Linear interpolation within the selection, clamped at its edges
    // (for a monotone axis the selection brackets q in practice).
    let first = selected[0];
    let last = selected[selected.len() - 1];
    if q <= xs[first] {
        return Ok(ys[first]);
    }
    if q >= xs[last] {
        return Ok(ys[last]);
    }

    for pair in selected.windows(2) {
        let (i, j) = (pair[0], pair[1]);
        if xs[i] <= q && q <= xs[j] {
            let t = (q - xs[i]) / (xs[j] - xs[i]);
            return Ok(ys[i] + t * (ys[j] - ys[i]));
        }
    }

    // Unreachable for a strictly increasing axis.
    Err(GrowthError::invalid_input(format!(
        "interpolation axis is not sorted around q = {q}"
    )))
}

// ===============================================
// LMS ESTIMATION FROM SD COLUMNS
// ===============================================

/// Estimate (L, M, S) from tabulated values at integer z-scores.
///
/// M is taken exactly from the z = 0 entry; (L, S) are fit by bounded
/// least squares of the value-for-z model against the tabulated values,
/// with L ∈ [−1.1, 1.1], S ∈ [1e-8, 1], starting from L = 0.1 and
/// S = std(values)/M. The damping schedule and tolerances are fixed so
/// the fit is deterministic across runs.
pub fn estimate_lms_from_sd(z_scores: &[f64], values: &[f64]) -> GrowthResult<(f64, f64, f64)> {
    if z_scores.len() != values.len() || z_scores.len() < 3 {
        return Err(GrowthError::invalid_input(format!(
            "SD estimation needs at least 3 parallel (z, value) samples, got {} and {}",
            z_scores.len(),
            values.len()
        )));
    }

    let median_idx = z_scores.iter().position(|&z| z == 0.0).ok_or_else(|| {
        GrowthError::MissingMedian {
            detail: format!("z-scores {z_scores:?} contain no 0"),
        }
    })?;
    let m = values[median_idx];
    if !m.is_finite() || m <= 0.0 {
        return Err(GrowthError::BadLmsFit {
            detail: format!("median value {m} is not a positive finite number"),
        });
    }

    let s0 = (population_std(values) / m).clamp(FIT_S_BOUNDS.0, FIT_S_BOUNDS.1);
    let (l, s) = fit_l_s(z_scores, values, m, FIT_L_START, s0)?;

    Ok((l, m, s))
}

/// Model value with the near-zero L branch used during fitting.
fn fit_model(z: f64, l: f64, m: f64, s: f64) -> f64 {
    if l.abs() <= 1e-6 {
        return m * (s * z).exp();
    }
    let base = 1.0 + l * s * z;
    if base <= 0.0 {
        return f64::NAN;
    }
    m * base.powf(1.0 / l)
}

fn fit_residuals(z_scores: &[f64], values: &[f64], m: f64, l: f64, s: f64) -> Option<Vec<f64>> {
    let mut out = Vec::with_capacity(z_scores.len());
    for (&z, &y) in z_scores.iter().zip(values) {
        let v = fit_model(z, l, m, s);
        if !v.is_finite() {
            return None;
        }
        out.push(v - y);
    }
    Some(out)
}

fn cost_of(residuals: &[f64]) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

/// Bounded 2-parameter Levenberg-Marquardt over (L, S) with analytic
/// Jacobian. Steps are projected back into the bounds.
fn fit_l_s(
    z_scores: &[f64],
    values: &[f64],
    m: f64,
    l_start: f64,
    s_start: f64,
) -> GrowthResult<(f64, f64)> {
    let (mut l, mut s) = (l_start, s_start);
    let mut residuals = fit_residuals(z_scores, values, m, l, s).ok_or_else(|| {
        GrowthError::BadLmsFit {
            detail: "model is undefined at the starting point".to_string(),
        }
    })?;
    let mut cost = cost_of(&residuals);
    let mut lambda = 1e-3;

    for _ in 0..FIT_MAX_ITER {
        // Normal equations from the analytic Jacobian:
        //   dv/dL = v · (−ln(u)/L² + S·z/(L·u)),  u = 1 + L·S·z
        //   dv/dS = v · z/u
        // with the L → 0 limits dv/dL → −v·S²z²/2 and dv/dS → v·z.
        let (mut jtj_ll, mut jtj_ls, mut jtj_ss) = (0.0, 0.0, 0.0);
        let (mut jtr_l, mut jtr_s) = (0.0, 0.0);
        for (i, &z) in z_scores.iter().enumerate() {
            let v = fit_model(z, l, m, s);
            let (dl, ds) = if l.abs() <= 1e-6 {
                (-v * s * s * z * z / 2.0, v * z)
            } else {
                let u = 1.0 + l * s * z;
                (v * (-u.ln() / (l * l) + s * z / (l * u)), v * z / u)
            };
            jtj_ll += dl * dl;
            jtj_ls += dl * ds;
            jtj_ss += ds * ds;
            jtr_l += dl * residuals[i];
            jtr_s += ds * residuals[i];
        }

        let mut improved = false;
        while lambda <= 1e12 {
            let a = jtj_ll * (1.0 + lambda);
            let b = jtj_ls;
            let d = jtj_ss * (1.0 + lambda);
            let det = a * d - b * b;
            if det.abs() < 1e-300 {
                lambda *= 10.0;
                continue;
            }

            let step_l = (-d * jtr_l + b * jtr_s) / det;
            let step_s = (b * jtr_l - a * jtr_s) / det;
            let cand_l = (l + step_l).clamp(FIT_L_BOUNDS.0, FIT_L_BOUNDS.1);
            let cand_s = (s + step_s).clamp(FIT_S_BOUNDS.0, FIT_S_BOUNDS.1);

            if let Some(cand_res) = fit_residuals(z_scores, values, m, cand_l, cand_s) {
                let cand_cost = cost_of(&cand_res);
                if cand_cost < cost {
                    let step_norm = (cand_l - l).hypot(cand_s - s);
                    let reduction = cost - cand_cost;
                    l = cand_l;
                    s = cand_s;
                    residuals = cand_res;
                    cost = cand_cost;
                    lambda = (lambda / 10.0).max(1e-12);
                    improved = true;

                    if step_norm < 1e-12 || reduction < 1e-14 * (1.0 + cost) {
                        return Ok((l, s));
                    }
                    break;
                }
            }
            lambda *= 10.0;
        }

        if !improved {
            // Damping exhausted: the current point is a bounded minimum.
            break;
        }
    }

    if !cost.is_finite() || !l.is_finite() || !s.is_finite() {
        return Err(GrowthError::BadLmsFit {
            detail: format!("fit diverged (L = {l}, S = {s}, cost = {cost})"),
        });
    }

    Ok((l, s))
}

fn population_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

//! Small numeric helpers shared by the feature, preprocessing and model layers.

/// Linear-interpolation quantile over already-sorted values.
///
/// Matches the estimator the training thresholds were tuned with
/// (`h = (n - 1) * q`, interpolate between the two adjacent order
/// statistics). `sorted` must be ascending and non-empty; `q` in [0, 1].
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let q = q.clamp(0.0, 1.0);
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = h - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Quantile of unsorted values. Non-finite values are skipped; returns
/// `None` when nothing finite remains.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(f64::total_cmp);
    Some(quantile_sorted(&finite, q))
}

/// Mean and (population) standard deviation, skipping non-finite values.
/// Returns `(0.0, 0.0)` for an empty input.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return (0.0, 0.0);
    }
    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Numerically safe logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Inverse of [`sigmoid`]. `p` is clamped away from 0 and 1.
pub fn logit(p: f64) -> f64 {
    let p = p.clamp(1e-12, 1.0 - 1e-12);
    (p / (1.0 - p)).ln()
}

/// Trapezoidal area under a curve given as matched x/y points. Handles a
/// descending x axis (the precision-recall convention) by summing absolute
/// x steps.
pub fn trapezoid_area(xs: &[f64], ys: &[f64]) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    let mut area = 0.0;
    for i in 1..xs.len() {
        let dx = (xs[i] - xs[i - 1]).abs();
        area += dx * (ys[i] + ys[i - 1]) / 2.0;
    }
    area
}

//! Small numeric helpers shared by the policies and the aggregator.

/// Index of the first maximum of `xs` (lowest index wins ties).
///
/// Returns `None` for an empty slice or when any value is `NaN`; callers treat
/// the latter as a numeric defect rather than silently picking an arm.
#[must_use]
pub fn first_max(xs: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &x) in xs.iter().enumerate() {
        if x.is_nan() {
            return None;
        }
        match best {
            Some((_, b)) if x <= b => {}
            _ => best = Some((i, x)),
        }
    }
    best.map(|(i, _)| i)
}

/// Natural log with a floor of zero: `ln(max(x, 1))`.
///
/// Used for confidence widths whose log argument can dip below 1 on very
/// short horizons; a negative width would otherwise make the bound shrink
/// below the empirical mean (or go `NaN` under a square root).
#[inline]
#[must_use]
pub fn ln_floor0(x: f64) -> f64 {
    if x > 1.0 {
        x.ln()
    } else {
        0.0
    }
}

/// Round half away from zero to two decimals, as published regret columns are.
#[inline]
#[must_use]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Quantile `q` in `[0, 1]` with linear interpolation between order statistics.
///
/// Matches the default used by common dataframe tooling: with sorted values
/// `v[0..n]`, position `q * (n - 1)` is interpolated between its neighbours.
/// Returns `None` for an empty input. Sorts `values` in place.
#[must_use]
pub fn quantile_linear(values: &mut [f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let q = if q.is_finite() { q.clamp(0.0, 1.0) } else { 0.5 };
    let pos = q * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(values[lo] + (values[hi] - values[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_max_breaks_ties_low() {
        assert_eq!(first_max(&[0.1, 0.5, 0.5]), Some(1));
        assert_eq!(first_max(&[0.5, 0.5]), Some(0));
        assert_eq!(first_max(&[f64::NEG_INFINITY, f64::NEG_INFINITY]), Some(0));
        assert_eq!(first_max(&[]), None);
        assert_eq!(first_max(&[0.1, f64::NAN]), None);
    }

    #[test]
    fn ln_floor0_never_negative() {
        assert_eq!(ln_floor0(0.0), 0.0);
        assert_eq!(ln_floor0(0.5), 0.0);
        assert!((ln_floor0(std::f64::consts::E) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn round2_matches_two_decimals() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.236), 1.24);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn quantile_interpolates() {
        let mut v = vec![4.0, 1.0, 3.0, 2.0];
        assert_eq!(quantile_linear(&mut v, 0.0), Some(1.0));
        assert_eq!(quantile_linear(&mut v, 1.0), Some(4.0));
        assert_eq!(quantile_linear(&mut v, 0.5), Some(2.5));
        let mut one = vec![7.0];
        assert_eq!(quantile_linear(&mut one, 0.95), Some(7.0));
        assert_eq!(quantile_linear(&mut [], 0.5), None);
    }
}

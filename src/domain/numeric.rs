//! Numeric helpers shared by the indicator and statistics.
//!
//! Undefined values are `None`, never zero.

/// Rounds half-to-even at `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// Fractional change from `from` to `to`. Undefined when `from` is zero.
pub fn fraction_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 || !from.is_finite() || !to.is_finite() {
        None
    } else {
        Some((to - from) / from)
    }
}

/// Period-over-period fractional change. The first element is always `None`.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    for w in values.windows(2) {
        out.push(fraction_change(w[0], w[1]));
    }
    out
}

/// Mean of the defined values; `None` when there are none.
pub fn nan_mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Index of the first minimum. Ties resolve to the earliest position.
pub fn argmin(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if v >= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Index of the first maximum. Ties resolve to the earliest position.
pub fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn round_half_even() {
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(3.5, 0), 4.0);
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(-0.456), -0.46);
    }

    #[test]
    fn pct_change_first_is_none() {
        let changes = pct_change(&[100.0, 110.0, 99.0]);
        assert_eq!(changes.len(), 3);
        assert!(changes[0].is_none());
        assert_relative_eq!(changes[1].unwrap(), 0.1);
        assert_relative_eq!(changes[2].unwrap(), -0.1);
    }

    #[test]
    fn pct_change_from_zero_is_undefined() {
        let changes = pct_change(&[0.0, 1.0]);
        assert!(changes[1].is_none());
    }

    #[test]
    fn nan_mean_skips_undefined() {
        assert_eq!(nan_mean(vec![Some(1.0), None, Some(3.0)]), Some(2.0));
        assert_eq!(nan_mean(vec![None, None]), None);
        assert_eq!(nan_mean(Vec::<Option<f64>>::new()), None);
    }

    #[test]
    fn quantile_interpolates() {
        let v: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        assert_relative_eq!(quantile(&v, 0.8).unwrap(), 8.2, epsilon = 1e-9);
        assert_relative_eq!(quantile(&v, 0.9).unwrap(), 9.1, epsilon = 1e-9);
        assert_relative_eq!(quantile(&v, 0.0).unwrap(), 1.0);
        assert_relative_eq!(quantile(&v, 1.0).unwrap(), 10.0);
        assert!(quantile(&[], 0.5).is_none());
    }

    #[test]
    fn arg_extrema_take_first_tie() {
        let v = [3.0, 1.0, 5.0, 1.0, 5.0];
        assert_eq!(argmin(&v), Some(1));
        assert_eq!(argmax(&v), Some(2));
        assert_eq!(argmin(&[]), None);
    }
}

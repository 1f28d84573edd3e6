//! RSI-style momentum oscillator.
//!
//! Works on fractional price changes rather than absolute differences, with
//! simple (not Wilder-smoothed) rolling means:
//! - gain = change where change > 0, else 0
//! - loss = |change| where change < 0, else 0
//! - RSI = 100 - 100 / (1 + mean(gain, window) / mean(loss, window))
//!
//! Values are rounded to 2 decimals. The first change is undefined, so the
//! first `window` positions carry no value.
//!
//! When the average loss is zero the ratio is infinite: a positive average
//! gain clamps to 100, and a window with neither gains nor losses (flat
//! prices) has no value.

use crate::domain::bar::BarSeries;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, RsiScope};
use crate::domain::numeric::{pct_change, round2};
use crate::domain::session::segment;

/// Oscillator over a raw price sequence.
pub fn calculate_rsi(prices: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; prices.len()];
    }

    let changes = pct_change(prices);
    let gains: Vec<Option<f64>> = changes.iter().map(|c| c.map(|c| c.max(0.0))).collect();
    let losses: Vec<Option<f64>> = changes
        .iter()
        .map(|c| c.map(|c| if c < 0.0 { -c } else { 0.0 }))
        .collect();

    (0..prices.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let range = i + 1 - window..=i;
            let avg_gain = rolling_mean(&gains[range.clone()])?;
            let avg_loss = rolling_mean(&losses[range])?;
            rsi_value(avg_gain, avg_loss)
        })
        .collect()
}

fn rolling_mean(window: &[Option<f64>]) -> Option<f64> {
    let mut sum = 0.0;
    for v in window {
        sum += (*v)?;
    }
    Some(sum / window.len() as f64)
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return if avg_gain > 0.0 { Some(100.0) } else { None };
    }
    Some(round2(100.0 - 100.0 / (1.0 + avg_gain / avg_loss)))
}

/// Oscillator column over a series' low prices.
pub fn calculate_rsi_series(series: &BarSeries, window: usize, scope: RsiScope) -> IndicatorSeries {
    let lows = series.lows();
    let raw = match scope {
        RsiScope::Series => calculate_rsi(&lows, window),
        RsiScope::Session => segment(series)
            .iter()
            .flat_map(|s| calculate_rsi(&lows[s.range()], window))
            .collect(),
    };

    let values = series
        .bars()
        .iter()
        .zip(raw)
        .map(|(bar, value)| IndicatorPoint {
            timestamp: bar.timestamp,
            value,
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(window),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Bar;
    use chrono::NaiveDateTime;

    #[test]
    fn rsi_empty_prices() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_single_price() {
        let values = calculate_rsi(&[100.0], 14);
        assert_eq!(values, vec![None]);
    }

    #[test]
    fn rsi_warmup_period() {
        let prices: Vec<f64> = (1..=20).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let values = calculate_rsi(&prices, 14);

        assert_eq!(values.len(), 20);
        for (i, v) in values.iter().enumerate().take(14) {
            assert!(v.is_none(), "position {} should have no value", i);
        }
        assert!(values[14].is_some(), "position 14 should have a value");
    }

    #[test]
    fn rsi_all_gains_clamps_to_100() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let values = calculate_rsi(&prices, 14);
        assert_eq!(values[14], Some(100.0));
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let values = calculate_rsi(&prices, 14);
        assert_eq!(values[14], Some(0.0));
    }

    #[test]
    fn rsi_flat_prices_undefined() {
        let values = calculate_rsi(&[10.0; 6], 3);
        assert!(values.iter().all(Option::is_none));
    }

    #[test]
    fn rsi_known_calculation() {
        let values = calculate_rsi(&[100.0, 102.0, 101.0, 104.0], 2);
        assert_eq!(values, vec![None, None, Some(67.11), Some(75.18)]);
    }

    #[test]
    fn rsi_zero_window() {
        let values = calculate_rsi(&[1.0, 2.0], 0);
        assert_eq!(values, vec![None, None]);
    }

    #[test]
    fn rsi_in_range() {
        let prices: Vec<f64> = (1..=40)
            .map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0)
            .collect();
        for v in calculate_rsi(&prices, 5).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "RSI {} out of range", v);
        }
    }

    fn minute_bars(day: &str, lows: &[f64]) -> Vec<Bar> {
        let open = NaiveDateTime::parse_from_str(&format!("{day} 09:30:00"), "%Y-%m-%d %H:%M:%S")
            .unwrap();
        lows.iter()
            .enumerate()
            .map(|(i, &low)| Bar {
                timestamp: open + chrono::Duration::minutes(i as i64),
                open: low,
                high: low,
                low,
                close: low,
                volume: 10,
            })
            .collect()
    }

    #[test]
    fn session_scope_restarts_warmup() {
        let mut bars = minute_bars("2024-01-02", &[100.0, 102.0, 101.0, 104.0]);
        bars.extend(minute_bars("2024-01-03", &[100.0, 102.0, 101.0, 104.0]));
        let series = BarSeries::new("T", "7d".parse().unwrap(), "1m".parse().unwrap(), bars).unwrap();

        let by_session = calculate_rsi_series(&series, 2, RsiScope::Session);
        let values: Vec<Option<f64>> = by_session.values.iter().map(|p| p.value).collect();
        assert_eq!(
            values,
            vec![None, None, Some(67.11), Some(75.18), None, None, Some(67.11), Some(75.18)]
        );

        let whole = calculate_rsi_series(&series, 2, RsiScope::Series);
        assert!(whole.values[4].value.is_some());
        assert_eq!(whole.indicator_type, IndicatorType::Rsi(2));
    }
}

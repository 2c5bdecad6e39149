/// indicators.rs — ATR and Donchian channel over an OHLCV series
///
/// All values are `f64::NAN` until their lookback window is filled; callers
/// treat NaN as "no signal possible", never as an error. The series must be
/// in ascending time order.
use chrono::{DateTime, Utc};

use crate::models::Bar;

#[derive(Debug, Clone, Copy)]
pub struct IndicatorParams {
    pub atr_window: usize,
    pub donchian_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            atr_window: 14,
            donchian_window: 20,
        }
    }
}

/// Per-bar indicator snapshot consumed by the signal detector.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot {
    pub open_time: DateTime<Utc>,
    pub close: f64,
    pub true_range: f64,
    pub atr: f64,
    pub donchian_upper: f64,
    pub donchian_lower: f64,
}

/// True Range series.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let n = bars.len();
    let mut tr = vec![f64::NAN; n];
    if n == 0 {
        return tr;
    }
    tr[0] = bars[0].high - bars[0].low;
    for i in 1..n {
        let h = bars[i].high;
        let l = bars[i].low;
        let pc = bars[i - 1].close;
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
    }
    tr
}

/// Compute the full snapshot series. ATR is a simple moving average of the
/// true range; Donchian bounds are the rolling max high / min low.
pub fn compute(bars: &[Bar], params: IndicatorParams) -> Vec<Snapshot> {
    let n = bars.len();
    let tr = true_range(bars);
    let mut out = Vec::with_capacity(n);

    for i in 0..n {
        let atr = if params.atr_window > 0 && i + 1 >= params.atr_window {
            let window = &tr[i + 1 - params.atr_window..=i];
            window.iter().sum::<f64>() / params.atr_window as f64
        } else {
            f64::NAN
        };

        let (upper, lower) = if params.donchian_window > 0 && i + 1 >= params.donchian_window {
            let window = &bars[i + 1 - params.donchian_window..=i];
            let mut max_high = f64::NEG_INFINITY;
            let mut min_low = f64::INFINITY;
            for bar in window {
                if bar.high > max_high {
                    max_high = bar.high;
                }
                if bar.low < min_low {
                    min_low = bar.low;
                }
            }
            (max_high, min_low)
        } else {
            (f64::NAN, f64::NAN)
        };

        out.push(Snapshot {
            open_time: bars[i].open_time,
            close: bars[i].close,
            true_range: tr[i],
            atr,
            donchian_upper: upper,
            donchian_lower: lower,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn make_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        data.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Bar {
                open_time: base + Duration::hours(4 * i as i64),
                open,
                high,
                low,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn true_range_basic() {
        let bars = make_bars(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 105-95 = 10
            (102.0, 108.0, 100.0, 106.0), // TR = max(8, 6, 2) = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = max(9, 1, 8) = 9
        ]);
        let tr = true_range(&bars);
        assert!((tr[0] - 10.0).abs() < 1e-9);
        assert!((tr[1] - 8.0).abs() < 1e-9);
        assert!((tr[2] - 9.0).abs() < 1e-9);
    }

    #[test]
    fn true_range_gap_up() {
        // Prev close 100, bar 110-115-108: TR = |115-100| = 15
        let bars = make_bars(&[(98.0, 102.0, 97.0, 100.0), (110.0, 115.0, 108.0, 112.0)]);
        let tr = true_range(&bars);
        assert!((tr[1] - 15.0).abs() < 1e-9);
    }

    #[test]
    fn atr_is_simple_mean_of_true_range() {
        let bars = make_bars(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 10
            (102.0, 108.0, 100.0, 106.0), // TR = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = 9
            (99.0, 103.0, 97.0, 101.0),   // TR = 6
        ]);
        let params = IndicatorParams {
            atr_window: 3,
            donchian_window: 2,
        };
        let snaps = compute(&bars, params);
        assert!(snaps[0].atr.is_nan());
        assert!(snaps[1].atr.is_nan());
        assert!((snaps[2].atr - 9.0).abs() < 1e-9); // mean(10, 8, 9)
        assert!((snaps[3].atr - 23.0 / 3.0).abs() < 1e-9); // mean(8, 9, 6)
    }

    #[test]
    fn donchian_rolling_bounds() {
        let bars = make_bars(&[
            (10.0, 12.0, 9.0, 11.0),
            (11.0, 15.0, 10.0, 14.0),
            (14.0, 14.0, 13.0, 13.5),
            (13.5, 16.0, 12.0, 15.0),
        ]);
        let params = IndicatorParams {
            atr_window: 2,
            donchian_window: 3,
        };
        let snaps = compute(&bars, params);
        assert!(snaps[1].donchian_upper.is_nan());
        assert!((snaps[2].donchian_upper - 15.0).abs() < 1e-9);
        assert!((snaps[2].donchian_lower - 9.0).abs() < 1e-9);
        assert!((snaps[3].donchian_upper - 16.0).abs() < 1e-9);
        assert!((snaps[3].donchian_lower - 10.0).abs() < 1e-9);
    }

    #[test]
    fn short_series_stays_undefined() {
        // Fewer bars than the larger window: everything downstream is NaN
        let bars = make_bars(&[(10.0, 12.0, 9.0, 11.0), (11.0, 15.0, 10.0, 14.0)]);
        let snaps = compute(&bars, IndicatorParams::default());
        for s in &snaps {
            assert!(s.atr.is_nan());
            assert!(s.donchian_upper.is_nan());
            assert!(s.donchian_lower.is_nan());
        }
    }

    #[test]
    fn empty_series() {
        let snaps = compute(&[], IndicatorParams::default());
        assert!(snaps.is_empty());
    }
}

/// detector.rs — Donchian breakout rule
///
/// Evaluates the two most recent indicator snapshots for one
/// (symbol, mode, timeframe). The channel bounds come from the PREVIOUS bar
/// so the decision never looks ahead of the bar it fires on.
use chrono::Utc;

use crate::indicators::Snapshot;
use crate::models::{bar_id, signal_id, Mode, Side, Signal};

/// Breakout decision:
/// - LONG iff `close > donchian_upper(prev)`
/// - SHORT iff `close < donchian_lower(prev)`
/// - otherwise, or when any input is still NaN (warmup), no signal.
///
/// Target is one ATR beyond the entry in the trade direction.
pub fn evaluate(
    symbol: &str,
    mode: Mode,
    timeframe: &str,
    prev: &Snapshot,
    last: &Snapshot,
) -> Option<Signal> {
    let close = last.close;
    if close.is_nan()
        || last.atr.is_nan()
        || prev.donchian_upper.is_nan()
        || prev.donchian_lower.is_nan()
    {
        return None;
    }

    let side = if close > prev.donchian_upper {
        Side::Long
    } else if close < prev.donchian_lower {
        Side::Short
    } else {
        return None;
    };

    let target_price = match side {
        Side::Long => close + last.atr,
        Side::Short => close - last.atr,
    };

    let bar_id = bar_id(last.open_time, timeframe);
    let signal_id = signal_id(symbol, mode, side, &bar_id);

    Some(Signal {
        symbol: symbol.to_owned(),
        mode,
        side,
        bar_id,
        entry_price: close,
        target_price,
        atr: last.atr,
        upper: prev.donchian_upper,
        lower: prev.donchian_lower,
        generated_at: Utc::now(),
        signal_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snap(close: f64, atr: f64, upper: f64, lower: f64) -> Snapshot {
        Snapshot {
            open_time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            close,
            true_range: atr,
            atr,
            donchian_upper: upper,
            donchian_lower: lower,
        }
    }

    #[test]
    fn long_breakout_with_atr_target() {
        // close=105 above prev upper=100, atr=2 -> LONG, target 107
        let prev = snap(99.0, 2.0, 100.0, 90.0);
        let last = snap(105.0, 2.0, 105.0, 90.0);
        let sig = evaluate("BTCUSDT", Mode::Swing, "4h", &prev, &last).unwrap();
        assert_eq!(sig.side, Side::Long);
        assert!((sig.entry_price - 105.0).abs() < 1e-9);
        assert!((sig.target_price - 107.0).abs() < 1e-9);
        assert!((sig.upper - 100.0).abs() < 1e-9);
    }

    #[test]
    fn short_breakout_with_atr_target() {
        // close=95 below prev lower=100, atr=3 -> SHORT, target 92
        let prev = snap(101.0, 3.0, 110.0, 100.0);
        let last = snap(95.0, 3.0, 110.0, 95.0);
        let sig = evaluate("ETHUSDT", Mode::Positional, "1d", &prev, &last).unwrap();
        assert_eq!(sig.side, Side::Short);
        assert!((sig.target_price - 92.0).abs() < 1e-9);
    }

    #[test]
    fn inside_channel_is_no_signal() {
        let prev = snap(100.0, 2.0, 110.0, 90.0);
        let last = snap(105.0, 2.0, 110.0, 90.0);
        assert!(evaluate("BTCUSDT", Mode::Swing, "4h", &prev, &last).is_none());
    }

    #[test]
    fn touching_the_bound_is_no_signal() {
        let prev = snap(100.0, 2.0, 110.0, 90.0);
        let last = snap(110.0, 2.0, 110.0, 90.0);
        assert!(evaluate("BTCUSDT", Mode::Swing, "4h", &prev, &last).is_none());
        let last = snap(90.0, 2.0, 110.0, 90.0);
        assert!(evaluate("BTCUSDT", Mode::Swing, "4h", &prev, &last).is_none());
    }

    #[test]
    fn warmup_nan_is_no_signal() {
        let prev = snap(100.0, f64::NAN, f64::NAN, f64::NAN);
        let last = snap(105.0, f64::NAN, 100.0, 90.0);
        assert!(evaluate("BTCUSDT", Mode::Swing, "4h", &prev, &last).is_none());

        // ATR still NaN even though bounds are warm
        let prev = snap(100.0, 2.0, 100.0, 90.0);
        let last = snap(105.0, f64::NAN, 100.0, 90.0);
        assert!(evaluate("BTCUSDT", Mode::Swing, "4h", &prev, &last).is_none());
    }

    #[test]
    fn sides_are_exclusive() {
        // upper >= lower always, so a close can never satisfy both rules
        let prev = snap(100.0, 2.0, 110.0, 90.0);
        for close in [80.0, 90.0, 100.0, 110.0, 120.0] {
            let last = snap(close, 2.0, 110.0, 90.0);
            let sig = evaluate("BTCUSDT", Mode::Swing, "4h", &prev, &last);
            let long = close > 110.0;
            let short = close < 90.0;
            assert!(!(long && short));
            match sig {
                Some(s) if long => assert_eq!(s.side, Side::Long),
                Some(s) if short => assert_eq!(s.side, Side::Short),
                Some(_) => panic!("signal inside channel"),
                None => assert!(!long && !short),
            }
        }
    }

    #[test]
    fn signal_id_reproducible_for_same_bar() {
        let prev = snap(99.0, 2.0, 100.0, 90.0);
        let last = snap(105.0, 2.0, 105.0, 90.0);
        let a = evaluate("BTCUSDT", Mode::Swing, "4h", &prev, &last).unwrap();
        let b = evaluate("BTCUSDT", Mode::Swing, "4h", &prev, &last).unwrap();
        assert_eq!(a.signal_id, b.signal_id);
    }
}

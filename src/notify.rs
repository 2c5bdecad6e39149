/// notify.rs — Best-effort signal notification
///
/// Delivery transport (SMTP in the source project) lives behind this trait;
/// the worker treats every failure as non-fatal and never retries within a
/// tick.
use anyhow::Result;
use tracing::info;

use crate::models::Signal;

pub trait Notifier {
    fn notify(&self, signals: &[Signal]) -> Result<()>;
}

/// Announces new signals through the log stream. Stands in wherever a real
/// delivery channel is not configured.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, signals: &[Signal]) -> Result<()> {
        for s in signals {
            info!(
                "NOTIFY {} {} {} entry={:.4} target={:.4} ({})",
                s.side, s.symbol, s.mode, s.entry_price, s.target_price, s.bar_id
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{bar_id, signal_id, Mode, Side};
    use chrono::{TimeZone, Utc};

    #[test]
    fn log_notifier_never_fails() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let bar_id = bar_id(t, "4h");
        let sig = Signal {
            symbol: "BTCUSDT".into(),
            mode: Mode::Swing,
            side: Side::Long,
            signal_id: signal_id("BTCUSDT", Mode::Swing, Side::Long, &bar_id),
            bar_id,
            entry_price: 105.0,
            target_price: 107.0,
            atr: 2.0,
            upper: 100.0,
            lower: 90.0,
            generated_at: t,
        };
        assert!(LogNotifier.notify(&[sig]).is_ok());
        assert!(LogNotifier.notify(&[]).is_ok());
    }
}

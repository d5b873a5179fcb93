//! Change-notification debouncing for the monitoring mode.
//!
//! WeChat fires bursts of accessibility notifications for a single update
//! (a new message changes several titles and values at once). The monitor
//! reports a notification only when the previous one, reported or not, is
//! older than the debounce window.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

/// Notifications the monitor subscribes to
pub const WATCHED_NOTIFICATIONS: [&str; 3] = ["AXUIElementDestroyed", "AXTitleChanged", "AXValueChanged"];

/// Default debounce window
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Suppresses notifications that follow the previous one within `window`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Debouncer { window, last: None }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a notification at `now`; `true` if it should be reported.
    ///
    /// The last-seen time is updated either way, so a steady stream of
    /// notifications closer together than the window stays silent.
    pub fn observe(&mut self, now: Instant) -> bool {
        let report = match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.window,
        };
        self.last = Some(now);
        report
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Debouncer::new(DEFAULT_DEBOUNCE)
    }
}

/// `[Notify] WeChat update at [<yyyy-MM-dd HH:mm:ss>] for notification: <name>`
pub fn notification_line(at: DateTime<Local>, notification: &str) -> String {
    format!(
        "[Notify] WeChat update at [{}] for notification: {}",
        at.format("%Y-%m-%d %H:%M:%S"),
        notification
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_first_notification_reported() {
        let mut debouncer = Debouncer::default();
        assert!(debouncer.observe(Instant::now()));
    }

    #[test]
    fn test_burst_is_suppressed() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        assert!(debouncer.observe(start));
        assert!(!debouncer.observe(start + Duration::from_millis(100)));
        assert!(!debouncer.observe(start + Duration::from_millis(500)));
        // 450ms after the previous one, though 950ms after the reported one
        assert!(!debouncer.observe(start + Duration::from_millis(950)));
        assert!(debouncer.observe(start + Duration::from_millis(1451)));
    }

    #[test]
    fn test_exactly_window_is_suppressed() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        debouncer.observe(start);
        assert!(!debouncer.observe(start + Duration::from_millis(500)));
        assert!(debouncer.observe(start + Duration::from_millis(1001)));
    }

    #[test]
    fn test_notification_line_format() {
        let at = Local.with_ymd_and_hms(2025, 5, 10, 9, 3, 7).unwrap();
        assert_eq!(
            notification_line(at, "AXTitleChanged"),
            "[Notify] WeChat update at [2025-05-10 09:03:07] for notification: AXTitleChanged"
        );
    }

    proptest! {
        #[test]
        fn prop_gaps_beyond_window_always_report(gaps in prop::collection::vec(501u64..5000, 1..20)) {
            let mut now = Instant::now();
            let mut debouncer = Debouncer::new(Duration::from_millis(500));
            prop_assert!(debouncer.observe(now));
            for gap in gaps {
                now += Duration::from_millis(gap);
                prop_assert!(debouncer.observe(now));
            }
        }

        #[test]
        fn prop_gaps_within_window_report_once(gaps in prop::collection::vec(0u64..=500, 1..20)) {
            let mut now = Instant::now();
            let mut debouncer = Debouncer::new(Duration::from_millis(500));
            debouncer.observe(now);
            for gap in gaps {
                now += Duration::from_millis(gap);
                prop_assert!(!debouncer.observe(now));
            }
        }
    }
}

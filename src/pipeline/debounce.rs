//! Debounce filter
//!
//! Converts the per-frame stream of parsed values into confirmation events.
//! A value is only confirmed after it has been the sole candidate for the
//! whole debounce window, so single-frame misreads and values oscillating
//! faster than the window never reach the classifier.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::NoReadingPolicy;
use crate::types::{Candidate, Confirmation, ConfirmedReading};

/// Debounce state: the pending candidate and the last confirmed reading.
#[derive(Debug, Clone)]
pub struct DebounceFilter {
    window: Duration,
    no_reading_policy: NoReadingPolicy,
    candidate: Option<Candidate>,
    last_confirmed: Option<ConfirmedReading>,
}

impl DebounceFilter {
    pub fn new(window: Duration, no_reading_policy: NoReadingPolicy) -> Self {
        Self {
            window,
            no_reading_policy,
            candidate: None,
            last_confirmed: None,
        }
    }

    /// Feed one tick's parsed value (`None` = no value this frame).
    ///
    /// Returns a confirmation only on the tick where a new value is promoted.
    #[allow(clippy::float_cmp)]
    pub fn observe(&mut self, parsed: Option<f64>, at: Instant) -> Option<Confirmation> {
        let Some(value) = parsed else {
            if self.no_reading_policy == NoReadingPolicy::Clear && self.candidate.take().is_some() {
                debug!("No reading: candidate cleared");
            }
            return None;
        };

        let candidate = match self.candidate {
            Some(c) if c.value == value => c,
            _ => {
                // New or changed value: the timer restarts, even when reverting
                // to a value seen earlier.
                self.candidate = Some(Candidate {
                    value,
                    first_seen_at: at,
                });
                return None;
            }
        };

        if at.saturating_duration_since(candidate.first_seen_at) < self.window {
            return None;
        }
        if self.last_confirmed.is_some_and(|c| c.value == value) {
            return None;
        }

        let current = ConfirmedReading {
            value,
            confirmed_at: at,
        };
        let previous = self.last_confirmed.replace(current);
        Some(Confirmation { previous, current })
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        self.candidate.as_ref()
    }

    pub fn last_confirmed(&self) -> Option<&ConfirmedReading> {
        self.last_confirmed.as_ref()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    fn filter() -> DebounceFilter {
        DebounceFilter::new(WINDOW, NoReadingPolicy::Retain)
    }

    fn ms(base: Instant, offset: u64) -> Instant {
        base + Duration::from_millis(offset)
    }

    #[test]
    fn test_first_sighting_never_confirms() {
        let mut f = filter();
        let t0 = Instant::now();
        assert!(f.observe(Some(5.0), t0).is_none());
        assert_eq!(f.candidate().map(|c| c.value), Some(5.0));
        assert!(f.last_confirmed().is_none());
    }

    #[test]
    fn test_confirms_after_window() {
        let mut f = filter();
        let t0 = Instant::now();
        f.observe(Some(5.0), t0);
        assert!(f.observe(Some(5.0), ms(t0, 499)).is_none());

        let confirmation = f.observe(Some(5.0), ms(t0, 500)).expect("should confirm at window");
        assert!(confirmation.previous.is_none());
        assert_eq!(confirmation.current.value, 5.0);
        assert_eq!(confirmation.current.confirmed_at, ms(t0, 500));
    }

    #[test]
    fn test_reconfirming_same_value_is_noop() {
        let mut f = filter();
        let t0 = Instant::now();
        f.observe(Some(5.0), t0);
        assert!(f.observe(Some(5.0), ms(t0, 600)).is_some());
        for i in 1..20 {
            assert!(f.observe(Some(5.0), ms(t0, 600 + i * 400)).is_none());
        }
    }

    #[test]
    fn test_value_change_restarts_timer() {
        let mut f = filter();
        let t0 = Instant::now();
        f.observe(Some(5.0), t0);
        f.observe(Some(6.0), ms(t0, 400));
        // 5 came back, but its timer restarts here
        f.observe(Some(5.0), ms(t0, 450));
        assert!(f.observe(Some(5.0), ms(t0, 900)).is_none());
        assert!(f.observe(Some(5.0), ms(t0, 950)).is_some());
    }

    #[test]
    fn test_fast_oscillation_never_confirms() {
        let mut f = filter();
        let t0 = Instant::now();
        for (i, v) in [5.0, 6.0, 5.0, 6.0, 5.0, 6.0].iter().enumerate() {
            assert!(f.observe(Some(*v), ms(t0, i as u64 * 200)).is_none());
        }
        assert!(f.last_confirmed().is_none());
    }

    #[test]
    fn test_confirmation_carries_previous() {
        let mut f = filter();
        let t0 = Instant::now();
        f.observe(Some(5.0), t0);
        f.observe(Some(5.0), ms(t0, 500));
        f.observe(Some(6.0), ms(t0, 1000));
        let c = f.observe(Some(6.0), ms(t0, 1500)).expect("6 should confirm");
        assert_eq!(c.previous.map(|p| p.value), Some(5.0));
        assert_eq!(c.current.value, 6.0);
    }

    #[test]
    fn test_no_reading_retain_keeps_candidate_timer() {
        let mut f = filter();
        let t0 = Instant::now();
        f.observe(Some(5.0), t0);
        assert!(f.observe(None, ms(t0, 200)).is_none());
        assert_eq!(f.candidate().map(|c| c.first_seen_at), Some(t0));
        assert!(f.observe(Some(5.0), ms(t0, 500)).is_some());
    }

    #[test]
    fn test_no_reading_clear_drops_candidate() {
        let mut f = DebounceFilter::new(WINDOW, NoReadingPolicy::Clear);
        let t0 = Instant::now();
        f.observe(Some(5.0), t0);
        f.observe(None, ms(t0, 200));
        assert!(f.candidate().is_none());
        // Timer restarts from the next sighting
        assert!(f.observe(Some(5.0), ms(t0, 500)).is_none());
        assert!(f.observe(Some(5.0), ms(t0, 1000)).is_some());
    }

    #[test]
    fn test_no_reading_never_touches_confirmed() {
        let mut f = DebounceFilter::new(WINDOW, NoReadingPolicy::Clear);
        let t0 = Instant::now();
        f.observe(Some(5.0), t0);
        f.observe(Some(5.0), ms(t0, 500));
        f.observe(None, ms(t0, 600));
        assert_eq!(f.last_confirmed().map(|c| c.value), Some(5.0));
    }
}

//! Timing transitions for a single pick.
//!
//! Each transition consumes a pick and returns the updated record. None of
//! them checks ordering, so an `ended_at` earlier than `started_at` is
//! representable; derived durations clamp such spans to zero.

use crate::data::Pick;
use crate::numbers::{minutes_to_ms, ms_to_minutes};

/// Stamp the start time. Calling it again overwrites the previous value.
#[must_use]
pub fn start_pick(mut pick: Pick, now: i64) -> Pick {
    pick.started_at = Some(now);
    pick
}

/// Stamp the end time. Calling it again overwrites the previous value.
#[must_use]
pub fn end_pick(mut pick: Pick, now: i64) -> Pick {
    pick.ended_at = Some(now);
    pick
}

/// Record a manually edited duration, which then wins over the timed span.
#[must_use]
pub fn edit_duration(mut pick: Pick, minutes: f64) -> Pick {
    pick.edited_duration_minutes = Some(minutes);
    pick.duration_ms = Some(minutes_to_ms(minutes).max(0));
    pick
}

impl Pick {
    /// `ended_at - started_at` when both are stamped, clamped at zero.
    #[must_use]
    pub fn span_ms(&self) -> Option<i64> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some(end.saturating_sub(start).max(0)),
            _ => None,
        }
    }

    /// Duration shown for this pick: the edited value if any, else the span.
    #[must_use]
    pub fn effective_duration_ms(&self) -> Option<i64> {
        self.edited_duration_minutes
            .map(|minutes| minutes_to_ms(minutes).max(0))
            .or_else(|| self.span_ms())
    }

    /// Minutes this pick contributes to a meet's total time.
    ///
    /// The timed span is preferred here and the edited value only fills in
    /// for picks that were never both started and ended.
    #[must_use]
    pub fn tracked_minutes(&self) -> f64 {
        if let Some(span) = self.span_ms() {
            return ms_to_minutes(span);
        }
        self.edited_duration_minutes.unwrap_or(0.0).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_pick() -> Pick {
        Pick {
            id: "test-pick".to_string(),
            round: 0,
            activity_id: "a1".to_string(),
            rng: 0.5,
            picked_at: 1_000_000,
            started_at: None,
            ended_at: None,
            edited_duration_minutes: None,
            duration_ms: None,
        }
    }

    #[test]
    fn start_twice_keeps_the_later_stamp() {
        let pick = start_pick(start_pick(bare_pick(), 10), 20);
        assert_eq!(pick.started_at, Some(20));
    }

    #[test]
    fn timer_math_uses_the_span() {
        let pick = end_pick(start_pick(bare_pick(), 1_000_000), 1_300_000);
        assert_eq!(pick.span_ms(), Some(300_000));
        assert_eq!(pick.effective_duration_ms(), Some(300_000));
        assert!((pick.tracked_minutes() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn edited_duration_overrides_the_span() {
        let timed = end_pick(start_pick(bare_pick(), 1_000_000), 1_300_000);
        let edited = edit_duration(timed, 10.0);
        assert_eq!(edited.duration_ms, Some(600_000));
        assert_eq!(edited.effective_duration_ms(), Some(600_000));
    }

    #[test]
    fn reversed_span_clamps_to_zero() {
        let pick = end_pick(start_pick(bare_pick(), 5_000), 1_000);
        assert_eq!(pick.span_ms(), Some(0));
        assert!(pick.tracked_minutes().abs() < f64::EPSILON);
    }

    #[test]
    fn untimed_pick_has_no_duration() {
        let pick = bare_pick();
        assert_eq!(pick.effective_duration_ms(), None);
        assert!(pick.tracked_minutes().abs() < f64::EPSILON);
        let edited = edit_duration(bare_pick(), 7.5);
        assert!((edited.tracked_minutes() - 7.5).abs() < f64::EPSILON);
    }
}

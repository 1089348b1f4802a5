//! Sequence classifier
//!
//! Classifies the step between two consecutive confirmed readings. Stateless:
//! the caller supplies the previous confirmed value.

use crate::types::{MissingRange, Transition, TransitionKind, VALUE_EPSILON};

/// Classify `new` against the previously confirmed value.
///
/// | delta              | kind      |
/// |--------------------|-----------|
/// | no previous        | Initial   |
/// | 0                  | NoChange  |
/// | 0 < delta <= 1     | Increment |
/// | delta > 1          | GapUp     |
/// | -1 <= delta < 0    | Decrement |
/// | delta < -1         | GapDown   |
///
/// Comparisons against 0 and ±1 allow [`VALUE_EPSILON`] of float error.
/// See [`missing_between`] for the reported range.
pub fn classify(previous: Option<f64>, new: f64) -> Transition {
    let Some(previous) = previous else {
        return Transition::new(TransitionKind::Initial);
    };

    let delta = new - previous;
    if delta.abs() < VALUE_EPSILON {
        Transition::new(TransitionKind::NoChange)
    } else if delta > 1.0 + VALUE_EPSILON {
        Transition {
            kind: TransitionKind::GapUp,
            missing_range: Some(missing_between(previous, new)),
        }
    } else if delta > 0.0 {
        Transition::new(TransitionKind::Increment)
    } else if delta < -1.0 - VALUE_EPSILON {
        Transition {
            kind: TransitionKind::GapDown,
            missing_range: Some(missing_between(new, previous)),
        }
    } else {
        Transition::new(TransitionKind::Decrement)
    }
}

/// Values skipped strictly between `low` and `high` (`high - low > 1`).
///
/// When the gap spans at least two units the range is `low+1 ..= high-1`,
/// stepping in display units (`12.3 -> 14.3` skipped `13.3`). Below two
/// units that range would be inverted, so it is clamped to the whole
/// numbers crossed instead (`5 -> 6.5` skipped `6`).
pub fn missing_between(low: f64, high: f64) -> MissingRange {
    if high - low >= 2.0 - VALUE_EPSILON {
        return MissingRange {
            start: low + 1.0,
            end: high - 1.0,
        };
    }
    let start = (low + VALUE_EPSILON).floor() + 1.0;
    let end = ((high - VALUE_EPSILON).ceil() - 1.0).max(start);
    MissingRange { start, end }
}

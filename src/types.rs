//! Shared data structures for the counter-watch pipeline
//!
//! This module defines the values that flow through one tick:
//! - Stage 1: RawReading (OCR text from the external source)
//! - Stage 2: Candidate (parsed value awaiting the debounce window)
//! - Stage 3: ConfirmedReading / Confirmation (debounce output)
//! - Stage 4: Transition (classifier output)
//! - Stage 5: Directive (indicator levels for the signal emitter)

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Tolerance used when comparing parsed display values.
///
/// Values come out of `str::parse::<f64>` on short decimal strings, so
/// arithmetic on them (e.g. `12.3 + 1.0`) can be off by a few ULPs.
pub const VALUE_EPSILON: f64 = 1e-9;

// ============================================================================
// Stage 1: Raw Reading
// ============================================================================

/// One OCR result, produced once per frame tick by the reading source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    /// Unfiltered recognition text (may contain arbitrary noise)
    pub text: String,
    /// Monotonic capture time
    pub timestamp: Instant,
}

impl RawReading {
    pub fn new(text: impl Into<String>, timestamp: Instant) -> Self {
        Self {
            text: text.into(),
            timestamp,
        }
    }

    /// Reading stamped with the current monotonic time.
    pub fn now(text: impl Into<String>) -> Self {
        Self::new(text, Instant::now())
    }
}

// ============================================================================
// Stage 2-3: Debounce
// ============================================================================

/// A parsed value waiting to survive the debounce window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub value: f64,
    pub first_seen_at: Instant,
}

/// The value the pipeline currently treats as ground truth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfirmedReading {
    pub value: f64,
    pub confirmed_at: Instant,
}

/// Emitted by the debounce filter when a new value is promoted.
///
/// `previous` is the confirmed reading that was replaced, or `None` for the
/// very first confirmation of the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confirmation {
    pub previous: Option<ConfirmedReading>,
    pub current: ConfirmedReading,
}

// ============================================================================
// Stage 4: Transition
// ============================================================================

/// Classification of the step between two consecutive confirmed readings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// First confirmed reading of the run
    Initial,
    Increment,
    Decrement,
    /// Counted up past one or more values
    GapUp,
    /// Counted down past one or more values
    GapDown,
    NoChange,
}

impl TransitionKind {
    /// Whether the transition implies skipped values.
    pub fn is_gap(self) -> bool {
        matches!(self, TransitionKind::GapUp | TransitionKind::GapDown)
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionKind::Initial => write!(f, "Initial"),
            TransitionKind::Increment => write!(f, "Increment"),
            TransitionKind::Decrement => write!(f, "Decrement"),
            TransitionKind::GapUp => write!(f, "Gap Up"),
            TransitionKind::GapDown => write!(f, "Gap Down"),
            TransitionKind::NoChange => write!(f, "No Change"),
        }
    }
}

/// Inclusive range of values implied to have been skipped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MissingRange {
    pub start: f64,
    pub end: f64,
}

impl MissingRange {
    /// Number of whole unit steps covered by the range.
    pub fn len(&self) -> u64 {
        let span = (self.end - self.start + VALUE_EPSILON).floor();
        if span < 0.0 {
            0
        } else {
            // Truncation is intended: span is a small non-negative whole number.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let steps = span as u64;
            steps.saturating_add(1)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for MissingRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if (self.end - self.start).abs() < VALUE_EPSILON {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}..={}", self.start, self.end)
        }
    }
}

/// Classifier output. Derived per confirmation, never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transition {
    pub kind: TransitionKind,
    pub missing_range: Option<MissingRange>,
}

impl Transition {
    pub const fn new(kind: TransitionKind) -> Self {
        Self {
            kind,
            missing_range: None,
        }
    }

    pub const fn with_gap(kind: TransitionKind, start: f64, end: f64) -> Self {
        Self {
            kind,
            missing_range: Some(MissingRange { start, end }),
        }
    }
}

// ============================================================================
// Stage 5: Indicator Directives
// ============================================================================

/// The two physical indicator outputs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Channel {
    Up,
    Down,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Up => write!(f, "UP"),
            Channel::Down => write!(f, "DOWN"),
        }
    }
}

/// Commanded level for both indicators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Directive {
    pub up: bool,
    pub down: bool,
}

impl Directive {
    /// Both indicators off. Also the shutdown state.
    pub const ALL_OFF: Self = Self {
        up: false,
        down: false,
    };
    pub const UP: Self = Self {
        up: true,
        down: false,
    };
    pub const DOWN: Self = Self {
        up: false,
        down: true,
    };

    pub fn level(&self, channel: Channel) -> bool {
        match channel {
            Channel::Up => self.up,
            Channel::Down => self.down,
        }
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = |on: bool| if on { "ON" } else { "OFF" };
        write!(f, "Up={}, Down={}", level(self.up), level(self.down))
    }
}

//! Pipeline state and statistics
//!
//! Everything that survives from one tick to the next lives here and is
//! owned by the [`PipelineCoordinator`](super::PipelineCoordinator).

use serde::{Deserialize, Serialize};

use super::debounce::DebounceFilter;
use crate::types::{Directive, Transition};

// ============================================================================
// Pipeline State
// ============================================================================

/// Mutable per-run state, updated explicitly once per tick.
#[derive(Debug, Clone)]
pub struct PipelineState {
    /// Candidate and last confirmed reading
    pub debounce: DebounceFilter,

    /// Indicator levels as last commanded to the emitter
    pub indicators: Directive,

    pub stats: PipelineStats,
}

impl PipelineState {
    pub fn new(debounce: DebounceFilter) -> Self {
        Self {
            debounce,
            indicators: Directive::ALL_OFF,
            stats: PipelineStats::default(),
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Counters reported when the processing loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Readings pulled from the source
    pub ticks_processed: u64,

    /// Readings the sanitizer could not turn into a number
    pub no_value_ticks: u64,

    /// Values promoted by the debounce filter
    pub confirmations: u64,

    pub increments: u64,
    pub decrements: u64,

    /// GapUp + GapDown transitions
    pub gaps_detected: u64,

    /// Sum of whole values skipped across all gaps
    pub missing_values: u64,
}

impl PipelineStats {
    pub(crate) fn record_transition(&mut self, transition: &Transition) {
        use crate::types::TransitionKind;

        self.confirmations += 1;
        match transition.kind {
            TransitionKind::Increment | TransitionKind::GapUp => self.increments += 1,
            TransitionKind::Decrement | TransitionKind::GapDown => self.decrements += 1,
            TransitionKind::Initial | TransitionKind::NoChange => {}
        }
        if transition.kind.is_gap() {
            self.gaps_detected += 1;
            let missing = transition.missing_range.map_or(0, |r| r.len());
            self.missing_values = self.missing_values.saturating_add(missing);
        }
    }
}

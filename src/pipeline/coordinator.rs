//! Pipeline Coordinator - runs one tick through every stage
//!
//! ```text
//! RawReading ──► sanitize ──► debounce ──► classify ──► directive ──► emitter
//!                  │              │
//!                  └─ None        └─ no confirmation: stop here, no directive
//! ```
//!
//! The coordinator owns the [`PipelineState`] and the [`SignalEmitter`]; no
//! other code mutates either.

use tracing::{debug, info, warn};

use super::classifier::classify;
use super::debounce::DebounceFilter;
use super::sanitizer::sanitize;
use super::state::{PipelineState, PipelineStats};
use crate::config::{ConfigError, NoChangeOutput, PipelineConfig};
use crate::emitter::{EmitterError, SignalEmitter};
use crate::types::{Channel, Confirmation, Directive, RawReading, Transition, TransitionKind};

/// Result of a tick that confirmed a new value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfirmationEvent {
    pub confirmation: Confirmation,
    pub transition: Transition,
    /// Indicator levels commanded for this confirmation
    pub directive: Directive,
}

/// Map a transition to indicator levels.
///
/// `current` is what the indicators show now; it is only used by
/// [`NoChangeOutput::RetainPrevious`].
pub fn directive_for(kind: TransitionKind, policy: NoChangeOutput, current: Directive) -> Directive {
    match kind {
        TransitionKind::Increment | TransitionKind::GapUp => Directive::UP,
        TransitionKind::Decrement | TransitionKind::GapDown => Directive::DOWN,
        TransitionKind::Initial | TransitionKind::NoChange => match policy {
            NoChangeOutput::AllOff => Directive::ALL_OFF,
            NoChangeOutput::RetainPrevious => current,
        },
    }
}

/// Owns the pipeline state and drives the emitter.
pub struct PipelineCoordinator<E: SignalEmitter> {
    state: PipelineState,
    emitter: E,
    decimal_digits_kept: u32,
    no_change_output: NoChangeOutput,
}

impl<E: SignalEmitter> PipelineCoordinator<E> {
    /// Build a coordinator. Rejects configurations the pipeline cannot run with.
    pub fn new(config: &PipelineConfig, emitter: E) -> Result<Self, ConfigError> {
        config.validate()?;
        let debounce = DebounceFilter::new(config.debounce_window(), config.no_reading_policy);
        debug!(
            window_secs = debounce.window().as_secs_f64(),
            policy = ?config.no_reading_policy,
            emitter = emitter.emitter_name(),
            "Pipeline coordinator ready"
        );
        Ok(Self {
            state: PipelineState::new(debounce),
            emitter,
            decimal_digits_kept: config.decimal_digits_kept,
            no_change_output: config.no_change_output,
        })
    }

    /// Process one raw reading.
    ///
    /// Returns `Ok(Some(_))` only on ticks that confirmed a new value. An
    /// error means the emitter could not apply the directive; pipeline state
    /// has already advanced.
    pub fn process_reading(
        &mut self,
        reading: &RawReading,
    ) -> Result<Option<ConfirmationEvent>, EmitterError> {
        self.state.stats.ticks_processed += 1;

        let parsed = sanitize(&reading.text, self.decimal_digits_kept);
        if parsed.is_none() {
            self.state.stats.no_value_ticks += 1;
            match self.state.debounce.last_confirmed() {
                Some(c) => debug!(
                    raw = %reading.text.trim(),
                    "No number detected, retaining previous number {}", c.value
                ),
                None => debug!(raw = %reading.text.trim(), "No number detected"),
            }
        }

        let Some(confirmation) = self.state.debounce.observe(parsed, reading.timestamp) else {
            return Ok(None);
        };

        let previous = confirmation.previous.map(|p| p.value);
        let transition = classify(previous, confirmation.current.value);
        self.state.stats.record_transition(&transition);
        log_transition(previous, confirmation.current.value, &transition);

        let directive = directive_for(transition.kind, self.no_change_output, self.state.indicators);
        self.apply(directive)?;

        Ok(Some(ConfirmationEvent {
            confirmation,
            transition,
            directive,
        }))
    }

    /// Command both indicators off, regardless of the tracked state.
    ///
    /// Both channels are attempted even if the first fails; the first error
    /// is returned.
    pub fn force_safe_state(&mut self) -> Result<(), EmitterError> {
        let up = self.emitter.set_indicator(Channel::Up, false);
        let down = self.emitter.set_indicator(Channel::Down, false);
        self.state.indicators = Directive::ALL_OFF;
        up.and(down)
    }

    /// Send only the channels whose level differs from what is shown now.
    fn apply(&mut self, directive: Directive) -> Result<(), EmitterError> {
        for channel in [Channel::Up, Channel::Down] {
            let on = directive.level(channel);
            if self.state.indicators.level(channel) == on {
                continue;
            }
            self.emitter.set_indicator(channel, on)?;
            match channel {
                Channel::Up => self.state.indicators.up = on,
                Channel::Down => self.state.indicators.down = on,
            }
        }
        Ok(())
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn stats(&self) -> PipelineStats {
        self.state.stats
    }

    pub fn indicators(&self) -> Directive {
        self.state.indicators
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }
}

fn log_transition(previous: Option<f64>, current: f64, transition: &Transition) {
    match (previous, transition.missing_range) {
        (Some(prev), Some(range)) => {
            info!("🔢 Detected number: {} (previous: {}) → {}", current, prev, transition.kind);
            warn!(
                "⚠️  Missing number(s) detected: {} ({} skipped)",
                range,
                range.len()
            );
        }
        (Some(prev), None) => {
            info!("🔢 Detected number: {} (previous: {}) → {}", current, prev, transition.kind);
        }
        (None, _) => {
            info!("🔢 Detected number: {} → {}", current, transition.kind);
        }
    }
}

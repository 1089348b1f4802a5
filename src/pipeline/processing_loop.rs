//! Processing loop shared across all input modes.
//!
//! Pulls one reading per tick from a [`ReadingSource`], pushes it through the
//! [`PipelineCoordinator`], and guarantees both indicators are commanded off
//! when the loop starts and on every way out of it.

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::source::{ReadingEvent, ReadingSource};
use super::{PipelineCoordinator, PipelineStats};
use crate::config::defaults::PROGRESS_LOG_INTERVAL_TICKS;
use crate::emitter::SignalEmitter;
use crate::types::Directive;

/// Why the loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// Source reported end of data.
    SourceExhausted,
    /// Cancellation token fired.
    Cancelled,
    /// Acquisition failed; the message is the source error.
    SourceFailed(String),
    /// Emitter rejected a command; the message is the emitter error.
    EmitterFailed(String),
}

impl LoopExit {
    /// Clean exits are end-of-data and cancellation.
    pub fn is_clean(&self) -> bool {
        matches!(self, LoopExit::SourceExhausted | LoopExit::Cancelled)
    }
}

/// What [`ProcessingLoop::run`] hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub exit: LoopExit,
    pub stats: PipelineStats,
    /// Indicator levels after the final safe-state command
    pub final_indicators: Directive,
    /// False if the final safe-state command itself failed
    pub safe_state_confirmed: bool,
}

/// Owns the coordinator and the shutdown token for one run.
pub struct ProcessingLoop<E: SignalEmitter> {
    coordinator: PipelineCoordinator<E>,
    cancel_token: CancellationToken,
    progress_interval: u64,
}

impl<E: SignalEmitter> ProcessingLoop<E> {
    pub fn new(coordinator: PipelineCoordinator<E>, cancel_token: CancellationToken) -> Self {
        Self {
            coordinator,
            cancel_token,
            progress_interval: PROGRESS_LOG_INTERVAL_TICKS,
        }
    }

    /// Log a progress line every `ticks` readings (0 disables).
    pub fn with_progress_interval(mut self, ticks: u64) -> Self {
        self.progress_interval = ticks;
        self
    }

    /// Run until the source is exhausted, fails, the emitter fails, or the
    /// token is cancelled.
    pub async fn run<S: ReadingSource>(mut self, source: &mut S) -> RunSummary {
        info!(
            "📊 Watching counter readings from {} (emitter: {})...",
            source.source_name(),
            self.coordinator.emitter().emitter_name()
        );
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let exit = match self.coordinator.force_safe_state() {
            Ok(()) => self.tick_until_exit(source).await,
            Err(e) => {
                error!("[ProcessingLoop] Could not set indicators to safe state at startup: {}", e);
                LoopExit::EmitterFailed(e.to_string())
            }
        };

        let safe_state_confirmed = match self.coordinator.force_safe_state() {
            Ok(()) => true,
            Err(e) => {
                error!("[ProcessingLoop] Failed to turn indicators off on exit: {}", e);
                false
            }
        };

        let stats = self.coordinator.stats();
        log_final_statistics(&stats, &exit);

        RunSummary {
            exit,
            stats,
            final_indicators: self.coordinator.indicators(),
            safe_state_confirmed,
        }
    }

    async fn tick_until_exit<S: ReadingSource>(&mut self, source: &mut S) -> LoopExit {
        loop {
            let event = tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    info!("[ProcessingLoop] Shutdown signal received");
                    return LoopExit::Cancelled;
                }
                result = source.next_reading() => {
                    match result {
                        Ok(ev) => ev,
                        Err(e) => {
                            warn!("[ProcessingLoop] Source error: {:#}", e);
                            return LoopExit::SourceFailed(format!("{e:#}"));
                        }
                    }
                }
            };

            let reading = match event {
                ReadingEvent::Reading(r) => r,
                ReadingEvent::Eof => {
                    info!(
                        "[ProcessingLoop] Source reached end ({} readings processed)",
                        self.coordinator.stats().ticks_processed
                    );
                    return LoopExit::SourceExhausted;
                }
            };

            if let Err(e) = self.coordinator.process_reading(&reading) {
                error!("[ProcessingLoop] Emitter error: {}", e);
                return LoopExit::EmitterFailed(e.to_string());
            }

            let stats = self.coordinator.stats();
            if self.progress_interval > 0 && stats.ticks_processed % self.progress_interval == 0 {
                info!(
                    "📈 Progress: {} readings | Confirmed: {} | Gaps: {} | Indicators: {}",
                    stats.ticks_processed,
                    stats.confirmations,
                    stats.gaps_detected,
                    self.coordinator.indicators()
                );
            }
        }
    }
}

fn log_final_statistics(stats: &PipelineStats, exit: &LoopExit) {
    info!("");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("📊 FINAL STATISTICS");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("   Readings Processed:   {}", stats.ticks_processed);
    info!("   No-Value Readings:    {}", stats.no_value_ticks);
    info!("   Confirmed Values:     {}", stats.confirmations);
    info!("   Increments:           {}", stats.increments);
    info!("   Decrements:           {}", stats.decrements);
    info!("   Gaps Detected:        {}", stats.gaps_detected);
    info!("   Missing Values:       {}", stats.missing_values);
    info!("   Exit Reason:          {:?}", exit);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::emitter::RecordingEmitter;
    use crate::pipeline::source::{ReplaySource, ScriptedReading};
    use crate::types::Channel;

    fn build(recorder: &RecordingEmitter, token: CancellationToken) -> ProcessingLoop<RecordingEmitter> {
        let coordinator =
            PipelineCoordinator::new(&PipelineConfig::default(), recorder.clone()).expect("valid");
        ProcessingLoop::new(coordinator, token)
    }

    #[tokio::test]
    async fn test_safe_state_at_start_and_end() {
        let recorder = RecordingEmitter::new();
        let mut source = ReplaySource::unpaced(vec![
            ScriptedReading::new(0.0, "1"),
            ScriptedReading::new(0.5, "1"),
            ScriptedReading::new(1.0, "2"),
            ScriptedReading::new(1.5, "2"),
        ]);

        let summary = build(&recorder, CancellationToken::new()).run(&mut source).await;

        assert_eq!(summary.exit, LoopExit::SourceExhausted);
        assert!(summary.safe_state_confirmed);
        assert_eq!(summary.final_indicators, Directive::ALL_OFF);
        assert_eq!(
            recorder.calls(),
            vec![
                (Channel::Up, false),
                (Channel::Down, false),
                (Channel::Up, true),
                (Channel::Up, false),
                (Channel::Down, false),
            ]
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_first_tick() {
        let recorder = RecordingEmitter::new();
        let token = CancellationToken::new();
        token.cancel();
        let mut source = ReplaySource::unpaced(vec![ScriptedReading::new(0.0, "1")]);

        let summary = build(&recorder, token).run(&mut source).await;

        assert_eq!(summary.exit, LoopExit::Cancelled);
        assert_eq!(summary.stats.ticks_processed, 0);
        assert!(summary.exit.is_clean());
    }

    #[tokio::test]
    async fn test_startup_emitter_failure_is_reported() {
        let recorder = RecordingEmitter::new();
        recorder.set_failing(true);
        let mut source = ReplaySource::unpaced(vec![ScriptedReading::new(0.0, "1")]);

        let summary = build(&recorder, CancellationToken::new()).run(&mut source).await;

        assert!(matches!(summary.exit, LoopExit::EmitterFailed(_)));
        assert!(!summary.safe_state_confirmed);
        assert_eq!(summary.stats.ticks_processed, 0);
    }
}

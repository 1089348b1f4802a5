//! Signal emitter abstraction for the two indicator outputs.
//!
//! The pipeline decides *what* each indicator should show; an emitter decides
//! how that becomes a physical signal. Implementations:
//! - [`LogEmitter`]: tracing only (dry run, no hardware)
//! - [`SysfsGpioEmitter`]: Linux sysfs GPIO lines
//! - [`RecordingEmitter`]: keeps every call for inspection

mod gpio;

pub use gpio::SysfsGpioEmitter;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::info;

use crate::types::Channel;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum EmitterError {
    #[error("GPIO I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Indicator {0} rejected the command")]
    Rejected(Channel),
}

// ============================================================================
// Emitter Trait
// ============================================================================

/// Where indicator commands go.
///
/// Called by the pipeline only when a channel's commanded level changes,
/// plus unconditionally when forcing the safe (all off) state.
pub trait SignalEmitter: Send + 'static {
    fn set_indicator(&mut self, channel: Channel, on: bool) -> Result<(), EmitterError>;

    /// Human-readable name for logging (e.g. "log", "sysfs-gpio").
    fn emitter_name(&self) -> &str;
}

impl<E: SignalEmitter + ?Sized> SignalEmitter for Box<E> {
    fn set_indicator(&mut self, channel: Channel, on: bool) -> Result<(), EmitterError> {
        (**self).set_indicator(channel, on)
    }

    fn emitter_name(&self) -> &str {
        (**self).emitter_name()
    }
}

// ============================================================================
// Log Emitter
// ============================================================================

/// Logs indicator changes without touching hardware.
#[derive(Debug, Default)]
pub struct LogEmitter;

impl SignalEmitter for LogEmitter {
    fn set_indicator(&mut self, channel: Channel, on: bool) -> Result<(), EmitterError> {
        info!("💡 {} indicator {}", channel, if on { "ON" } else { "OFF" });
        Ok(())
    }

    fn emitter_name(&self) -> &str {
        "log"
    }
}

// ============================================================================
// Recording Emitter
// ============================================================================

/// Records every `set_indicator` call.
///
/// Clones share the same log, so a caller can keep one handle while the
/// pipeline owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingEmitter {
    calls: Arc<Mutex<Vec<(Channel, bool)>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<(Channel, bool)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    /// Last commanded level of a channel, if it was ever set.
    pub fn level(&self, channel: Channel) -> Option<bool> {
        self.calls()
            .iter()
            .rev()
            .find(|(c, _)| *c == channel)
            .map(|(_, on)| *on)
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    /// Make subsequent calls fail with [`EmitterError::Rejected`].
    /// Failed calls are not recorded.
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut f) = self.failing.lock() {
            *f = failing;
        }
    }
}

impl SignalEmitter for RecordingEmitter {
    fn set_indicator(&mut self, channel: Channel, on: bool) -> Result<(), EmitterError> {
        if self.failing.lock().map(|f| *f).unwrap_or(false) {
            return Err(EmitterError::Rejected(channel));
        }
        match self.calls.lock() {
            Ok(mut calls) => calls.push((channel, on)),
            Err(e) => e.into_inner().push((channel, on)),
        }
        Ok(())
    }

    fn emitter_name(&self) -> &str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_emitter_shares_log_between_clones() {
        let handle = RecordingEmitter::new();
        let mut owned: Box<dyn SignalEmitter> = Box::new(handle.clone());
        owned.set_indicator(Channel::Up, true).expect("record");
        owned.set_indicator(Channel::Down, false).expect("record");
        assert_eq!(handle.calls(), vec![(Channel::Up, true), (Channel::Down, false)]);
        assert_eq!(handle.level(Channel::Up), Some(true));
        assert_eq!(owned.emitter_name(), "recording");
    }

    #[test]
    fn test_recording_emitter_failure_mode() {
        let mut emitter = RecordingEmitter::new();
        emitter.set_failing(true);
        assert!(matches!(
            emitter.set_indicator(Channel::Down, true),
            Err(EmitterError::Rejected(Channel::Down))
        ));
        assert!(emitter.calls().is_empty());
        emitter.set_failing(false);
        assert!(emitter.set_indicator(Channel::Down, true).is_ok());
    }

    #[test]
    fn test_log_emitter_never_fails() {
        let mut emitter = LogEmitter;
        assert!(emitter.set_indicator(Channel::Up, true).is_ok());
        assert_eq!(emitter.emitter_name(), "log");
    }
}

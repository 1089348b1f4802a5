//! countwatch: OCR counter watcher
//!
//! Reads a numeric display (one OCR text reading per tick), debounces the
//! value, classifies each confirmed change, and drives two indicators.
//!
//! ## Architecture
//!
//! - **Pipeline**: sanitize -> debounce -> classify -> directive, with all
//!   state held in an explicit [`PipelineState`]
//! - **Sources**: replay scripts, stdin lines, or an external OCR command
//! - **Emitters**: log-only, sysfs GPIO, or an in-memory recorder for tests
//! - **Config**: TOML with unknown-key detection and range validation

pub mod config;
pub mod emitter;
pub mod pipeline;
pub mod types;

pub use config::{ConfigError, NoChangeOutput, NoReadingPolicy, PipelineConfig, WatchConfig};

pub use types::{
    Candidate, Channel, Confirmation, ConfirmedReading, Directive, MissingRange, RawReading,
    Transition, TransitionKind, VALUE_EPSILON,
};

pub use emitter::{EmitterError, LogEmitter, RecordingEmitter, SignalEmitter, SysfsGpioEmitter};

pub use pipeline::{
    classify, sanitize, DebounceFilter, LoopExit, PipelineCoordinator, PipelineState,
    PipelineStats, ProcessingLoop, RunSummary,
};

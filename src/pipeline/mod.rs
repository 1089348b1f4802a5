//! Processing Pipeline Module
//!
//! ## Per-Tick Architecture
//!
//! ```text
//! STAGE 1: Acquisition   (ReadingSource: replay, stdin, external command)
//! STAGE 2: Sanitize      (raw OCR text -> Option<f64>)
//! STAGE 3: Debounce      (confirm only values stable for the whole window)
//! STAGE 4: Classify      (previous vs new confirmed value -> Transition)
//! STAGE 5: Directive     (Transition -> indicator levels)
//! STAGE 6: Emit          (changed channels only -> SignalEmitter)
//! ```
//!
//! Stages 4-6 ONLY execute on ticks where the debounce filter confirms a value.

mod classifier;
mod coordinator;
mod debounce;
mod sanitizer;
mod state;
pub mod processing_loop;
pub mod source;

pub use classifier::classify;
pub use coordinator::{directive_for, ConfirmationEvent, PipelineCoordinator};
pub use debounce::DebounceFilter;
pub use processing_loop::{LoopExit, ProcessingLoop, RunSummary};
pub use sanitizer::sanitize;
pub use source::{
    load_replay_file, parse_replay, CommandSource, LineSource, ReadingEvent, ReadingSource,
    ReplaySource, ScriptedReading, SourceError, StdinSource,
};
pub use state::{PipelineState, PipelineStats};

//! Watch Configuration Module
//!
//! Provides the pipeline configuration loaded from TOML files. Every tunable
//! of the debounce, parsing and indicator stages is a field here.
//!
//! ## Loading Order
//!
//! 1. `--config <path>` on the command line (errors are fatal)
//! 2. `COUNTWATCH_CONFIG` environment variable (path to TOML file)
//! 3. `countwatch.toml` in the current working directory
//! 4. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! let config = WatchConfig::load();
//! let coordinator = PipelineCoordinator::new(&config.pipeline, emitter);
//! ```

mod watch_config;
pub mod defaults;
pub mod validation;

pub use watch_config::*;

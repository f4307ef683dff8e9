//! Shared utilities for the as3 CLI.
//!
//! Logging setup, the log-level argument and output formatting.

pub mod args;
pub mod format;
pub mod logging;

pub use args::LogLevel;
pub use format::{format_number, human_readable_size};
pub use logging::init_logging;

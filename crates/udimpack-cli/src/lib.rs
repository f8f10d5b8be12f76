//! udimpack CLI library.
//!
//! The scene-file host for the layout, texture and material stages: loading
//! scenes and configs, the end-to-end combine run, and the commands.

pub mod commands;
pub mod input;
pub mod logging;
pub mod merge;
pub mod pipeline;

pub use pipeline::{run_combine, NothingToProcess, OutputWriteFailed, RunOptions, RunOutcome};

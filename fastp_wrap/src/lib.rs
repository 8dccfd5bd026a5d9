//! Run fastp on every paired sample of a sequencing run, then MultiQC over
//! the results.

// Warning groups (as of rust 1.55)
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]

pub mod config;
pub mod outputs;
pub mod run;
pub mod scheduler;
pub mod summary;
pub mod tasks;
pub mod tools;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use config::{RunConfig, ToolPrograms};
pub use run::run;
pub use summary::RunSummary;
pub use tools::{SystemInvoker, ToolInvoker};

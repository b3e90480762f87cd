//! Schema module - configuration and setup types for the solver.

mod config;
mod mask;

pub use config::*;
pub use mask::*;

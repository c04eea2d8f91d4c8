//! Command-line interface.

mod args;
pub mod send;
pub mod serve;

pub use args::{Cli, Commands};

//! Command line front end for lackai-core.

pub mod cmd;
pub mod console;

pub use cmd::Cli;

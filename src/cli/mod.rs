//! CLI argument parsing and command dispatch.

pub mod args;
pub mod config;
pub mod credentials;
pub mod dolphin;
pub mod generate;
pub mod status;

pub use args::{Cli, Commands, OutputFormat};

/// Print rendered output with exactly one trailing newline.
pub(crate) fn emit(output: &str) {
    println!("{}", output.trim_end());
}

//! Command line interface module
//!
//! Argument parsing and the runner that maps each subcommand onto one
//! [`RegistryClient`](crate::registry::RegistryClient) operation.

pub mod args;
pub mod runner;

pub use args::{Args, Command, ManifestCommand};
pub use runner::Runner;

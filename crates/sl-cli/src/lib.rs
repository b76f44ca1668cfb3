//! Structura Ludis agenda CLI library.
//!
//! This crate provides the CLI interface, the agenda view controller and
//! rendering for the `sl` binary.

mod cli;
pub mod commands;
mod config;
pub mod render;
#[cfg(test)]
mod testing;
pub mod view;

pub use cli::{Cli, Commands};
pub use config::Config;

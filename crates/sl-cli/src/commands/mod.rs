//! CLI subcommand implementations.

pub mod action;
pub mod agenda;
pub mod show_config;
pub mod util;
pub mod watch;

//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Structura Ludis agenda.
///
/// Shows the sessions you run and the seats you booked at an exhibition,
/// flags overlaps, and handles check-in.
#[derive(Debug, Parser)]
#[command(name = "sl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show your agenda for an exhibition.
    Agenda {
        /// Exhibition ID.
        #[arg(short, long)]
        exhibition: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check into a booking, then show the refreshed agenda.
    CheckIn {
        /// Booking ID.
        booking: String,

        /// Exhibition ID.
        #[arg(short, long)]
        exhibition: String,
    },

    /// Cancel a booking, then show the refreshed agenda.
    Cancel {
        /// Booking ID.
        booking: String,

        /// Exhibition ID.
        #[arg(short, long)]
        exhibition: String,
    },

    /// Keep the agenda on screen with live check-in countdowns.
    Watch {
        /// Exhibition ID.
        #[arg(short, long)]
        exhibition: String,
    },

    /// Print the effective configuration.
    Config,
}

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use courtmate_scheduler::logging::TracingFormat;

/// Mutual availability and match suggestions for tennis players
#[derive(Debug, Parser)]
#[command(name = "courtmate", version, about)]
pub struct Args {
    /// Configuration file (defaults to ./courtmate.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, global = true, default_value_t = TracingFormat::Pretty)]
    pub tracing: TracingFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP API
    Web {
        /// Overrides the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Ranked match suggestions for a player
    Suggest {
        #[arg(long)]
        user: String,
        /// Opponents to consider; recommended players are used when omitted
        #[arg(long = "opponent")]
        opponents: Vec<String>,
        /// First day of the search horizon (defaults to today)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Also write the suggestions to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Candidate slots for two players on one date
    Mutual {
        #[arg(long)]
        user: String,
        #[arg(long)]
        opponent: String,
        #[arg(long)]
        date: NaiveDate,
    },
    /// Convert a UTR rating to NTRP
    ConvertUtr { utr: f64 },
    /// Estimate NTRP from skill quiz answers (1-5 points each)
    Quiz {
        #[arg(required = true)]
        answers: Vec<u32>,
    },
    /// Opponents recommended for a player
    Recommend {
        #[arg(long)]
        user: String,
    },
}

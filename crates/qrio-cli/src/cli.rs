//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use a simulated adapter instead of the platform one
    #[arg(long)]
    pub simulate: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Advertise a session until interrupted
    Advertise {
        /// Session identity to advertise (defaults to "session")
        #[arg(short, long)]
        session_id: Option<String>,
    },
    /// Answer JSON method calls read line by line from stdin
    Serve,
}

// src/cli/mod.rs — CLI definition (clap derive)

pub mod ask;
pub mod health;
pub mod history;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "router_agent",
    about = "Route food photos and nutrition questions to the right backend",
    version,
    args_conflicts_with_subcommands = true,
    after_help = "Examples:\n  router_agent ./session_001 \"Calculate calories\" food.jpg\n  router_agent ./session_001 \"What should I eat for dinner?\"\n  router_agent ./session_001 \"\" food.jpg   (empty query: calculate calories)"
)]
pub struct Cli {
    /// Session folder; its last component is the session id
    pub session: Option<PathBuf>,

    /// Question or instruction; may be empty when an image is given
    pub query: Option<String>,

    /// Food photo (png, jpg, jpeg)
    pub image: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log routing decisions to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the recorded turns of a session
    History {
        /// Session folder
        session: PathBuf,
        /// Only show the last N turns
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Check that the volume-estimation service is reachable
    Health,
}

//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Turns a product list into a promotional reel and publishes it
#[derive(Parser, Debug)]
#[command(name = "reelsmith")]
#[command(version, about = "Promotional reel generator and publisher", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a reel from a JSON list of product names
    Render {
        /// Product names as a JSON array, e.g. '["Red Sneakers","Blue Jacket"]'
        products: String,

        /// Output video path (default: render.output_path from config)
        output: Option<PathBuf>,
    },
    /// Publish a rendered reel from a public URL
    Publish {
        /// Publicly reachable URL of the rendered video
        #[arg(long)]
        video_url: String,

        /// Caption (default: publish.caption from config)
        #[arg(long)]
        caption: Option<String>,

        /// Exit with code 2 when publishing runs out of attempts
        #[arg(long)]
        strict: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Create default config file
    Init,
}

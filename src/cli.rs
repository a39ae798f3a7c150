use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vconv")]
#[command(author, version, about = "Convert a video to a target resolution with live progress")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a video file, printing progress until it finishes (Ctrl-C cancels)
    Convert {
        /// Video file to convert (mp4, mkv, avi, webm)
        #[arg(required = true)]
        file: PathBuf,

        /// Target resolution profile (Same, Sd, Hsd, Hd, Hdd); keeps the
        /// source resolution when omitted
        #[arg(short, long, default_value = "")]
        resolution: String,

        /// Print progress and the final job as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// List the available resolution profiles
    Profiles,

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

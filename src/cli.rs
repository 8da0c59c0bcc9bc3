use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stickerforge")]
#[command(author, version, about = "Turn short video clips into animated WebP stickers")]
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
    /// Start the HTTP API server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Convert a local video into a sticker
    Convert {
        /// Video file to convert
        #[arg(required = true)]
        input: PathBuf,

        /// Where to copy the finished sticker
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum sticker length in seconds
        #[arg(long, allow_negative_numbers = true)]
        max_duration: Option<i64>,

        /// WebP quality
        #[arg(short, long, allow_negative_numbers = true)]
        quality: Option<i64>,

        /// Playback speed multiplier (0.25 - 4)
        #[arg(long)]
        speed: Option<f64>,

        /// Trim start in seconds
        #[arg(long, allow_negative_numbers = true)]
        crop_start: Option<f64>,

        /// Trim end in seconds
        #[arg(long)]
        crop_end: Option<f64>,

        /// Print the ffmpeg command without running it
        #[arg(long)]
        dry_run: bool,
    },

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

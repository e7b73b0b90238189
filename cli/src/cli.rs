//! Argument parsing for audi-cli.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Split media uploads into WAV chunks with optional transcription.
#[derive(Parser, Debug)]
#[command(name = "audi-cli", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Root directory for generated files (jobs live under <DATA>/jobs)
    #[arg(long, global = true, value_name = "DIR", env = "AUDI_DATA")]
    pub data: Option<PathBuf>,

    /// Path to a JSON configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a media file and process it to completion
    Process(ProcessArgs),

    /// List stored jobs, newest first
    List {
        /// Print job records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one job with its chunks
    Show {
        /// Job identifier
        id: String,

        /// Include the captured processing log
        #[arg(long)]
        log: bool,

        /// Print the job record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a job and all of its files
    Delete {
        /// Job identifier
        id: String,

        /// Delete even if the record says the job is still pending or
        /// processing (e.g. left over from a crashed run)
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Media file to split
    pub file: PathBuf,

    /// Chunk length, in --chunk-unit
    #[arg(long, value_name = "N")]
    pub chunk_value: Option<String>,

    /// Unit for --chunk-value (seconds, minutes, hours)
    #[arg(long, value_name = "UNIT", default_value = "seconds")]
    pub chunk_unit: String,

    /// Chunk length in seconds, used when --chunk-value is absent or invalid
    #[arg(long, value_name = "SECONDS")]
    pub chunk_seconds: Option<String>,

    /// Transcribe each chunk (requires a configured whisper binary)
    #[arg(long)]
    pub transcribe: bool,

    /// Skip base64 dumps of the chunks
    #[arg(long)]
    pub no_base64: bool,
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a source-language SRT from a speech recognition transcript
    Segment {
        /// Input transcript (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output SRT file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Translate an SRT file, realigning the translation onto the original blocks
    Translate {
        /// Input SRT file
        #[arg(short, long)]
        input: PathBuf,

        /// Output translated SRT file
        #[arg(short, long)]
        output: PathBuf,

        /// Source language code
        #[arg(short, long, default_value = "en")]
        source_lang: String,

        /// Target language code
        #[arg(short, long)]
        target_lang: String,
    },

    /// Segment a transcript and translate it into several languages
    Process {
        /// Input transcript (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Source language code
        #[arg(short, long, default_value = "en")]
        source_lang: String,

        /// Target languages for translation (comma-separated)
        #[arg(short, long, default_value = "es")]
        target_langs: String,

        /// Output directory for generated subtitles
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Process all transcripts in a directory
    Batch {
        /// Input directory containing transcripts
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Source language code
        #[arg(short, long, default_value = "en")]
        source_lang: String,

        /// Target languages for translation (comma-separated)
        #[arg(short, long, default_value = "es")]
        target_langs: String,

        /// Output directory for generated subtitles
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination of the configuration file
        #[arg(short, long, default_value = "config.toml")]
        path: PathBuf,
    },
}

/// Split a comma-separated language list, dropping empty entries
pub fn parse_language_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

//! subsync - subtitle segmentation and translation realignment
//!
//! Entry point for the command line tool: builds source-language subtitles
//! from word-level speech recognition output and translates them while
//! keeping every block's timing.

use anyhow::Result;
use clap::Parser;
use tracing::{Level, info};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use subsync::cli::{Args, Commands, parse_language_list};
use subsync::config::Config;
use subsync::error::SubsyncError;
use subsync::subtitle::{render_blocks, write_srt};
use subsync::transcript::Transcript;
use subsync::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;
    info!("Starting subsync");

    // Writing the default config must not depend on an existing one
    if let Commands::InitConfig { path } = &args.command {
        Config::default().save_to_file(path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load config.toml from current directory first
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    let workflow = Workflow::from_config(config)?;

    // Execute command
    match args.command {
        Commands::Segment { input, output } => {
            info!("Segmenting transcript: {}", input.display());

            let transcript = Transcript::from_file(&input).await?;
            let blocks = workflow.segment_transcript(&transcript)?;
            write_srt(&render_blocks(&blocks), &output).await?;
            println!("Wrote {} subtitle blocks to {}", blocks.len(), output.display());
        }
        Commands::Translate {
            input,
            output,
            source_lang,
            target_lang,
        } => {
            info!("Translating subtitles: {}", input.display());
            workflow
                .translate_srt_file(&input, &output, &source_lang, &target_lang)
                .await?;
        }
        Commands::Process {
            input,
            source_lang,
            target_langs,
            output_dir,
        } => {
            let target_languages = require_languages(&target_langs)?;
            let outputs = workflow
                .process_transcript(&input, &source_lang, &target_languages, output_dir.as_ref())
                .await?;
            for path in outputs {
                println!("{}", path.display());
            }
        }
        Commands::Batch {
            input_dir,
            source_lang,
            target_langs,
            output_dir,
        } => {
            let target_languages = require_languages(&target_langs)?;
            let processed = workflow
                .process_directory(&input_dir, &source_lang, &target_languages, output_dir.as_ref())
                .await?;
            println!("Processed {} transcripts", processed);
        }
        Commands::InitConfig { .. } => {}
    }

    info!("subsync completed successfully");
    Ok(())
}

fn require_languages(list: &str) -> Result<Vec<String>> {
    let languages = parse_language_list(list);
    if languages.is_empty() {
        return Err(SubsyncError::Config("No target languages given".to_string()).into());
    }
    Ok(languages)
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".subsync").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "subsync.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("subsync.log").display()
    );

    Ok(())
}

//! farsi-dub - English to Farsi video dubbing
//!
//! Downloads a video, transcribes it with whisper.cpp, translates each
//! segment, synthesizes Farsi (or English, for technical passages) speech
//! fitted to the original timing, and remuxes the dubbed audio track.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use farsi_dub::cli::{parse_url_list, Args, Commands};
use farsi_dub::config::Config;
use farsi_dub::setup::ModelManager;
use farsi_dub::workflow::{BatchReport, Pipeline};

const APP_DIR: &str = ".farsi-dub";
const DEFAULT_CONFIG: &str = "farsi-dub.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    info!("Starting farsi-dub");

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG);
                Config::from_file(DEFAULT_CONFIG)?
            } else {
                Config::default()
            }
        }
    };

    let app_dir = std::env::current_dir()?.join(APP_DIR);
    let models = ModelManager::new(&app_dir)?;

    let urls = match &args.command {
        Commands::Models { download } => {
            list_models(&models, *download).await?;
            return Ok(());
        }
        Commands::InitConfig { path } => {
            if path.exists() {
                anyhow::bail!("{} already exists, not overwriting", path.display());
            }
            Config::default().save_to_file(path)?;
            println!("Wrote default configuration to {}", path.display());
            return Ok(());
        }
        Commands::Dub { url, job } => {
            job.apply(&mut config);
            vec![url.clone()]
        }
        Commands::Batch { input, job } => {
            job.apply(&mut config);
            let content = std::fs::read_to_string(input)?;
            let urls = parse_url_list(&content);
            if urls.is_empty() {
                anyhow::bail!("No URLs found in {}", input.display());
            }
            urls
        }
    };
    config.validate()?;

    info!(
        "Output: {}, model: {}, voices: {} / {}",
        config.output.directory.display(),
        config.transcriber.model,
        config.synthesis.farsi_voice,
        config.synthesis.english_voice
    );

    let pipeline = Pipeline::new(config, models)?;

    // Without the remux tool no job can finish
    if let Err(e) = pipeline.check_media_tools() {
        error!("{}", e);
        eprintln!("Error: ffmpeg is required but was not found: {}", e);
        std::process::exit(1);
    }
    pipeline.check_translator().await?;

    // Interrupting drops the running job: child processes are killed and its
    // work directory is removed before exit
    let report = tokio::select! {
        report = pipeline.process_batch(&urls) => report?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, current job abandoned");
            std::process::exit(130);
        }
    };

    print_report(&report);
    info!("farsi-dub finished");
    Ok(())
}

async fn list_models(models: &ModelManager, download: bool) -> Result<()> {
    info!("Listing available whisper models...");

    let available = models.get_available_models();
    println!("\nAvailable Whisper Models:");
    println!("{:<15} {:<25} {:<10} {:<10}", "Name", "Filename", "Size (MB)", "Status");
    println!("{}", "-".repeat(65));

    for model in &available {
        let status = if models.is_downloaded(model) { "Downloaded" } else { "Missing" };
        println!("{:<15} {:<25} {:<10.1} {:<10}", model.name, model.filename, model.size_mb, status);
    }

    if download {
        info!("Downloading all missing models...");
        for model in &available {
            if !models.is_downloaded(model) {
                models.download_model(model).await?;
            }
        }
        info!("All models downloaded successfully");
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    println!("\nDubbing summary:");
    println!("{}", "-".repeat(65));
    for outcome in &report.outcomes {
        let name = outcome.title.as_deref().unwrap_or(&outcome.url);
        let elapsed = format_duration(outcome.elapsed_secs());
        match (&outcome.output, &outcome.error) {
            (Some(path), _) => println!("OK     {} ({}) -> {}", name, elapsed, path.display()),
            (None, error) => println!(
                "FAILED {} ({}) during {}: {}",
                name,
                elapsed,
                outcome.stage,
                error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
    println!("{} succeeded, {} failed", report.succeeded(), report.failed());
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(APP_DIR).join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "farsi-dub.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("farsi-dub.log").display());

    Ok(())
}

/// Format duration in seconds to human readable string
fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}

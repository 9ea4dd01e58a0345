//! `silencer` command line tool.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use silencer_media::{EngineOptions, FfmpegEngine};
use silencer_models::{AudioStream, OutputSuffix};
use silencer_worker::{Pipeline, PipelineConfig, StreamSelector, WorkerError, WorkerResult};

/// Split audio on silence with parallel FFmpeg workers.
#[derive(Debug, Parser)]
#[command(name = "silencer", version)]
struct Cli {
    /// Input media file
    input: PathBuf,

    /// Output directory, or output file with --merge-parts
    #[arg(short, long)]
    output: PathBuf,

    /// Silence noise floor in dB (e.g. -40)
    #[arg(short = 's', long, allow_negative_numbers = true)]
    silence_db: f64,

    /// Minimum silence duration in seconds
    #[arg(short = 'd', long)]
    silence_duration: f64,

    /// Audio stream index; prompts when omitted and ambiguous
    #[arg(short = 'a', long)]
    audio_index: Option<usize>,

    /// Number of concurrent FFmpeg processes
    #[arg(short = 'p', long)]
    processes: Option<usize>,

    /// Output suffix ("auto" derives it from the codec)
    #[arg(long, alias = "output-suffix")]
    suffix: Option<OutputSuffix>,

    /// Merge parts into one file
    #[arg(short = 'm', long)]
    merge_parts: bool,

    /// Do not log FFmpeg progress
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Kill any FFmpeg invocation running longer than this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    report: bool,
}

impl Cli {
    fn into_config(self) -> PipelineConfig {
        let mut config = PipelineConfig::from_env(self.input, self.output)
            .with_threshold_db(self.silence_db)
            .with_min_silence_secs(self.silence_duration);

        if self.audio_index.is_some() {
            config = config.with_audio_index(self.audio_index);
        }
        if let Some(workers) = self.processes {
            config = config.with_workers(workers);
        }
        if let Some(suffix) = self.suffix {
            config = config.with_suffix(suffix);
        }
        if self.merge_parts {
            config = config.with_merge(true);
        }
        if self.quiet {
            config = config.with_progress(false);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Some(Duration::from_secs(secs)));
        }
        config
    }
}

/// Asks on the terminal until a valid stream index is entered.
struct ConsolePrompt;

#[async_trait]
impl StreamSelector for ConsolePrompt {
    async fn select(&self, streams: &[AudioStream]) -> WorkerResult<usize> {
        let last = streams.len().saturating_sub(1);
        for stream in streams {
            eprintln!("  {}", stream);
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            eprint!("More than one audio stream found, please specify audio_index (0 - {}): ", last);
            let Some(line) = lines.next_line().await? else {
                return Err(WorkerError::AmbiguousStream {
                    available: streams.len(),
                });
            };
            match line.trim().parse::<usize>() {
                Ok(index) if index <= last => return Ok(index),
                _ => eprintln!("audio_index out of range (must be <= {})", last),
            }
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("silencer=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let (ffmpeg, ffprobe) = FfmpegEngine::check_tools().map_err(WorkerError::from)?;
    info!(ffmpeg = %ffmpeg.display(), ffprobe = %ffprobe.display(), "Found FFmpeg tools");

    let print_report = cli.report;
    let config = cli.into_config();
    info!("Pipeline config: {:?}", config);

    let engine = FfmpegEngine::new(EngineOptions {
        show_progress: config.show_progress,
        timeout: config.timeout,
    });
    let result = Pipeline::new(engine, config)
        .with_selector(ConsolePrompt)
        .run_with_report()
        .await;

    let report = match result {
        Ok(report) => report,
        Err(failure) => {
            if let (true, Some(report)) = (print_report, &failure.report) {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            return Err(failure.error.into());
        }
    };

    if print_report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    info!(
        outcome = ?report.outcome,
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "Finished"
    );
    Ok(report.exit_code())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialise logging: {e:#}");
    }

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            let rejected = e
                .downcast_ref::<WorkerError>()
                .is_some_and(WorkerError::is_precondition);
            if rejected {
                error!("Run rejected: {:#}", e);
            } else {
                error!("Run failed: {:#}", e);
            }
            1
        }
    };
    std::process::exit(code);
}

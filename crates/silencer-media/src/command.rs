//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::{is_progress_line, parse_progress_line, FfmpegProgress};

/// Number of diagnostic stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path (`-` for the null muxer)
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
    /// Emit `-progress pipe:2` records
    progress: bool,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
            progress: false,
        }
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Select the N-th audio stream of the first input.
    pub fn map_audio(self, ordinal: usize) -> Self {
        self.output_arg("-map").output_arg(format!("0:a:{}", ordinal))
    }

    /// Accurate output-side range selection; `end == None` runs to EOF.
    pub fn range(self, start: Decimal, end: Option<Decimal>) -> Self {
        let cmd = self.output_arg("-ss").output_arg(start.normalize().to_string());
        match end {
            Some(end) => cmd.output_arg("-to").output_arg(end.normalize().to_string()),
            None => cmd,
        }
    }

    /// Set audio filter.
    pub fn audio_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-af").output_arg(filter)
    }

    /// Force output format.
    pub fn format(self, format: impl Into<String>) -> Self {
        self.output_arg("-f").output_arg(format)
    }

    /// Copy streams without re-encoding.
    pub fn codec_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Treat the input as a concat demuxer list with absolute paths.
    pub fn concat_input(self) -> Self {
        self.input_arg("-f")
            .input_arg("concat")
            .input_arg("-safe")
            .input_arg("0")
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable machine-readable progress on stderr.
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-hide_banner".to_string());
        args.push("-nostats".to_string());

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        if self.progress {
            args.push("-progress".to_string());
            args.push("pipe:2".to_string());
        }

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Exit status plus the last diagnostic lines FFmpeg printed.
#[derive(Debug)]
pub struct RunOutput {
    pub status: ExitStatus,
    pub stderr_tail: Vec<String>,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Diagnostic tail joined for error messages.
    pub fn stderr_text(&self) -> Option<String> {
        if self.stderr_tail.is_empty() {
            None
        } else {
            Some(self.stderr_tail.join("\n"))
        }
    }
}

/// Runner for FFmpeg commands with stderr streaming and an optional timeout.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    /// Kill the process after this long
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run an FFmpeg command, returning its exit status.
    ///
    /// A non-zero exit is not an error at this layer.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<RunOutput> {
        self.run_streaming(cmd, |_| false).await
    }

    /// Run an FFmpeg command with progress callback.
    pub async fn run_with_progress<F>(
        &self,
        cmd: &FfmpegCommand,
        progress_callback: F,
    ) -> MediaResult<RunOutput>
    where
        F: Fn(FfmpegProgress) + Send,
    {
        let mut current = FfmpegProgress::default();
        self.run_streaming(cmd, move |line| {
            if !is_progress_line(line) {
                return false;
            }
            if let Some(progress) = parse_progress_line(line, &mut current) {
                progress_callback(progress);
            }
            true
        })
        .await
    }

    /// Run an FFmpeg command, handing every stderr line to `on_line`.
    ///
    /// `on_line` returns `true` when it consumed the line; other lines are
    /// kept in the diagnostic tail.
    pub async fn run_streaming<F>(&self, cmd: &FfmpegCommand, mut on_line: F) -> MediaResult<RunOutput>
    where
        F: FnMut(&str) -> bool + Send,
    {
        check_ffmpeg()?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("stderr not captured"))?;

        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

        let drive = async {
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                if reader.read_until(b'\n', &mut buf).await? == 0 {
                    break;
                }
                // Metadata in stderr is not guaranteed to be UTF-8
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end();
                if line.is_empty() || on_line(line) {
                    continue;
                }
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line.to_string());
            }
            child.wait().await
        };

        let finished = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, drive).await.ok(),
            None => Some(drive.await),
        };

        let status = match finished {
            Some(result) => result?,
            None => {
                let secs = self.timeout.map(|t| t.as_secs()).unwrap_or_default();
                warn!(
                    output = %cmd.output_path().display(),
                    "FFmpeg timed out after {} seconds, killing process",
                    secs
                );
                let _ = child.kill().await;
                return Err(MediaError::Timeout(secs));
            }
        };

        Ok(RunOutput {
            status,
            stderr_tail: tail.into_iter().collect(),
        })
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

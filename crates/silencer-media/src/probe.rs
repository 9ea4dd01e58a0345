//! FFprobe stream information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use silencer_models::AudioStream;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Container-level information plus every stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds, when the container reports one
    pub duration: Option<f64>,
    /// Container format name
    pub format_name: Option<String>,
    pub streams: Vec<StreamInfo>,
}

/// One stream as reported by FFprobe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInfo {
    pub index: usize,
    pub codec_type: String,
    pub codec_name: Option<String>,
    pub codec_long_name: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
}

impl MediaInfo {
    /// Audio streams only, numbered by their position among audio streams.
    pub fn audio_streams(&self) -> Vec<AudioStream> {
        self.streams
            .iter()
            .filter(|s| s.codec_type == "audio")
            .enumerate()
            .map(|(ordinal, s)| AudioStream {
                ordinal,
                stream_index: s.index,
                codec_name: s.codec_name.clone().unwrap_or_default(),
                codec_long_name: s.codec_long_name.clone(),
                sample_rate: s.sample_rate,
                channels: s.channels,
            })
            .collect()
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    format_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: usize,
    codec_type: Option<String>,
    codec_name: Option<String>,
    codec_long_name: Option<String>,
    // FFprobe prints sample_rate as a string
    sample_rate: Option<String>,
    channels: Option<u32>,
}

/// Probe a media file for stream information.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe exited with {:?}", output.status.code()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let info = parse_probe_output(&output.stdout)?;
    debug!(
        path = %path.display(),
        streams = info.streams.len(),
        "Probed media"
    );
    Ok(info)
}

/// Parse FFprobe's `-print_format json` output.
pub fn parse_probe_output(stdout: &[u8]) -> MediaResult<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let (duration, format_name) = match probe.format {
        Some(format) => (
            format.duration.as_deref().and_then(|d| d.parse::<f64>().ok()),
            format.format_name,
        ),
        None => (None, None),
    };

    let streams = probe
        .streams
        .into_iter()
        .map(|s| StreamInfo {
            index: s.index,
            codec_type: s.codec_type.unwrap_or_default(),
            codec_name: s.codec_name,
            codec_long_name: s.codec_long_name,
            sample_rate: s.sample_rate.as_deref().and_then(|r| r.parse().ok()),
            channels: s.channels,
        })
        .collect();

    Ok(MediaInfo {
        duration,
        format_name,
        streams,
    })
}

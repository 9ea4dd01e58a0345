//! Audio stream metadata and output suffix selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An audio stream reported by the media probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioStream {
    /// Position among audio streams only (`0:a:N`)
    pub ordinal: usize,
    /// Absolute stream index in the container
    pub stream_index: usize,
    pub codec_name: String,
    pub codec_long_name: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
}

impl AudioStream {
    /// Suffix derived from this stream's codec.
    pub fn suffix(&self) -> &'static str {
        suffix_for_codec(&self.codec_name)
    }
}

impl fmt::Display for AudioStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.ordinal, self.codec_name)?;
        if let Some(rate) = self.sample_rate {
            write!(f, " {} Hz", rate)?;
        }
        if let Some(channels) = self.channels {
            write!(f, " {}ch", channels)?;
        }
        if let Some(long_name) = &self.codec_long_name {
            write!(f, " ({})", long_name)?;
        }
        Ok(())
    }
}

/// Map a codec name to the container suffix a stream copy can be written to.
///
/// Codecs without a dedicated container fall back to Matroska audio.
pub fn suffix_for_codec(codec_name: &str) -> &'static str {
    match codec_name {
        "aac" => "aac",
        "libmp3lame" | "mp3" => "mp3",
        "libvorbis" | "vorbis" => "ogg",
        "flac" => "flac",
        "pcm_s16le" => "wav",
        "opus" => "opus",
        "libaom" => "webm",
        _ => "mka",
    }
}

/// How the output suffix is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSuffix {
    /// Derive from the selected stream's codec
    #[default]
    Auto,
    /// Fixed suffix, stored without the leading dot
    Explicit(String),
}

impl OutputSuffix {
    /// Resolve against the selected stream.
    pub fn resolve(&self, stream: &AudioStream) -> String {
        match self {
            OutputSuffix::Auto => stream.suffix().to_string(),
            OutputSuffix::Explicit(suffix) => suffix.clone(),
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, OutputSuffix::Auto)
    }
}

impl FromStr for OutputSuffix {
    type Err = SuffixParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == "auto" {
            return Ok(OutputSuffix::Auto);
        }
        let suffix = trimmed.strip_prefix('.').unwrap_or(trimmed);
        if suffix.is_empty() || suffix.contains(['/', '\\']) {
            return Err(SuffixParseError(s.to_string()));
        }
        Ok(OutputSuffix::Explicit(suffix.to_string()))
    }
}

impl fmt::Display for OutputSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSuffix::Auto => write!(f, "auto"),
            OutputSuffix::Explicit(suffix) => write!(f, "{}", suffix),
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid output suffix: {0:?}")]
pub struct SuffixParseError(String);

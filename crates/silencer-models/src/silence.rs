//! Silence intervals and the non-silent spans they bound.

use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single detected silence, in seconds from the start of the stream.
///
/// `duration == end - start` always holds; the start is derived from the
/// reported end and duration rather than parsed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SilenceInterval {
    pub start: Decimal,
    pub end: Decimal,
    pub duration: Decimal,
}

impl SilenceInterval {
    /// Build an interval from a reported end timestamp and duration.
    ///
    /// Returns `None` for negative durations. The derived start may be
    /// slightly negative for a silence at the head of the stream.
    pub fn from_end(end: Decimal, duration: Decimal) -> Option<Self> {
        if duration.is_sign_negative() && !duration.is_zero() {
            return None;
        }
        Some(Self {
            start: end - duration,
            end,
            duration,
        })
    }
}

/// A non-silent span to extract, owned by the silence interval at `index`.
///
/// The span begins where silence `index` ends and runs to the start of the
/// next silence, or to the end of the stream for the final silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSpan {
    pub index: usize,
    pub start: Decimal,
    /// `None` means "until end of stream"
    pub end: Option<Decimal>,
}

impl SegmentSpan {
    /// Length of the span, if bounded.
    pub fn duration(&self) -> Option<Decimal> {
        self.end.map(|end| end - self.start)
    }
}

/// Output of silence detection for one audio stream of one source file.
///
/// Immutable once produced; shared read-only by allocation and extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SilenceSet {
    /// Absolute path of the source media
    pub source: PathBuf,
    /// Audio stream ordinal (`0:a:N`)
    pub audio_index: usize,
    /// File suffix for extracted segments, without the leading dot
    pub suffix: String,
    /// Silences in chronological order
    pub intervals: Vec<SilenceInterval>,
}

impl SilenceSet {
    pub fn new(
        source: impl Into<PathBuf>,
        audio_index: usize,
        suffix: impl Into<String>,
        intervals: Vec<SilenceInterval>,
    ) -> Self {
        Self {
            source: source.into(),
            audio_index,
            suffix: suffix.into(),
            intervals,
        }
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// At least two silences are needed before any span can be cut.
    pub fn is_splittable(&self) -> bool {
        self.intervals.len() >= 2
    }

    /// Sum of all silence durations, computed exactly.
    pub fn total_silence(&self) -> Decimal {
        self.intervals.iter().map(|s| s.duration).sum()
    }

    /// The non-silent span owned by interval `index`.
    ///
    /// Spans start at a silence's end, so audio before the first silence
    /// is never covered, while audio after the last silence is.
    pub fn segment_span(&self, index: usize) -> Option<SegmentSpan> {
        let current = self.intervals.get(index)?;
        let end = self.intervals.get(index + 1).map(|next| next.start);
        Some(SegmentSpan {
            index,
            start: current.end,
            end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn set(pairs: &[(&str, &str)]) -> SilenceSet {
        let intervals = pairs
            .iter()
            .map(|(end, duration)| SilenceInterval::from_end(dec(end), dec(duration)).unwrap())
            .collect();
        SilenceSet::new("/media/talk.m4a", 0, "aac", intervals)
    }

    #[test]
    fn test_from_end_derives_start() {
        let interval = SilenceInterval::from_end(dec("12.750000"), dec("2.5")).unwrap();
        assert_eq!(interval.start, dec("10.25"));
        assert_eq!(interval.end - interval.start, interval.duration);
    }

    #[test]
    fn test_from_end_rejects_negative_duration() {
        assert!(SilenceInterval::from_end(dec("5"), dec("-1")).is_none());
    }

    #[test]
    fn test_from_end_keeps_negative_start() {
        let interval = SilenceInterval::from_end(dec("1.5"), dec("1.501")).unwrap();
        assert_eq!(interval.start, dec("-0.001"));
        assert_eq!(interval.end - interval.start, interval.duration);
    }

    #[test]
    fn test_splittable() {
        assert!(!set(&[]).is_splittable());
        assert!(!set(&[("3", "1")]).is_splittable());
        assert!(set(&[("3", "1"), ("9", "2")]).is_splittable());
    }

    #[test]
    fn test_total_silence_is_exact() {
        let silences = set(&[("1.1", "0.1"), ("2.2", "0.2"), ("3.3", "0.3")]);
        assert_eq!(silences.total_silence(), dec("0.6"));
    }

    #[test]
    fn test_segment_spans() {
        let silences = set(&[("3", "1"), ("9", "2"), ("20", "4")]);

        let first = silences.segment_span(0).unwrap();
        assert_eq!(first.start, dec("3"));
        assert_eq!(first.end, Some(dec("7")));
        assert_eq!(first.duration(), Some(dec("4")));

        let last = silences.segment_span(2).unwrap();
        assert_eq!(last.start, dec("20"));
        assert_eq!(last.end, None);

        assert!(silences.segment_span(3).is_none());
    }
}

//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; the binary installs no exporter,
//! so these are no-ops unless an embedding application installs a recorder.

use metrics::{counter, histogram};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Metric name constants for consistency.
pub mod names {
    /// Extracted segments by status (`ok`, `failed`).
    pub const SEGMENTS_TOTAL: &str = "silencer_segments_total";

    /// Merge attempts by status (`ok`, `failed`).
    pub const MERGE_TOTAL: &str = "silencer_merge_total";

    /// Total detected silence per run, in seconds.
    pub const SILENCE_SECONDS: &str = "silencer_silence_seconds";
}

fn status_label(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "failed"
    }
}

/// Record the outcome of one segment extraction.
pub fn record_segment(ok: bool) {
    counter!(names::SEGMENTS_TOTAL, "status" => status_label(ok)).increment(1);
}

/// Record the outcome of a merge.
pub fn record_merge(ok: bool) {
    counter!(names::MERGE_TOTAL, "status" => status_label(ok)).increment(1);
}

/// Record total detected silence for a run.
pub fn record_silence(total: Decimal) {
    histogram!(names::SILENCE_SECONDS).record(total.to_f64().unwrap_or(0.0));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::SEGMENTS_TOTAL.starts_with("silencer_"));
        assert!(names::MERGE_TOTAL.contains("merge"));
        assert!(names::SILENCE_SECONDS.ends_with("_seconds"));
    }

    #[test]
    fn test_recording_without_recorder() {
        record_segment(true);
        record_segment(false);
        record_merge(true);
        record_silence(Decimal::new(1525, 3));
    }
}

//! Audio stream selection.
//!
//! When a container carries several audio streams and none was named up
//! front, the pipeline defers to a [`StreamSelector`]. The binary plugs in
//! an interactive prompt; library callers pick a fixed stream or refuse.

use async_trait::async_trait;

use silencer_models::AudioStream;

use crate::error::{WorkerError, WorkerResult};

/// Chooses one audio stream ordinal from a non-empty list.
#[async_trait]
pub trait StreamSelector: Send + Sync {
    async fn select(&self, streams: &[AudioStream]) -> WorkerResult<usize>;
}

/// Always selects the given ordinal.
#[derive(Debug, Clone, Copy)]
pub struct FixedStream(pub usize);

#[async_trait]
impl StreamSelector for FixedStream {
    async fn select(&self, streams: &[AudioStream]) -> WorkerResult<usize> {
        check_ordinal(self.0, streams)
    }
}

/// Selects the only stream; refuses when there is more than one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleStreamOnly;

#[async_trait]
impl StreamSelector for SingleStreamOnly {
    async fn select(&self, streams: &[AudioStream]) -> WorkerResult<usize> {
        match streams.len() {
            1 => Ok(0),
            available => Err(WorkerError::AmbiguousStream { available }),
        }
    }
}

/// Validate an ordinal against the probed streams.
pub fn check_ordinal(index: usize, streams: &[AudioStream]) -> WorkerResult<usize> {
    if index < streams.len() {
        Ok(index)
    } else {
        Err(WorkerError::InvalidStreamIndex {
            index,
            available: streams.len(),
        })
    }
}

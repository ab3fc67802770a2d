//! Audio output
//!
//! Synthesized clips are rendered through a [`PlaybackUnit`] which owns a
//! dedicated audio thread and at most one active clip.

use crate::error::PlaybackError;
use bytes::Bytes;

pub mod engine;
pub mod rodio_sink;

pub use engine::PlaybackUnit;
pub use rodio_sink::RodioSink;

/// Encoded audio returned by the synthesis backend
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub data: Bytes,
    pub mime_type: String,
}

impl AudioClip {
    pub fn new(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn mpeg(data: impl Into<Bytes>) -> Self {
        Self::new(data, "audio/mpeg")
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// How a `play` call ended, when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Clip played to the end
    Finished,
    /// Stopped by `stop()` or by the caller's cancellation token
    Cancelled,
    /// Another `play` started before this clip ended
    Superseded,
}

/// Device-level output, driven only from the audio thread.
///
/// Implementations need not be `Send`; they are constructed on the thread
/// that uses them.
pub trait AudioSink {
    /// Begin rendering `clip`. Any previous clip has already been stopped.
    fn start(&mut self, clip: &AudioClip) -> Result<(), PlaybackError>;

    /// True once the current clip has drained (or nothing is playing)
    fn is_finished(&self) -> bool;

    /// Stop the current clip and release its buffers. Idempotent.
    fn stop(&mut self);
}

/// Builds the sink on the audio thread
pub type SinkFactory = Box<dyn FnOnce() -> Result<Box<dyn AudioSink>, PlaybackError> + Send>;

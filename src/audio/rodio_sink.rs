//! rodio-backed audio sink

use super::{AudioClip, AudioSink};
use crate::error::PlaybackError;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::io::Cursor;
use tracing::debug;

/// Plays clips on the default output device.
///
/// Holds the output stream for its whole life; a fresh `Sink` is created per
/// clip so a stopped sink never has to be revived.
pub struct RodioSink {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl RodioSink {
    pub fn open_default() -> Result<Self, PlaybackError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| PlaybackError::Unavailable(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }
}

impl AudioSink for RodioSink {
    fn start(&mut self, clip: &AudioClip) -> Result<(), PlaybackError> {
        self.stop();

        let source = Decoder::new(Cursor::new(clip.data.clone()))
            .map_err(|e| PlaybackError::Decode(e.to_string()))?;
        let sink =
            Sink::try_new(&self.handle).map_err(|e| PlaybackError::Unavailable(e.to_string()))?;

        sink.append(source);
        debug!("🔊 Rendering clip ({} bytes, {})", clip.len(), clip.mime_type);
        self.sink = Some(sink);
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.sink.as_ref().map_or(true, |s| s.empty())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}

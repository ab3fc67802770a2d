//! Playback unit
//!
//! Uses a channel-based architecture to handle rodio's non-Send stream.
//! The unit spawns a dedicated audio thread that owns the output device and
//! at most one active clip. Starting a clip always stops the previous one.

use super::{AudioClip, AudioSink, PlaybackOutcome, RodioSink, SinkFactory};
use crate::error::PlaybackError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How often the audio thread checks whether the active clip has drained
const POLL_INTERVAL: Duration = Duration::from_millis(15);

type PlaybackReply = oneshot::Sender<Result<PlaybackOutcome, PlaybackError>>;

/// Commands sent to the audio thread
enum AudioCommand {
    Play {
        id: u64,
        clip: AudioClip,
        /// Checked again on the audio thread before the clip starts
        cancel: CancellationToken,
        reply: PlaybackReply,
    },
    /// Stop the active clip; `Some(id)` only if it is still that clip
    Stop(Option<u64>),
    Shutdown,
}

struct ActiveClip {
    id: u64,
    reply: PlaybackReply,
}

impl ActiveClip {
    fn resolve(self, outcome: PlaybackOutcome) {
        let _ = self.reply.send(Ok(outcome));
    }
}

/// Thread-safe handle to the audio thread
#[derive(Clone)]
pub struct PlaybackUnit {
    sender: mpsc::Sender<AudioCommand>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for PlaybackUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackUnit").finish()
    }
}

impl PlaybackUnit {
    /// Playback on the default output device
    pub fn new() -> Self {
        Self::with_sink(Box::new(
            || -> Result<Box<dyn AudioSink>, PlaybackError> {
                Ok(Box::new(RodioSink::open_default()?))
            },
        ))
    }

    /// Playback through an already constructed, `Send` sink
    pub fn with_device<S: AudioSink + Send + 'static>(sink: S) -> Self {
        Self::with_sink(Box::new(
            move || -> Result<Box<dyn AudioSink>, PlaybackError> { Ok(Box::new(sink)) },
        ))
    }

    /// Playback through a custom sink, built on the audio thread
    pub fn with_sink(factory: SinkFactory) -> Self {
        let (sender, receiver) = mpsc::channel::<AudioCommand>();

        thread::Builder::new()
            .name("survival-voice-audio".to_string())
            .spawn(move || audio_thread(factory, receiver))
            .map_err(|e| warn!("🔇 Failed to spawn audio thread: {}", e))
            .ok();

        Self {
            sender,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Play `clip` until it ends, fails, is superseded, or `cancel` fires.
    pub async fn play(
        &self,
        clip: AudioClip,
        cancel: &CancellationToken,
    ) -> Result<PlaybackOutcome, PlaybackError> {
        if cancel.is_cancelled() {
            return Ok(PlaybackOutcome::Cancelled);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (reply, done) = oneshot::channel();
        self.sender
            .send(AudioCommand::Play {
                id,
                clip,
                cancel: cancel.clone(),
                reply,
            })
            .map_err(|_| PlaybackError::Disconnected)?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let _ = self.sender.send(AudioCommand::Stop(Some(id)));
                Ok(PlaybackOutcome::Cancelled)
            }
            result = done => result.map_err(|_| PlaybackError::Disconnected)?,
        }
    }

    /// Stop whatever is playing. Safe to call when idle.
    pub fn stop(&self) {
        let _ = self.sender.send(AudioCommand::Stop(None));
    }

    /// Stop playback and end the audio thread
    pub fn shutdown(&self) {
        let _ = self.sender.send(AudioCommand::Shutdown);
    }
}

impl Default for PlaybackUnit {
    fn default() -> Self {
        Self::new()
    }
}

fn audio_thread(factory: SinkFactory, receiver: mpsc::Receiver<AudioCommand>) {
    let mut sink = match factory() {
        Ok(sink) => Ok(sink),
        Err(e) => {
            warn!("🔇 Failed to initialize audio output: {}", e);
            Err(e)
        }
    };
    let mut active: Option<ActiveClip> = None;

    info!("🔊 Audio thread started");

    loop {
        let command = if active.is_some() {
            match receiver.recv_timeout(POLL_INTERVAL) {
                Ok(cmd) => Some(cmd),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match receiver.recv() {
                Ok(cmd) => Some(cmd),
                Err(_) => break,
            }
        };

        match command {
            None => {
                if let Ok(s) = sink.as_mut() {
                    if s.is_finished() {
                        s.stop();
                        if let Some(clip) = active.take() {
                            debug!("✅ Clip {} finished", clip.id);
                            clip.resolve(PlaybackOutcome::Finished);
                        }
                    }
                }
            }
            Some(AudioCommand::Play {
                id,
                clip,
                cancel,
                reply,
            }) => {
                if cancel.is_cancelled() {
                    debug!("Clip {} cancelled before it started", id);
                    let _ = reply.send(Ok(PlaybackOutcome::Cancelled));
                    continue;
                }

                let s = match sink.as_mut() {
                    Ok(s) => s,
                    Err(e) => {
                        let _ = reply.send(Err(e.clone()));
                        continue;
                    }
                };

                if let Some(previous) = active.take() {
                    debug!("⏭️ Clip {} superseded by {}", previous.id, id);
                    s.stop();
                    previous.resolve(PlaybackOutcome::Superseded);
                }

                match s.start(&clip) {
                    Ok(()) => active = Some(ActiveClip { id, reply }),
                    Err(e) => {
                        warn!("❌ Clip {} failed to start: {}", id, e);
                        let _ = reply.send(Err(e));
                    }
                }
            }
            Some(AudioCommand::Stop(target)) => {
                let matches = match (&active, target) {
                    (Some(clip), Some(id)) => clip.id == id,
                    (Some(_), None) => true,
                    (None, _) => false,
                };
                if matches {
                    if let Ok(s) = sink.as_mut() {
                        s.stop();
                    }
                    if let Some(clip) = active.take() {
                        info!("🛑 Stopped clip {}", clip.id);
                        clip.resolve(PlaybackOutcome::Cancelled);
                    }
                }
            }
            Some(AudioCommand::Shutdown) => break,
        }
    }

    if let Ok(s) = sink.as_mut() {
        s.stop();
    }
    if let Some(clip) = active.take() {
        clip.resolve(PlaybackOutcome::Cancelled);
    }

    info!("🔇 Audio thread stopped");
}

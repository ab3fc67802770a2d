//! Speech queue controller
//!
//! Accepts utterances from the chat layer and speaks them one at a time.
//!
//! - FIFO per conversation, never two items in flight.
//! - Duplicates of recently accepted lines are dropped at submit time.
//! - A new conversation id flushes pending items and dedup history and cancels
//!   whatever is being synthesized or played.
//! - Cloud synthesis failures fall back to platform speech for that line only.
//!
//! Each drain loop is tagged with a generation number. `stop_all` and
//! conversation resets bump the generation, so a loop resuming from an await
//! after being disowned exits without touching state.

use crate::audio::{PlaybackOutcome, PlaybackUnit};
use crate::config::Config;
use crate::dedup::{DuplicateReason, UtteranceDeduplicator, UtteranceHistory};
use crate::error::{ErrorKind, VoiceResult};
use crate::narrator::{FallbackNarrator, FallbackOutcome};
use crate::tts::{create_synthesizer, SpeechSynthesizer};
use crate::voice::VoiceProfile;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const EVENT_CAPACITY: usize = 256;

/// A line of text waiting to be spoken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub conversation_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuePhase {
    Idle,
    Draining,
}

/// Which path actually produced the audio
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechChannel {
    Cloud,
    Fallback(String),
}

/// Observable queue activity.
///
/// Serializes as `{"event": "<name>", "data": ...}` for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum QueueEvent {
    StateChanged(QueuePhase),
    Enqueued {
        text: String,
        conversation_id: String,
    },
    Suppressed {
        text: String,
        reason: DuplicateReason,
    },
    ConversationReset {
        conversation_id: Option<String>,
    },
    Stopped,
    Spoken {
        text: String,
        channel: SpeechChannel,
    },
    Dropped {
        text: String,
    },
    Error {
        kind: ErrorKind,
        detail: String,
    },
}

/// What `submit` did with a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Enqueued,
    Suppressed(DuplicateReason),
    /// Blank text, or the controller has been disposed
    Rejected,
}

/// Tunables for a controller instance
#[derive(Debug, Clone)]
pub struct QueueOptions {
    pub profile: VoiceProfile,
    pub deduplicator: UtteranceDeduplicator,
    pub history_capacity: usize,
    pub history_retain: usize,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            profile: VoiceProfile::default(),
            deduplicator: UtteranceDeduplicator::default(),
            history_capacity: 100,
            history_retain: 50,
        }
    }
}

impl QueueOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            profile: config.voice_profile(),
            deduplicator: UtteranceDeduplicator::from_config(config),
            history_capacity: config.history_capacity,
            history_retain: config.history_retain,
        }
    }
}

struct QueueState {
    pending: VecDeque<Utterance>,
    history: UtteranceHistory,
    conversation_id: Option<String>,
    phase: QueuePhase,
    generation: u64,
    /// Cancellation for the item currently being synthesized or played
    current: Option<CancellationToken>,
    profile: VoiceProfile,
    disposed: bool,
}

struct Inner {
    state: Mutex<QueueState>,
    deduplicator: UtteranceDeduplicator,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    playback: PlaybackUnit,
    narrator: FallbackNarrator,
    events: broadcast::Sender<QueueEvent>,
    phase: watch::Sender<QueuePhase>,
}

/// Single-flight narration queue. Cheap to clone; clones share one queue.
#[derive(Clone)]
pub struct SpeechQueueController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SpeechQueueController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechQueueController")
            .field("phase", &self.phase())
            .field("pending", &self.pending_len())
            .finish()
    }
}

impl SpeechQueueController {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        playback: PlaybackUnit,
        narrator: FallbackNarrator,
        options: QueueOptions,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (phase, _) = watch::channel(QueuePhase::Idle);

        let state = QueueState {
            pending: VecDeque::new(),
            history: UtteranceHistory::new(options.history_capacity, options.history_retain),
            conversation_id: None,
            phase: QueuePhase::Idle,
            generation: 0,
            current: None,
            profile: options.profile,
            disposed: false,
        };

        info!(
            "🎙️ Speech queue ready (synthesis: {}, fallback: {:?})",
            synthesizer.name(),
            narrator.tier_names()
        );

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                deduplicator: options.deduplicator,
                synthesizer,
                playback,
                narrator,
                events,
                phase,
            }),
        }
    }

    /// Production stack: cloud synthesis, default audio device, configured tiers
    pub fn from_config(config: &Config) -> VoiceResult<Self> {
        Ok(Self::new(
            create_synthesizer(config)?,
            PlaybackUnit::new(),
            FallbackNarrator::from_config(config),
            QueueOptions::from_config(config),
        ))
    }

    /// Subscribe to queue events
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.inner.events.subscribe()
    }

    /// Queue a line for speaking.
    ///
    /// Must be called from within a Tokio runtime; the drain loop is spawned
    /// onto it when the queue is idle. Outside one the line is rejected.
    pub fn submit(&self, text: &str, conversation_id: &str) -> SubmitOutcome {
        let mut state = self.inner.lock();

        if state.disposed {
            debug!("Queue disposed, rejecting '{}'", text);
            return SubmitOutcome::Rejected;
        }
        if text.trim().is_empty() {
            return SubmitOutcome::Rejected;
        }
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("❌ No async runtime to drain the speech queue: {}", e);
                return SubmitOutcome::Rejected;
            }
        };

        if state.conversation_id.as_deref() != Some(conversation_id) {
            let previous = state.conversation_id.take();
            if previous.is_some() {
                info!(
                    "🔄 Conversation switched {:?} -> '{}'",
                    previous, conversation_id
                );
                self.inner.flush(&mut state, true);
                self.inner.emit(QueueEvent::ConversationReset {
                    conversation_id: Some(conversation_id.to_string()),
                });
            }
            state.conversation_id = Some(conversation_id.to_string());
        }

        if let Some(reason) = self.inner.deduplicator.check(text, &state.history) {
            debug!("🔁 Suppressed duplicate ({:?}): '{}'", reason, text);
            self.inner.emit(QueueEvent::Suppressed {
                text: text.to_string(),
                reason,
            });
            return SubmitOutcome::Suppressed(reason);
        }

        state.pending.push_back(Utterance {
            text: text.to_string(),
            conversation_id: conversation_id.to_string(),
        });
        state.history.push(text);
        self.inner.emit(QueueEvent::Enqueued {
            text: text.to_string(),
            conversation_id: conversation_id.to_string(),
        });

        if state.phase == QueuePhase::Idle {
            self.inner.set_phase(&mut state, QueuePhase::Draining);
            let inner = self.inner.clone();
            let generation = state.generation;
            runtime.spawn(async move { inner.drain(generation).await });
        }

        SubmitOutcome::Enqueued
    }

    /// Stop speaking and drop pending lines. Dedup history is kept.
    pub fn stop_all(&self) {
        let mut state = self.inner.lock();
        self.inner.flush(&mut state, false);
        self.inner.emit(QueueEvent::Stopped);
    }

    /// Forget the current conversation entirely: pending lines, dedup
    /// history, and in-flight audio.
    pub fn reset_conversation(&self) {
        let mut state = self.inner.lock();
        self.inner.flush(&mut state, true);
        state.conversation_id = None;
        self.inner
            .emit(QueueEvent::ConversationReset { conversation_id: None });
    }

    /// Release audio resources; later submits are rejected
    pub fn dispose(&self) {
        let mut state = self.inner.lock();
        if state.disposed {
            return;
        }
        self.inner.flush(&mut state, true);
        state.conversation_id = None;
        state.disposed = true;
        self.inner.playback.shutdown();
        info!("🔇 Speech queue disposed");
    }

    /// Applies to every line not yet dequeued
    pub fn set_voice_profile(&self, profile: VoiceProfile) {
        let mut state = self.inner.lock();
        info!("🎚️ Voice changed to {}", profile.voice_id);
        state.profile = profile;
    }

    pub fn voice_profile(&self) -> VoiceProfile {
        self.inner.lock().profile
    }

    pub fn phase(&self) -> QueuePhase {
        self.inner.lock().phase
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn history_len(&self) -> usize {
        self.inner.lock().history.len()
    }

    /// Whether `text` (normalized) is in the dedup history
    pub fn remembers(&self, text: &str) -> bool {
        self.inner.lock().history.contains_normalized(text)
    }

    pub fn conversation_id(&self) -> Option<String> {
        self.inner.lock().conversation_id.clone()
    }

    /// Resolves once the queue has nothing pending or in flight
    pub async fn wait_until_idle(&self) {
        let mut rx = self.inner.phase.subscribe();
        let _ = rx.wait_for(|phase| *phase == QueuePhase::Idle).await;
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: QueueEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn set_phase(&self, state: &mut QueueState, phase: QueuePhase) {
        if state.phase != phase {
            state.phase = phase;
            self.phase.send_replace(phase);
            self.emit(QueueEvent::StateChanged(phase));
        }
    }

    /// Cancel in-flight work, drop pending lines, disown the drain loop
    fn flush(&self, state: &mut QueueState, clear_history: bool) {
        let dropped = state.pending.len();
        state.pending.clear();
        if clear_history {
            state.history.clear();
        }
        if let Some(token) = state.current.take() {
            token.cancel();
        }
        self.playback.stop();
        state.generation += 1;
        self.set_phase(state, QueuePhase::Idle);

        if dropped > 0 {
            info!("🛑 Flushed {} pending line(s)", dropped);
        }
    }

    async fn drain(self: Arc<Self>, generation: u64) {
        debug!("▶️ Drain loop {} started", generation);

        loop {
            let (item, token, profile) = {
                let mut state = self.lock();
                if state.generation != generation {
                    return;
                }
                match state.pending.pop_front() {
                    Some(item) => {
                        let token = CancellationToken::new();
                        state.current = Some(token.clone());
                        (item, token, state.profile)
                    }
                    None => {
                        state.current = None;
                        self.set_phase(&mut state, QueuePhase::Idle);
                        debug!("⏹️ Drain loop {} finished", generation);
                        return;
                    }
                }
            };

            self.playback.stop();
            self.speak(&item, &token, &profile).await;

            {
                let mut state = self.lock();
                if state.generation != generation {
                    return;
                }
                state.current = None;
            }
        }
    }

    /// Synthesize and play one line, falling back on synthesis failure.
    /// Every outcome ends here; nothing propagates to the drain loop.
    async fn speak(&self, item: &Utterance, token: &CancellationToken, profile: &VoiceProfile) {
        let text = item.text.as_str();

        let synthesis = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            result = self.synthesizer.synthesize(text, profile) => result,
        };
        if token.is_cancelled() {
            return;
        }

        match synthesis {
            Ok(clip) => match self.playback.play(clip, token).await {
                Ok(PlaybackOutcome::Finished) => {
                    self.emit(QueueEvent::Spoken {
                        text: text.to_string(),
                        channel: SpeechChannel::Cloud,
                    });
                }
                Ok(outcome) => {
                    debug!("Playback of '{}' ended early: {:?}", text, outcome);
                }
                Err(e) => {
                    warn!("❌ Playback failed for '{}': {}", text, e);
                    self.emit(QueueEvent::Error {
                        kind: ErrorKind::Playback,
                        detail: e.to_string(),
                    });
                }
            },
            Err(e) => {
                warn!("⚠️ Synthesis failed ({}), using fallback: {}", e.kind(), e);
                self.emit(QueueEvent::Error {
                    kind: e.kind(),
                    detail: e.to_string(),
                });

                let outcome = tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    outcome = self.narrator.speak_via_fallback(text, profile) => outcome,
                };

                match outcome {
                    FallbackOutcome::Spoken(tier) => {
                        self.emit(QueueEvent::Spoken {
                            text: text.to_string(),
                            channel: SpeechChannel::Fallback(tier),
                        });
                    }
                    FallbackOutcome::Dropped => {
                        self.emit(QueueEvent::Error {
                            kind: ErrorKind::Fallback,
                            detail: "no fallback voice available".to_string(),
                        });
                        self.emit(QueueEvent::Dropped {
                            text: text.to_string(),
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioClip, AudioSink};
    use crate::error::{PlaybackError, SynthesisError};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct Unconfigured;

    #[async_trait]
    impl SpeechSynthesizer for Unconfigured {
        async fn synthesize(
            &self,
            _text: &str,
            _profile: &VoiceProfile,
        ) -> Result<AudioClip, SynthesisError> {
            Err(SynthesisError::Configuration("no key".into()))
        }

        fn name(&self) -> &str {
            "unconfigured"
        }
    }

    struct SilentSink;

    impl AudioSink for SilentSink {
        fn start(&mut self, _clip: &AudioClip) -> Result<(), PlaybackError> {
            Ok(())
        }
        fn is_finished(&self) -> bool {
            true
        }
        fn stop(&mut self) {}
    }

    fn controller() -> SpeechQueueController {
        SpeechQueueController::new(
            Arc::new(Unconfigured),
            PlaybackUnit::with_device(SilentSink),
            FallbackNarrator::default(),
            QueueOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_blank_text_rejected() {
        let queue = controller();
        assert_eq!(queue.submit("   ", "c1"), SubmitOutcome::Rejected);
        assert_eq!(queue.pending_len(), 0);
        assert_eq!(queue.phase(), QueuePhase::Idle);
    }

    #[test]
    fn test_submit_outside_runtime_is_rejected() {
        let queue = controller();
        assert_eq!(queue.submit("Find shelter.", "c1"), SubmitOutcome::Rejected);
        assert_eq!(queue.pending_len(), 0);
        assert_eq!(queue.history_len(), 0);
        assert_eq!(queue.conversation_id(), None);
        assert_eq!(queue.phase(), QueuePhase::Idle);
    }

    #[test]
    fn test_events_serialize_for_export() {
        let phase = serde_json::to_value(QueueEvent::StateChanged(QueuePhase::Draining)).unwrap();
        assert_eq!(
            phase,
            serde_json::json!({ "event": "state_changed", "data": "draining" })
        );

        let spoken = serde_json::to_value(QueueEvent::Spoken {
            text: "Boil it first.".into(),
            channel: SpeechChannel::Fallback("system".into()),
        })
        .unwrap();
        assert_eq!(
            spoken,
            serde_json::json!({
                "event": "spoken",
                "data": { "text": "Boil it first.", "channel": { "fallback": "system" } }
            })
        );

        let suppressed = serde_json::to_value(QueueEvent::Suppressed {
            text: "Not great.".into(),
            reason: DuplicateReason::Substring,
        })
        .unwrap();
        assert_eq!(suppressed["data"]["reason"], "substring");

        let stopped = serde_json::to_value(QueueEvent::Stopped).unwrap();
        assert_eq!(stopped, serde_json::json!({ "event": "stopped" }));
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_harmless() {
        let queue = controller();
        queue.stop_all();
        queue.stop_all();
        assert_eq!(queue.phase(), QueuePhase::Idle);
    }

    #[tokio::test]
    async fn test_dropped_line_still_returns_to_idle() {
        let queue = controller();
        let mut events = queue.subscribe();

        assert_eq!(queue.submit("Anyone out there?", "c1"), SubmitOutcome::Enqueued);
        queue.wait_until_idle().await;

        let mut saw_dropped = false;
        while let Ok(event) = events.try_recv() {
            if event == (QueueEvent::Dropped { text: "Anyone out there?".into() }) {
                saw_dropped = true;
            }
        }
        assert!(saw_dropped);
        assert_eq!(queue.phase(), QueuePhase::Idle);
    }

    #[tokio::test]
    async fn test_dispose_rejects_later_submits() {
        let queue = controller();
        queue.submit("Find shelter.", "c1");
        queue.dispose();
        assert_eq!(queue.submit("Find water.", "c1"), SubmitOutcome::Rejected);
        assert_eq!(queue.history_len(), 0);
        assert_eq!(queue.phase(), QueuePhase::Idle);
    }

    #[tokio::test]
    async fn test_voice_profile_can_change() {
        let queue = controller();
        let profile = VoiceProfile::new(crate::voice::VoiceId::Josh);
        queue.set_voice_profile(profile);
        assert_eq!(queue.voice_profile(), profile);
    }
}

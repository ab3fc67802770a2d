//! Mock synthesizer for Testing
//!
//! Records every request and can be told to fail or to hang until released.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use survival_voice::audio::AudioClip;
use survival_voice::error::SynthesisError;
use survival_voice::tts::SpeechSynthesizer;
use survival_voice::voice::{VoiceId, VoiceProfile};
use tokio::sync::Semaphore;

#[derive(Debug, Clone)]
pub struct MockSynth {
    /// (text, voice) for every call, recorded when the call starts
    pub calls: Arc<Mutex<Vec<(String, VoiceId)>>>,
    /// Number of upcoming calls that fail, counted when each call starts
    pub fail_next: Arc<AtomicUsize>,
    pub error: SynthesisError,
    /// When set, each call waits for one permit before answering
    pub gate: Option<Arc<Semaphore>>,
}

impl MockSynth {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_next: Arc::new(AtomicUsize::new(0)),
            error: SynthesisError::Transport("connection reset".to_string()),
            gate: None,
        }
    }

    /// Every call fails with `error`
    pub fn failing(error: SynthesisError) -> Self {
        let mock = Self {
            error,
            ..Self::new()
        };
        mock.fail_next.store(usize::MAX, Ordering::SeqCst);
        mock
    }

    /// Calls hang until `release` is called once per call
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::new()
        }
    }

    pub fn release(&self, calls: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(calls);
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(text, _)| text.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockSynth {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynth {
    async fn synthesize(
        &self,
        text: &str,
        profile: &VoiceProfile,
    ) -> Result<AudioClip, SynthesisError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), profile.voice_id));

        // Decided up front so a hung call keeps its verdict
        let failing = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n > 0).then(|| if n == usize::MAX { n } else { n - 1 })
            })
            .is_ok();

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        if failing {
            return Err(self.error.clone());
        }

        // The clip body carries the text so the sink can log what it played
        Ok(AudioClip::mpeg(text.as_bytes().to_vec()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

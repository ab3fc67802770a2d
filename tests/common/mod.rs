#![allow(dead_code)]

pub mod mock_audio;
pub mod mock_synth;
pub mod mock_tts;

use mock_audio::MockSink;
use mock_synth::MockSynth;
use mock_tts::MockTts;
use std::sync::Arc;
use std::time::Duration;
use survival_voice::narrator::FallbackNarrator;
use survival_voice::queue::{QueueEvent, QueueOptions, SpeechQueueController};
use survival_voice::tts::TtsEngine;
use tokio::sync::broadcast;

/// A controller wired to mocks, plus handles to inspect them
pub struct TestContext {
    pub queue: SpeechQueueController,
    pub synth: MockSynth,
    pub sink: MockSink,
    pub fallback: MockTts,
    pub events: broadcast::Receiver<QueueEvent>,
}

impl TestContext {
    pub fn new(synth: MockSynth, sink: MockSink) -> Self {
        Self::with_options(synth, sink, QueueOptions::default())
    }

    pub fn with_options(synth: MockSynth, sink: MockSink, options: QueueOptions) -> Self {
        let fallback = MockTts::new();
        let tiers: Vec<Arc<dyn TtsEngine>> = vec![Arc::new(fallback.clone())];

        let queue = SpeechQueueController::new(
            Arc::new(synth.clone()),
            sink.unit(),
            FallbackNarrator::new(tiers),
            options,
        );
        let events = queue.subscribe();

        Self {
            queue,
            synth,
            sink,
            fallback,
            events,
        }
    }

    /// Wait for the queue to go idle, failing the test if it hangs
    pub async fn settle(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.queue.wait_until_idle())
            .await
            .expect("queue never went idle");
    }

    /// Every event received so far
    pub fn drain_events(&mut self) -> Vec<QueueEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

/// Poll `condition` until it holds, failing the test after two seconds
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met in time");
}

//! Mock audio sink for Testing
//!
//! Logs every start/stop and tracks how many clips were ever live at once.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use survival_voice::audio::{AudioClip, AudioSink, PlaybackUnit};
use survival_voice::error::PlaybackError;

#[derive(Debug, Clone)]
pub struct MockSink {
    /// "start <text>" / "stop <text>" in order
    pub log: Arc<Mutex<Vec<String>>>,
    /// When false, clips play until stopped
    pub auto_finish: Arc<AtomicBool>,
    pub live: Arc<AtomicUsize>,
    pub max_live: Arc<AtomicUsize>,
    current: Arc<Mutex<Option<String>>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            auto_finish: Arc::new(AtomicBool::new(true)),
            live: Arc::new(AtomicUsize::new(0)),
            max_live: Arc::new(AtomicUsize::new(0)),
            current: Arc::new(Mutex::new(None)),
        }
    }

    /// Clips never end on their own
    pub fn holding() -> Self {
        let sink = Self::new();
        sink.auto_finish.store(false, Ordering::SeqCst);
        sink
    }

    pub fn unit(&self) -> PlaybackUnit {
        PlaybackUnit::with_device(self.clone())
    }

    pub fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Texts whose playback started, in order
    pub fn started(&self) -> Vec<String> {
        self.entries()
            .iter()
            .filter_map(|e| e.strip_prefix("start ").map(str::to_string))
            .collect()
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for MockSink {
    fn start(&mut self, clip: &AudioClip) -> Result<(), PlaybackError> {
        let text = String::from_utf8_lossy(&clip.data).to_string();
        if text.contains("corrupt") {
            return Err(PlaybackError::Decode("unsupported format".to_string()));
        }

        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(live, Ordering::SeqCst);
        self.log.lock().unwrap().push(format!("start {}", text));
        *self.current.lock().unwrap() = Some(text);
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.auto_finish.load(Ordering::SeqCst)
    }

    fn stop(&mut self) {
        if let Some(text) = self.current.lock().unwrap().take() {
            self.live.fetch_sub(1, Ordering::SeqCst);
            self.log.lock().unwrap().push(format!("stop {}", text));
        }
    }
}

//! Survival Voice Library
//!
//! Voice output turn management for the survival companion: queueing,
//! deduplication, single-flight playback and fallback speech.

pub mod audio;
pub mod config;
pub mod core;
pub mod dedup;
pub mod error;
pub mod narrator;
pub mod queue;
pub mod tts;
pub mod utils;
pub mod voice;

pub use error::{VoiceError, VoiceResult};
pub use queue::{QueueEvent, QueuePhase, SpeechQueueController, SubmitOutcome};

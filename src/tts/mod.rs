//! TTS (Text-to-Speech) Module
//!
//! Two seams: [`SpeechSynthesizer`] turns text into an audio clip (the cloud
//! path), [`TtsEngine`] speaks text directly through a local capability (the
//! fallback tiers).

use crate::audio::AudioClip;
use crate::config::Config;
use crate::error::{SynthesisError, VoiceResult};
use crate::voice::VoiceProfile;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub mod elevenlabs;
pub mod speechd;
pub mod system;

/// Converts text into playable audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + std::fmt::Debug {
    /// One attempt, no retry. The caller owns the fallback policy.
    async fn synthesize(
        &self,
        text: &str,
        profile: &VoiceProfile,
    ) -> Result<AudioClip, SynthesisError>;

    /// Get the backend name
    fn name(&self) -> &str;
}

/// Trait for local TTS engines used as fallback tiers
#[async_trait]
pub trait TtsEngine: Send + Sync + std::fmt::Debug {
    /// Speak the given text, resolving once speech has been handed off or completed
    async fn speak(&self, text: &str, profile: &VoiceProfile) -> Result<()>;

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Factory for the configured cloud synthesizer
pub fn create_synthesizer(config: &Config) -> VoiceResult<Arc<dyn SpeechSynthesizer>> {
    let client = elevenlabs::ElevenLabsClient::new(config)?;
    if !config.has_api_key() {
        warn!("🔑 No synthesis API key configured, every line will use fallback speech");
    }
    Ok(Arc::new(client))
}

/// Build the ordered fallback tiers named in config
pub fn create_fallback_tiers(config: &Config) -> Vec<Arc<dyn TtsEngine>> {
    let mut tiers: Vec<Arc<dyn TtsEngine>> = Vec::new();

    for name in &config.fallback_tiers {
        match name.as_str() {
            "speechd_ng" | "speechd" => {
                info!("  - Fallback tier: speechd-ng");
                tiers.push(Arc::new(speechd::SpeechdEngine::new()));
            }
            "system" => {
                info!("  - Fallback tier: system commands");
                tiers.push(Arc::new(system::SystemEngine::new(config.fallback_rate)));
            }
            other => {
                warn!("  - Unknown fallback tier '{}', skipping", other);
            }
        }
    }

    tiers
}

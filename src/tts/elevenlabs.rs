//! ElevenLabs cloud synthesis over HTTP

use super::SpeechSynthesizer;
use crate::audio::AudioClip;
use crate::config::Config;
use crate::error::{SynthesisError, VoiceError, VoiceResult};
use crate::voice::VoiceProfile;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Upstream error bodies are cut to this many characters
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Clone)]
pub struct ElevenLabsClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model_id: String,
    output_format: String,
}

impl ElevenLabsClient {
    pub fn new(config: &Config) -> VoiceResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| VoiceError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.elevenlabs_api_key.clone(),
            base_url: config.elevenlabs_base_url.trim_end_matches('/').to_string(),
            model_id: config.elevenlabs_model_id.clone(),
            output_format: config.output_format.clone(),
        })
    }

    fn endpoint(&self, profile: &VoiceProfile) -> String {
        format!(
            "{}/v1/text-to-speech/{}?output_format={}",
            self.base_url,
            profile.voice_id.backend_id(),
            self.output_format
        )
    }

    fn request_body(&self, text: &str, profile: &VoiceProfile) -> serde_json::Value {
        serde_json::json!({
            "text": text,
            "model_id": self.model_id,
            "voice_settings": profile.synthesis,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(
        &self,
        text: &str,
        profile: &VoiceProfile,
    ) -> Result<AudioClip, SynthesisError> {
        if self.api_key.trim().is_empty() {
            return Err(SynthesisError::Configuration(
                "no ElevenLabs API key configured".to_string(),
            ));
        }

        debug!("☁️ Synthesizing with voice {}: '{}'", profile.voice_id, text);

        let response = self
            .client
            .post(self.endpoint(profile))
            .header("xi-api-key", &self.api_key)
            .header("accept", "audio/mpeg")
            .json(&self.request_body(text, profile))
            .send()
            .await
            .map_err(|e| SynthesisError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            warn!("❌ Synthesis API Error ({}): {}", status, body);
            return Err(SynthesisError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();

        let data = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Transport(e.to_string()))?;

        if data.is_empty() {
            return Err(SynthesisError::Upstream {
                status: status.as_u16(),
                body: "empty audio body".to_string(),
            });
        }

        Ok(AudioClip::new(data, mime_type))
    }

    fn name(&self) -> &str {
        "elevenlabs"
    }
}

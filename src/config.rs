use crate::error::{VoiceError, VoiceResult};
use crate::voice::{SynthesisParameters, VoiceId, VoiceProfile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured API key
pub const API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Cloud synthesis
    pub elevenlabs_api_key: String,
    pub elevenlabs_base_url: String,
    pub elevenlabs_model_id: String,
    pub output_format: String,
    pub request_timeout_secs: Option<u64>,

    // Voice
    pub voice: VoiceId,
    pub synthesis: SynthesisParameters,

    // Deduplication
    pub history_capacity: usize,
    pub history_retain: usize,
    pub near_duplicate_min_chars: usize,
    pub similarity_threshold: Option<f64>,

    // Fallback
    pub fallback_tiers: Vec<String>,
    pub fallback_rate: i32,

    // Meta
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            elevenlabs_api_key: "".to_string(),
            elevenlabs_base_url: "https://api.elevenlabs.io".to_string(),
            elevenlabs_model_id: "eleven_monolingual_v1".to_string(),
            output_format: "mp3_44100_128".to_string(),
            request_timeout_secs: None,
            voice: VoiceId::default(),
            synthesis: SynthesisParameters::default(),
            history_capacity: 100,
            history_retain: 50,
            near_duplicate_min_chars: 10,
            similarity_threshold: None,
            fallback_tiers: vec!["speechd".to_string(), "system".to_string()],
            fallback_rate: 0,
            log_level: "INFO".to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location, or create default
    pub fn load() -> VoiceResult<Self> {
        Self::load_from(&config_path())
    }

    /// Load config from an explicit path.
    ///
    /// A corrupt file is moved aside to `*.json.corrupt` and defaults are used.
    pub fn load_from(path: &Path) -> VoiceResult<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            match serde_json::from_str::<Config>(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                    let backup_path = path.with_extension("json.corrupt");
                    let _ = std::fs::rename(path, &backup_path);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.elevenlabs_api_key = key;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> VoiceResult<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> VoiceResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> VoiceResult<()> {
        if self.history_retain == 0 {
            return Err(VoiceError::Config(
                "history_retain must be at least 1".to_string(),
            ));
        }
        if self.history_retain > self.history_capacity {
            return Err(VoiceError::Config(format!(
                "history_retain ({}) exceeds history_capacity ({})",
                self.history_retain, self.history_capacity
            )));
        }
        if !self.synthesis.is_valid() {
            return Err(VoiceError::Config(
                "synthesis parameters must be within [0, 1]".to_string(),
            ));
        }
        if let Some(threshold) = self.similarity_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(VoiceError::Config(format!(
                    "similarity_threshold {} is outside [0, 1]",
                    threshold
                )));
            }
        }
        Ok(())
    }

    /// Whether a non-blank API key is present
    pub fn has_api_key(&self) -> bool {
        !self.elevenlabs_api_key.trim().is_empty()
    }

    pub fn voice_profile(&self) -> VoiceProfile {
        VoiceProfile::new(self.voice).with_parameters(self.synthesis)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("survival-voice")
        .join("config.json")
}

//! Voice profiles
//!
//! The voice a user picked for the companion, plus the knobs passed through
//! to the synthesis backend untouched.

use serde::{Deserialize, Serialize};

/// Available companion voices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceId {
    #[default]
    Rachel,
    Adam,
    Antoni,
    Bella,
    Josh,
}

/// Hint for platform speech when the cloud voice is unavailable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackVoice {
    pub female: bool,
    /// espeak-ng voice variant
    pub espeak_variant: &'static str,
}

impl std::str::FromStr for VoiceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rachel" => Ok(VoiceId::Rachel),
            "adam" => Ok(VoiceId::Adam),
            "antoni" => Ok(VoiceId::Antoni),
            "bella" => Ok(VoiceId::Bella),
            "josh" => Ok(VoiceId::Josh),
            other => Err(format!("unknown voice '{}'", other)),
        }
    }
}

impl std::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl VoiceId {
    /// Config/CLI name
    pub fn id(&self) -> &'static str {
        match self {
            VoiceId::Rachel => "rachel",
            VoiceId::Adam => "adam",
            VoiceId::Antoni => "antoni",
            VoiceId::Bella => "bella",
            VoiceId::Josh => "josh",
        }
    }

    /// Identifier understood by the synthesis backend
    pub fn backend_id(&self) -> &'static str {
        match self {
            VoiceId::Rachel => "21m00Tcm4TlvDq8ikWAM",
            VoiceId::Adam => "pNInz6obpgDQGcFmaJgB",
            VoiceId::Antoni => "ErXwobaYiN019PkySvjV",
            VoiceId::Bella => "EXAVITQu4vr4xnJEhWfq",
            VoiceId::Josh => "TxGEqnHWrfWFTfGW9XjX",
        }
    }

    pub fn fallback(&self) -> FallbackVoice {
        match self {
            VoiceId::Rachel | VoiceId::Bella => FallbackVoice {
                female: true,
                espeak_variant: "en+f3",
            },
            VoiceId::Adam | VoiceId::Antoni | VoiceId::Josh => FallbackVoice {
                female: false,
                espeak_variant: "en+m3",
            },
        }
    }

    pub fn all() -> Vec<VoiceId> {
        vec![
            VoiceId::Rachel,
            VoiceId::Adam,
            VoiceId::Antoni,
            VoiceId::Bella,
            VoiceId::Josh,
        ]
    }
}

/// Stability/expressiveness knobs, sent verbatim as `voice_settings`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthesisParameters {
    pub stability: f32,
    pub similarity_boost: f32,
    #[serde(default)]
    pub style: f32,
    #[serde(default = "default_speaker_boost")]
    pub use_speaker_boost: bool,
}

fn default_speaker_boost() -> bool {
    true
}

impl Default for SynthesisParameters {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

impl SynthesisParameters {
    /// All ratio knobs must sit in `[0, 1]`
    pub fn is_valid(&self) -> bool {
        [self.stability, self.similarity_boost, self.style]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }
}

/// Voice selection for a session. Read by synthesis, never mutated by it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub voice_id: VoiceId,
    #[serde(default)]
    pub synthesis: SynthesisParameters,
}

impl VoiceProfile {
    pub fn new(voice_id: VoiceId) -> Self {
        Self {
            voice_id,
            synthesis: SynthesisParameters::default(),
        }
    }

    pub fn with_parameters(mut self, synthesis: SynthesisParameters) -> Self {
        self.synthesis = synthesis;
        self
    }
}

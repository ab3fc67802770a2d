//! Survival Voice Error Types
//!
//! Centralized error handling for the narration pipeline.

use serde::Serialize;
use thiserror::Error;

/// Failure while turning text into audio through the cloud backend.
///
/// Every variant is final for the item that produced it: the caller decides
/// whether to fall back, the client never retries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    /// No usable credential, detected before any network activity.
    #[error("speech synthesis not configured: {0}")]
    Configuration(String),

    /// Network unreachable, connection reset, timeout from the transport.
    #[error("synthesis transport error: {0}")]
    Transport(String),

    /// The backend answered, but not with audio.
    #[error("synthesis backend returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

impl SynthesisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SynthesisError::Configuration(_) => ErrorKind::Configuration,
            SynthesisError::Transport(_) => ErrorKind::Transport,
            SynthesisError::Upstream { .. } => ErrorKind::Upstream,
        }
    }
}

/// Failure while rendering an already synthesized clip.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),

    #[error("failed to decode audio: {0}")]
    Decode(String),

    #[error("audio thread disconnected")]
    Disconnected,
}

/// Coarse classification reported through queue events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Transport,
    Upstream,
    Playback,
    Fallback,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Transport => "transport",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Playback => "playback",
            ErrorKind::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// Central error type for the crate
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for crate operations
pub type VoiceResult<T> = Result<T, VoiceError>;

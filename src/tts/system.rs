//! System fallback TTS engine
//!
//! Shells out to whatever platform speech command is installed and waits for
//! it to finish speaking.

use super::TtsEngine;
use crate::voice::VoiceProfile;
use anyhow::Result;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// espeak-ng default speaking rate in words per minute
const ESPEAK_BASE_WPM: i32 = 175;

/// Argument convention of a speech command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStyle {
    /// speech-dispatcher's `spd-say`
    SpdSay,
    /// `espeak-ng` / `espeak`
    Espeak,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechCommand {
    pub program: String,
    pub style: CommandStyle,
}

impl SpeechCommand {
    pub fn new(program: impl Into<String>, style: CommandStyle) -> Self {
        Self {
            program: program.into(),
            style,
        }
    }

    /// Arguments for speaking `text`; `rate` is -100..=100 around normal speed
    pub fn args(&self, text: &str, profile: &VoiceProfile, rate: i32) -> Vec<String> {
        let hint = profile.voice_id.fallback();
        let rate = rate.clamp(-100, 100);
        match self.style {
            CommandStyle::SpdSay => vec![
                "-w".to_string(),
                "-r".to_string(),
                rate.to_string(),
                "-t".to_string(),
                if hint.female { "female1" } else { "male1" }.to_string(),
                "--".to_string(),
                text.to_string(),
            ],
            CommandStyle::Espeak => vec![
                "-v".to_string(),
                hint.espeak_variant.to_string(),
                "-s".to_string(),
                (ESPEAK_BASE_WPM + rate).to_string(),
                "--".to_string(),
                text.to_string(),
            ],
        }
    }
}

#[derive(Debug)]
pub struct SystemEngine {
    commands: Vec<SpeechCommand>,
    rate: i32,
}

impl Default for SystemEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SystemEngine {
    /// spd-say first, espeak-ng second
    pub fn new(rate: i32) -> Self {
        Self::with_commands(
            vec![
                SpeechCommand::new("spd-say", CommandStyle::SpdSay),
                SpeechCommand::new("espeak-ng", CommandStyle::Espeak),
            ],
            rate,
        )
    }

    pub fn with_commands(commands: Vec<SpeechCommand>, rate: i32) -> Self {
        Self { commands, rate }
    }
}

#[async_trait]
impl TtsEngine for SystemEngine {
    async fn speak(&self, text: &str, profile: &VoiceProfile) -> Result<()> {
        debug!("System speaking: {}", text);

        let mut failures = Vec::new();
        for command in &self.commands {
            let child = Command::new(&command.program)
                .args(command.args(text, profile, self.rate))
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();

            let mut child = match child {
                Ok(child) => child,
                Err(e) => {
                    failures.push(format!("{}: {}", command.program, e));
                    continue;
                }
            };

            let status = child.wait().await?;
            if status.success() {
                return Ok(());
            }
            failures.push(format!("{}: exited with {}", command.program, status));
        }

        Err(anyhow::anyhow!(
            "No system TTS command succeeded ({})",
            failures.join("; ")
        ))
    }

    fn name(&self) -> &str {
        "system"
    }
}

//! Speechd-ng TTS backend using D-Bus

use crate::tts::TtsEngine;
use crate::voice::VoiceProfile;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use zbus::{proxy, Connection};

#[proxy(
    interface = "org.speech.Service",
    default_service = "org.speech.Service",
    default_path = "/org/speech/Service"
)]
trait SpeechService {
    fn speak(&self, text: &str) -> zbus::Result<()>;
    fn ping(&self) -> zbus::Result<String>;
}

/// Connects on first use; a failed connect is retried on the next line.
#[derive(Default)]
pub struct SpeechdEngine {
    proxy: OnceCell<SpeechServiceProxy<'static>>,
}

impl std::fmt::Debug for SpeechdEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechdEngine")
            .field("connected", &self.proxy.initialized())
            .finish()
    }
}

impl SpeechdEngine {
    pub fn new() -> Self {
        Self::default()
    }

    async fn proxy(&self) -> Result<&SpeechServiceProxy<'static>> {
        self.proxy
            .get_or_try_init(|| async {
                let connection = Connection::session().await?;
                let proxy = SpeechServiceProxy::new(&connection).await?;
                let response = proxy
                    .ping()
                    .await
                    .map_err(|e| anyhow::anyhow!("speechd-ng not responding: {}", e))?;
                info!("🔊 Connected to speechd-ng: {}", response);
                Ok::<_, anyhow::Error>(proxy)
            })
            .await
    }
}

#[async_trait]
impl TtsEngine for SpeechdEngine {
    async fn speak(&self, text: &str, profile: &VoiceProfile) -> Result<()> {
        // speechd-ng picks its own voice; the profile is only logged
        debug!("speechd-ng speaking ({}): {}", profile.voice_id, text);
        self.proxy().await?.speak(text).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "speechd_ng"
    }
}

//! Fallback narration
//!
//! When cloud synthesis cannot produce a clip, the line is spoken through the
//! platform's own speech instead. Tiers are tried in order; if none works the
//! line is dropped. Nothing here ever returns an error to the queue.

use crate::config::Config;
use crate::tts::{create_fallback_tiers, TtsEngine};
use crate::voice::VoiceProfile;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a fallback attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackOutcome {
    /// Spoken by the named tier
    Spoken(String),
    /// No tier could speak the line
    Dropped,
}

#[derive(Debug, Clone, Default)]
pub struct FallbackNarrator {
    tiers: Vec<Arc<dyn TtsEngine>>,
}

impl FallbackNarrator {
    pub fn new(tiers: Vec<Arc<dyn TtsEngine>>) -> Self {
        Self { tiers }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(create_fallback_tiers(config))
    }

    pub fn tier_names(&self) -> Vec<&str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// Best effort: the first tier that succeeds wins
    pub async fn speak_via_fallback(&self, text: &str, profile: &VoiceProfile) -> FallbackOutcome {
        for tier in &self.tiers {
            match tier.speak(text, profile).await {
                Ok(()) => {
                    info!("🗣️ Fallback '{}' spoke: '{}'", tier.name(), text);
                    return FallbackOutcome::Spoken(tier.name().to_string());
                }
                Err(e) => {
                    debug!("Fallback tier '{}' failed: {}", tier.name(), e);
                }
            }
        }

        warn!("🔇 No fallback voice available, dropping: '{}'", text);
        FallbackOutcome::Dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct ScriptedTier {
        name: &'static str,
        works: bool,
        heard: Mutex<Vec<String>>,
    }

    impl ScriptedTier {
        fn new(name: &'static str, works: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                works,
                heard: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TtsEngine for ScriptedTier {
        async fn speak(&self, text: &str, _profile: &VoiceProfile) -> Result<()> {
            self.heard.lock().unwrap().push(text.to_string());
            if self.works {
                Ok(())
            } else {
                Err(anyhow::anyhow!("{} unavailable", self.name))
            }
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    #[tokio::test]
    async fn test_tiers_tried_in_order() {
        let broken = ScriptedTier::new("speechd_ng", false);
        let working = ScriptedTier::new("system", true);
        let spare = ScriptedTier::new("spare", true);
        let tiers: Vec<Arc<dyn TtsEngine>> = vec![broken.clone(), working.clone(), spare.clone()];
        let narrator = FallbackNarrator::new(tiers);

        let outcome = narrator
            .speak_via_fallback("Boil it first.", &VoiceProfile::default())
            .await;

        assert_eq!(outcome, FallbackOutcome::Spoken("system".to_string()));
        assert_eq!(broken.heard.lock().unwrap().len(), 1);
        assert_eq!(working.heard.lock().unwrap().len(), 1);
        assert!(spare.heard.lock().unwrap().is_empty());
    }

    #[test]
    fn test_no_tiers_drops_silently() {
        let narrator = FallbackNarrator::default();
        let outcome = tokio_test::block_on(
            narrator.speak_via_fallback("anyone there?", &VoiceProfile::default()),
        );
        assert_eq!(outcome, FallbackOutcome::Dropped);
    }

    #[tokio::test]
    async fn test_all_tiers_failing_drops() {
        let tier: Arc<dyn TtsEngine> = ScriptedTier::new("a", false);
        let narrator = FallbackNarrator::new(vec![tier]);
        assert_eq!(narrator.tier_names(), vec!["a"]);
        let outcome = narrator
            .speak_via_fallback("hello", &VoiceProfile::default())
            .await;
        assert_eq!(outcome, FallbackOutcome::Dropped);
    }
}

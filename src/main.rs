//! Survival Voice - narrate companion replies
//!
//! Reads chat text from stdin and speaks it through the speech queue.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use survival_voice::config::Config;
use survival_voice::core::SentenceSegmenter;
use survival_voice::voice::{VoiceId, VoiceProfile};
use survival_voice::{QueueEvent, SpeechQueueController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Conversation id for incoming text
    #[arg(short, long, default_value = "default")]
    conversation: String,

    /// Voice to speak with (rachel, adam, antoni, bella, josh)
    #[arg(long)]
    voice: Option<VoiceId>,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(voice) = args.voice {
        config.voice = voice;
    }

    // Setup logging
    let level = if args.verbose {
        "debug".to_string()
    } else {
        config.log_level.to_lowercase()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🏕️ Survival Voice v{} starting...", env!("CARGO_PKG_VERSION"));

    let queue = SpeechQueueController::from_config(&config)?;
    spawn_event_logger(&queue);

    let mut conversation = args.conversation;
    let mut segmenter = SentenceSegmenter::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    info!("✅ Ready - type or pipe text, /stop, /new <id>, /voice <name>");

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("🛑 Interrupted");
                queue.stop_all();
                break;
            }
        };

        let Some(line) = line else {
            if let Some(tail) = segmenter.finish() {
                queue.submit(&tail, &conversation);
            }
            queue.wait_until_idle().await;
            break;
        };

        let trimmed = line.trim();
        if trimmed == "/stop" {
            segmenter.clear();
            queue.stop_all();
        } else if let Some(id) = trimmed.strip_prefix("/new ") {
            segmenter.clear();
            queue.reset_conversation();
            conversation = id.trim().to_string();
            info!("💬 Conversation '{}'", conversation);
        } else if let Some(name) = trimmed.strip_prefix("/voice ") {
            match name.parse::<VoiceId>() {
                Ok(voice) => {
                    let profile = queue.voice_profile();
                    queue.set_voice_profile(VoiceProfile {
                        voice_id: voice,
                        ..profile
                    });
                }
                Err(e) => warn!("⚠️ {}", e),
            }
        } else {
            for sentence in segmenter.push(&format!("{}\n", line)) {
                queue.submit(&sentence, &conversation);
            }
        }
    }

    queue.dispose();
    Ok(())
}

fn spawn_event_logger(queue: &SpeechQueueController) {
    let mut events = queue.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(QueueEvent::Error { kind, detail }) => warn!("⚠️ [{}] {}", kind, detail),
                Ok(other) => match serde_json::to_string(&other) {
                    Ok(json) => debug!("📣 {}", json),
                    Err(_) => debug!("📣 {:?}", other),
                },
                Err(RecvError::Lagged(missed)) => debug!("Event logger skipped {} events", missed),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

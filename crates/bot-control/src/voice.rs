use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use bot_proto::Command;

use crate::console::Input;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Text source of recognized utterances, one per line (file or FIFO fed
    /// by an external recognizer). Unset disables voice control.
    pub transcripts: Option<String>,
}

/// Speech input, one transcript per utterance. `None` once the recognizer
/// has closed.
#[async_trait]
pub trait SpeechRecognizer: Send {
    async fn next_transcript(&mut self) -> Option<String>;
}

/// Transcripts pushed by whatever thread or task drives the recognizer.
#[async_trait]
impl SpeechRecognizer for mpsc::Receiver<String> {
    async fn next_transcript(&mut self) -> Option<String> {
        self.recv().await
    }
}

/// Keyword match over a transcript, first rule wins: forward, backward,
/// left, right, light, stop, status. Substring matches, so "go back" is a
/// forward command. Stop needs the bare word or one of its synonyms.
pub fn command_for_utterance(text: &str) -> Option<Input> {
    let lower = text.trim().to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    let command = if has(&["forward", "go", "front", "aage"]) {
        Command::Forward
    } else if has(&["back", "reverse", "behind", "peeche"]) {
        Command::Backward
    } else if has(&["left", "baaye"]) {
        Command::Left
    } else if has(&["right", "daaye"]) {
        Command::Right
    } else if has(&["light", "torch", "flash"]) {
        Command::ToggleLight
    } else if lower == "stop" || has(&["halt", "ruk", "thamba"]) {
        Command::Stop
    } else if has(&["status", "report", "battery", "health"]) {
        return Some(Input::Status);
    } else {
        return None;
    };
    Some(Input::Command(command))
}

/// Feeds recognized commands into the console input. Voice commands take
/// the same path as typed ones, mode rejection and interlock included.
pub async fn run_voice<S: SpeechRecognizer>(mut recognizer: S, input: mpsc::Sender<Input>) {
    while let Some(text) = recognizer.next_transcript().await {
        let Some(msg) = command_for_utterance(&text) else {
            debug!("voice: no command in {:?}", text);
            continue;
        };
        info!(?msg, "voice: {:?}", text);
        if input.send(msg).await.is_err() {
            break;
        }
    }
    debug!("voice: recognizer closed");
}

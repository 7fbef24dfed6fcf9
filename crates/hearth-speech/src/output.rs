//! Speech synthesis with barge-in.
//!
//! At most one utterance plays at a time: a new `speak` cancels whatever is
//! still playing instead of queueing behind it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hearth_core::{VoiceGender, VoiceParams};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::SpeechError;

/// A voice offered by the platform synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    pub name: String,
    pub language: String,
}

impl VoiceInfo {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
        }
    }
}

/// Everything the synthesizer needs for one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// `None` means the platform default voice.
    pub voice: Option<VoiceInfo>,
    pub params: VoiceParams,
}

/// Platform speech synthesis.
///
/// `speak` resolves when playback finishes. Dropping the future must stop
/// playback; that is how cancellation reaches the device.
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Voices currently available for synthesis.
    fn voices(&self) -> Vec<VoiceInfo>;

    async fn speak(&self, utterance: Utterance) -> Result<(), SpeechError>;
}

/// Best-effort voice match by name.
///
/// Female-coded requests look for "female" or "samantha"; male-coded ones for
/// "male" or "daniel", skipping names that only match because they contain
/// "female". Returns `None` when nothing matches.
pub fn select_voice(voices: &[VoiceInfo], gender: VoiceGender) -> Option<&VoiceInfo> {
    voices.iter().find(|voice| {
        let name = voice.name.to_lowercase();
        match gender {
            VoiceGender::Female => name.contains("female") || name.contains("samantha"),
            VoiceGender::Male => {
                (name.contains("male") && !name.contains("female")) || name.contains("daniel")
            }
        }
    })
}

/// Plays one utterance at a time and exposes an observable `speaking` flag.
pub struct SpeechOutputController {
    backend: Arc<dyn SpeechOutput>,
    speaking: Arc<watch::Sender<bool>>,
    utterance_seq: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for SpeechOutputController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechOutputController")
            .field("speaking", &self.is_speaking())
            .finish()
    }
}

impl SpeechOutputController {
    pub fn new(backend: Arc<dyn SpeechOutput>) -> Self {
        let (speaking, _) = watch::channel(false);
        Self {
            backend,
            speaking: Arc::new(speaking),
            utterance_seq: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    pub fn is_speaking(&self) -> bool {
        *self.speaking.borrow()
    }

    /// Observe the `speaking` flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.speaking.subscribe()
    }

    /// Speak `text`, pre-empting any utterance still playing.
    ///
    /// A no-op when `enabled` is false, so callers may invoke it
    /// unconditionally. Returns `true` if playback was started.
    pub fn speak(&mut self, text: &str, params: &VoiceParams, enabled: bool) -> bool {
        self.speak_with(text, params, enabled, |_| {})
    }

    /// Like [`speak`](Self::speak), but reports a synthesis failure through
    /// `on_error`. A cancelled or pre-empted utterance never reports.
    ///
    /// Blank text still silences the previous utterance.
    pub fn speak_with<E>(
        &mut self,
        text: &str,
        params: &VoiceParams,
        enabled: bool,
        on_error: E,
    ) -> bool
    where
        E: FnOnce(SpeechError) + Send + 'static,
    {
        if !enabled {
            tracing::debug!("Voice output disabled, not speaking");
            return false;
        }

        self.interrupt();
        if text.trim().is_empty() {
            self.speaking.send_replace(false);
            return false;
        }

        let voices = self.backend.voices();
        let voice = select_voice(&voices, params.gender).cloned();
        if voice.is_none() {
            tracing::debug!(gender = ?params.gender, "No matching voice, using platform default");
        }
        let utterance = Utterance {
            text: text.to_string(),
            voice,
            params: params.clone(),
        };

        let utterance_id = self.utterance_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.speaking.send_replace(true);
        tracing::info!(
            utterance_id,
            text_len = text.len(),
            voice = utterance.voice.as_ref().map(|v| v.name.as_str()).unwrap_or("default"),
            "Speaking"
        );

        let backend = Arc::clone(&self.backend);
        let speaking = Arc::clone(&self.speaking);
        let utterance_seq = Arc::clone(&self.utterance_seq);

        self.task = Some(tokio::spawn(async move {
            let outcome = backend.speak(utterance).await;
            if utterance_seq.load(Ordering::SeqCst) != utterance_id {
                return;
            }
            speaking.send_replace(false);
            match outcome {
                Ok(()) => tracing::debug!(utterance_id, "Utterance finished"),
                Err(e) => {
                    tracing::warn!(utterance_id, error = %e, "Speech synthesis failed");
                    on_error(e);
                }
            }
        }));
        true
    }

    /// Stop any in-progress speech. Idempotent.
    pub fn cancel(&mut self) {
        let was_speaking = self.is_speaking();
        self.interrupt();
        self.speaking.send_replace(false);
        if was_speaking {
            tracing::info!("Speech cancelled");
        }
    }

    fn interrupt(&mut self) {
        self.utterance_seq.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for SpeechOutputController {
    fn drop(&mut self) {
        self.interrupt();
    }
}

// =============================================================================
// Tests
// =============================================================================

//! In-process speech backends.
//!
//! Used by tests and by front-ends running where no platform speech engine
//! exists. None of them touch real audio devices.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::SpeechError;
use crate::input::{CaptureOptions, SpeechInput};
use crate::output::{SpeechOutput, Utterance, VoiceInfo};

// =============================================================================
// Input
// =============================================================================

/// Speech input for platforms without voice capture.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedSpeechInput;

#[async_trait]
impl SpeechInput for UnsupportedSpeechInput {
    fn is_supported(&self) -> bool {
        false
    }

    async fn capture(&self, _options: &CaptureOptions) -> Result<String, SpeechError> {
        Err(SpeechError::Unsupported)
    }
}

/// What a scripted capture does.
#[derive(Debug, Clone)]
pub enum ScriptedCapture {
    /// Resolve with this transcript.
    Transcript(String),
    /// Resolve with this error.
    Fail(SpeechError),
    /// Never resolve; only a stop ends the capture.
    Pending,
}

/// Speech input that replays a fixed script, one entry per capture.
///
/// Once the script runs out, captures fail with [`SpeechError::NoSpeech`].
#[derive(Debug, Default)]
pub struct ScriptedSpeechInput {
    script: Mutex<VecDeque<ScriptedCapture>>,
    captures: AtomicUsize,
    last_language: Mutex<Option<String>>,
}

impl ScriptedSpeechInput {
    pub fn new(script: Vec<ScriptedCapture>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            captures: AtomicUsize::new(0),
            last_language: Mutex::new(None),
        }
    }

    /// Queue another capture outcome.
    pub fn push(&self, capture: ScriptedCapture) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(capture);
        }
    }

    /// Number of captures started so far.
    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    /// Language requested by the most recent capture.
    pub fn last_language(&self) -> Option<String> {
        self.last_language.lock().ok().and_then(|l| l.clone())
    }
}

#[async_trait]
impl SpeechInput for ScriptedSpeechInput {
    fn is_supported(&self) -> bool {
        true
    }

    async fn capture(&self, options: &CaptureOptions) -> Result<String, SpeechError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut lang) = self.last_language.lock() {
            *lang = Some(options.language.clone());
        }
        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());

        match next {
            Some(ScriptedCapture::Transcript(text)) => Ok(text),
            Some(ScriptedCapture::Fail(err)) => Err(err),
            Some(ScriptedCapture::Pending) => std::future::pending().await,
            None => Err(SpeechError::NoSpeech),
        }
    }
}

// =============================================================================
// Output
// =============================================================================

/// Speech output that records every utterance instead of playing it.
#[derive(Debug, Default)]
pub struct RecordingSpeechOutput {
    voices: Vec<VoiceInfo>,
    /// Playback never finishes on its own; only cancellation ends it.
    hold: bool,
    fail: bool,
    spoken: Mutex<Vec<Utterance>>,
    active: Arc<AtomicUsize>,
}

impl RecordingSpeechOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voices(mut self, voices: Vec<VoiceInfo>) -> Self {
        self.voices = voices;
        self
    }

    pub fn holding(mut self) -> Self {
        self.hold = true;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// All utterances handed to the synthesizer, in order.
    pub fn spoken(&self) -> Vec<Utterance> {
        self.spoken.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Utterances currently playing.
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Decrements the active count when playback ends or is dropped.
struct PlaybackGuard(Arc<AtomicUsize>);

impl Drop for PlaybackGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SpeechOutput for RecordingSpeechOutput {
    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.clone()
    }

    async fn speak(&self, utterance: Utterance) -> Result<(), SpeechError> {
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push(utterance);
        }
        if self.fail {
            return Err(SpeechError::Device("synthesis failed".to_string()));
        }

        self.active.fetch_add(1, Ordering::SeqCst);
        let _guard = PlaybackGuard(Arc::clone(&self.active));
        if self.hold {
            std::future::pending::<()>().await;
        }
        tokio::task::yield_now().await;
        Ok(())
    }
}

//! One-shot voice capture.
//!
//! [`SpeechInputController`] turns a single microphone capture into a
//! transcript. Outcomes are delivered through caller-supplied callbacks,
//! exactly once per capture, unless the capture is stopped first.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::SpeechError;
use crate::state::CaptureState;

/// Recognition settings handed to the backend for every capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    /// BCP 47 language tag.
    pub language: String,
    /// Whether partial transcripts are wanted. Hearth only uses final ones.
    pub interim_results: bool,
    pub max_alternatives: u32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            interim_results: false,
            max_alternatives: 1,
        }
    }
}

/// Platform voice recognition.
///
/// A capture resolves when the platform detects the end of an utterance or
/// gives up. Dropping the returned future must release the microphone.
#[async_trait]
pub trait SpeechInput: Send + Sync {
    /// Whether voice capture exists on this platform at all.
    fn is_supported(&self) -> bool;

    /// Listen for one utterance and return its transcript.
    async fn capture(&self, options: &CaptureOptions) -> Result<String, SpeechError>;
}

/// Drives one capture at a time and exposes an observable `listening` flag.
pub struct SpeechInputController {
    backend: Arc<dyn SpeechInput>,
    options: CaptureOptions,
    listening: Arc<watch::Sender<bool>>,
    /// Identifies the current capture. Bumped on stop so late outcomes are dropped.
    capture_seq: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for SpeechInputController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechInputController")
            .field("options", &self.options)
            .field("state", &self.state())
            .finish()
    }
}

impl SpeechInputController {
    pub fn new(backend: Arc<dyn SpeechInput>) -> Self {
        Self::with_options(backend, CaptureOptions::default())
    }

    pub fn with_options(backend: Arc<dyn SpeechInput>, options: CaptureOptions) -> Self {
        let (listening, _) = watch::channel(false);
        Self {
            backend,
            options,
            listening: Arc::new(listening),
            capture_seq: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.backend.is_supported()
    }

    pub fn is_listening(&self) -> bool {
        *self.listening.borrow()
    }

    pub fn state(&self) -> CaptureState {
        CaptureState::from_listening(self.is_listening())
    }

    /// Observe the `listening` flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.listening.subscribe()
    }

    /// Begin a capture.
    ///
    /// Returns `true` if listening started. When the platform has no voice
    /// capture, `on_error` fires immediately with [`SpeechError::Unsupported`].
    /// Calling `start` while already listening does nothing.
    pub fn start<R, E>(&mut self, on_result: R, on_error: E) -> bool
    where
        R: FnOnce(String) + Send + 'static,
        E: FnOnce(SpeechError) + Send + 'static,
    {
        if !self.backend.is_supported() {
            tracing::warn!("Voice capture is not supported on this platform");
            on_error(SpeechError::Unsupported);
            return false;
        }
        if self.is_listening() {
            tracing::debug!("Voice capture already active, ignoring start");
            return false;
        }

        let capture_id = self.capture_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.transition(CaptureState::Listening);
        tracing::info!(capture_id, language = %self.options.language, "Voice capture started");

        let backend = Arc::clone(&self.backend);
        let options = self.options.clone();
        let listening = Arc::clone(&self.listening);
        let capture_seq = Arc::clone(&self.capture_seq);

        self.task = Some(tokio::spawn(async move {
            let outcome = backend.capture(&options).await;
            if capture_seq.load(Ordering::SeqCst) != capture_id {
                tracing::debug!(capture_id, "Dropping outcome of a stopped capture");
                return;
            }
            listening.send_replace(false);
            match outcome {
                Ok(text) => {
                    tracing::info!(capture_id, text_len = text.len(), "Utterance captured");
                    on_result(text);
                }
                Err(e) => {
                    tracing::warn!(capture_id, error = %e, "Voice capture failed");
                    on_error(e);
                }
            }
        }));
        true
    }

    /// Cancel the active capture without firing either callback.
    ///
    /// Idempotent: does nothing when not listening.
    pub fn stop(&mut self) {
        if !self.is_listening() {
            return;
        }
        self.capture_seq.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.transition(CaptureState::Idle);
        tracing::info!("Voice capture stopped");
    }

    fn transition(&self, target: CaptureState) {
        let current = self.state();
        if !current.can_transition_to(&target) {
            tracing::warn!("Ignoring invalid capture transition: {} -> {}", current, target);
            return;
        }
        tracing::debug!("Capture state: {} -> {}", current, target);
        self.listening.send_replace(target.is_listening());
    }
}

impl Drop for SpeechInputController {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{ScriptedCapture, ScriptedSpeechInput, UnsupportedSpeechInput};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    type Outcome = Result<String, SpeechError>;

    /// Start a capture whose outcome lands in the returned receiver.
    fn start_with_channel(
        controller: &mut SpeechInputController,
    ) -> (bool, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        let tx = Arc::new(Mutex::new(Some(tx)));
        let tx_err = Arc::clone(&tx);
        let started = controller.start(
            move |text| {
                if let Some(tx) = tx.lock().unwrap().take() {
                    let _ = tx.send(Ok(text));
                }
            },
            move |err| {
                if let Some(tx) = tx_err.lock().unwrap().take() {
                    let _ = tx.send(Err(err));
                }
            },
        );
        (started, rx)
    }

    #[tokio::test]
    async fn test_unsupported_signals_error_immediately() {
        let mut controller = SpeechInputController::new(Arc::new(UnsupportedSpeechInput));
        let (started, mut rx) = start_with_channel(&mut controller);
        assert!(!started);
        assert!(!controller.is_listening());
        assert_eq!(rx.try_recv().unwrap(), Err(SpeechError::Unsupported));
    }

    #[tokio::test]
    async fn test_result_fires_once_and_stops_listening() {
        let input = Arc::new(ScriptedSpeechInput::new(vec![ScriptedCapture::Transcript(
            "hello mom".to_string(),
        )]));
        let mut controller = SpeechInputController::new(input.clone());

        let (started, rx) = start_with_channel(&mut controller);
        assert!(started);
        assert!(controller.is_listening());

        assert_eq!(rx.await.unwrap(), Ok("hello mom".to_string()));
        assert!(!controller.is_listening());
        assert_eq!(input.capture_count(), 1);
    }

    #[tokio::test]
    async fn test_error_fires_once_and_stops_listening() {
        let input = Arc::new(ScriptedSpeechInput::new(vec![ScriptedCapture::Fail(
            SpeechError::PermissionDenied,
        )]));
        let mut controller = SpeechInputController::new(input);

        let (_, rx) = start_with_channel(&mut controller);
        assert_eq!(rx.await.unwrap(), Err(SpeechError::PermissionDenied));
        assert_eq!(controller.state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn test_stop_cancels_without_callback() {
        let input = Arc::new(ScriptedSpeechInput::new(vec![ScriptedCapture::Pending]));
        let mut controller = SpeechInputController::new(input);

        let (started, rx) = start_with_channel(&mut controller);
        assert!(started);
        tokio::task::yield_now().await;

        controller.stop();
        assert!(!controller.is_listening());
        // Both callbacks were dropped with the aborted task.
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let mut controller =
            SpeechInputController::new(Arc::new(ScriptedSpeechInput::new(vec![])));
        controller.stop();
        controller.stop();
        assert!(!controller.is_listening());
    }

    #[tokio::test]
    async fn test_start_while_listening_is_ignored() {
        let input = Arc::new(ScriptedSpeechInput::new(vec![
            ScriptedCapture::Pending,
            ScriptedCapture::Transcript("second".to_string()),
        ]));
        let mut controller = SpeechInputController::new(input.clone());

        let (first, _rx1) = start_with_channel(&mut controller);
        let (second, _rx2) = start_with_channel(&mut controller);
        assert!(first);
        assert!(!second);

        tokio::task::yield_now().await;
        assert_eq!(input.capture_count(), 1);
        controller.stop();
    }

    #[tokio::test]
    async fn test_subscribe_observes_flag() {
        let input = Arc::new(ScriptedSpeechInput::new(vec![ScriptedCapture::Pending]));
        let mut controller = SpeechInputController::new(input);
        let rx = controller.subscribe();
        assert!(!*rx.borrow());

        let _ = start_with_channel(&mut controller);
        assert!(*rx.borrow());

        controller.stop();
        assert!(!*rx.borrow());
    }

    #[tokio::test]
    async fn test_options_reach_backend() {
        let input = Arc::new(ScriptedSpeechInput::new(vec![ScriptedCapture::Transcript(
            "hola".to_string(),
        )]));
        let options = CaptureOptions {
            language: "es-ES".to_string(),
            ..CaptureOptions::default()
        };
        let mut controller = SpeechInputController::with_options(input.clone(), options);
        let (_, rx) = start_with_channel(&mut controller);
        rx.await.unwrap().unwrap();
        assert_eq!(input.last_language().as_deref(), Some("es-ES"));
    }
}

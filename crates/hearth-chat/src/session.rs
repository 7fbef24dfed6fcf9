//! Conversation session controller.
//!
//! One controller per open conversation. It owns the message log and both
//! speech controllers, and it is driven by a single event inbox: remote
//! replies and voice transcripts are delivered as [`SessionEvent`]s and
//! applied one at a time by [`SessionController::handle_event`], so no two
//! state changes ever interleave.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use hearth_core::{
    DomainEvent, EmotionTag, HearthConfig, Message, MessageDraft, Persona, SessionId, VoiceParams,
};
use hearth_speech::{
    CaptureOptions, SpeechError, SpeechInput, SpeechInputController, SpeechOutput,
    SpeechOutputController,
};
use tokio::sync::{broadcast, mpsc, watch};

use crate::backend::{ChatBackend, ChatReply, ChatRequest, ContextTurn};
use crate::error::ChatError;
use crate::state::{
    ErrorReason, RejectReason, SessionSnapshot, SessionState, SubmitOutcome, VoiceSettings,
};
use crate::store::ConversationStore;

/// Capacity of the domain event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Tunables for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Trailing messages sent as context with each request.
    pub context_window: usize,
    /// Upper bound on a single remote request.
    pub request_timeout: Duration,
    /// Whether replies are spoken when the session opens.
    pub voice_enabled: bool,
    pub user_id: Option<i64>,
    pub capture: CaptureOptions,
    pub rate: f32,
    pub volume: f32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            context_window: 10,
            request_timeout: Duration::from_secs(30),
            voice_enabled: true,
            user_id: None,
            capture: CaptureOptions::default(),
            rate: 0.95,
            volume: 1.0,
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &HearthConfig) -> Self {
        Self {
            context_window: config.session.context_window,
            request_timeout: config.backend.timeout(),
            voice_enabled: config.voice.output_enabled,
            user_id: config.backend.user_id,
            capture: CaptureOptions {
                language: config.voice.input_language.clone(),
                ..CaptureOptions::default()
            },
            rate: config.voice.rate,
            volume: config.voice.volume,
        }
    }
}

/// Something that happened outside the controller and must be applied to it.
#[derive(Debug)]
pub enum SessionEvent {
    /// The remote request identified by `ticket` finished.
    ReplyReady {
        ticket: u64,
        result: Result<ChatReply, ChatError>,
    },
    /// Voice capture produced a transcript.
    Transcript(String),
    /// Voice capture failed.
    CaptureFailed(SpeechError),
    /// Speaking a reply failed.
    SpeechFailed(SpeechError),
}

#[derive(Debug)]
struct PendingRequest {
    ticket: u64,
    started: Instant,
}

/// Coordinates one conversation with a persona.
pub struct SessionController {
    id: SessionId,
    persona: Persona,
    store: ConversationStore,
    state: SessionState,
    notice: Option<ErrorReason>,
    voice: VoiceSettings,
    voice_params: VoiceParams,
    options: SessionOptions,
    backend: Arc<dyn ChatBackend>,
    input: SpeechInputController,
    output: SpeechOutputController,
    inbox_tx: mpsc::UnboundedSender<SessionEvent>,
    inbox_rx: mpsc::UnboundedReceiver<SessionEvent>,
    pending: Option<PendingRequest>,
    next_ticket: u64,
    events: broadcast::Sender<DomainEvent>,
    /// A `ListeningStarted` went out without its matching stop.
    capture_announced: bool,
    closed: bool,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("id", &self.id)
            .field("persona", &self.persona)
            .field("state", &self.state)
            .field("messages", &self.store.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl SessionController {
    /// Open a session with `persona`, seeded with the persona's greeting.
    pub fn open(
        persona: Persona,
        backend: Arc<dyn ChatBackend>,
        input: Arc<dyn SpeechInput>,
        output: Arc<dyn SpeechOutput>,
        options: SessionOptions,
    ) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let voice_params = VoiceParams {
            rate: options.rate,
            volume: options.volume,
            ..persona.voice_params()
        };

        let mut session = Self {
            id: SessionId::new(),
            persona,
            store: ConversationStore::new(),
            state: SessionState::Idle,
            notice: None,
            voice: VoiceSettings {
                enabled: options.voice_enabled,
            },
            voice_params,
            input: SpeechInputController::with_options(input, options.capture.clone()),
            output: SpeechOutputController::new(output),
            options,
            backend,
            inbox_tx,
            inbox_rx,
            pending: None,
            next_ticket: 0,
            events,
            capture_announced: false,
            closed: false,
        };

        tracing::info!(session_id = %session.id, persona = %persona, "Session opened");
        session.emit(DomainEvent::SessionOpened {
            session_id: session.id,
            persona,
            timestamp: Utc::now(),
        });
        let greeting = persona.profile().greeting;
        session.append(MessageDraft::assistant(greeting, Some(EmotionTag::happy())));
        session
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The most recent voice problem, if it has not been superseded.
    pub fn notice(&self) -> Option<&ErrorReason> {
        self.notice.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn is_listening(&self) -> bool {
        self.input.is_listening()
    }

    pub fn is_speaking(&self) -> bool {
        self.output.is_speaking()
    }

    pub fn voice_enabled(&self) -> bool {
        self.voice.enabled
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.clone(),
            notice: self.notice.clone(),
            listening: self.is_listening(),
            speaking: self.is_speaking(),
            voice_enabled: self.voice.enabled,
            message_count: self.store.len(),
        }
    }

    /// Subscribe to domain events. Only events after this call are seen.
    pub fn subscribe_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    pub fn watch_listening(&self) -> watch::Receiver<bool> {
        self.input.subscribe()
    }

    pub fn watch_speaking(&self) -> watch::Receiver<bool> {
        self.output.subscribe()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Submit a user message.
    ///
    /// Whitespace-only input, a submission while a reply is outstanding and
    /// a submission after close are all rejected without touching the log.
    /// An accepted message is appended immediately and the request goes out
    /// with the context window as it stood before the message.
    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        if self.closed {
            return SubmitOutcome::Rejected(RejectReason::Closed);
        }
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!(session_id = %self.id, "Ignoring empty submission");
            return SubmitOutcome::Rejected(RejectReason::Empty);
        }
        if self.state.is_awaiting() {
            tracing::debug!(session_id = %self.id, "Reply outstanding, ignoring submission");
            return SubmitOutcome::Rejected(RejectReason::Busy);
        }

        let prior = self.store.context_window(self.options.context_window);
        let message = self.append(MessageDraft::user(text));
        self.state = SessionState::AwaitingResponse;
        self.notice = None;

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let request = ChatRequest {
            message: text.to_string(),
            persona: self.persona,
            user_id: self.options.user_id,
            prior_context: prior.iter().map(ContextTurn::from).collect(),
        };
        let context_len = request.prior_context.len();

        let backend = Arc::clone(&self.backend);
        let inbox = self.inbox_tx.clone();
        let limit = self.options.request_timeout;
        tokio::spawn(async move {
            let result = match tokio::time::timeout(limit, backend.send(&request)).await {
                Ok(result) => result,
                Err(_) => Err(ChatError::Timeout(limit)),
            };
            if inbox.send(SessionEvent::ReplyReady { ticket, result }).is_err() {
                tracing::debug!(ticket, "Session gone, reply discarded");
            }
        });
        self.pending = Some(PendingRequest {
            ticket,
            started: Instant::now(),
        });

        tracing::info!(session_id = %self.id, ticket, context_len, "Message submitted");
        self.emit(DomainEvent::SubmissionAccepted {
            session_id: self.id,
            ticket,
            context_len,
            timestamp: Utc::now(),
        });
        SubmitOutcome::Accepted {
            ticket,
            message_id: message.id,
        }
    }

    /// Start voice capture, or stop it if already listening.
    ///
    /// A transcript is submitted as if typed. Capture failures surface as
    /// an error notice and never disturb an outstanding request.
    pub fn toggle_voice_input(&mut self) {
        if self.closed {
            return;
        }
        if self.input.is_listening() {
            self.input.stop();
            self.announce_listening_stopped();
            return;
        }

        let on_result = self.inbox_tx.clone();
        let on_error = self.inbox_tx.clone();
        let started = self.input.start(
            move |text| {
                let _ = on_result.send(SessionEvent::Transcript(text));
            },
            move |err| {
                let _ = on_error.send(SessionEvent::CaptureFailed(err));
            },
        );
        if started {
            self.capture_announced = true;
            self.emit(DomainEvent::ListeningStarted {
                session_id: self.id,
                timestamp: Utc::now(),
            });
        } else {
            // A refused start reports through the inbox synchronously.
            self.process_ready();
        }
    }

    /// Flip spoken replies on or off. Turning them off silences any reply
    /// being spoken. Returns the new setting.
    pub fn toggle_voice_output(&mut self) -> bool {
        self.voice.enabled = !self.voice.enabled;
        if !self.voice.enabled {
            let was_speaking = self.output.is_speaking();
            self.output.cancel();
            if was_speaking {
                self.emit(DomainEvent::SpeechStopped {
                    session_id: self.id,
                    timestamp: Utc::now(),
                });
            }
        }
        tracing::info!(session_id = %self.id, enabled = self.voice.enabled, "Voice output toggled");
        self.emit(DomainEvent::VoiceOutputToggled {
            session_id: self.id,
            enabled: self.voice.enabled,
            timestamp: Utc::now(),
        });
        self.voice.enabled
    }

    /// Tear the session down: stop listening, silence speech and abandon any
    /// outstanding request. Its reply, if one ever arrives, is discarded.
    /// Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.input.stop();
        self.capture_announced = false;
        self.output.cancel();
        if let Some(pending) = self.pending.take() {
            tracing::debug!(ticket = pending.ticket, "Abandoning outstanding request");
        }
        tracing::info!(
            session_id = %self.id,
            messages = self.store.len(),
            "Session closed"
        );
        self.emit(DomainEvent::SessionClosed {
            session_id: self.id,
            message_count: self.store.len(),
            timestamp: Utc::now(),
        });
    }

    // =========================================================================
    // Event loop
    // =========================================================================

    /// Wait for the next inbox event. Cancel-safe.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.inbox_rx.recv().await
    }

    /// Apply one inbox event to the session.
    pub fn handle_event(&mut self, event: SessionEvent) {
        if self.closed {
            tracing::debug!(session_id = %self.id, ?event, "Session closed, dropping event");
            return;
        }
        match event {
            SessionEvent::ReplyReady { ticket, result } => self.apply_reply(ticket, result),
            SessionEvent::Transcript(text) => {
                self.announce_listening_stopped();
                let outcome = self.submit(&text);
                tracing::debug!(session_id = %self.id, ?outcome, "Transcript submitted");
            }
            SessionEvent::CaptureFailed(err) => {
                self.announce_listening_stopped();
                self.surface(ErrorReason::from(&err));
            }
            SessionEvent::SpeechFailed(err) => {
                self.emit(DomainEvent::SpeechStopped {
                    session_id: self.id,
                    timestamp: Utc::now(),
                });
                self.surface(ErrorReason::from(&err));
            }
        }
    }

    /// Wait for and apply one event. Returns `false` if the inbox is closed.
    pub async fn pump(&mut self) -> bool {
        match self.next_event().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Apply events until no request is outstanding.
    pub async fn settle(&mut self) {
        while self.state.is_awaiting() && !self.closed {
            if !self.pump().await {
                break;
            }
        }
    }

    /// Apply every event already waiting, without blocking. Returns how many.
    pub fn process_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.inbox_rx.try_recv() {
            self.handle_event(event);
            applied += 1;
        }
        applied
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn apply_reply(&mut self, ticket: u64, result: Result<ChatReply, ChatError>) {
        let pending = match self.pending.take() {
            Some(pending) if pending.ticket == ticket => pending,
            other => {
                self.pending = other;
                tracing::debug!(session_id = %self.id, ticket, "Discarding stale reply");
                self.emit(DomainEvent::StaleReplyDiscarded {
                    session_id: self.id,
                    ticket,
                    timestamp: Utc::now(),
                });
                return;
            }
        };
        let elapsed_ms = pending.started.elapsed().as_millis() as u64;

        match result {
            Ok(reply) => {
                let mut draft = MessageDraft::assistant(reply.response, reply.emotion);
                if let Some(at) = reply.timestamp {
                    draft = draft.at(at);
                }
                let message = self.append(draft);
                self.state = SessionState::Idle;
                tracing::info!(session_id = %self.id, ticket, elapsed_ms, "Reply received");
                self.emit(DomainEvent::ReplyReceived {
                    session_id: self.id,
                    ticket,
                    elapsed_ms,
                    timestamp: Utc::now(),
                });

                let was_speaking = self.output.is_speaking();
                let inbox = self.inbox_tx.clone();
                let started = self.output.speak_with(
                    &message.content,
                    &self.voice_params,
                    self.voice.enabled,
                    move |err| {
                        let _ = inbox.send(SessionEvent::SpeechFailed(err));
                    },
                );
                if started {
                    self.emit(DomainEvent::SpeechStarted {
                        session_id: self.id,
                        message_id: message.id,
                        timestamp: Utc::now(),
                    });
                } else if was_speaking && !self.output.is_speaking() {
                    self.emit(DomainEvent::SpeechStopped {
                        session_id: self.id,
                        timestamp: Utc::now(),
                    });
                }
            }
            Err(err) => {
                tracing::warn!(
                    session_id = %self.id,
                    ticket,
                    elapsed_ms,
                    error = %err,
                    "Request failed"
                );
                self.state = SessionState::Error(ErrorReason::from(&err));
                self.emit(DomainEvent::SubmissionFailed {
                    session_id: self.id,
                    ticket,
                    reason: err.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
    }

    /// Emit `ListeningStopped` for a capture that was announced as started.
    fn announce_listening_stopped(&mut self) {
        if !self.capture_announced {
            return;
        }
        self.capture_announced = false;
        self.emit(DomainEvent::ListeningStopped {
            session_id: self.id,
            timestamp: Utc::now(),
        });
    }

    /// Record a voice problem. An outstanding request keeps the session in
    /// `AwaitingResponse`; otherwise the session moves to `Error`.
    fn surface(&mut self, reason: ErrorReason) {
        tracing::warn!(session_id = %self.id, reason = ?reason, "Voice problem");
        if !self.state.is_awaiting() {
            self.state = SessionState::Error(reason.clone());
        }
        self.notice = Some(reason);
    }

    fn append(&mut self, draft: MessageDraft) -> Message {
        let message = self.store.append(draft);
        self.emit(DomainEvent::MessageAppended {
            session_id: self.id,
            message_id: message.id,
            role: message.role,
            timestamp: Utc::now(),
        });
        message
    }

    fn emit(&self, event: DomainEvent) {
        tracing::trace!(event = event.event_name(), "Domain event");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.close();
    }
}

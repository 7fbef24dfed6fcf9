//! Scripted chat backend for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::{ChatBackend, ChatReply, ChatRequest};
use crate::error::ChatError;

/// What a scripted request does.
#[derive(Debug)]
pub enum ScriptedReply {
    Reply(ChatReply),
    /// Answer after a delay.
    Delayed(Duration, ChatReply),
    Fail(ChatError),
    /// Never answer.
    Hang,
}

/// [`ChatBackend`] that replays a script and records every request.
///
/// When the script runs out it echoes the message back with a "caring" tag.
#[derive(Debug, Default)]
pub struct ScriptedChatBackend {
    script: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChatBackend {
    pub fn new(script: Vec<ScriptedReply>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Backend that answers every request by echoing it.
    pub fn echo() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: ScriptedReply) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatBackend for ScriptedChatBackend {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());

        match next {
            Some(ScriptedReply::Reply(reply)) => Ok(reply),
            Some(ScriptedReply::Delayed(delay, reply)) => {
                tokio::time::sleep(delay).await;
                Ok(reply)
            }
            Some(ScriptedReply::Fail(err)) => Err(err),
            Some(ScriptedReply::Hang) => std::future::pending().await,
            None => Ok(ChatReply::new(format!("I hear you: {}", request.message))
                .with_emotion("caring")),
        }
    }
}

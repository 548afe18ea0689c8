//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns a conversation,
//! drives one transport call per accepted submission, and fans events out to
//! observers.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::chat::config::ChatConfig;
use crate::client::Transport;
use crate::conversation::{
    ControllerState, Conversation, ConversationObserver, ConversationSnapshot,
};
use crate::error::FailureKind;
use crate::observability::{
    CONVERSATION_FAILURES, CONVERSATION_REJECTED, CONVERSATION_SUBMISSIONS,
    CONVERSATION_TURN_DURATION,
};
use crate::types::{Model, Turn};

/// Outcome of [`ChatSession::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The input was empty or a request was already in flight.  Nothing changed.
    Rejected,
    /// The server answered; this is the appended bot turn.
    Answered(Turn),
    /// The request failed; this is the synthesized bot turn.
    Failed {
        /// The appended bot turn.
        turn: Turn,
        /// How the failure was classified.
        kind: FailureKind,
    },
}

/// A chat session that manages conversation state and transport calls.
///
/// The conversation lives behind a mutex that is never held across the
/// transport call, so a second `submit` issued while one is outstanding sees
/// the pending flag and is rejected.
pub struct ChatSession<T: Transport> {
    transport: T,
    conversation: Mutex<Conversation>,
    observers: Mutex<Vec<Box<dyn ConversationObserver>>>,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The model subsequent submissions target.
    pub model: Model,
    /// The number of turns in the transcript.
    pub turn_count: usize,
    /// Whether a request is in flight.
    pub pending: bool,
    /// Total number of requests dispatched.
    pub total_requests: u64,
    /// Number of requests that failed.
    pub failed_requests: u64,
    /// The stored continuation token, if any.
    pub continuation_token: Option<String>,
    /// Classification of the last failure, if not yet cleared.
    pub last_error: Option<FailureKind>,
}

impl<T: Transport> ChatSession<T> {
    /// Creates a new chat session with the given transport and configuration.
    pub fn new(transport: T, config: &ChatConfig) -> Self {
        Self::with_conversation(
            transport,
            Conversation::new(config.greeting.clone(), config.model),
        )
    }

    /// Creates a new chat session around an existing conversation.
    pub fn with_conversation(transport: T, conversation: Conversation) -> Self {
        Self {
            transport,
            conversation: Mutex::new(conversation),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Subscribes `observer` to all subsequent events.
    pub fn add_observer(&self, observer: impl ConversationObserver + 'static) {
        lock(&self.observers).push(Box::new(observer));
    }

    /// Submits user input and waits for the turn to resolve.
    ///
    /// Failures never escape: they become a bot turn and a recorded
    /// classification, reported as [`Submission::Failed`].
    pub async fn submit(&self, text: &str) -> Submission {
        let request = lock(&self.conversation).submit(text);
        self.dispatch();
        let Some(request) = request else {
            CONVERSATION_REJECTED.click();
            return Submission::Rejected;
        };
        CONVERSATION_SUBMISSIONS.click();
        tracing::info!(model = %request.model, "submitting turn");

        let start = Instant::now();
        let result = self.transport.ask(&request).await;
        CONVERSATION_TURN_DURATION.add(start.elapsed().as_secs_f64());

        let outcome = {
            let mut conversation = lock(&self.conversation);
            match result {
                Ok(response) => conversation
                    .on_success(response)
                    .cloned()
                    .map(Submission::Answered),
                Err(err) => {
                    CONVERSATION_FAILURES.click();
                    let kind = err.kind();
                    tracing::info!(error = %err, kind = %kind, "turn failed");
                    conversation
                        .on_failure(&err)
                        .cloned()
                        .map(|turn| Submission::Failed { turn, kind })
                }
            }
        };
        self.dispatch();
        outcome.unwrap_or(Submission::Rejected)
    }

    /// Changes the model used by subsequent submissions.
    pub fn select_model(&self, model: Model) {
        lock(&self.conversation).select_model(model);
        self.dispatch();
    }

    /// The model subsequent submissions target.
    pub fn selected_model(&self) -> Model {
        lock(&self.conversation).selected_model()
    }

    /// Whether a request is in flight.
    pub fn is_pending(&self) -> bool {
        lock(&self.conversation).is_pending()
    }

    /// Current controller state.
    pub fn state(&self) -> ControllerState {
        lock(&self.conversation).state()
    }

    /// A copy of the transcript.
    pub fn turns(&self) -> Vec<Turn> {
        lock(&self.conversation).turns().to_vec()
    }

    /// A copy of the full conversation state.
    pub fn snapshot(&self) -> ConversationSnapshot {
        lock(&self.conversation).snapshot()
    }

    /// The transport this session sends through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        let conversation = lock(&self.conversation);
        SessionStats {
            model: conversation.selected_model(),
            turn_count: conversation.turns().len(),
            pending: conversation.is_pending(),
            total_requests: conversation.request_count(),
            failed_requests: conversation.failure_count(),
            continuation_token: conversation.continuation_token().map(String::from),
            last_error: conversation.last_error().cloned(),
        }
    }

    // Observers are locked before the events are drained so that two
    // dispatches cannot deliver events out of order.
    fn dispatch(&self) {
        let mut observers = lock(&self.observers);
        let events = lock(&self.conversation).take_events();
        for event in &events {
            for observer in observers.iter_mut() {
                observer.notify(event);
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

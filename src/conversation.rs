//! The conversation controller.
//!
//! [`Conversation`] owns the transcript and the request bookkeeping of one chat
//! session.  It is a plain state machine: it never performs I/O and never
//! touches the terminal.  Callers submit text, receive the [`AskRequest`] to
//! dispatch, and report back with [`Conversation::on_success`] or
//! [`Conversation::on_failure`].  Every mutation queues a [`ConversationEvent`]
//! that the presentation layer consumes via [`Conversation::take_events`].
//!
//! ```
//! use askchat::{AskResponse, Conversation, ControllerState, Model};
//!
//! let mut conversation = Conversation::new("Hello!", Model::Gpt41);
//! let request = conversation.submit("  hello  ").unwrap();
//! assert_eq!(request.user_query, "hello");
//! assert_eq!(conversation.state(), ControllerState::Awaiting);
//! assert!(conversation.submit("again").is_none());
//!
//! conversation.on_success(AskResponse::new("hi").with_previous_response_id("abc"));
//! assert_eq!(conversation.state(), ControllerState::Idle);
//! assert_eq!(conversation.continuation_token(), Some("abc"));
//! assert_eq!(conversation.turns().len(), 3);
//! ```

use crate::error::{Error, FailureKind};
use crate::types::{AskRequest, AskResponse, Model, Turn, TurnLog};

/// Greeting seeded into every new conversation unless configured otherwise.
pub const DEFAULT_GREETING: &str = "Hello! Pick a model and start chatting.";

/// Observable state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No request in flight and no error showing.
    Idle,
    /// A request is in flight; submissions are rejected.
    Awaiting,
    /// No request in flight; the last request failed.
    IdleWithError,
}

/// A change to the conversation, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationEvent {
    /// A turn was appended to the transcript.
    TurnAppended(Turn),
    /// The in-flight flag changed.
    PendingChanged(bool),
    /// A failed request was classified.
    ErrorRecorded(FailureKind),
    /// A previously recorded error was cleared by a new submission.
    ErrorCleared,
    /// The selected model changed.
    ModelSelected(Model),
}

/// Subscriber to conversation events.
///
/// Presentation side effects (redrawing, the typing indicator, returning to
/// the prompt) live in observers, never in the controller.
pub trait ConversationObserver: Send {
    /// Called once per event, in order.
    fn notify(&mut self, event: &ConversationEvent);
}

/// Point-in-time copy of the conversation state.
#[derive(Debug, Clone)]
pub struct ConversationSnapshot {
    /// All turns in order.
    pub turns: Vec<Turn>,
    /// Whether a request is in flight.
    pub pending: bool,
    /// Classification of the last failure, if it has not been cleared.
    pub last_error: Option<FailureKind>,
    /// Continuation token from the last successful response that carried one.
    pub continuation_token: Option<String>,
    /// The model subsequent submissions target.
    pub selected_model: Model,
}

/// Conversation state for one session.
#[derive(Debug)]
pub struct Conversation {
    turns: TurnLog,
    pending: bool,
    last_error: Option<FailureKind>,
    continuation_token: Option<String>,
    selected_model: Model,
    requests: u64,
    failures: u64,
    events: Vec<ConversationEvent>,
}

impl Conversation {
    /// Creates a conversation seeded with one bot greeting turn.
    pub fn new(greeting: impl Into<String>, model: Model) -> Self {
        let mut turns = TurnLog::new();
        turns.push(Turn::bot(greeting));
        Self {
            turns,
            pending: false,
            last_error: None,
            continuation_token: None,
            selected_model: model,
            requests: 0,
            failures: 0,
            events: Vec::new(),
        }
    }

    /// Accepts user input and returns the request to dispatch.
    ///
    /// Returns `None` without changing anything when the trimmed text is empty
    /// or a request is already in flight.
    pub fn submit(&mut self, text: &str) -> Option<AskRequest> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if self.pending {
            tracing::debug!("submission rejected: a request is already in flight");
            return None;
        }

        let turn = self.turns.push(Turn::user(text)).clone();
        self.events.push(ConversationEvent::TurnAppended(turn));
        self.pending = true;
        self.events.push(ConversationEvent::PendingChanged(true));
        if self.last_error.take().is_some() {
            self.events.push(ConversationEvent::ErrorCleared);
        }
        self.requests += 1;

        Some(
            AskRequest::new(text, self.selected_model)
                .with_previous_response_id(self.continuation_token.clone()),
        )
    }

    /// Records a successful response and returns the appended bot turn.
    ///
    /// Ignored when no request is in flight.
    pub fn on_success(&mut self, response: AskResponse) -> Option<&Turn> {
        if !self.pending {
            tracing::warn!("response arrived with no request in flight; dropping it");
            return None;
        }
        let AskResponse {
            response_text,
            previous_response_id,
        } = response;
        if let Some(token) = previous_response_id {
            self.continuation_token = Some(token);
        }
        self.finish(Turn::bot(response_text))
    }

    /// Records a failed request and returns the synthesized bot turn.
    ///
    /// Ignored when no request is in flight.
    pub fn on_failure(&mut self, error: &Error) -> Option<&Turn> {
        if !self.pending {
            tracing::warn!(error = %error, "failure arrived with no request in flight; dropping it");
            return None;
        }
        let kind = error.kind();
        let turn = Turn::bot(kind.fallback_message());
        self.failures += 1;
        self.last_error = Some(kind.clone());
        self.events.push(ConversationEvent::ErrorRecorded(kind));
        self.finish(turn)
    }

    fn finish(&mut self, turn: Turn) -> Option<&Turn> {
        let turn = self.turns.push(turn).clone();
        self.events.push(ConversationEvent::TurnAppended(turn));
        self.pending = false;
        self.events.push(ConversationEvent::PendingChanged(false));
        self.turns.last()
    }

    /// Changes the model used by subsequent submissions.
    pub fn select_model(&mut self, model: Model) {
        if self.selected_model != model {
            self.selected_model = model;
            self.events.push(ConversationEvent::ModelSelected(model));
        }
    }

    /// Drains the events queued since the last call.
    pub fn take_events(&mut self) -> Vec<ConversationEvent> {
        std::mem::take(&mut self.events)
    }

    /// Current controller state.
    pub fn state(&self) -> ControllerState {
        if self.pending {
            ControllerState::Awaiting
        } else if self.last_error.is_some() {
            ControllerState::IdleWithError
        } else {
            ControllerState::Idle
        }
    }

    /// The transcript in order.
    pub fn turns(&self) -> &[Turn] {
        self.turns.as_slice()
    }

    /// Whether a request is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Classification of the last failure, if not yet cleared.
    pub fn last_error(&self) -> Option<&FailureKind> {
        self.last_error.as_ref()
    }

    /// The stored continuation token.
    pub fn continuation_token(&self) -> Option<&str> {
        self.continuation_token.as_deref()
    }

    /// The model subsequent submissions target.
    pub fn selected_model(&self) -> Model {
        self.selected_model
    }

    /// Number of requests dispatched.
    pub fn request_count(&self) -> u64 {
        self.requests
    }

    /// Number of requests that failed.
    pub fn failure_count(&self) -> u64 {
        self.failures
    }

    /// Copies out the current state.
    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            turns: self.turns.as_slice().to_vec(),
            pending: self.pending,
            last_error: self.last_error.clone(),
            continuation_token: self.continuation_token.clone(),
            selected_model: self.selected_model,
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_GREETING, Model::default())
    }
}

// Public modules
pub mod chat;
pub mod client;
pub mod conversation;
pub mod error;
pub mod markdown;
pub mod observability;
pub mod render;
pub mod types;

// Re-exports
pub use client::{AskClient, Transport};
pub use conversation::{
    ControllerState, Conversation, ConversationEvent, ConversationObserver, ConversationSnapshot,
};
pub use error::{Error, FailureKind, Result};
pub use observability::register_biometrics;
pub use types::*;

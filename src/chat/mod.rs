//! Interactive chat application module.
//!
//! This module provides a REPL chat interface built on top of the askchat
//! conversation controller and transport. It supports:
//!
//! - Markdown rendering of bot turns, including GFM tables
//! - A typing indicator while a request is in flight
//! - Slash commands for picking a model and inspecting the session
//! - Configurable endpoint, model, greeting and width
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: async session driving the conversation and transport
//! - [`commands`]: slash command parsing

mod commands;
mod config;
mod session;

pub use crate::render::{PlainTextRenderer, RenderObserver, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, ENDPOINT_ENV_VAR};
pub use session::{ChatSession, SessionStats, Submission};

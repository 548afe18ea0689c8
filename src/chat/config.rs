//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::env;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::client::{DEFAULT_ENDPOINT, parse_endpoint};
use crate::conversation::DEFAULT_GREETING;
use crate::error::{Error, Result};
use crate::render::DEFAULT_WIDTH;
use crate::types::Model;

/// Environment variable consulted when `--endpoint` is not given.
pub const ENDPOINT_ENV_VAR: &str = "ASKCHAT_ENDPOINT";

/// Narrowest transcript the renderer will lay out.
const MIN_WIDTH: usize = 20;

/// Command-line arguments for the askchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the inference server.
    #[arrrg(
        optional,
        "Server base URL (default: $ASKCHAT_ENDPOINT or http://127.0.0.1:8000)",
        "URL"
    )]
    pub endpoint: Option<String>,

    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: gpt-4.1)", "MODEL")]
    pub model: Option<String>,

    /// Greeting shown as the first bot turn.
    #[arrrg(optional, "Greeting shown when the session starts", "TEXT")]
    pub greeting: Option<String>,

    /// Transcript width in columns.
    #[arrrg(optional, "Transcript width in columns (default: 80)", "COLS")]
    pub width: Option<u32>,

    /// Client-side request timeout.
    #[arrrg(optional, "Request timeout in seconds (default: wait indefinitely)", "SECS")]
    pub timeout: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments and the environment with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Base URL of the inference server.
    pub endpoint: String,

    /// The model selected when the session starts.
    pub model: Model,

    /// Text of the seeded bot greeting.
    pub greeting: String,

    /// Transcript width in columns.
    pub width: usize,

    /// Client-side request timeout; `None` waits until the transport resolves.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Endpoint: http://127.0.0.1:8000
    /// - Model: gpt-4.1
    /// - Width: 80 columns
    /// - Timeout: none
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: Model::default(),
            greeting: DEFAULT_GREETING.to_string(),
            width: DEFAULT_WIDTH,
            timeout: None,
            use_color: true,
        }
    }

    /// Resolves arguments, consulting `env_endpoint` when no endpoint flag was given.
    pub fn from_args(args: ChatArgs, env_endpoint: Option<String>) -> Result<Self> {
        let endpoint = args
            .endpoint
            .or(env_endpoint.filter(|e| !e.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        parse_endpoint(&endpoint)?;

        let model = match args.model {
            Some(name) => name.parse()?,
            None => Model::default(),
        };

        let width = match args.width {
            Some(width) if (width as usize) < MIN_WIDTH => {
                return Err(Error::validation(
                    format!("width must be at least {MIN_WIDTH} columns"),
                    Some("width".to_string()),
                ));
            }
            Some(width) => width as usize,
            None => DEFAULT_WIDTH,
        };

        let timeout = match args.timeout {
            Some(0) => {
                return Err(Error::validation(
                    "timeout must be positive",
                    Some("timeout".to_string()),
                ));
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        Ok(ChatConfig {
            endpoint,
            model,
            greeting: args.greeting.unwrap_or_else(|| DEFAULT_GREETING.to_string()),
            width,
            timeout,
            use_color: !args.no_color,
        })
    }

    /// Sets the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the greeting.
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Sets the transcript width.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(MIN_WIDTH);
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = Error;

    fn try_from(args: ChatArgs) -> Result<Self> {
        ChatConfig::from_args(args, env::var(ENDPOINT_ENV_VAR).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.endpoint, "http://127.0.0.1:8000");
        assert_eq!(config.model, Model::Gpt41);
        assert_eq!(config.greeting, DEFAULT_GREETING);
        assert_eq!(config.width, 80);
        assert!(config.timeout.is_none());
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::from_args(ChatArgs::default(), None).unwrap();
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            endpoint: Some("http://192.168.0.10:9000".to_string()),
            model: Some("qwen2.5".to_string()),
            greeting: Some("Welcome".to_string()),
            width: Some(100),
            timeout: Some(30),
            no_color: true,
        };
        let config = ChatConfig::from_args(args, Some("http://ignored".to_string())).unwrap();
        assert_eq!(config.endpoint, "http://192.168.0.10:9000");
        assert_eq!(config.model, Model::Qwen25);
        assert_eq!(config.greeting, "Welcome");
        assert_eq!(config.width, 100);
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert!(!config.use_color);
    }

    #[test]
    fn endpoint_from_environment() {
        let config =
            ChatConfig::from_args(ChatArgs::default(), Some("https://llm.internal".to_string()))
                .unwrap();
        assert_eq!(config.endpoint, "https://llm.internal");

        let config = ChatConfig::from_args(ChatArgs::default(), Some("  ".to_string())).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn invalid_args() {
        let args = ChatArgs {
            model: Some("gpt-5".to_string()),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::from_args(args, None).unwrap_err().is_validation());

        let args = ChatArgs {
            endpoint: Some("localhost:8000".to_string()),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::from_args(args, None).is_err());

        let args = ChatArgs {
            width: Some(5),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::from_args(args, None).unwrap_err().is_validation());

        let args = ChatArgs {
            timeout: Some(0),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::from_args(args, None).unwrap_err().is_validation());
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_endpoint("http://example.com")
            .with_model(Model::GptO4)
            .with_greeting("hey")
            .with_width(10)
            .with_timeout(Some(Duration::from_secs(5)))
            .without_color();
        assert_eq!(config.endpoint, "http://example.com");
        assert_eq!(config.model, Model::GptO4);
        assert_eq!(config.greeting, "hey");
        assert_eq!(config.width, MIN_WIDTH);
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert!(!config.use_color);
    }
}

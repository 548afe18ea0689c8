use serde::{Deserialize, Serialize};

use crate::types::Model;

/// Body of a `POST {endpoint}/ask?model=...` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    /// The trimmed user input.
    pub user_query: String,

    /// The model the request targets.  Also sent as the `model` query parameter.
    pub model: Model,

    /// Continuation token from the previous successful response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
}

impl AskRequest {
    /// Creates a request without a continuation token.
    pub fn new(user_query: impl Into<String>, model: Model) -> Self {
        Self {
            user_query: user_query.into(),
            model,
            previous_response_id: None,
        }
    }

    /// Sets the continuation token.
    pub fn with_previous_response_id(mut self, previous_response_id: Option<String>) -> Self {
        self.previous_response_id = previous_response_id;
        self
    }
}

/// Successful response body from the `/ask` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    /// Markdown text of the answer.
    pub response_text: String,

    /// Token the server uses to resume this conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
}

impl AskResponse {
    /// Creates a response without a continuation token.
    pub fn new(response_text: impl Into<String>) -> Self {
        Self {
            response_text: response_text.into(),
            previous_response_id: None,
        }
    }

    /// Sets the continuation token.
    pub fn with_previous_response_id(mut self, previous_response_id: impl Into<String>) -> Self {
        self.previous_response_id = Some(previous_response_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_omits_absent_token() {
        let request = AskRequest::new("hello", Model::Gpt41);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"user_query": "hello", "model": "gpt-4.1"}));
    }

    #[test]
    fn request_includes_token() {
        let request = AskRequest::new("again", Model::Qwen25)
            .with_previous_response_id(Some("abc".to_string()));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"user_query": "again", "model": "Qwen2.5", "previous_response_id": "abc"})
        );
    }

    #[test]
    fn response_token_is_optional() {
        let response: AskResponse = serde_json::from_str(r#"{"response_text": "hi"}"#).unwrap();
        assert_eq!(response, AskResponse::new("hi"));

        let response: AskResponse = serde_json::from_str(
            r#"{"response_text": "hi", "previous_response_id": "abc", "usage": {}}"#,
        )
        .unwrap();
        assert_eq!(response.previous_response_id.as_deref(), Some("abc"));
    }

    #[test]
    fn response_requires_text() {
        assert!(serde_json::from_str::<AskResponse>(r#"{"message": "hi"}"#).is_err());
    }
}

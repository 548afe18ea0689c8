use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The models the inference endpoint routes to.
///
/// The set is fixed; the first entry is the default selection for a new
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    /// GPT-4.1
    #[serde(rename = "gpt-4.1")]
    Gpt41,

    /// GPT-4.1 nano
    #[serde(rename = "gpt-4.1-nano")]
    Gpt41Nano,

    /// GPT-4.1 mini
    #[serde(rename = "gpt-4.1-mini")]
    Gpt41Mini,

    /// GPT-o4
    #[serde(rename = "gpt-o4")]
    GptO4,

    /// Qwen 2.5
    #[serde(rename = "Qwen2.5")]
    Qwen25,
}

impl Model {
    /// Every model, in picker order.
    pub const ALL: [Model; 5] = [
        Model::Gpt41,
        Model::Gpt41Nano,
        Model::Gpt41Mini,
        Model::GptO4,
        Model::Qwen25,
    ];

    /// The identifier sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Gpt41 => "gpt-4.1",
            Model::Gpt41Nano => "gpt-4.1-nano",
            Model::Gpt41Mini => "gpt-4.1-mini",
            Model::GptO4 => "gpt-o4",
            Model::Qwen25 => "Qwen2.5",
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::ALL[0]
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Model {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Model::ALL
            .into_iter()
            .find(|model| model.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known = Model::ALL
                    .iter()
                    .map(Model::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                Error::validation(
                    format!("unknown model {s:?} (expected one of: {known})"),
                    Some("model".to_string()),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_first() {
        assert_eq!(Model::default(), Model::Gpt41);
    }

    #[test]
    fn serialization() {
        let json = serde_json::to_string(&Model::Qwen25).unwrap();
        assert_eq!(json, r#""Qwen2.5""#);
        let model: Model = serde_json::from_str(r#""gpt-4.1-mini""#).unwrap();
        assert_eq!(model, Model::Gpt41Mini);
    }

    #[test]
    fn parse() {
        assert_eq!("gpt-o4".parse::<Model>().unwrap(), Model::GptO4);
        assert_eq!(" qwen2.5 ".parse::<Model>().unwrap(), Model::Qwen25);
        let err = "claude".parse::<Model>().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("gpt-4.1-nano"));
    }

    #[test]
    fn display_matches_wire_name() {
        for model in Model::ALL {
            let json = serde_json::to_string(&model).unwrap();
            assert_eq!(json, format!("\"{model}\""));
        }
    }
}

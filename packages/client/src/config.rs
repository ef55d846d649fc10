//! Client configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Query parameter of the loader locator that carries the session id
    pub session_param: String,

    /// Event kinds whose reports include the live value of the control
    pub value_events: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session_param: "session".to_string(),
            value_events: vec!["input".to_string(), "change".to_string()],
        }
    }
}

impl ClientConfig {
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }
}

//! # Channel
//!
//! The persistent bidirectional connection to the authority, and the rules
//! for deriving its address from the page.
//!
//! ```text
//! loader:  https://example.com/_tether.js?session=3f2a
//! page:    https://example.com/inbox
//! channel: wss://example.com/3f2a
//! ```

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    #[error("Channel is closed")]
    Closed,

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Close failed: {0}")]
    Close(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Unsupported page scheme: {0}")]
    UnsupportedScheme(String),

    #[error("No `{0}` parameter in loader locator")]
    MissingSession(String),
}

/// Outbound half of the connection; inbound frames are pushed into the session
pub trait Channel {
    fn send(&mut self, message: &str) -> Result<(), ChannelError>;

    fn close(&mut self) -> Result<(), ChannelError>;
}

/// Session id carried by the loader's own locator
pub fn session_id(locator: &str, param: &str) -> Option<String> {
    let pattern = Regex::new(&format!(r"[?&]{}=([^&#]*)", regex::escape(param))).ok()?;
    let id = pattern.captures(locator)?.get(1)?.as_str();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Channel address for a page served over `scheme` from `host`
pub fn channel_url(scheme: &str, host: &str, session_id: &str) -> Result<String, ChannelError> {
    let channel_scheme = match scheme.trim_end_matches(':') {
        "http" => "ws",
        "https" => "wss",
        other => return Err(ChannelError::UnsupportedScheme(other.to_string())),
    };
    Ok(format!("{}://{}/{}", channel_scheme, host, session_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_from_query() {
        assert_eq!(
            session_id("http://localhost:8000/_tether.js?session=abc-123", "session").as_deref(),
            Some("abc-123")
        );
        assert_eq!(
            session_id("/_tether.js?v=2&session=abc&x=1", "session").as_deref(),
            Some("abc")
        );
        assert_eq!(session_id("/_tether.js?session=abc#frag", "session").as_deref(), Some("abc"));
    }

    #[test]
    fn test_session_id_missing() {
        assert_eq!(session_id("/_tether.js", "session"), None);
        assert_eq!(session_id("/_tether.js?session=", "session"), None);
        assert_eq!(session_id("/_tether.js?mysession=abc", "session"), None);
    }

    #[test]
    fn test_custom_param() {
        assert_eq!(session_id("/app.js?sid=42", "sid").as_deref(), Some("42"));
    }

    #[test]
    fn test_channel_url_matches_page_scheme() {
        assert_eq!(
            channel_url("http:", "localhost:8000", "abc").unwrap(),
            "ws://localhost:8000/abc"
        );
        assert_eq!(
            channel_url("https", "example.com", "abc").unwrap(),
            "wss://example.com/abc"
        );
        assert_eq!(
            channel_url("file:", "", "abc"),
            Err(ChannelError::UnsupportedScheme("file".to_string()))
        );
    }
}

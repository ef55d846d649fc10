//! # Navigation Bridge
//!
//! Applies authority-driven URL changes to session history without a
//! document load, and turns user-driven back/forward navigation into
//! `pop_url` reports.

use tether_protocol::Report;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("History error: {0}")]
pub struct HistoryError(pub String);

/// Browser session history
pub trait History {
    /// Append an entry; no document load
    fn push(&mut self, url: &str) -> Result<(), HistoryError>;

    /// Rewrite the current entry; no document load
    fn replace(&mut self, url: &str) -> Result<(), HistoryError>;

    /// Current location without scheme or host
    fn location(&self) -> Result<String, HistoryError>;
}

pub struct NavigationBridge<H> {
    history: H,
}

impl<H: History> NavigationBridge<H> {
    pub fn new(history: H) -> Self {
        Self { history }
    }

    pub fn push_url(&mut self, url: &str) -> Result<(), HistoryError> {
        debug!(url, "Pushing history entry");
        self.history.push(url)
    }

    pub fn replace_url(&mut self, url: &str) -> Result<(), HistoryError> {
        debug!(url, "Replacing history entry");
        self.history.replace(url)
    }

    /// Report for a back/forward navigation that already happened
    pub fn pop_state(&self) -> Result<Report, HistoryError> {
        let location = self.history.location()?;
        debug!(location = %location, "History popped");
        Ok(Report::pop_url(location))
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHistory;

    #[test]
    fn test_push_and_replace() {
        let mut bridge = NavigationBridge::new(MemoryHistory::new("/"));
        bridge.push_url("/a").unwrap();
        bridge.replace_url("/b").unwrap();

        assert_eq!(bridge.history().entries(), &["/", "/b"]);
    }

    #[test]
    fn test_pop_state_reports_current_location() {
        let mut bridge = NavigationBridge::new(MemoryHistory::new("/"));
        bridge.push_url("/next?page=2").unwrap();
        assert!(bridge.history_mut().back());

        assert_eq!(bridge.pop_state().unwrap(), Report::pop_url("/"));
        assert!(bridge.history_mut().forward());
        assert_eq!(bridge.pop_state().unwrap(), Report::pop_url("/next?page=2"));
    }
}

use crate::dom::describe;
use tether_client::{History, HistoryError};
use wasm_bindgen::JsValue;
use web_sys::Location;

/// Session history of the window, updated without reloading the page
pub struct WebHistory {
    history: web_sys::History,
    location: Location,
}

impl WebHistory {
    pub fn new(history: web_sys::History, location: Location) -> Self {
        Self { history, location }
    }
}

fn failed(value: JsValue) -> HistoryError {
    HistoryError(describe(&value))
}

impl History for WebHistory {
    fn push(&mut self, url: &str) -> Result<(), HistoryError> {
        self.history
            .push_state_with_url(&JsValue::NULL, "", Some(url))
            .map_err(failed)
    }

    fn replace(&mut self, url: &str) -> Result<(), HistoryError> {
        self.history
            .replace_state_with_url(&JsValue::NULL, "", Some(url))
            .map_err(failed)
    }

    /// Path, query and fragment; never scheme or host
    fn location(&self) -> Result<String, HistoryError> {
        let pathname = self.location.pathname().map_err(failed)?;
        let search = self.location.search().map_err(failed)?;
        let hash = self.location.hash().map_err(failed)?;
        Ok(format!("{}{}{}", pathname, search, hash))
    }
}

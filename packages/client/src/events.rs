//! # Event Bridge
//!
//! Turns an interaction on a live node into an outbound report addressed by
//! the node's path.
//!
//! Suppression flags belong to the listener registration, never to the
//! authority at dispatch time. An event whose node can no longer be reached
//! from the root (a handler firing after removal) is dropped, not reported.

use crate::config::ClientConfig;
use crate::dom::{Dom, DomEvent};
use crate::mirror::Mirror;
use crate::patch::VALUE_KEY;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tether_protocol::Report;
use tracing::{debug, warn};

/// Per-listener handling flags, fixed when the listener is registered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerOptions {
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

impl ListenerOptions {
    pub fn default_prevented() -> Self {
        Self {
            prevent_default: true,
            stop_propagation: false,
        }
    }
}

pub struct EventBridge {
    value_events: HashSet<String>,
}

impl EventBridge {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            value_events: config.value_events.iter().cloned().collect(),
        }
    }

    /// Build the report for one event, or `None` if its node is unreachable
    pub fn handle<D, E>(
        &self,
        dom: &D,
        mirror: &Mirror<D::Node>,
        event: &E,
        options: ListenerOptions,
    ) -> Option<Report>
    where
        D: Dom,
        E: DomEvent<D::Node>,
    {
        if options.prevent_default {
            event.prevent_default();
        }
        if options.stop_propagation {
            event.stop_propagation();
        }

        let kind = event.kind();
        let Some(target) = event.current_target() else {
            warn!(kind = %kind, "Dropping event without a current target");
            return None;
        };

        let path = match mirror.locate(dom, &target) {
            Ok(path) => path,
            Err(e) => {
                warn!(kind = %kind, error = %e, "Dropping event from unreachable node");
                return None;
            }
        };

        let mut details = Map::new();
        if self.value_events.contains(&kind) {
            // The originating control, which may sit below the listener
            let value = event
                .target()
                .and_then(|origin| dom.value(&origin))
                .or_else(|| dom.value(&target))
                .unwrap_or_default();
            details.insert(VALUE_KEY.to_string(), Value::String(value));
        }

        debug!(kind = %kind, path = %path, "Reporting event");
        Some(Report::Event {
            kind,
            path,
            details,
        })
    }
}

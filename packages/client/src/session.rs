//! # Session
//!
//! One live synchronization context: the document backend, its mirror, the
//! navigation bridge and the channel, created once at startup and torn down
//! by closing the channel. Nothing here is global, so several sessions can
//! run side by side.
//!
//! All work happens synchronously inside one call: a batch is fully applied
//! (or aborted) before `receive` returns, so no event report can observe a
//! half-applied instruction.

use crate::channel::{Channel, ChannelError};
use crate::config::ClientConfig;
use crate::dom::{Dom, DomEvent};
use crate::errors::{BatchError, SessionError};
use crate::events::{EventBridge, ListenerOptions};
use crate::mirror::Mirror;
use crate::navigation::{History, NavigationBridge};
use crate::patch::{BatchSummary, PatchApplier};
use tether_protocol::Report;
use tracing::{info, warn};

/// Called when a batch aborts; the place to ask the authority for a full
/// resynchronization
pub type ResyncHook = Box<dyn FnMut(&BatchError)>;

pub struct Session<D: Dom, H: History, C: Channel> {
    id: String,
    config: ClientConfig,
    dom: D,
    mirror: Mirror<D::Node>,
    navigation: NavigationBridge<H>,
    events: EventBridge,
    channel: C,
    resync: Option<ResyncHook>,
    batches_applied: u64,
}

impl<D: Dom, H: History, C: Channel> Session<D, H, C> {
    /// Snapshot the document and take ownership of the channel
    pub fn new(id: impl Into<String>, dom: D, history: H, channel: C, config: ClientConfig) -> Self {
        let id = id.into();
        let mirror = Mirror::snapshot(&dom);
        info!(session = %id, nodes = mirror.root().size(), "Session opened");

        Self {
            id,
            events: EventBridge::new(&config),
            config,
            dom,
            mirror,
            navigation: NavigationBridge::new(history),
            channel,
            resync: None,
            batches_applied: 0,
        }
    }

    pub fn set_resync_hook(&mut self, hook: impl FnMut(&BatchError) + 'static) {
        self.resync = Some(Box::new(hook));
    }

    /// Apply one inbound message
    pub fn receive(&mut self, message: &str) -> Result<BatchSummary, BatchError> {
        let result =
            PatchApplier::new(&mut self.dom, &mut self.mirror, &mut self.navigation).apply_batch(message);

        match result {
            Ok(summary) => {
                self.batches_applied += 1;
                info!(
                    session = %self.id,
                    batch = self.batches_applied,
                    instructions = summary.applied,
                    "Batch applied"
                );
                Ok(summary)
            }
            Err(err) => {
                warn!(
                    session = %self.id,
                    applied = err.applied,
                    error = %err.cause,
                    "Batch aborted"
                );
                if let Some(hook) = self.resync.as_mut() {
                    hook(&err);
                }
                Err(err)
            }
        }
    }

    /// Report an interaction. Returns whether a report was sent.
    pub fn dispatch_event<E: DomEvent<D::Node>>(
        &mut self,
        event: &E,
        options: ListenerOptions,
    ) -> Result<bool, SessionError> {
        let Some(report) = self.events.handle(&self.dom, &self.mirror, event, options) else {
            return Ok(false);
        };
        self.send(&report)?;
        Ok(true)
    }

    /// Report a back/forward navigation that already happened
    pub fn pop_state(&mut self) -> Result<(), SessionError> {
        let report = self.navigation.pop_state()?;
        self.send(&report)?;
        Ok(())
    }

    /// Tear down: close the channel and hand it back
    pub fn close(mut self) -> Result<C, ChannelError> {
        info!(session = %self.id, batches = self.batches_applied, "Session closed");
        self.channel.close()?;
        Ok(self.channel)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    /// Direct access to the live document, for user-side changes the
    /// mirror does not track (such as typing into a control)
    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn mirror(&self) -> &Mirror<D::Node> {
        &self.mirror
    }

    pub fn history(&self) -> &H {
        self.navigation.history()
    }

    pub fn history_mut(&mut self) -> &mut H {
        self.navigation.history_mut()
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn batches_applied(&self) -> u64 {
        self.batches_applied
    }

    fn send(&mut self, report: &Report) -> Result<(), ChannelError> {
        let message = report
            .to_message()
            .map_err(|e| ChannelError::Encode(e.to_string()))?;

        self.channel.send(&message).map_err(|e| {
            warn!(session = %self.id, kind = report.kind(), error = %e, "Report not sent");
            e
        })
    }
}

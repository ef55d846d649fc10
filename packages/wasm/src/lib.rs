//! Browser entry point: wires a [`Session`] to the page's document, history
//! and a WebSocket to the authority.
//!
//! ```js
//! import init, { Client } from "./tether_wasm.js";
//!
//! await init();
//! const client = Client.connect(document.currentScript.src);
//! client.listen(form, "submit", true, false);
//! client.onResync((reason) => location.reload());
//! ```

mod dom;
mod history;
mod slot;
mod socket;

pub use dom::{WebDom, WebEvent};
pub use history::WebHistory;
pub use socket::WebSocketChannel;

use slot::{Close, Slot};
use std::rc::Rc;
use tether_client::{channel_url, session_id, ChannelError, ClientConfig, ListenerOptions, Session};
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, MessageEvent, WebSocket};

type WebSession = Session<WebDom, WebHistory, WebSocketChannel>;

/// Shared slot; empty once the client is closed
type SharedSession = Rc<Slot<WebSession>>;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Run `f` against the live session, then finish a close that `f`
/// requested (for instance from a resync handler)
fn with_session(shared: &SharedSession, f: impl FnOnce(&mut WebSession)) {
    if let Some(session) = shared.with(f) {
        if let Err(e) = session.close() {
            warn!(error = %e, "Deferred close failed");
        }
    }
}

struct Listener {
    target: EventTarget,
    kind: String,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn detach(&self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(&self.kind, self.callback.as_ref().unchecked_ref());
    }
}

#[wasm_bindgen]
pub struct Client {
    session: SharedSession,
    socket: WebSocket,
    // Owned so the socket's handler stays alive
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl Client {
    /// Open the session named in `locator` (the loader's own URL) against
    /// the host that served the page
    pub fn connect(locator: &str, config: Option<String>) -> Result<Client, JsValue> {
        let config = match config {
            Some(source) => ClientConfig::from_json(&source).map_err(js_error)?,
            None => ClientConfig::default(),
        };

        let id = session_id(locator, &config.session_param)
            .ok_or_else(|| js_error(ChannelError::MissingSession(config.session_param.clone())))?;

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document"))?;
        let location = window.location();
        let url = channel_url(&location.protocol()?, &location.host()?, &id).map_err(js_error)?;
        let socket = WebSocket::new(&url)?;

        info!(session = %id, url = %url, "Connecting");

        let session = Session::new(
            id,
            WebDom::new(document),
            WebHistory::new(window.history()?, location),
            WebSocketChannel::new(socket.clone()),
            config,
        );
        let session: SharedSession = Rc::new(Slot::new(session));

        let inbound = Rc::clone(&session);
        let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            let Some(text) = event.data().as_string() else {
                warn!("Non-text frame ignored");
                return;
            };
            // Failures are logged and handed to the resync hook by the session
            with_session(&inbound, |session| {
                let _ = session.receive(&text);
            });
        });
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        let popped = Rc::clone(&session);
        let on_popstate = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            with_session(&popped, |session| {
                if let Err(e) = session.pop_state() {
                    warn!(error = %e, "Navigation not reported");
                }
            });
        });
        let window_target: EventTarget = window.into();
        window_target
            .add_event_listener_with_callback("popstate", on_popstate.as_ref().unchecked_ref())?;

        Ok(Client {
            session,
            socket,
            _on_message: on_message,
            listeners: vec![Listener {
                target: window_target,
                kind: "popstate".to_string(),
                callback: on_popstate,
            }],
        })
    }

    /// Report `kind` events reaching `target` to the authority
    pub fn listen(
        &mut self,
        target: &EventTarget,
        kind: &str,
        prevent_default: bool,
        stop_propagation: bool,
    ) -> Result<(), JsValue> {
        let options = ListenerOptions {
            prevent_default,
            stop_propagation,
        };
        let shared = Rc::clone(&self.session);
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let event = WebEvent(event);
            with_session(&shared, |session| {
                if let Err(e) = session.dispatch_event(&event, options) {
                    warn!(error = %e, "Event not reported");
                }
            });
        });

        target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
        self.listeners.push(Listener {
            target: target.clone(),
            kind: kind.to_string(),
            callback,
        });
        Ok(())
    }

    /// Called with the failure text whenever a batch aborts
    #[wasm_bindgen(js_name = onResync)]
    pub fn on_resync(&mut self, callback: js_sys::Function) -> Result<(), JsValue> {
        let mut session = self
            .session
            .get_mut()
            .ok_or_else(|| JsValue::from_str("Session busy or closed"))?;

        session.set_resync_hook(move |err| {
            let _ = callback.call1(&JsValue::NULL, &JsValue::from_str(&err.to_string()));
        });
        Ok(())
    }

    /// Detach every listener and close the socket. Called from inside one
    /// of this client's callbacks, the session is closed as soon as that
    /// callback returns.
    pub fn close(&mut self) -> Result<(), JsValue> {
        let closing = self.session.request_close();
        self.detach();

        match closing {
            Close::Ready(Some(session)) => session.close().map(drop).map_err(js_error),
            Close::Ready(None) | Close::Deferred => Ok(()),
        }
    }
}

impl Client {
    fn detach(&mut self) {
        for listener in self.listeners.drain(..) {
            listener.detach();
        }
        self.socket.set_onmessage(None);
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.detach();
    }
}

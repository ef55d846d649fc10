//! # Tether Client
//!
//! Client-resident synchronization engine. A remote authority decides what
//! the document should become and streams ordered instructions; this crate
//! applies them to the live document and reports interactions back, both
//! addressed by structural path.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ channel: inbound batches / outbound reports │
//! └─────────────────────────────────────────────┘
//!            ↓ batch                ↑ report
//! ┌──────────────────────┐ ┌────────────────────┐
//! │ patch: PatchApplier  │ │ events: EventBridge│
//! │  materialize + build │ │ navigation: popped │
//! └──────────────────────┘ └────────────────────┘
//!            ↓                      ↑ locate
//! ┌─────────────────────────────────────────────┐
//! │ mirror: shadow tree, path ⇄ live node       │
//! └─────────────────────────────────────────────┘
//!            ↕ lockstep
//! ┌─────────────────────────────────────────────┐
//! │ dom: live document backend (web / memory)   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Lockstep**: the mirror and the live tree have the same shape
//!    between any two instructions
//! 2. **Strict order**: instructions within a batch and batches within a
//!    session apply in arrival order, one at a time
//! 3. **Fail loudly**: a violation aborts the batch; nothing is skipped
//!    silently and nothing is rolled back
//! 4. **Observe only**: outbound reports are raw facts, never decisions
//!
//! ## Usage
//!
//! ```rust
//! use tether_client::memory::{MemoryChannel, MemoryDocument, MemoryHistory, SyntheticEvent};
//! use tether_client::{ClientConfig, ListenerOptions, Session};
//!
//! let mut session = Session::new(
//!     "demo",
//!     MemoryDocument::new(),
//!     MemoryHistory::new("/"),
//!     MemoryChannel::new(),
//!     ClientConfig::default(),
//! );
//!
//! session.receive(r#"[["create",0,["button",{},"Go"]]]"#).unwrap();
//!
//! let button = *session.mirror().resolve(&[0]).unwrap().node();
//! session
//!     .dispatch_event(&SyntheticEvent::new("click", button), ListenerOptions::default())
//!     .unwrap();
//!
//! assert_eq!(session.channel().sent(), &[r#"["click",0,{}]"#]);
//! ```

pub mod channel;
pub mod config;
pub mod dom;
pub mod errors;
pub mod events;
pub mod materialize;
pub mod memory;
pub mod mirror;
pub mod navigation;
pub mod patch;
pub mod session;

pub use channel::{channel_url, session_id, Channel, ChannelError};
pub use config::ClientConfig;
pub use dom::{Dom, DomError, DomEvent, NodeKind};
pub use errors::{BatchError, PatchError, SessionError};
pub use events::{EventBridge, ListenerOptions};
pub use materialize::materialize;
pub use mirror::{Mirror, MirrorError, MirrorNode};
pub use navigation::{History, HistoryError, NavigationBridge};
pub use patch::{BatchSummary, PatchApplier, VALUE_KEY};
pub use session::{ResyncHook, Session};

// Re-export wire types for convenience
pub use tether_protocol::{Instruction, NodeDescription, Path, Report};

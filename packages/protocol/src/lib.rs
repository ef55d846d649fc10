//! # Tether Protocol
//!
//! Wire types exchanged between a remote authority and a client-resident
//! document mirror.
//!
//! ## Message flow
//!
//! ```text
//! authority ──[ batch: [instruction, ...] ]──▶ client
//! authority ◀──[ report: [kind, ...path, details] ]── client
//! ```
//!
//! Inbound messages are JSON arrays of instructions. Each instruction is a
//! flat array: a string tag, then the target path as leading integers, then
//! payload fields. Outbound messages are a single report record.
//!
//! ## Usage
//!
//! ```rust
//! use tether_protocol::{Batch, Instruction, NodeDescription, Path};
//!
//! let batch = Batch::parse(r#"[["create",0,["div",{},"hi"]]]"#).unwrap();
//! let instructions: Vec<_> = batch.instructions().collect::<Result<_, _>>().unwrap();
//!
//! assert_eq!(
//!     instructions[0],
//!     Instruction::Create {
//!         parent: Path::root(),
//!         index: 0,
//!         node: NodeDescription::element("div").with_child(NodeDescription::text("hi")),
//!     }
//! );
//! ```

pub mod error;
pub mod instruction;
pub mod node;
pub mod path;
pub mod report;

pub use error::ProtocolError;
pub use instruction::{Batch, Instruction};
pub use node::NodeDescription;
pub use path::Path;
pub use report::Report;

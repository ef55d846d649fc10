//! # Instructions
//!
//! One inbound message is a batch: a JSON array of instructions applied in
//! order. Each instruction is a flat array whose first element is the tag.
//!
//! ```text
//! ["create",      ...parent, index, node]
//! ["delete",      ...parent, index]
//! ["replace",     ...parent, index, node]
//! ["move",        ...parent, from, to]
//! ["set",         ...target, key, value]
//! ["unset",       ...target, key]
//! ["push_url",    url]
//! ["replace_url", url]
//! ```
//!
//! Payload fields are popped from the end of the array; whatever remains
//! after the tag is the path.

use crate::error::{json_type, ProtocolError};
use crate::node::{NodeDescription, WireString};
use crate::path::Path;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde::Deserialize;
use serde_json::Value;

/// A single tree or navigation mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Insert a new node under `parent` at `index` (append when past the end)
    Create {
        parent: Path,
        index: usize,
        node: NodeDescription,
    },

    /// Remove the child of `parent` at `index`
    Delete { parent: Path, index: usize },

    /// Swap the child of `parent` at `index` for a new node
    Replace {
        parent: Path,
        index: usize,
        node: NodeDescription,
    },

    /// Relocate a child of `parent`; `to` is relative to the list after removal
    Move { parent: Path, from: usize, to: usize },

    /// Set an attribute (or the live value of a form control)
    Set {
        target: Path,
        key: String,
        value: String,
    },

    /// Remove an attribute (or clear the live value of a form control)
    Unset { target: Path, key: String },

    /// Add a history entry without loading a document
    PushUrl { url: String },

    /// Rewrite the current history entry without loading a document
    ReplaceUrl { url: String },
}

impl Instruction {
    /// Wire tag of this instruction
    pub fn kind(&self) -> &'static str {
        match self {
            Instruction::Create { .. } => "create",
            Instruction::Delete { .. } => "delete",
            Instruction::Replace { .. } => "replace",
            Instruction::Move { .. } => "move",
            Instruction::Set { .. } => "set",
            Instruction::Unset { .. } => "unset",
            Instruction::PushUrl { .. } => "push_url",
            Instruction::ReplaceUrl { .. } => "replace_url",
        }
    }

    /// Decode one flat wire array
    pub fn from_wire(value: Value) -> Result<Self, ProtocolError> {
        let mut values = match value {
            Value::Array(values) => values,
            other => return Err(ProtocolError::NotAnArray(json_type(&other))),
        };
        if values.is_empty() {
            return Err(ProtocolError::EmptyInstruction);
        }

        let tag = match values.remove(0) {
            Value::String(tag) => tag,
            _ => return Err(ProtocolError::InvalidTag),
        };

        let instruction = match tag.as_str() {
            "create" => "create",
            "delete" => "delete",
            "replace" => "replace",
            "move" => "move",
            "set" => "set",
            "unset" => "unset",
            "push_url" => "push_url",
            "replace_url" => "replace_url",
            _ => return Err(ProtocolError::UnknownInstruction(tag)),
        };
        let mut fields = Fields {
            instruction,
            values,
        };

        match instruction {
            "create" => {
                let node = fields.pop_node()?;
                let index = fields.pop_index("index")?;
                Ok(Instruction::Create {
                    parent: fields.into_path()?,
                    index,
                    node,
                })
            }
            "delete" => {
                let index = fields.pop_index("index")?;
                Ok(Instruction::Delete {
                    parent: fields.into_path()?,
                    index,
                })
            }
            "replace" => {
                let node = fields.pop_node()?;
                let index = fields.pop_index("index")?;
                Ok(Instruction::Replace {
                    parent: fields.into_path()?,
                    index,
                    node,
                })
            }
            "move" => {
                let to = fields.pop_index("destination index")?;
                let from = fields.pop_index("source index")?;
                Ok(Instruction::Move {
                    parent: fields.into_path()?,
                    from,
                    to,
                })
            }
            "set" => {
                let value = fields.pop_scalar("value")?;
                let key = fields.pop_key()?;
                Ok(Instruction::Set {
                    target: fields.into_path()?,
                    key,
                    value,
                })
            }
            "unset" => {
                let key = fields.pop_key()?;
                Ok(Instruction::Unset {
                    target: fields.into_path()?,
                    key,
                })
            }
            "push_url" => {
                let url = fields.pop_scalar("url")?;
                fields.finish()?;
                Ok(Instruction::PushUrl { url })
            }
            _ => {
                let url = fields.pop_scalar("url")?;
                fields.finish()?;
                Ok(Instruction::ReplaceUrl { url })
            }
        }
    }
}

/// Remaining wire fields of one instruction, consumed from the back
struct Fields {
    instruction: &'static str,
    values: Vec<Value>,
}

impl Fields {
    fn pop(&mut self, field: &'static str) -> Result<Value, ProtocolError> {
        self.values.pop().ok_or(ProtocolError::MissingField {
            instruction: self.instruction,
            field,
        })
    }

    fn pop_index(&mut self, field: &'static str) -> Result<usize, ProtocolError> {
        let value = self.pop(field)?;
        as_index(self.instruction, &value)
    }

    fn pop_key(&mut self) -> Result<String, ProtocolError> {
        match self.pop("key")? {
            Value::String(key) => Ok(key),
            other => Err(ProtocolError::InvalidString {
                instruction: self.instruction,
                field: "key",
                value: other.to_string(),
            }),
        }
    }

    fn pop_scalar(&mut self, field: &'static str) -> Result<String, ProtocolError> {
        let value = self.pop(field)?;
        let rendered = value.to_string();
        WireString::deserialize(value)
            .map(|scalar| scalar.0)
            .map_err(|_| ProtocolError::InvalidString {
                instruction: self.instruction,
                field,
                value: rendered,
            })
    }

    fn pop_node(&mut self) -> Result<NodeDescription, ProtocolError> {
        let value = self.pop("node")?;
        NodeDescription::deserialize(value).map_err(|e| ProtocolError::InvalidNode(e.to_string()))
    }

    /// Everything left over is the target path
    fn into_path(self) -> Result<Path, ProtocolError> {
        self.values
            .iter()
            .map(|value| as_index(self.instruction, value))
            .collect::<Result<Vec<usize>, _>>()
            .map(Path::new)
    }

    fn finish(self) -> Result<(), ProtocolError> {
        if self.values.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::UnexpectedFields {
                instruction: self.instruction,
                count: self.values.len(),
            })
        }
    }
}

fn as_index(instruction: &'static str, value: &Value) -> Result<usize, ProtocolError> {
    value
        .as_u64()
        .and_then(|index| usize::try_from(index).ok())
        .ok_or_else(|| ProtocolError::InvalidIndex {
            instruction,
            value: value.to_string(),
        })
}

impl Serialize for Instruction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(None)?;
        seq.serialize_element(self.kind())?;

        match self {
            Instruction::Create {
                parent,
                index,
                node,
            }
            | Instruction::Replace {
                parent,
                index,
                node,
            } => {
                for i in parent.iter() {
                    seq.serialize_element(i)?;
                }
                seq.serialize_element(index)?;
                seq.serialize_element(node)?;
            }
            Instruction::Delete { parent, index } => {
                for i in parent.iter() {
                    seq.serialize_element(i)?;
                }
                seq.serialize_element(index)?;
            }
            Instruction::Move { parent, from, to } => {
                for i in parent.iter() {
                    seq.serialize_element(i)?;
                }
                seq.serialize_element(from)?;
                seq.serialize_element(to)?;
            }
            Instruction::Set { target, key, value } => {
                for i in target.iter() {
                    seq.serialize_element(i)?;
                }
                seq.serialize_element(key)?;
                seq.serialize_element(value)?;
            }
            Instruction::Unset { target, key } => {
                for i in target.iter() {
                    seq.serialize_element(i)?;
                }
                seq.serialize_element(key)?;
            }
            Instruction::PushUrl { url } | Instruction::ReplaceUrl { url } => {
                seq.serialize_element(url)?;
            }
        }

        seq.end()
    }
}

/// One inbound message.
///
/// Entries stay undecoded until iterated so that a bad entry only fails
/// once every entry before it has been handed out.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    entries: Vec<Value>,
}

impl Batch {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        match serde_json::from_str(text)? {
            Value::Array(entries) => Ok(Self { entries }),
            other => Err(ProtocolError::NotAnArray(json_type(&other))),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode entries lazily, in order
    pub fn instructions(self) -> impl Iterator<Item = Result<Instruction, ProtocolError>> {
        self.entries.into_iter().map(Instruction::from_wire)
    }

    /// Encode instructions as one wire message
    pub fn encode(instructions: &[Instruction]) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(instructions)?)
    }
}

//! # Outbound Reports
//!
//! Observations sent from the client to the authority. Reports are never
//! acknowledged individually.
//!
//! ```text
//! ["click", 0, 1, {}]            → event on the node at /0/1
//! ["input", 0, {"value": "abc"}] → value-input event with payload
//! ["pop_url", "/about"]          → back/forward navigation
//! ```

use crate::error::ProtocolError;
use crate::path::Path;
use serde::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::{Map, Value};
use std::fmt;

pub const POP_URL: &str = "pop_url";

#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// An interaction on a mirrored node
    Event {
        kind: String,
        path: Path,
        details: Map<String, Value>,
    },

    /// User-driven history navigation; carries a path-only location
    PopUrl { location: String },
}

impl Report {
    pub fn event(kind: impl Into<String>, path: Path) -> Self {
        Report::Event {
            kind: kind.into(),
            path,
            details: Map::new(),
        }
    }

    pub fn pop_url(location: impl Into<String>) -> Self {
        Report::PopUrl {
            location: location.into(),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Report::Event { kind, .. } => kind,
            Report::PopUrl { .. } => POP_URL,
        }
    }

    /// Encode as one outbound text frame
    pub fn to_message(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode one inbound record, as the authority does
    pub fn from_message(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        Report::deserialize(value).map_err(|e| ProtocolError::InvalidReport(e.to_string()))
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Report::Event {
                kind,
                path,
                details,
            } => {
                let mut seq = serializer.serialize_seq(Some(path.len() + 2))?;
                seq.serialize_element(kind)?;
                for index in path.iter() {
                    seq.serialize_element(index)?;
                }
                seq.serialize_element(details)?;
                seq.end()
            }
            Report::PopUrl { location } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(POP_URL)?;
                seq.serialize_element(location)?;
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Report {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(ReportVisitor)
    }
}

struct ReportVisitor;

impl<'de> Visitor<'de> for ReportVisitor {
    type Value = Report;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a [kind, ...path, details] or [\"pop_url\", location] array")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let kind: String = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;

        if kind == POP_URL {
            let location: String = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(1, &self))?;
            return Ok(Report::PopUrl { location });
        }

        let mut path = Path::root();
        loop {
            match seq.next_element::<Value>()? {
                Some(Value::Object(details)) => {
                    if seq.next_element::<Value>()?.is_some() {
                        return Err(de::Error::custom("details must be the last element"));
                    }
                    return Ok(Report::Event {
                        kind,
                        path,
                        details,
                    });
                }
                Some(value) => {
                    let index = value
                        .as_u64()
                        .and_then(|index| usize::try_from(index).ok())
                        .ok_or_else(|| de::Error::custom(format!("invalid path index {}", value)))?;
                    path.push(index);
                }
                None => return Err(de::Error::custom("missing details mapping")),
            }
        }
    }
}

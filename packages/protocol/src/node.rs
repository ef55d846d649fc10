//! # Node Descriptions
//!
//! Declarative wire form of a node to be created on the client.
//!
//! ```text
//! "hello"                          → text node
//! ["div", {"id": "a"}, "hi", [...]] → element with attributes and children
//! ```

use serde::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A node to materialize: plain text or an element subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeDescription {
    Text(String),

    Element {
        tag: String,
        /// Attribute names are unique, so application order is irrelevant
        attributes: BTreeMap<String, String>,
        children: Vec<NodeDescription>,
    },
}

impl NodeDescription {
    pub fn text(content: impl Into<String>) -> Self {
        NodeDescription::Text(content.into())
    }

    pub fn element(tag: impl Into<String>) -> Self {
        NodeDescription::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let NodeDescription::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_child(mut self, child: NodeDescription) -> Self {
        if let NodeDescription::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    /// Number of nodes in this description, itself included
    pub fn node_count(&self) -> usize {
        match self {
            NodeDescription::Text(_) => 1,
            NodeDescription::Element { children, .. } => {
                1 + children.iter().map(NodeDescription::node_count).sum::<usize>()
            }
        }
    }
}

impl Serialize for NodeDescription {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NodeDescription::Text(content) => serializer.serialize_str(content),
            NodeDescription::Element {
                tag,
                attributes,
                children,
            } => {
                let mut seq = serializer.serialize_seq(Some(2 + children.len()))?;
                seq.serialize_element(tag)?;
                seq.serialize_element(attributes)?;
                for child in children {
                    seq.serialize_element(child)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for NodeDescription {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = NodeDescription;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a text string or a [tag, attributes, ...children] array")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(NodeDescription::Text(value.to_owned()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        Ok(NodeDescription::Text(value))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let tag: String = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let attributes: BTreeMap<String, WireString> = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;

        let mut children = Vec::new();
        while let Some(child) = seq.next_element::<NodeDescription>()? {
            children.push(child);
        }

        Ok(NodeDescription::Element {
            tag,
            attributes: attributes
                .into_iter()
                .map(|(key, value)| (key, value.0))
                .collect(),
            children,
        })
    }
}

/// A string-valued wire scalar.
///
/// Numbers and booleans are accepted and rendered in their JSON text form.
pub(crate) struct WireString(pub(crate) String);

impl<'de> Deserialize<'de> for WireString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WireStringVisitor)
    }
}

struct WireStringVisitor;

impl<'de> Visitor<'de> for WireStringVisitor {
    type Value = WireString;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string, number or boolean")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(WireString(value.to_owned()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        Ok(WireString(value))
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        Ok(WireString(value.to_string()))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(WireString(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(WireString(value.to_string()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        // Keep the fraction of integral floats: 1.0 stays "1.0"
        let text = serde_json::Number::from_f64(value)
            .map(|number| number.to_string())
            .unwrap_or_else(|| value.to_string());
        Ok(WireString(text))
    }
}

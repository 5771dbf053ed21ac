//! Core type definitions for the page-to-SMS pipeline

use crate::link_registry::LinkBatch;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inbound SMS webhook payload (Twilio field names)
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    /// Host and path to fetch, without scheme
    #[serde(rename = "Body", default)]
    pub body: String,
    /// Conversation id; namespaces stored link tokens
    #[serde(rename = "MessageSid")]
    pub message_sid: String,
    /// Number the reply segments go back to
    #[serde(rename = "From")]
    pub from: String,
}

/// Tag after its rewrite rule ran, attributes in emission order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenTag {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl RewrittenTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// One numbered piece of compressed output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub index: usize, // 1-based
    pub total: usize, // kept segments, not the untruncated count
    pub body: String,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", self.index, self.total, self.body)
    }
}

/// Result of running one page through the pipeline
#[derive(Debug, Clone)]
pub struct Compacted {
    pub sanitized: String,
    pub compressed: String,
    pub segments: Vec<Segment>,
    /// Link mappings not yet written to the store
    pub links: LinkBatch,
}

impl Compacted {
    /// Message bodies in delivery order
    pub fn messages(&self) -> Vec<String> {
        self.segments.iter().map(|s| s.to_string()).collect()
    }
}

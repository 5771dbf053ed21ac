//! pagetext - web pages over SMS
//!
//! Fetches a page, keeps only its links and form inputs, squeezes the
//! markup into single-character glyphs and replies in numbered segments:
//! - Whitelist sanitizer with per-tag rewrite rules
//! - Link tokens stored per conversation for later lookup
//! - Ordered glyph substitution table
//! - Fixed-size, truncating chunker

pub mod types;
pub mod error;
pub mod config;
pub mod shortener;
pub mod link_store;
pub mod link_registry;
pub mod transform;
pub mod sanitizer;
pub mod compressor;
pub mod chunker;
pub mod pipeline;
pub mod fetcher;
pub mod messaging;
pub mod relay;
pub mod server;

pub use types::*;
pub use error::{PipelineError, RelayError};
pub use config::Config;
pub use shortener::TextShortener;
pub use link_store::{LinkStore, MemoryLinkStore, RedisLinkStore};
pub use link_registry::{LinkBatch, LinkPolicy, LinkRegistry, RandomTokens, SequentialTokens, TokenSource};
pub use transform::{TagRule, TagTransformer};
pub use sanitizer::SanitizeConfig;
pub use compressor::SymbolCompressor;
pub use chunker::Chunker;
pub use pipeline::{Pipeline, PipelineConfig};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use messaging::{LogSender, MessageSender, TwilioSender};
pub use relay::{Relay, SharedRelay};

//! Page-to-segments pipeline: sanitize, compress, chunk

use crate::chunker::{Chunker, DEFAULT_MAX_SEGMENTS, DEFAULT_SEGMENT_CAPACITY};
use crate::compressor::SymbolCompressor;
use crate::error::PipelineError;
use crate::link_registry::{LinkBatch, LinkPolicy, LinkRegistry, StdTokens, TokenFactory};
use crate::link_store::LinkStore;
use crate::sanitizer::{sanitize_document, SanitizeConfig};
use crate::shortener::{TextShortener, DEFAULT_EXPRESSIONS};
use crate::transform::TagTransformer;
use crate::types::Compacted;
use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub sanitize: SanitizeConfig,
    pub links: LinkPolicy,
    /// Word → token abbreviations, applied in order
    pub expressions: Vec<(String, String)>,
    pub segment_capacity: usize,
    pub max_segments: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sanitize: SanitizeConfig::default(),
            links: LinkPolicy::default(),
            expressions: DEFAULT_EXPRESSIONS
                .iter()
                .map(|(word, short)| (word.to_string(), short.to_string()))
                .collect(),
            segment_capacity: DEFAULT_SEGMENT_CAPACITY,
            max_segments: DEFAULT_MAX_SEGMENTS,
        }
    }
}

/// Output of the synchronous half of the pipeline; links are not yet stored
pub struct Transformed<'a> {
    pub sanitized: String,
    pub compressed: String,
    pub registry: LinkRegistry<'a>,
}

pub struct Pipeline {
    config: PipelineConfig,
    shortener: TextShortener,
    compressor: SymbolCompressor,
    chunker: Chunker,
    store: Arc<dyn LinkStore>,
    tokens: TokenFactory,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, store: Arc<dyn LinkStore>) -> Result<Self> {
        let shortener = TextShortener::new(
            config
                .expressions
                .iter()
                .map(|(word, short)| (word.as_str(), short.as_str())),
        )?;
        let chunker = Chunker::new(config.segment_capacity, config.max_segments);

        Ok(Self {
            config,
            shortener,
            compressor: SymbolCompressor::new()?,
            chunker,
            store,
            tokens: StdTokens::factory(),
        })
    }

    /// Replace the randomness behind link tokens
    pub fn with_tokens(mut self, tokens: TokenFactory) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn LinkStore {
        self.store.as_ref()
    }

    /// Sanitize and compress a page, collecting its links
    pub fn transform(&self, conversation_id: &str, html: &str) -> Result<Transformed<'_>, PipelineError> {
        let registry = LinkRegistry::new(conversation_id, &self.config.links, (self.tokens)());
        let mut transformer = TagTransformer::new(&self.shortener, registry);

        let sanitized = sanitize_document(html, &self.config.sanitize, &mut transformer)?;
        let compressed = self.compressor.compress(&sanitized).trim().to_string();

        Ok(Transformed {
            sanitized,
            compressed,
            registry: transformer.into_registry(),
        })
    }

    /// Run a fetched page all the way to segments. Links come back unstored;
    /// hand them to `store_links` once the replies are settled.
    pub fn run(&self, conversation_id: &str, html: &str) -> Result<Compacted, PipelineError> {
        let Transformed {
            sanitized,
            compressed,
            registry,
        } = self.transform(conversation_id, html)?;

        let segments = self.chunker.chunk(&compressed);
        if segments.is_empty() {
            return Err(PipelineError::EmptyOutput);
        }

        let links = registry.into_batch();

        debug!("Compressed {} → {} chars", sanitized.len(), compressed.chars().count());
        info!(
            "Compacted page for {}: {} segments, {} links",
            conversation_id,
            segments.len(),
            links.len()
        );

        Ok(Compacted {
            sanitized,
            compressed,
            segments,
            links,
        })
    }

    /// Write links in the background; a slow store never holds up the caller
    pub fn store_links(&self, links: LinkBatch) -> JoinHandle<usize> {
        let store = self.store.clone();
        tokio::spawn(async move { links.commit(store.as_ref()).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link_registry::SequentialTokens;
    use crate::link_store::MemoryLinkStore;

    fn pipeline(store: Arc<MemoryLinkStore>) -> Pipeline {
        Pipeline::new(PipelineConfig::default(), store)
            .unwrap()
            .with_tokens(SequentialTokens::factory())
    }

    #[tokio::test]
    async fn test_links_stored_in_background() {
        let store = Arc::new(MemoryLinkStore::new());
        let p = pipeline(store.clone());

        let out = p
            .run("SM9", r#"<body><a href="http://a.example">A</a> <a href="http://b.example/signout">out</a></body>"#)
            .unwrap();

        assert_eq!(out.sanitized, r#"<a href="000">A</a> "#);
        assert_eq!(out.compressed, "Φ000ΣAΩ");
        assert_eq!(out.links.len(), 1);
        assert!(store.is_empty().await);

        assert_eq!(p.store_links(out.links).await.unwrap(), 1);
        assert_eq!(
            store.get("SM9_000").await.unwrap().as_deref(),
            Some("http://a.example")
        );
    }

    #[test]
    fn test_empty_page_is_an_error() {
        let store = Arc::new(MemoryLinkStore::new());
        let p = pipeline(store);

        let result = p.run("SM9", "<body> \n <div><img src=x></div>\n</body>");
        assert!(matches!(result, Err(PipelineError::EmptyOutput)));
    }

    #[test]
    fn test_segment_settings_come_from_config() {
        let store = Arc::new(MemoryLinkStore::new());
        let config = PipelineConfig {
            segment_capacity: 4,
            max_segments: 3,
            ..Default::default()
        };
        let p = Pipeline::new(config, store).unwrap();

        let out = p.run("SM9", "<body>abcdefghijklmnop</body>").unwrap();
        assert_eq!(out.messages(), vec!["1/3 abcd", "2/3 efgh", "3/3 ijkl"]);
    }

    #[test]
    fn test_transform_does_not_touch_store() {
        let store = Arc::new(MemoryLinkStore::new());
        let p = pipeline(store);

        let t = p
            .transform("SM9", r#"<body><a href="http://a.example">A</a></body>"#)
            .unwrap();
        assert_eq!(t.registry.pending().len(), 1);
    }
}

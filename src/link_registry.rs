//! Short tokens standing in for retained link targets

use crate::link_store::LinkStore;
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Path fragments of links not worth sending over SMS
pub const DEFAULT_DENYLIST: &[&str] = &["policies", "signin", "preferences", "login", "signout"];

/// Which links are retained and how their mappings are stored
#[derive(Debug, Clone)]
pub struct LinkPolicy {
    pub denylist: Vec<String>,
    pub token_len: usize,
    /// Retention handed to the store; `None` keeps mappings until the store evicts them
    pub ttl: Option<Duration>,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
            token_len: 3,
            ttl: None,
        }
    }
}

impl LinkPolicy {
    pub fn is_denied(&self, url: &str) -> bool {
        self.denylist.iter().any(|fragment| url.contains(fragment.as_str()))
    }
}

/// Source of link tokens
pub trait TokenSource: Send {
    fn token(&mut self, len: usize) -> String;
}

/// Builds a fresh token source for each request
pub type TokenFactory = Arc<dyn Fn() -> Box<dyn TokenSource> + Send + Sync>;

/// Base-36 tokens drawn from a random number generator
pub struct RandomTokens<R> {
    rng: R,
}

impl<R: Rng + Send> RandomTokens<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

/// Random tokens backed by the standard generator
pub type StdTokens = RandomTokens<StdRng>;

impl RandomTokens<StdRng> {
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn factory() -> TokenFactory {
        Arc::new(|| Box::new(Self::from_os_rng()) as Box<dyn TokenSource>)
    }
}

impl<R: Rng + Send> TokenSource for RandomTokens<R> {
    fn token(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| BASE36[self.rng.random_range(0..BASE36.len())] as char)
            .collect()
    }
}

/// Deterministic tokens counting up in base 36 ("000", "001", ...)
#[derive(Debug, Default)]
pub struct SequentialTokens {
    next: u64,
}

impl SequentialTokens {
    pub fn factory() -> TokenFactory {
        Arc::new(|| Box::new(Self::default()) as Box<dyn TokenSource>)
    }
}

impl TokenSource for SequentialTokens {
    fn token(&mut self, len: usize) -> String {
        let mut n = self.next;
        self.next += 1;

        let mut digits = vec![b'0'; len];
        for slot in digits.iter_mut().rev() {
            *slot = BASE36[(n % 36) as usize];
            n /= 36;
        }
        String::from_utf8_lossy(&digits).into_owned()
    }
}

/// Key under which a token's URL is stored
pub fn link_key(conversation_id: &str, token: &str) -> String {
    format!("{}_{}", conversation_id, token)
}

/// Look up the URL behind a token handed out earlier
pub async fn resolve(
    store: &dyn LinkStore,
    conversation_id: &str,
    token: &str,
) -> Result<Option<String>> {
    store.get(&link_key(conversation_id, token)).await
}

/// Per-request registry; collects mappings until committed to a store
pub struct LinkRegistry<'a> {
    conversation_id: String,
    policy: &'a LinkPolicy,
    tokens: Box<dyn TokenSource>,
    pending: Vec<(String, String)>,
}

impl<'a> LinkRegistry<'a> {
    pub fn new(
        conversation_id: impl Into<String>,
        policy: &'a LinkPolicy,
        tokens: Box<dyn TokenSource>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            policy,
            tokens,
            pending: Vec::new(),
        }
    }

    /// Token for a retained URL, or the empty placeholder for a rejected one
    pub fn register(&mut self, url: Option<&str>) -> String {
        let url = match url {
            Some(url) if !url.is_empty() => url,
            _ => return String::new(),
        };
        if self.policy.is_denied(url) {
            debug!("Dropping denylisted link {}", url);
            return String::new();
        }

        let token = self.tokens.token(self.policy.token_len);
        self.pending
            .push((link_key(&self.conversation_id, &token), url.to_string()));
        token
    }

    /// Mappings recorded so far, in registration order
    pub fn pending(&self) -> &[(String, String)] {
        &self.pending
    }

    /// Detach the recorded mappings from the request so they can be stored later
    pub fn into_batch(self) -> LinkBatch {
        LinkBatch {
            conversation_id: self.conversation_id,
            ttl: self.policy.ttl,
            pending: self.pending,
        }
    }

    /// Write every recorded mapping; failures are logged and skipped
    pub async fn commit(self, store: &dyn LinkStore) -> usize {
        self.into_batch().commit(store).await
    }
}

/// Owned mappings awaiting a store write
#[derive(Debug, Clone, Default)]
pub struct LinkBatch {
    conversation_id: String,
    ttl: Option<Duration>,
    pending: Vec<(String, String)>,
}

impl LinkBatch {
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> &[(String, String)] {
        &self.pending
    }

    pub async fn commit(self, store: &dyn LinkStore) -> usize {
        let mut written = 0;
        for (key, url) in &self.pending {
            match store.set(key, url, self.ttl).await {
                Ok(()) => written += 1,
                Err(e) => warn!("Failed to store link {} in {} store: {:?}", key, store.name(), e),
            }
        }
        debug!(
            "Committed {}/{} links for conversation {}",
            written,
            self.pending.len(),
            self.conversation_id
        );
        written
    }
}

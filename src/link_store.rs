//! Key-value storage behind the link registry

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Shared key-value service the registry writes link mappings into
#[async_trait]
pub trait LinkStore: Send + Sync {
    fn name(&self) -> &'static str;

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<String>>;
}

/// In-process store. Expired entries are dropped when read and swept on every write.
#[derive(Debug, Default)]
pub struct MemoryLinkStore {
    entries: RwLock<HashMap<String, StoredLink>>,
}

#[derive(Debug, Clone)]
struct StoredLink {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredLink {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let now = Instant::now();
        let entry = StoredLink {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| now + ttl),
        };

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, stored| stored.is_live(now));
        if entries.len() < before {
            debug!("Swept {} expired links", before - entries.len());
        }
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if entry.is_live(Instant::now()) => {
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
            }
        }

        debug!("Evicting expired link {}", key);
        self.entries.write().await.remove(key);
        Ok(None)
    }
}

/// Redis-backed store shared between server instances
#[derive(Clone)]
pub struct RedisLinkStore {
    url: String,
    conn: ConnectionManager,
}

impl RedisLinkStore {
    /// Connect to Redis; the manager reconnects on its own after failures
    pub async fn connect(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let client = redis::Client::open(url.as_str())
            .with_context(|| format!("invalid Redis URL {}", url))?;
        let conn = ConnectionManager::new(client)
            .await
            .with_context(|| format!("failed to connect to Redis at {}", url))?;
        Ok(Self { url, conn })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Health check
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

#[async_trait]
impl LinkStore for RedisLinkStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        debug!("SET {}", key);
        let mut conn = self.conn.clone();
        match ttl {
            // EX 0 is rejected by Redis
            Some(ttl) => {
                let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        debug!("GET {}", key);
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }
}

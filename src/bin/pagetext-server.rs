//! pagetext HTTP server binary

use pagetext::config::load_dotenv;
use pagetext::{
    Config, HttpFetcher, LinkStore, LogSender, MemoryLinkStore, MessageSender, Pipeline,
    RedisLinkStore, Relay, TwilioSender,
};
use std::sync::Arc;

mod server {
    pub use pagetext::server::*;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    println!("pagetext: web pages over SMS");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    if let Some(path) = load_dotenv() {
        println!("✓ Loaded environment from {}", path.display());
    }

    let config = Config::from_env()?;

    // --dry-run logs replies instead of texting them
    let dry_run = std::env::args().any(|arg| arg == "--dry-run");

    let sender: Arc<dyn MessageSender> = if dry_run {
        println!("✓ Mode: DRY RUN (replies are logged, not sent)");
        Arc::new(LogSender)
    } else {
        let Some(ref twilio) = config.twilio else {
            eprintln!("❌ TWILIO_SID, TWILIO_AUTH_TOKEN and TWILIO_NUMBER must be set");
            eprintln!("   (use --dry-run to start without sending SMS)");
            anyhow::bail!("missing Twilio credentials");
        };
        println!("✓ Mode: Twilio, sending from {}", twilio.from_number);
        Arc::new(TwilioSender::new(
            twilio.api_base.clone(),
            twilio.account_sid.clone(),
            twilio.auth_token.clone(),
            twilio.from_number.clone(),
        ))
    };

    let store: Arc<dyn LinkStore> = match config.redis_url {
        Some(ref url) => {
            let store = RedisLinkStore::connect(url.clone()).await?;
            match store.health_check().await {
                Ok(true) => println!("✓ Redis is healthy: {}", store.url()),
                Ok(false) => eprintln!("⚠️  Redis at {} answered PING unexpectedly", store.url()),
                Err(e) => eprintln!("⚠️  Redis at {} unreachable: {}", store.url(), e),
            }
            Arc::new(store)
        }
        None => {
            println!("✓ Link store: in-process (set REDIS_URL for a shared store)");
            Arc::new(MemoryLinkStore::new())
        }
    };

    if let Some(ttl) = config.pipeline.links.ttl {
        println!("✓ Links expire after {}s", ttl.as_secs());
    }

    let pipeline = Pipeline::new(config.pipeline.clone(), store)?;
    let relay = Relay::new(pipeline, Arc::new(HttpFetcher::new()), sender);

    println!("✓ Relay initialized");
    println!("✓ Starting HTTP server on port {}...", config.port);
    println!();

    server::run_server(relay, config.port).await?;

    Ok(())
}

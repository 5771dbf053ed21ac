//! Request orchestration: fetch, compact, reply

use crate::error::{PipelineError, RelayError};
use crate::fetcher::PageFetcher;
use crate::messaging::MessageSender;
use crate::pipeline::Pipeline;
use crate::types::InboundMessage;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub const ERROR_NOTICE_PREFIX: &str = "Sorry, something went wrong! Here's the error: ";

/// What to send back for one inbound request
#[derive(Debug)]
pub struct Dispatch {
    pub to: String,
    /// Message bodies, in send order
    pub messages: Vec<String>,
    /// Sanitized fragment, or the failure the requester is told about
    pub outcome: Result<String, PipelineError>,
    /// Background write of the page's links; resolves to the number stored
    pub links: Option<JoinHandle<usize>>,
}

pub struct Relay {
    pipeline: Pipeline,
    fetcher: Arc<dyn PageFetcher>,
    sender: Arc<dyn MessageSender>,
}

pub type SharedRelay = Arc<Relay>;

impl Relay {
    pub fn new(
        pipeline: Pipeline,
        fetcher: Arc<dyn PageFetcher>,
        sender: Arc<dyn MessageSender>,
    ) -> SharedRelay {
        Arc::new(Self {
            pipeline,
            fetcher,
            sender,
        })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// URL fetched for an SMS body
    pub fn target_url(body: &str) -> String {
        format!("https://{}", body.trim())
    }

    /// Fetch the requested page and work out the replies. Fetch failures
    /// produce no replies at all.
    pub async fn process(&self, msg: &InboundMessage) -> Result<Dispatch, RelayError> {
        let url = Self::target_url(&msg.body);
        info!("Relaying {} for {} ({})", url, msg.from, msg.message_sid);

        let html = self.fetcher.fetch(&url).await.map_err(|e| {
            warn!("Fetch of {} via {} failed: {:?}", url, self.fetcher.name(), e);
            RelayError::Fetch {
                url: url.clone(),
                reason: e.to_string(),
            }
        })?;

        let dispatch = match self.pipeline.run(&msg.message_sid, &html) {
            Ok(compacted) => {
                let messages = compacted.messages();
                Dispatch {
                    to: msg.from.clone(),
                    messages,
                    outcome: Ok(compacted.sanitized),
                    links: Some(self.pipeline.store_links(compacted.links)),
                }
            }
            Err(e) => {
                error!("Compaction of {} failed: {}", url, e);
                Dispatch {
                    to: msg.from.clone(),
                    messages: vec![format!("{}{}", ERROR_NOTICE_PREFIX, e)],
                    outcome: Err(e),
                    links: None,
                }
            }
        };

        Ok(dispatch)
    }

    /// Send messages one after another; a failed send does not stop the rest
    pub async fn deliver(&self, to: &str, messages: &[String]) -> usize {
        let mut sent = 0;
        for (i, body) in messages.iter().enumerate() {
            match self.sender.send(to, body).await {
                Ok(()) => sent += 1,
                Err(e) => error!(
                    "Sending message {}/{} to {} via {} failed: {:?}",
                    i + 1,
                    messages.len(),
                    to,
                    self.sender.name(),
                    e
                ),
            }
        }
        info!("Delivered {}/{} messages to {}", sent, messages.len(), to);
        sent
    }
}

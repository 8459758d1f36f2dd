//! Ordered fallback from the retrieval service to the direct relay.
//!
//! The retrieval service answers first because its replies are grounded in indexed documents.
//! When it fails for any reason the prompt goes to [`Relay::send_message`] exactly once. The two
//! attempts never overlap and no probe runs between them.
use crate::alternate::AlternateClient;
use crate::client::HttpClient;
use crate::outcome::{FailureKind, RelayOutcome};
use crate::relay::Relay;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug)]
pub struct FallbackRouter<T: HttpClient> {
    alternate: AlternateClient<T>,
    relay: Arc<Relay<T>>,
}

impl<T: HttpClient> FallbackRouter<T> {
    pub fn new(alternate: AlternateClient<T>, relay: Arc<Relay<T>>) -> Self {
        Self { alternate, relay }
    }

    pub fn relay(&self) -> &Arc<Relay<T>> {
        &self.relay
    }

    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn route(&self, prompt: &str) -> RelayOutcome {
        match self.alternate.query(prompt).await {
            Ok(text) => return RelayOutcome::Success(text),
            Err(e) => warn!("Retrieval service unavailable, falling back to direct backend: {}", e),
        }

        match self.relay.send_message(prompt).await {
            RelayOutcome::Success(text) => {
                info!("Request succeeded on direct backend");
                RelayOutcome::Success(text)
            }
            RelayOutcome::Failure(kind) => {
                warn!("Direct backend failed after retrieval service failure: {}", kind);
                RelayOutcome::Failure(FailureKind::AllBackendsFailed)
            }
        }
    }
}

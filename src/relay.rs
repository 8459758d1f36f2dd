//! Health-gated relay in front of the inference backend.
//!
//! A [`Relay`] owns one [`BackendClient`] and the [`HealthState`] describing it. Each prompt gets
//! at most one generation attempt, and only while the cached state says the backend is
//! reachable. Failed generations do not touch the health state; only probes do.
use crate::backend::BackendClient;
use crate::client::HttpClient;
use crate::health::HealthState;
use crate::outcome::{FailureKind, RelayOutcome};
use tracing::{debug, info, instrument, warn};

/// Prompt sent by [`Relay::ping`].
pub const PING_PROMPT: &str = "pinging";

#[derive(Debug)]
pub struct Relay<T: HttpClient> {
    backend: BackendClient<T>,
    health: HealthState,
}

impl<T: HttpClient> Relay<T> {
    /// Build a relay without probing. The backend counts as unreachable until
    /// [`Relay::health_check`] succeeds.
    pub fn new(backend: BackendClient<T>) -> Self {
        Self {
            backend,
            health: HealthState::new(),
        }
    }

    /// Build a relay and run the startup probe. A failed probe is not an error; the relay just
    /// starts out unreachable.
    pub async fn connect(backend: BackendClient<T>) -> Self {
        let relay = Self::new(backend);
        if relay.health_check().await {
            info!(
                "Connected to inference backend at {}",
                relay.backend.config().base_url
            );
        } else {
            warn!(
                "Inference backend at {} is not reachable yet",
                relay.backend.config().base_url
            );
        }
        relay
    }

    pub fn backend(&self) -> &BackendClient<T> {
        &self.backend
    }

    /// The cached reachability flag. Never touches the network.
    pub fn is_reachable(&self) -> bool {
        self.health.is_reachable()
    }

    /// Probe the backend and store the result.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> bool {
        let reachable = self.backend.probe().await;
        self.health.record_probe(reachable);
        reachable
    }

    /// Relay one prompt to the backend's default model.
    ///
    /// Callers must not pass an empty prompt.
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn send_message(&self, prompt: &str) -> RelayOutcome {
        if !self.health.is_reachable() {
            debug!("Skipping generation, backend marked unreachable");
            return RelayOutcome::Failure(FailureKind::BackendUnreachable);
        }

        let model = &self.backend.config().default_model;
        match self.backend.generate(model, prompt).await {
            Ok(response) => RelayOutcome::Success(response.response),
            Err(e) => {
                warn!("Generation with model {} failed: {}", model, e);
                RelayOutcome::Failure(FailureKind::GenerationFailed)
            }
        }
    }

    /// Send the fixed [`PING_PROMPT`] through the normal relay path.
    pub async fn ping(&self) -> RelayOutcome {
        self.send_message(PING_PROMPT).await
    }
}

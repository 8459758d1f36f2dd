//! Configuration parsing and validation for the relay
//!
//! Everything is resolved once at startup from command-line flags, each of which falls back to
//! an environment variable. Nothing is reconfigured at runtime.
use crate::alternate::AlternateConfig;
use crate::backend::BackendConfig;
use anyhow::anyhow;
use clap::{Args, Parser};
use std::time::Duration;
use url::Url;

/// Settings for the inference server, shared by the relay server and the ping tool.
#[derive(Debug, Clone, Args)]
pub struct BackendArgs {
    /// Base URL of the Ollama server.
    #[arg(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: Url,

    /// Model used for every generation request.
    #[arg(long, env = "MODEL", default_value = "qwen2.5-coder")]
    pub model: String,

    /// Deadline (in seconds) for each call to the inference server, probes included.
    #[arg(long, env = "RELAY_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,
}

impl BackendArgs {
    pub fn validate(self) -> Result<Self, anyhow::Error> {
        if self.timeout_secs == 0 {
            return Err(anyhow!("--timeout-secs must be greater than zero"));
        }
        if self.model.trim().is_empty() {
            return Err(anyhow!("--model must not be empty"));
        }
        Ok(self)
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig::builder()
            .base_url(self.ollama_url.clone())
            .default_model(self.model.clone())
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
    }
}

#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The port on which the relay will listen.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    #[command(flatten)]
    pub backend: BackendArgs,

    /// Base URL of the retrieval-augmented query service. When set, `/chat` tries it first.
    #[arg(long, env = "RAG_URL")]
    pub rag_url: Option<Url>,

    /// Deadline (in seconds) for each call to the retrieval service.
    #[arg(long, env = "RAG_TIMEOUT_SECS", default_value_t = 60)]
    pub rag_timeout_secs: u64,

    /// The port on which the metrics server will listen.
    #[arg(long, default_value_t = 9090)]
    pub metrics_port: u16,

    /// Whether to enable the metrics endpoint.
    #[arg(short = 'm', long, default_value_t = false)]
    pub metrics: bool,

    /// The prefix to use for metrics.
    #[arg(long, default_value = "ollama_relay")]
    pub metrics_prefix: String,

    /// Maximum number of idle HTTP connections to keep alive per upstream host.
    #[arg(long, default_value_t = 16)]
    pub pool_max_idle_per_host: usize,

    /// How long (in seconds) to keep idle HTTP connections alive.
    #[arg(long, default_value_t = 90)]
    pub pool_idle_timeout_secs: u64,
}

impl Config {
    pub fn validate(mut self) -> Result<Self, anyhow::Error> {
        self.backend = self.backend.validate()?;
        if self.rag_url.is_some() && self.rag_timeout_secs == 0 {
            return Err(anyhow!("--rag-timeout-secs must be greater than zero"));
        }
        if self.metrics && self.metrics_port == self.port {
            return Err(anyhow!(
                "Metrics port {} clashes with the relay port",
                self.metrics_port
            ));
        }
        Ok(self)
    }

    pub fn alternate_config(&self) -> Option<AlternateConfig> {
        self.rag_url.as_ref().map(|url| {
            AlternateConfig::builder()
                .base_url(url.clone())
                .timeout(Duration::from_secs(self.rag_timeout_secs))
                .build()
        })
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }
}

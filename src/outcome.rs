//! The single result contract handed to every caller of the relay.
use serde::Serialize;
use std::fmt;

/// Why a relay call produced no text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The cached health state says the backend is down; nothing was sent.
    BackendUnreachable,
    /// A generation call was attempted and failed (timeout, refused, bad status, bad body).
    GenerationFailed,
    /// The alternate service and the direct backend both failed.
    AllBackendsFailed,
}

impl FailureKind {
    /// Neutral, user-facing description of the failure.
    pub fn message(&self) -> &'static str {
        match self {
            FailureKind::BackendUnreachable => {
                "Unable to connect to the inference backend. Check if the service is running."
            }
            FailureKind::GenerationFailed => "The inference backend failed to answer the request.",
            FailureKind::AllBackendsFailed => {
                "Neither the retrieval service nor the inference backend could answer the request."
            }
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::BackendUnreachable => "backend unreachable",
            FailureKind::GenerationFailed => "generation failed",
            FailureKind::AllBackendsFailed => "all backends failed",
        };
        f.write_str(name)
    }
}

/// The outcome of one relayed prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Success(String),
    Failure(FailureKind),
}

impl RelayOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RelayOutcome::Success(_))
    }

    /// The generated text, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            RelayOutcome::Success(text) => Some(text),
            RelayOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            RelayOutcome::Success(_) => None,
            RelayOutcome::Failure(kind) => Some(*kind),
        }
    }
}

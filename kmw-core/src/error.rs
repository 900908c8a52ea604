use thiserror::Error;

use crate::provider::Resource;

/// Failure to obtain a resource from the vendor API.
///
/// A failed resource is never normalized; the previous snapshot value is kept.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{resource} request failed: {source}")]
    Transport {
        resource: Resource,
        #[source]
        source: reqwest::Error,
    },

    #[error("{resource} request rejected with status {status}; check the configured API key")]
    Auth { resource: Resource, status: u16 },

    #[error("{resource} request failed with status {status}: {body}")]
    Status {
        resource: Resource,
        status: u16,
        body: String,
    },

    #[error("failed to decode {resource} response: {source}")]
    Decode {
        resource: Resource,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn resource(&self) -> Resource {
        match self {
            FetchError::Transport { resource, .. }
            | FetchError::Auth { resource, .. }
            | FetchError::Status { resource, .. }
            | FetchError::Decode { resource, .. } => *resource,
        }
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("HTTP request to backend failed: {0}")]
    RequestFailed(String),

    /// The backend answered with a non-success status. `info` carries the
    /// backend's own explanation when the error body had one.
    #[error("backend rejected request with HTTP {status}{}", info_suffix(.info))]
    Rejected { status: u16, info: Option<String> },

    #[error("invalid response from backend: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Message suitable for an operator: the backend's `info` text when it
    /// gave one, otherwise the error itself.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected {
                info: Some(info), ..
            } => info.clone(),
            other => other.to_string(),
        }
    }
}

fn info_suffix(info: &Option<String>) -> String {
    info.as_deref().map(|i| format!(": {i}")).unwrap_or_default()
}

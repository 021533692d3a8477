use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("backend error: {0}")]
    Backend(#[from] metis_client::ClientError),

    #[error("cannot delete {0}: the build is locked")]
    LockedResource(String),

    #[error("unknown build {0}")]
    UnknownBuild(String),

    #[error("unknown VM {0}")]
    UnknownVm(String),

    #[error("VM {uuid} is already {state}")]
    AlreadyInState { uuid: String, state: String },

    #[error("invalid {field}: {value:?}")]
    InvalidChoice { field: &'static str, value: String },

    #[error("build request incomplete: {0}")]
    Incomplete(String),

    #[error("config error: {0}")]
    Config(String),
}

impl ConsoleError {
    /// Message suitable for an operator notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

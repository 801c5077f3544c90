#[derive(Debug)]
pub enum RepositoryError {
    NotFound,
    PermissionDenied(String),
    Status { status: u16, body: String },
    Http(String),
    Serialization(String),
    Realtime(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::NotFound => write!(f, "Row not found"),
            RepositoryError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            RepositoryError::Status { status, body } => {
                write!(f, "Unexpected status {}: {}", status, body)
            }
            RepositoryError::Http(msg) => write!(f, "HTTP error: {}", msg),
            RepositoryError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            RepositoryError::Realtime(msg) => write!(f, "Realtime error: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

impl From<reqwest::Error> for RepositoryError {
    fn from(err: reqwest::Error) -> Self {
        RepositoryError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for RepositoryError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        RepositoryError::Realtime(err.to_string())
    }
}

use crate::repositories::errors::repository_errors::RepositoryError;

#[derive(Debug)]
pub enum GameSessionServiceError {
    RepositoryError(RepositoryError),
    GameNotFound(String),
    ValidationError(String),
}

impl std::fmt::Display for GameSessionServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameSessionServiceError::RepositoryError(err) => {
                write!(f, "Repository error: {}", err)
            }
            GameSessionServiceError::GameNotFound(id) => write!(f, "Game {} not found", id),
            GameSessionServiceError::ValidationError(msg) => {
                write!(f, "Validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for GameSessionServiceError {}

impl From<RepositoryError> for GameSessionServiceError {
    fn from(err: RepositoryError) -> Self {
        GameSessionServiceError::RepositoryError(err)
    }
}

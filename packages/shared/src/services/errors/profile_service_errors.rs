use crate::repositories::errors::repository_errors::RepositoryError;
use std::fmt;

#[derive(Debug)]
pub enum ProfileServiceError {
    ProfileNotFound,
    ValidationError(String),
    RepositoryError(RepositoryError),
}

impl fmt::Display for ProfileServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProfileServiceError::ProfileNotFound => write!(f, "Profile not found"),
            ProfileServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ProfileServiceError::RepositoryError(err) => write!(f, "Repository error: {}", err),
        }
    }
}

impl std::error::Error for ProfileServiceError {}

impl From<RepositoryError> for ProfileServiceError {
    fn from(err: RepositoryError) -> Self {
        ProfileServiceError::RepositoryError(err)
    }
}

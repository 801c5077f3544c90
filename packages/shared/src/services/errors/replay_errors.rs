use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ReplayError {
    Malformed(String),
    InvalidMove { index: usize, notation: String },
    OutOfRange { ply: usize, len: usize },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReplayError::Malformed(msg) => write!(f, "Malformed replay file: {}", msg),
            ReplayError::InvalidMove { index, notation } => {
                write!(f, "Move {} ({}) cannot be replayed", index + 1, notation)
            }
            ReplayError::OutOfRange { ply, len } => {
                write!(f, "Ply {} is out of range (game has {} moves)", ply, len)
            }
        }
    }
}

impl std::error::Error for ReplayError {}

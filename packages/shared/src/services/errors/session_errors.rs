use std::fmt;

use crate::models::game::PlayerColor;

/// Reasons a gesture does not become a committed move.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveRejection {
    ReplayActive,
    Spectator,
    NotYourTurn { to_move: PlayerColor },
    GameOver,
    Illegal(String),
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MoveRejection::ReplayActive => write!(f, "Live play is disabled while replaying"),
            MoveRejection::Spectator => write!(f, "Spectators cannot move pieces"),
            MoveRejection::NotYourTurn { to_move } => write!(f, "It is {}'s turn", to_move),
            MoveRejection::GameOver => write!(f, "The game is over"),
            MoveRejection::Illegal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for MoveRejection {}

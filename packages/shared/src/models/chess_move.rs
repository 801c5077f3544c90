use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::game::PlayerColor;

/// A move the session controller accepted, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedMove {
    pub move_number: u32,
    pub mover: PlayerColor,
    pub notation: String,
    pub from_square: String,
    pub to_square: String,
    pub fen_before: String,
    pub fen_after: String,
    pub checkmate: bool,
    pub stalemate: bool,
}

/// A row of the `moves` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub id: String,
    pub game_id: String,
    pub move_number: u32,
    pub notation: String,
    pub from_square: String,
    pub to_square: String,
    pub fen_before: String,
    pub fen_after: String,
    pub created_at: DateTime<Utc>,
}

impl MoveRecord {
    pub fn new(game_id: &str, committed: &CommittedMove) -> Self {
        MoveRecord {
            id: Uuid::new_v4().to_string(),
            game_id: game_id.to_string(),
            move_number: committed.move_number,
            notation: committed.notation.clone(),
            from_square: committed.from_square.clone(),
            to_square: committed.to_square.clone(),
            fen_before: committed.fen_before.clone(),
            fen_after: committed.fen_after.clone(),
            created_at: Utc::now(),
        }
    }
}

/// One line of the visible move list.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub move_number: u32,
    pub notation: String,
    pub from_square: String,
    pub to_square: String,
    pub fen_after: String,
}

impl From<&CommittedMove> for HistoryEntry {
    fn from(committed: &CommittedMove) -> Self {
        HistoryEntry {
            move_number: committed.move_number,
            notation: committed.notation.clone(),
            from_square: committed.from_square.clone(),
            to_square: committed.to_square.clone(),
            fen_after: committed.fen_after.clone(),
        }
    }
}

impl From<&MoveRecord> for HistoryEntry {
    fn from(record: &MoveRecord) -> Self {
        HistoryEntry {
            move_number: record.move_number,
            notation: record.notation.clone(),
            from_square: record.from_square.clone(),
            to_square: record.to_square.clone(),
            fen_after: record.fen_after.clone(),
        }
    }
}

use crate::{
    models::{position::Position, replay::ReplayDocument},
    services::{chess_service::ChessService, errors::replay_errors::ReplayError},
};

/// Local-only replay of an imported move list, independent of the live game.
#[derive(Debug, Clone)]
pub struct ReplaySession {
    game_id: String,
    moves: Vec<String>,
    ply: usize,
    position: Position,
}

impl ReplaySession {
    /// Validates every notation by replaying the whole game once, then rewinds
    /// to the starting position.
    pub fn load(document: ReplayDocument) -> Result<Self, ReplayError> {
        replay_prefix(&document.moves, document.moves.len())?;

        Ok(ReplaySession {
            game_id: document.game_id,
            moves: document.moves,
            ply: 0,
            position: Position::starting(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        Self::load(ReplayDocument::from_json(json)?)
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Number of moves applied to the shown position.
    pub fn ply(&self) -> usize {
        self.ply
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Notation of the move that led to the shown position.
    pub fn current_notation(&self) -> Option<&str> {
        self.ply
            .checked_sub(1)
            .and_then(|index| self.moves.get(index))
            .map(String::as_str)
    }

    /// Position after the move at `index` (0-based), replayed from the start.
    pub fn position_after(&self, index: usize) -> Result<Position, ReplayError> {
        if index >= self.moves.len() {
            return Err(ReplayError::OutOfRange {
                ply: index + 1,
                len: self.moves.len(),
            });
        }
        replay_prefix(&self.moves, index + 1)
    }

    pub fn go_to(&mut self, ply: usize) -> Result<&Position, ReplayError> {
        if ply > self.moves.len() {
            return Err(ReplayError::OutOfRange {
                ply,
                len: self.moves.len(),
            });
        }
        self.position = replay_prefix(&self.moves, ply)?;
        self.ply = ply;
        Ok(&self.position)
    }

    /// Returns false when already at the last move.
    pub fn step_forward(&mut self) -> Result<bool, ReplayError> {
        if self.ply >= self.moves.len() {
            return Ok(false);
        }
        self.go_to(self.ply + 1)?;
        Ok(true)
    }

    /// Returns false when already at the starting position.
    pub fn step_backward(&mut self) -> Result<bool, ReplayError> {
        if self.ply == 0 {
            return Ok(false);
        }
        self.go_to(self.ply - 1)?;
        Ok(true)
    }

    pub fn to_document(&self) -> ReplayDocument {
        ReplayDocument::new(&self.game_id, self.moves.clone())
    }
}

fn replay_prefix(moves: &[String], ply: usize) -> Result<Position, ReplayError> {
    let chess_service = ChessService::new();
    let mut position = Position::starting();

    for (index, notation) in moves.iter().take(ply).enumerate() {
        position = chess_service
            .apply_san(&position, notation)
            .map_err(|_| ReplayError::InvalidMove {
                index,
                notation: notation.clone(),
            })?
            .position;
    }

    Ok(position)
}

use crate::models::chess_move::MoveRecord;
use crate::models::game::Game;

/// A row change delivered by the realtime feed for the active game.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    MoveInserted(MoveRecord),
    GameUpdated(Game),
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::position::STARTING_FEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Playing,
    Finished,
    Draw,
}

impl GameStatus {
    /// Finished and drawn games accept no further moves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameStatus::Finished | GameStatus::Draw)
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Playing => "playing",
            GameStatus::Finished => "finished",
            GameStatus::Draw => "draw",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    White,
    Black,
}

impl PlayerColor {
    pub fn opponent(&self) -> PlayerColor {
        match self {
            PlayerColor::White => PlayerColor::Black,
            PlayerColor::Black => PlayerColor::White,
        }
    }

    /// Color to move once `move_count` moves have been recorded.
    pub fn to_move_after(move_count: usize) -> PlayerColor {
        if move_count % 2 == 0 {
            PlayerColor::White
        } else {
            PlayerColor::Black
        }
    }

    /// Column holding this color's participant in the `games` table.
    pub fn seat_column(&self) -> &'static str {
        match self {
            PlayerColor::White => "white_player_id",
            PlayerColor::Black => "black_player_id",
        }
    }
}

impl From<chess::Color> for PlayerColor {
    fn from(color: chess::Color) -> Self {
        match color {
            chess::Color::White => PlayerColor::White,
            chess::Color::Black => PlayerColor::Black,
        }
    }
}

impl From<PlayerColor> for chess::Color {
    fn from(color: PlayerColor) -> Self {
        match color {
            PlayerColor::White => chess::Color::White,
            PlayerColor::Black => chess::Color::Black,
        }
    }
}

impl std::fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerColor::White => write!(f, "white"),
            PlayerColor::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub white_player_id: Option<String>,
    pub black_player_id: Option<String>,
    pub fen: String,
    pub status: GameStatus,
    pub winner_id: Option<String>,
    pub draw_offered_by: Option<PlayerColor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    pub fn new() -> Self {
        let now = Utc::now();
        Game {
            id: Uuid::new_v4().to_string(),
            white_player_id: None,
            black_player_id: None,
            fen: STARTING_FEN.to_string(),
            status: GameStatus::Waiting,
            winner_id: None,
            draw_offered_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn player_id(&self, color: PlayerColor) -> Option<&str> {
        match color {
            PlayerColor::White => self.white_player_id.as_deref(),
            PlayerColor::Black => self.black_player_id.as_deref(),
        }
    }

    pub fn color_of(&self, player_id: &str) -> Option<PlayerColor> {
        if self.white_player_id.as_deref() == Some(player_id) {
            Some(PlayerColor::White)
        } else if self.black_player_id.as_deref() == Some(player_id) {
            Some(PlayerColor::Black)
        } else {
            None
        }
    }

    pub fn has_both_players(&self) -> bool {
        self.white_player_id.is_some() && self.black_player_id.is_some()
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial update for a `games` row. `Some(None)` writes an explicit null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GameStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draw_offered_by: Option<Option<PlayerColor>>,
    pub updated_at: DateTime<Utc>,
}

impl GameUpdate {
    pub fn new() -> Self {
        GameUpdate {
            fen: None,
            status: None,
            winner_id: None,
            draw_offered_by: None,
            updated_at: Utc::now(),
        }
    }

    pub fn fen(mut self, fen: impl Into<String>) -> Self {
        self.fen = Some(fen.into());
        self
    }

    pub fn status(mut self, status: GameStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn winner(mut self, winner_id: Option<String>) -> Self {
        self.winner_id = Some(winner_id);
        self
    }

    pub fn draw_offer(mut self, offered_by: Option<PlayerColor>) -> Self {
        self.draw_offered_by = Some(offered_by);
        self
    }

    /// Applies the update to a local copy of the row.
    pub fn apply_to(&self, game: &mut Game) {
        if let Some(fen) = &self.fen {
            game.fen = fen.clone();
        }
        if let Some(status) = self.status {
            game.status = status;
        }
        if let Some(winner_id) = &self.winner_id {
            game.winner_id = winner_id.clone();
        }
        if let Some(offer) = self.draw_offered_by {
            game.draw_offered_by = offer;
        }
        game.updated_at = self.updated_at;
    }
}

impl Default for GameUpdate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game_fields() {
        let game = Game::new();

        assert!(!game.id.is_empty());
        assert_eq!(game.fen, STARTING_FEN);
        assert_eq!(game.status, GameStatus::Waiting);
        assert!(game.white_player_id.is_none());
        assert!(game.black_player_id.is_none());
        assert!(game.winner_id.is_none());
        assert!(game.draw_offered_by.is_none());
    }

    #[test]
    fn test_game_id_uniqueness() {
        let game1 = Game::new();
        let game2 = Game::new();

        assert_ne!(game1.id, game2.id);
    }

    #[test]
    fn test_color_of_player() {
        let mut game = Game::new();
        game.white_player_id = Some("alice".to_string());
        game.black_player_id = Some("bob".to_string());

        assert_eq!(game.color_of("alice"), Some(PlayerColor::White));
        assert_eq!(game.color_of("bob"), Some(PlayerColor::Black));
        assert_eq!(game.color_of("carol"), None);
        assert!(game.has_both_players());
    }

    #[test]
    fn test_enum_serialization() {
        assert_eq!(
            serde_json::to_string(&GameStatus::Playing).unwrap(),
            "\"playing\""
        );
        assert_eq!(
            serde_json::to_string(&PlayerColor::Black).unwrap(),
            "\"black\""
        );

        let status: GameStatus = serde_json::from_str("\"draw\"").unwrap();
        assert_eq!(status, GameStatus::Draw);
    }

    #[test]
    fn test_game_row_deserialization() {
        let json = r#"{
            "id": "5b7f1f4e-0000-4000-8000-000000000000",
            "white_player_id": "alice",
            "black_player_id": null,
            "fen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "status": "waiting",
            "winner_id": null,
            "draw_offered_by": "white",
            "created_at": "2024-05-01T10:00:00.123456+00:00",
            "updated_at": "2024-05-01T10:00:00+00:00"
        }"#;

        let game: Game = serde_json::from_str(json).unwrap();

        assert_eq!(game.white_player_id.as_deref(), Some("alice"));
        assert!(game.black_player_id.is_none());
        assert_eq!(game.draw_offered_by, Some(PlayerColor::White));
    }

    #[test]
    fn test_parity_decides_color_to_move() {
        assert_eq!(PlayerColor::to_move_after(0), PlayerColor::White);
        assert_eq!(PlayerColor::to_move_after(1), PlayerColor::Black);
        assert_eq!(PlayerColor::to_move_after(6), PlayerColor::White);
    }

    #[test]
    fn test_update_serializes_explicit_nulls() {
        let update = GameUpdate::new()
            .status(GameStatus::Draw)
            .winner(None)
            .draw_offer(None);

        let value = serde_json::to_value(&update).unwrap();

        assert_eq!(value["status"], "draw");
        assert!(value["winner_id"].is_null());
        assert!(value.get("winner_id").is_some());
        assert!(value.get("fen").is_none());
    }

    #[test]
    fn test_update_apply_to() {
        let mut game = Game::new();
        game.draw_offered_by = Some(PlayerColor::Black);

        GameUpdate::new()
            .status(GameStatus::Playing)
            .draw_offer(None)
            .apply_to(&mut game);

        assert_eq!(game.status, GameStatus::Playing);
        assert!(game.draw_offered_by.is_none());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(GameStatus::Finished.is_terminal());
        assert!(GameStatus::Draw.is_terminal());
        assert!(!GameStatus::Waiting.is_terminal());
        assert!(!GameStatus::Playing.is_terminal());
    }
}

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    models::{
        chess_move::{CommittedMove, MoveRecord},
        game::{Game, GameStatus, GameUpdate, PlayerColor},
        replay::ReplayDocument,
    },
    repositories::{
        errors::repository_errors::RepositoryError, game_repository::GameRepository,
        move_repository::MoveRepository,
    },
    services::{
        errors::game_session_service_errors::GameSessionServiceError,
        session_controller::PlayerRole,
    },
};

/// A game row together with its move log, as fetched on entry.
#[derive(Debug, Clone)]
pub struct EnteredGame {
    pub game: Game,
    pub moves: Vec<MoveRecord>,
    pub role: PlayerRole,
}

#[derive(Clone)]
pub struct GameSessionService {
    games: Arc<dyn GameRepository + Send + Sync>,
    moves: Arc<dyn MoveRepository + Send + Sync>,
}

impl GameSessionService {
    pub fn new(
        games: Arc<dyn GameRepository + Send + Sync>,
        moves: Arc<dyn MoveRepository + Send + Sync>,
    ) -> Self {
        GameSessionService { games, moves }
    }

    /// Opens a new match with the creator seated as white.
    pub async fn create_game(&self, creator_id: &str) -> Result<Game, GameSessionServiceError> {
        if creator_id.is_empty() {
            return Err(GameSessionServiceError::ValidationError(
                "Creator ID cannot be empty".to_string(),
            ));
        }

        let mut game = Game::new();
        game.white_player_id = Some(creator_id.to_string());
        let created = self.games.create_game(&game).await?;
        info!("Created game {}", created.id);
        Ok(created)
    }

    pub async fn get_game(&self, game_id: &str) -> Result<Game, GameSessionServiceError> {
        if game_id.is_empty() {
            return Err(GameSessionServiceError::ValidationError(
                "Game ID cannot be empty".to_string(),
            ));
        }
        self.games.get_game(game_id).await.map_err(|e| match e {
            RepositoryError::NotFound => GameSessionServiceError::GameNotFound(game_id.to_string()),
            _ => GameSessionServiceError::from(e),
        })
    }

    pub async fn load_game(
        &self,
        game_id: &str,
    ) -> Result<(Game, Vec<MoveRecord>), GameSessionServiceError> {
        let game = self.get_game(game_id).await?;
        let moves = self.moves.list_moves(game_id).await?;
        Ok((game, moves))
    }

    /// Resolves the viewer's role: a stored seat, else the first empty seat
    /// they manage to claim, else spectator.
    pub async fn enter_game(
        &self,
        game_id: &str,
        player_id: &str,
    ) -> Result<EnteredGame, GameSessionServiceError> {
        if player_id.is_empty() {
            return Err(GameSessionServiceError::ValidationError(
                "Player ID cannot be empty".to_string(),
            ));
        }

        let mut game = self.get_game(game_id).await?;
        let mut role = game.color_of(player_id).map(PlayerRole::Player);

        if role.is_none() {
            for color in [PlayerColor::White, PlayerColor::Black] {
                if game.player_id(color).is_some() {
                    continue;
                }
                match self.games.claim_seat(game_id, color, player_id).await? {
                    Some(claimed) => {
                        info!("Player {} joined game {} as {}", player_id, game_id, color);
                        game = claimed;
                        role = Some(PlayerRole::Player(color));
                        break;
                    }
                    None => {
                        warn!("Lost the race for the {} seat of game {}", color, game_id);
                        game = self.get_game(game_id).await?;
                    }
                }
            }

            if role.is_some() && game.has_both_players() && game.status == GameStatus::Waiting {
                game = self
                    .games
                    .update_game(game_id, &GameUpdate::new().status(GameStatus::Playing))
                    .await?;
            }
        }

        let moves = self.moves.list_moves(game_id).await?;
        Ok(EnteredGame {
            game,
            moves,
            role: role.unwrap_or(PlayerRole::Spectator),
        })
    }

    /// Persists a committed move and the resulting game row.
    pub async fn record_move(
        &self,
        game: &Game,
        committed: &CommittedMove,
    ) -> Result<Game, GameSessionServiceError> {
        self.moves
            .insert_move(&MoveRecord::new(&game.id, committed))
            .await?;

        let mut update = GameUpdate::new().fen(committed.fen_after.clone());
        if committed.checkmate {
            update = update
                .status(GameStatus::Finished)
                .winner(game.player_id(committed.mover).map(str::to_string))
                .draw_offer(None);
        } else if committed.stalemate {
            update = update
                .status(GameStatus::Draw)
                .winner(None)
                .draw_offer(None);
        }

        Ok(self.games.update_game(&game.id, &update).await?)
    }

    pub async fn offer_draw(
        &self,
        game_id: &str,
        color: PlayerColor,
    ) -> Result<Game, GameSessionServiceError> {
        let update = GameUpdate::new().draw_offer(Some(color));
        Ok(self.games.update_game(game_id, &update).await?)
    }

    pub async fn decline_draw(&self, game_id: &str) -> Result<Game, GameSessionServiceError> {
        let update = GameUpdate::new().draw_offer(None);
        Ok(self.games.update_game(game_id, &update).await?)
    }

    pub async fn accept_draw(&self, game_id: &str) -> Result<Game, GameSessionServiceError> {
        let update = GameUpdate::new()
            .status(GameStatus::Draw)
            .winner(None)
            .draw_offer(None);
        let game = self.games.update_game(game_id, &update).await?;
        self.discard_moves(game_id).await;
        Ok(game)
    }

    /// Ends the game with the opponent of `color` as winner.
    pub async fn resign(
        &self,
        game: &Game,
        color: PlayerColor,
    ) -> Result<Game, GameSessionServiceError> {
        let update = GameUpdate::new()
            .status(GameStatus::Finished)
            .winner(game.player_id(color.opponent()).map(str::to_string))
            .draw_offer(None);
        let updated = self.games.update_game(&game.id, &update).await?;
        info!("{} resigned game {}", color, game.id);
        self.discard_moves(&game.id).await;
        Ok(updated)
    }

    /// Run when a viewer leaves. Drops the move log of a game still in play.
    /// Returns whether the log was discarded.
    pub async fn abandon(&self, game_id: &str) -> Result<bool, GameSessionServiceError> {
        let game = self.get_game(game_id).await?;
        if game.status != GameStatus::Playing {
            return Ok(false);
        }
        self.discard_moves(game_id).await;
        Ok(true)
    }

    pub async fn export_game(&self, game_id: &str) -> Result<ReplayDocument, GameSessionServiceError> {
        let moves = self.moves.list_moves(game_id).await?;
        Ok(ReplayDocument::new(
            game_id,
            moves.into_iter().map(|m| m.notation).collect(),
        ))
    }

    async fn discard_moves(&self, game_id: &str) {
        if let Err(e) = self.moves.delete_moves(game_id).await {
            warn!("Could not delete moves of game {}: {}", game_id, e);
        }
    }
}

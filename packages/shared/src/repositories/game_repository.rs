use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use tracing::debug;

use crate::models::game::{Game, GameUpdate, PlayerColor};
use crate::repositories::errors::repository_errors::RepositoryError;
use crate::repositories::postgrest::{eq, PostgrestClient, RETURN_REPRESENTATION};

#[cfg(test)]
use mockall::automock;

const GAMES_TABLE: &str = "games";

pub struct PostgrestGameRepository {
    pub client: PostgrestClient,
}

impl PostgrestGameRepository {
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
#[cfg_attr(test, automock)]
pub trait GameRepository: Send + Sync {
    async fn create_game(&self, game: &Game) -> Result<Game, RepositoryError>;
    async fn get_game(&self, game_id: &str) -> Result<Game, RepositoryError>;
    async fn update_game(&self, game_id: &str, update: &GameUpdate)
        -> Result<Game, RepositoryError>;

    /// Writes `player_id` into the seat only while it is still empty.
    /// `Ok(None)` means someone else took it first.
    async fn claim_seat(
        &self,
        game_id: &str,
        color: PlayerColor,
        player_id: &str,
    ) -> Result<Option<Game>, RepositoryError>;
}

fn first_row(rows: Vec<Game>) -> Result<Game, RepositoryError> {
    rows.into_iter().next().ok_or(RepositoryError::NotFound)
}

#[async_trait]
impl GameRepository for PostgrestGameRepository {
    async fn create_game(&self, game: &Game) -> Result<Game, RepositoryError> {
        let request = self
            .client
            .request(Method::POST, GAMES_TABLE, &[])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(game);

        first_row(self.client.fetch_rows(request).await?)
    }

    async fn get_game(&self, game_id: &str) -> Result<Game, RepositoryError> {
        let request = self.client.request(
            Method::GET,
            GAMES_TABLE,
            &[("id", eq(game_id)), ("select", "*".to_string())],
        );

        first_row(self.client.fetch_rows(request).await?)
    }

    async fn update_game(
        &self,
        game_id: &str,
        update: &GameUpdate,
    ) -> Result<Game, RepositoryError> {
        let request = self
            .client
            .request(Method::PATCH, GAMES_TABLE, &[("id", eq(game_id))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(update);

        first_row(self.client.fetch_rows(request).await?)
    }

    async fn claim_seat(
        &self,
        game_id: &str,
        color: PlayerColor,
        player_id: &str,
    ) -> Result<Option<Game>, RepositoryError> {
        let column = color.seat_column();
        let request = self
            .client
            .request(
                Method::PATCH,
                GAMES_TABLE,
                &[("id", eq(game_id)), (column, "is.null".to_string())],
            )
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&json!({ column: player_id, "updated_at": chrono::Utc::now() }));

        let claimed = self.client.fetch_rows::<Game>(request).await?;
        if claimed.is_empty() {
            debug!("Seat {} of game {} was already taken", color, game_id);
        }
        Ok(claimed.into_iter().next())
    }
}

use async_trait::async_trait;
use reqwest::Method;

use crate::models::chess_move::MoveRecord;
use crate::repositories::errors::repository_errors::RepositoryError;
use crate::repositories::postgrest::{eq, PostgrestClient, RETURN_REPRESENTATION};

#[cfg(test)]
use mockall::automock;

const MOVES_TABLE: &str = "moves";

pub struct PostgrestMoveRepository {
    pub client: PostgrestClient,
}

impl PostgrestMoveRepository {
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
#[cfg_attr(test, automock)]
pub trait MoveRepository: Send + Sync {
    /// Moves of `game_id` in `move_number` order.
    async fn list_moves(&self, game_id: &str) -> Result<Vec<MoveRecord>, RepositoryError>;
    async fn insert_move(&self, record: &MoveRecord) -> Result<MoveRecord, RepositoryError>;
    async fn delete_moves(&self, game_id: &str) -> Result<(), RepositoryError>;
}

#[async_trait]
impl MoveRepository for PostgrestMoveRepository {
    async fn list_moves(&self, game_id: &str) -> Result<Vec<MoveRecord>, RepositoryError> {
        let request = self.client.request(
            Method::GET,
            MOVES_TABLE,
            &[
                ("game_id", eq(game_id)),
                ("order", "move_number.asc".to_string()),
            ],
        );

        self.client.fetch_rows(request).await
    }

    async fn insert_move(&self, record: &MoveRecord) -> Result<MoveRecord, RepositoryError> {
        let request = self
            .client
            .request(Method::POST, MOVES_TABLE, &[])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(record);

        self.client
            .fetch_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete_moves(&self, game_id: &str) -> Result<(), RepositoryError> {
        let request = self
            .client
            .request(Method::DELETE, MOVES_TABLE, &[("game_id", eq(game_id))]);

        self.client.execute(request).await?;
        Ok(())
    }
}

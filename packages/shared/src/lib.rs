pub mod config;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::game::{Game, GameStatus, PlayerColor};
pub use models::position::Position;

pub mod errors;
pub mod game_repository;
pub mod move_repository;
pub mod postgrest;
pub mod profile_repository;
pub mod realtime_repository;

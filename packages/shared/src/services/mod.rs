pub mod chess_service;
pub mod errors;
pub mod game_session_service;
pub mod notation;
pub mod profile_service;
pub mod replay_service;
pub mod session_controller;
pub mod session_service;

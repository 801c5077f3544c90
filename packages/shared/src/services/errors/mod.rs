pub mod chess_service_errors;
pub mod game_session_service_errors;
pub mod profile_service_errors;
pub mod replay_errors;
pub mod session_errors;

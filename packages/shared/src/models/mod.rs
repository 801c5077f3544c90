pub mod change_event;
pub mod chess_move;
pub mod game;
pub mod position;
pub mod profile;
pub mod replay;

//! Standard Algebraic Notation for the moves the chess service accepts.

use chess::{BoardStatus, ChessMove, Piece, Square};

use crate::models::position::Position;

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

fn file_char(square: Square) -> char {
    (b'a' + square.get_file().to_index() as u8) as char
}

fn rank_char(square: Square) -> char {
    (b'1' + square.get_rank().to_index() as u8) as char
}

fn disambiguation(
    position: &Position,
    chess_move: ChessMove,
    piece: Piece,
    candidates: &[ChessMove],
) -> String {
    let from = chess_move.get_source();
    let board = position.board();
    let mut rivals: Vec<Square> = candidates
        .iter()
        .filter(|c| c.get_dest() == chess_move.get_dest() && c.get_source() != from)
        .filter(|c| board.piece_on(c.get_source()) == Some(piece))
        .map(|c| c.get_source())
        .collect();
    rivals.dedup();

    if rivals.is_empty() {
        String::new()
    } else if !rivals.iter().any(|s| s.get_file() == from.get_file()) {
        file_char(from).to_string()
    } else if !rivals.iter().any(|s| s.get_rank() == from.get_rank()) {
        rank_char(from).to_string()
    } else {
        from.to_string()
    }
}

/// Encodes `chess_move` played from `position`. `candidates` is every move the
/// side to move may play, used for disambiguation.
pub fn to_san(position: &Position, chess_move: ChessMove, candidates: &[ChessMove]) -> String {
    let board = position.board();
    let from = chess_move.get_source();
    let to = chess_move.get_dest();

    let piece = match board.piece_on(from) {
        Some(piece) => piece,
        None => return format!("{}{}", from, to),
    };

    let file_distance = (from.get_file().to_index() as i32 - to.get_file().to_index() as i32).abs();
    let mut san = String::new();

    if piece == Piece::King && file_distance == 2 {
        if to.get_file().to_index() > from.get_file().to_index() {
            san.push_str("O-O");
        } else {
            san.push_str("O-O-O");
        }
    } else {
        let capture =
            board.piece_on(to).is_some() || (piece == Piece::Pawn && file_distance != 0);

        if piece == Piece::Pawn {
            if capture {
                san.push(file_char(from));
            }
        } else {
            san.push(piece_letter(piece));
            san.push_str(&disambiguation(position, chess_move, piece, candidates));
        }
        if capture {
            san.push('x');
        }
        san.push_str(&to.to_string());
        if let Some(promotion) = chess_move.get_promotion() {
            san.push('=');
            san.push(piece_letter(promotion));
        }
    }

    let after = board.make_move_new(chess_move);
    if after.status() == BoardStatus::Checkmate {
        san.push('#');
    } else if after.checkers().popcnt() > 0 {
        san.push('+');
    }

    san
}

/// Strips annotations and alternative spellings so two SAN strings compare.
fn normalize(san: &str) -> String {
    san.trim()
        .trim_end_matches(|c| matches!(c, '+' | '#' | '!' | '?'))
        .replace("0-0-0", "O-O-O")
        .replace("0-0", "O-O")
        .replace('=', "")
}

/// Finds the candidate move whose SAN matches `san`.
pub fn from_san(position: &Position, san: &str, candidates: &[ChessMove]) -> Option<ChessMove> {
    let wanted = normalize(san);
    if wanted.is_empty() {
        return None;
    }

    candidates
        .iter()
        .copied()
        .find(|candidate| normalize(&to_san(position, *candidate, candidates)) == wanted)
}

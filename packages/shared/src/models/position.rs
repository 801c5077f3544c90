use std::fmt;
use std::str::FromStr;

use chess::{Board, BoardBuilder, ChessMove, Color, File, Piece, Rank, Square, ALL_SQUARES};

use crate::services::errors::chess_service_errors::ChessServiceError;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A board together with the move counters the rules library does not track.
///
/// `chess::Board` always prints `0 1` for the halfmove clock and fullmove
/// number, so both are carried here to keep the FEN well-formed.
#[derive(Clone, Copy)]
pub struct Position {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Position {
    pub fn starting() -> Self {
        Position {
            board: Board::default(),
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Parses a FEN string.
    ///
    /// A position reached by a king stepping onto an attacked square leaves the
    /// side not to move in check, which `chess::Board` refuses to load. Such a
    /// position is rebuilt as the result of that king step instead.
    pub fn from_fen(fen: &str) -> Result<Self, ChessServiceError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(ChessServiceError::InvalidPosition(format!(
                "Invalid FEN: {}",
                fen
            )));
        }

        let halfmove_clock = parse_counter(fields.get(4), 0, fen)?;
        let fullmove_number = parse_counter(fields.get(5), 1, fen)?;
        let normalized = format!(
            "{} {} {}",
            fields[..4].join(" "),
            halfmove_clock,
            fullmove_number
        );

        let setup = BoardBuilder::from_str(&normalized)
            .map_err(|e| ChessServiceError::InvalidPosition(format!("Invalid FEN: {}", e)))?;

        let board = match Board::try_from(&setup) {
            Ok(board) => board,
            Err(e) => reconstruct_after_king_step(&setup).ok_or_else(|| {
                ChessServiceError::InvalidPosition(format!("Invalid FEN: {}", e))
            })?,
        };

        Ok(Position {
            board,
            halfmove_clock,
            fullmove_number,
        })
    }

    pub fn fen(&self) -> String {
        format!(
            "{} {} {}",
            placement_fields(&self.board.to_string()),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn piece_at(&self, square: Square) -> Option<(Piece, Color)> {
        self.board.piece_on(square).zip(self.board.color_on(square))
    }

    /// Plays `chess_move` without checking legality and updates the counters.
    pub(crate) fn advance(&self, chess_move: ChessMove, reset_clock: bool) -> Position {
        let board = self.board.make_move_new(chess_move);
        let halfmove_clock = if reset_clock {
            0
        } else {
            self.halfmove_clock + 1
        };
        let fullmove_number = if self.board.side_to_move() == Color::Black {
            self.fullmove_number + 1
        } else {
            self.fullmove_number
        };

        Position {
            board,
            halfmove_clock,
            fullmove_number,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.fen() == other.fen()
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Position").field(&self.fen()).finish()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fen())
    }
}

/// The up to eight squares a king on `square` could step to.
pub fn neighbours(square: Square) -> Vec<Square> {
    let rank = square.get_rank().to_index() as i32;
    let file = square.get_file().to_index() as i32;
    let mut squares = Vec::with_capacity(8);

    for rank_offset in -1..=1 {
        for file_offset in -1..=1 {
            if rank_offset == 0 && file_offset == 0 {
                continue;
            }
            let (r, f) = (rank + rank_offset, file + file_offset);
            if (0..8).contains(&r) && (0..8).contains(&f) {
                squares.push(Square::make_square(
                    Rank::from_index(r as usize),
                    File::from_index(f as usize),
                ));
            }
        }
    }

    squares
}

fn parse_counter(field: Option<&&str>, default: u32, fen: &str) -> Result<u32, ChessServiceError> {
    match field {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| {
            ChessServiceError::InvalidPosition(format!("Invalid move counter in FEN: {}", fen))
        }),
    }
}

/// Placement, side to move, castling and en-passant fields of a FEN.
fn placement_fields(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

fn reconstruct_after_king_step(setup: &BoardBuilder) -> Option<Board> {
    let mover = !setup.get_side_to_move();
    let king = ALL_SQUARES
        .iter()
        .copied()
        .find(|square| setup[*square] == Some((Piece::King, mover)))?;
    let target = placement_fields(&setup.to_string());

    neighbours(king)
        .into_iter()
        .filter(|square| setup[*square].is_none())
        .find_map(|origin| {
            let mut prior = setup.clone();
            prior
                .clear_square(king)
                .piece(origin, Piece::King, mover)
                .side_to_move(mover)
                .en_passant(None);
            let board = Board::try_from(&prior).ok()?;
            let after = board.make_move_new(ChessMove::new(origin, king, None));
            (placement_fields(&after.to_string()) == target).then_some(after)
        })
}

use chess::{BoardStatus, ChessMove, Color, MoveGen, Piece, Rank, Square};
use std::str::FromStr;

use crate::{
    models::position::{neighbours, Position},
    services::{errors::chess_service_errors::ChessServiceError, notation},
};

/// Result of applying a move to a position.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedMove {
    pub san: String,
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
    pub fen_before: String,
    pub fen_after: String,
    pub position: Position,
    pub checkmate: bool,
    pub stalemate: bool,
    /// The move was only accepted through the king-step house rule.
    pub king_step: bool,
}

/// Base chess rules composed with the king-step house rule: a king may step to
/// any adjacent square that is empty or holds an enemy piece, even an attacked one.
#[derive(Clone, Default)]
pub struct ChessService;

impl ChessService {
    pub fn new() -> Self {
        ChessService
    }

    /// Moves the base rules allow. A king left attacked by a king step is never
    /// capturable.
    pub fn legal_moves(&self, position: &Position) -> Vec<ChessMove> {
        let board = position.board();
        MoveGen::new_legal(board)
            .filter(|m| board.piece_on(m.get_dest()) != Some(Piece::King))
            .collect()
    }

    /// The house-rule predicate.
    pub fn is_king_step(&self, position: &Position, from: Square, to: Square) -> bool {
        let board = position.board();
        let side = board.side_to_move();

        if board.piece_on(from) != Some(Piece::King) || board.color_on(from) != Some(side) {
            return false;
        }
        if !neighbours(from).contains(&to) {
            return false;
        }

        match position.piece_at(to) {
            None => true,
            Some((Piece::King, _)) => false,
            Some((_, color)) => color != side,
        }
    }

    pub fn king_steps(&self, position: &Position, from: Square) -> Vec<Square> {
        neighbours(from)
            .into_iter()
            .filter(|to| self.is_king_step(position, from, *to))
            .collect()
    }

    /// Every move the side to move may play: legal moves plus king steps.
    pub fn candidate_moves(&self, position: &Position) -> Vec<ChessMove> {
        let mut moves = self.legal_moves(position);
        let board = position.board();
        let king = board.king_square(board.side_to_move());

        for to in self.king_steps(position, king) {
            let step = ChessMove::new(king, to, None);
            if !moves.contains(&step) {
                moves.push(step);
            }
        }

        moves
    }

    /// Squares the piece on `from` may move to, de-duplicated and sorted.
    pub fn legal_destinations(&self, position: &Position, from: Square) -> Vec<Square> {
        let mut destinations: Vec<Square> = self
            .legal_moves(position)
            .into_iter()
            .filter(|m| m.get_source() == from)
            .map(|m| m.get_dest())
            .chain(self.king_steps(position, from))
            .collect();
        destinations.sort_by_key(|square| square.to_index());
        destinations.dedup();
        destinations
    }

    /// Validate and apply a move. A pawn reaching the last rank promotes to a
    /// queen unless another piece is given.
    pub fn apply(
        &self,
        position: &Position,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Result<AppliedMove, ChessServiceError> {
        let board = position.board();
        let side = board.side_to_move();

        let piece = board.piece_on(from).ok_or_else(|| {
            ChessServiceError::IllegalMove(format!("No piece on {}", from))
        })?;
        if board.color_on(from) != Some(side) {
            return Err(ChessServiceError::IllegalMove(format!(
                "The piece on {} does not belong to the side to move",
                from
            )));
        }

        let promotion = if reaches_last_rank(piece, side, to) {
            Some(promotion.unwrap_or(Piece::Queen))
        } else {
            None
        };
        let chess_move = ChessMove::new(from, to, promotion);
        let legal = self.legal_moves(position);

        let (chess_move, reset_clock, king_step) = if legal.contains(&chess_move) {
            let reset = piece == Piece::Pawn || board.piece_on(to).is_some();
            (chess_move, reset, false)
        } else if self.is_king_step(position, from, to) {
            (ChessMove::new(from, to, None), true, true)
        } else {
            return Err(ChessServiceError::IllegalMove(format!(
                "{}{} is not legal",
                from, to
            )));
        };

        Ok(self.commit(position, chess_move, reset_clock, king_step))
    }

    /// Apply a move given in SAN.
    pub fn apply_san(
        &self,
        position: &Position,
        san: &str,
    ) -> Result<AppliedMove, ChessServiceError> {
        let candidates = self.candidate_moves(position);
        let chess_move = notation::from_san(position, san, &candidates)
            .ok_or_else(|| ChessServiceError::IllegalMove(format!("{} is not playable", san)))?;

        self.apply(
            position,
            chess_move.get_source(),
            chess_move.get_dest(),
            chess_move.get_promotion(),
        )
    }

    /// Plays `moves` from the standard starting position.
    pub fn replay<S: AsRef<str>>(&self, moves: &[S]) -> Result<Position, ChessServiceError> {
        moves.iter().try_fold(Position::starting(), |position, san| {
            self.apply_san(&position, san.as_ref())
                .map(|applied| applied.position)
        })
    }

    pub fn parse_square(value: &str) -> Result<Square, ChessServiceError> {
        Square::from_str(&value.trim().to_lowercase()).map_err(|_| {
            ChessServiceError::ValidationError(format!("Invalid square: {}", value))
        })
    }

    pub fn parse_promotion(value: &str) -> Result<Piece, ChessServiceError> {
        match value.trim().to_lowercase().as_str() {
            "q" => Ok(Piece::Queen),
            "r" => Ok(Piece::Rook),
            "b" => Ok(Piece::Bishop),
            "n" => Ok(Piece::Knight),
            _ => Err(ChessServiceError::ValidationError(
                "Invalid promotion piece".to_string(),
            )),
        }
    }

    fn commit(
        &self,
        position: &Position,
        chess_move: ChessMove,
        reset_clock: bool,
        king_step: bool,
    ) -> AppliedMove {
        let candidates = self.candidate_moves(position);
        let san = notation::to_san(position, chess_move, &candidates);
        let next = position.advance(chess_move, reset_clock);
        let status = next.board().status();

        AppliedMove {
            san,
            from: chess_move.get_source(),
            to: chess_move.get_dest(),
            promotion: chess_move.get_promotion(),
            fen_before: position.fen(),
            fen_after: next.fen(),
            position: next,
            checkmate: status == BoardStatus::Checkmate,
            stalemate: status == BoardStatus::Stalemate,
            king_step,
        }
    }
}

fn reaches_last_rank(piece: Piece, side: Color, to: Square) -> bool {
    piece == Piece::Pawn
        && match side {
            Color::White => to.get_rank() == Rank::Eighth,
            Color::Black => to.get_rank() == Rank::First,
        }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn position(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    #[test]
    fn test_apply_matches_rules_engine_position() {
        let chess_service = ChessService::new();
        let start = Position::starting();

        let applied = chess_service
            .apply(&start, Square::E2, Square::E4, None)
            .unwrap();
        let expected = start.board().make_move_new(ChessMove::new(Square::E2, Square::E4, None));

        assert_eq!(applied.san, "e4");
        assert!(!applied.king_step);
        assert_eq!(
            applied.position.board().to_string(),
            expected.to_string()
        );
        assert_eq!(
            applied.fen_after,
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_apply_rejects_illegal_move() {
        let chess_service = ChessService::new();

        let result = chess_service.apply(&Position::starting(), Square::E2, Square::E5, None);

        match result.unwrap_err() {
            ChessServiceError::IllegalMove(_) => {}
            other => panic!("Expected IllegalMove error, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_rejects_opponent_piece() {
        let chess_service = ChessService::new();

        let result = chess_service.apply(&Position::starting(), Square::E7, Square::E5, None);

        assert!(matches!(result, Err(ChessServiceError::IllegalMove(_))));
    }

    #[test]
    fn test_halfmove_clock_counts_quiet_moves() {
        let chess_service = ChessService::new();
        let after = chess_service.replay(&["Nf3", "Nf6", "Ng1"]).unwrap();

        assert_eq!(after.halfmove_clock(), 3);
        assert_eq!(after.fullmove_number(), 2);
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let chess_service = ChessService::new();
        let start = position("8/P6k/8/8/8/8/8/K7 w - - 0 1");

        let applied = chess_service.apply(&start, Square::A7, Square::A8, None).unwrap();

        assert_eq!(applied.promotion, Some(Piece::Queen));
        assert!(applied.fen_after.starts_with("Q7/"));
    }

    #[test]
    fn test_underpromotion() {
        let chess_service = ChessService::new();
        let start = position("8/P6k/8/8/8/8/8/K7 w - - 0 1");

        let applied = chess_service
            .apply(&start, Square::A7, Square::A8, Some(Piece::Knight))
            .unwrap();

        assert_eq!(applied.san, "a8=N");
    }

    #[rstest]
    #[case(Square::D3)]
    #[case(Square::D4)]
    #[case(Square::D5)]
    #[case(Square::E3)]
    #[case(Square::E5)]
    #[case(Square::F3)]
    #[case(Square::F4)]
    #[case(Square::F5)]
    fn test_king_step_commits_onto_attacked_square(#[case] to: Square) {
        // Rooks on d8, f8, a5 and a3 cover every square around the king on e4.
        let chess_service = ChessService::new();
        let start = position("3r1r1k/8/8/r7/4K3/r7/7P/8 w - - 7 30");

        let applied = chess_service.apply(&start, Square::E4, to, None).unwrap();

        assert_eq!(applied.position.side_to_move(), Color::Black);
        assert_eq!(applied.position.halfmove_clock(), 0);
        assert_eq!(applied.position.fullmove_number(), 30);
        assert_eq!(applied.position.piece_at(to), Some((Piece::King, Color::White)));
    }

    #[test]
    fn test_king_step_captures_defended_piece() {
        let chess_service = ChessService::new();
        // The knight on d5 is defended by the pawn on c6.
        let start = position("4k3/8/2p5/3n4/4K3/8/8/8 w - - 3 40");

        let applied = chess_service.apply(&start, Square::E4, Square::D5, None).unwrap();

        assert!(applied.king_step);
        assert_eq!(applied.san, "Kxd5");
        assert_eq!(applied.position.halfmove_clock(), 0);
    }

    #[test]
    fn test_king_step_leaves_castling_rights_behind() {
        let chess_service = ChessService::new();
        // Black bishop on a6 covers f1.
        let start = position("4k3/8/b7/8/8/8/8/R3K2R w KQ - 0 1");

        let applied = chess_service.apply(&start, Square::E1, Square::F1, None).unwrap();

        assert!(applied.king_step);
        assert!(applied.fen_after.contains(" b - - "));
    }

    #[test]
    fn test_king_step_predicate_limits() {
        let chess_service = ChessService::new();
        let start = position("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");

        assert!(!chess_service.is_king_step(&start, Square::E1, Square::E2));
        assert!(!chess_service.is_king_step(&start, Square::E1, Square::E3));
        assert!(!chess_service.is_king_step(&start, Square::E8, Square::E7));
        assert!(chess_service.is_king_step(&start, Square::E1, Square::D2));
    }

    #[test]
    fn test_king_step_never_takes_the_enemy_king() {
        let chess_service = ChessService::new();
        let start = position("8/8/8/8/8/3k4/8/4K3 w - - 0 1");

        let applied = chess_service
            .apply(&start, Square::E1, Square::E2, None)
            .unwrap();

        assert!(applied.king_step);
        assert!(!chess_service.is_king_step(&applied.position, Square::D3, Square::E2));
        assert!(!chess_service
            .legal_destinations(&applied.position, Square::D3)
            .contains(&Square::E2));
    }

    #[test]
    fn test_position_after_king_step_reloads_and_continues() {
        let chess_service = ChessService::new();
        let start = position("4k3/8/8/8/8/3q4/8/4K3 w - - 0 1");
        let applied = chess_service.apply(&start, Square::E1, Square::E2, None).unwrap();

        let reloaded = Position::from_fen(&applied.fen_after).unwrap();
        let legal = chess_service.legal_moves(&reloaded);

        assert_eq!(reloaded.fen(), applied.fen_after);
        assert!(!legal.is_empty());
        assert!(legal.iter().all(|m| m.get_dest() != Square::E2));
    }

    #[test]
    fn test_legal_destinations_include_king_steps() {
        let chess_service = ChessService::new();
        let start = position("4k3/8/8/8/8/8/3q4/4K3 w - - 0 1");

        let destinations = chess_service.legal_destinations(&start, Square::E1);

        // Kxd2 and Kf1 are ordinary moves; d1, e2 and f2 are house-rule steps.
        assert_eq!(
            destinations,
            vec![Square::D1, Square::F1, Square::D2, Square::E2, Square::F2]
        );
    }

    #[test]
    fn test_mated_king_may_still_step() {
        let chess_service = ChessService::new();
        let mated = chess_service
            .replay(&["f3", "e5", "g4", "Qh4#"])
            .unwrap();

        let applied = chess_service
            .apply(&mated, Square::E1, Square::F2, None)
            .unwrap();

        assert!(applied.king_step);
        assert_eq!(applied.position.side_to_move(), Color::Black);
        assert_eq!(applied.position.halfmove_clock(), 0);
        assert_eq!(
            applied.position.piece_at(Square::F2),
            Some((Piece::King, Color::White))
        );
    }

    #[test]
    fn test_mated_side_cannot_play_ordinary_moves() {
        let chess_service = ChessService::new();
        let mated = chess_service
            .replay(&["f3", "e5", "g4", "Qh4#"])
            .unwrap();

        let result = chess_service.apply(&mated, Square::A2, Square::A3, None);

        assert!(matches!(result, Err(ChessServiceError::IllegalMove(_))));
    }

    #[test]
    fn test_checkmate_flag() {
        let chess_service = ChessService::new();
        let before = chess_service.replay(&["f3", "e5", "g4"]).unwrap();

        let applied = chess_service.apply_san(&before, "Qh4").unwrap();

        assert!(applied.checkmate);
        assert_eq!(applied.san, "Qh4#");
    }

    #[test]
    fn test_parse_square_and_promotion() {
        assert_eq!(ChessService::parse_square("E4").unwrap(), Square::E4);
        assert!(ChessService::parse_square("z9").is_err());
        assert_eq!(ChessService::parse_promotion("n").unwrap(), Piece::Knight);
        assert!(ChessService::parse_promotion("k").is_err());
    }
}

use chess::{Piece, Square};
use tracing::{debug, info, warn};

use crate::{
    models::{
        chess_move::{CommittedMove, HistoryEntry, MoveRecord},
        game::{Game, GameStatus, PlayerColor},
        position::Position,
        replay::ReplayDocument,
    },
    services::{
        chess_service::ChessService,
        errors::{
            chess_service_errors::ChessServiceError, replay_errors::ReplayError,
            session_errors::MoveRejection,
        },
        replay_service::ReplaySession,
    },
};

pub const LOCAL_GAME_ID: &str = "local";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerRole {
    Player(PlayerColor),
    Spectator,
}

impl PlayerRole {
    pub fn color(&self) -> Option<PlayerColor> {
        match self {
            PlayerRole::Player(color) => Some(*color),
            PlayerRole::Spectator => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionMode {
    Local,
    Online { game_id: String, role: PlayerRole },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub from: Square,
    pub targets: Vec<Square>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Selected(Selection),
    Reselected(Selection),
    Moved(CommittedMove),
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteMoveOutcome {
    Applied,
    Duplicate,
}

/// Owns the visible board of one session and decides which gestures become moves.
pub struct GameSessionController {
    chess: ChessService,
    mode: SessionMode,
    position: Position,
    history: Vec<HistoryEntry>,
    status: GameStatus,
    draw_offered_by: Option<PlayerColor>,
    selection: Option<Selection>,
    annotations: Vec<Square>,
    replay: Option<ReplaySession>,
}

impl GameSessionController {
    /// Sandbox board: either side may move when it is their turn.
    pub fn local() -> Self {
        GameSessionController {
            chess: ChessService::new(),
            mode: SessionMode::Local,
            position: Position::starting(),
            history: Vec::new(),
            status: GameStatus::Playing,
            draw_offered_by: None,
            selection: None,
            annotations: Vec::new(),
            replay: None,
        }
    }

    pub fn online(
        game: &Game,
        moves: &[MoveRecord],
        role: PlayerRole,
    ) -> Result<Self, ChessServiceError> {
        let mut controller = GameSessionController {
            chess: ChessService::new(),
            mode: SessionMode::Online {
                game_id: game.id.clone(),
                role,
            },
            position: Position::starting(),
            history: Vec::new(),
            status: game.status,
            draw_offered_by: game.draw_offered_by,
            selection: None,
            annotations: Vec::new(),
            replay: None,
        };
        controller.reload(game, moves)?;
        Ok(controller)
    }

    /// Replaces the live state with freshly fetched rows.
    pub fn reload(&mut self, game: &Game, moves: &[MoveRecord]) -> Result<(), ChessServiceError> {
        if let Some(last) = moves.last() {
            if last.fen_after != game.fen {
                warn!(
                    "Game {} position differs from its latest move {}",
                    game.id, last.move_number
                );
            }
        }

        self.position = Position::from_fen(&game.fen)?;
        self.history = moves.iter().map(HistoryEntry::from).collect();
        self.status = game.status;
        self.draw_offered_by = game.draw_offered_by;
        self.selection = None;
        Ok(())
    }

    pub fn mode(&self) -> &SessionMode {
        &self.mode
    }

    pub fn game_id(&self) -> &str {
        match &self.mode {
            SessionMode::Local => LOCAL_GAME_ID,
            SessionMode::Online { game_id, .. } => game_id,
        }
    }

    pub fn role(&self) -> Option<PlayerRole> {
        match &self.mode {
            SessionMode::Local => None,
            SessionMode::Online { role, .. } => Some(*role),
        }
    }

    /// The live position, regardless of replay.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// What the board view shows: the replay position while replaying.
    pub fn displayed_position(&self) -> &Position {
        match &self.replay {
            Some(replay) => replay.position(),
            None => &self.position,
        }
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn draw_offered_by(&self) -> Option<PlayerColor> {
        self.draw_offered_by
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn annotations(&self) -> &[Square] {
        &self.annotations
    }

    pub fn replay(&self) -> Option<&ReplaySession> {
        self.replay.as_ref()
    }

    pub fn is_replaying(&self) -> bool {
        self.replay.is_some()
    }

    /// Online the move count decides; the sandbox follows the board.
    pub fn color_to_move(&self) -> PlayerColor {
        match &self.mode {
            SessionMode::Local => PlayerColor::from(self.position.side_to_move()),
            SessionMode::Online { .. } => PlayerColor::to_move_after(self.history.len()),
        }
    }

    /// Color whose pieces this viewer may pick up.
    pub fn viewer_color(&self) -> Option<PlayerColor> {
        match &self.mode {
            SessionMode::Local => Some(PlayerColor::from(self.position.side_to_move())),
            SessionMode::Online { role, .. } => role.color(),
        }
    }

    pub fn attempt_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Result<CommittedMove, MoveRejection> {
        if self.replay.is_some() {
            return Err(MoveRejection::ReplayActive);
        }

        if let SessionMode::Online { role, .. } = &self.mode {
            if self.status.is_terminal() {
                return Err(MoveRejection::GameOver);
            }
            let color = role.color().ok_or(MoveRejection::Spectator)?;
            let to_move = PlayerColor::to_move_after(self.history.len());
            if color != to_move {
                return Err(MoveRejection::NotYourTurn { to_move });
            }
        }

        let mover = PlayerColor::from(self.position.side_to_move());
        let applied = self
            .chess
            .apply(&self.position, from, to, promotion)
            .map_err(|e| MoveRejection::Illegal(e.to_string()))?;

        let committed = CommittedMove {
            move_number: self.history.len() as u32 + 1,
            mover,
            notation: applied.san.clone(),
            from_square: applied.from.to_string(),
            to_square: applied.to.to_string(),
            fen_before: applied.fen_before.clone(),
            fen_after: applied.fen_after.clone(),
            checkmate: applied.checkmate,
            stalemate: applied.stalemate,
        };

        self.position = applied.position;
        self.history.push(HistoryEntry::from(&committed));
        self.selection = None;

        if applied.king_step {
            debug!("{} committed through the king-step rule", committed.notation);
        }
        if committed.checkmate {
            info!("Checkmate by {} with {}", mover, committed.notation);
        }

        Ok(committed)
    }

    /// Two-phase square selector.
    pub fn click(&mut self, square: Square) -> ClickOutcome {
        let selection = match self.selection.take() {
            None => return self.select(square).map_or(ClickOutcome::Cleared, ClickOutcome::Selected),
            Some(selection) => selection,
        };

        if selection.from == square {
            return ClickOutcome::Cleared;
        }

        match self.attempt_move(selection.from, square, None) {
            Ok(committed) => ClickOutcome::Moved(committed),
            Err(rejection) => {
                debug!("Click move {}{} rejected: {}", selection.from, square, rejection);
                self.select(square)
                    .map_or(ClickOutcome::Cleared, ClickOutcome::Reselected)
            }
        }
    }

    fn select(&mut self, square: Square) -> Option<Selection> {
        if self.replay.is_some() || !self.owns_piece_at(square) {
            return None;
        }

        let selection = Selection {
            from: square,
            targets: self.chess.legal_destinations(&self.position, square),
        };
        self.selection = Some(selection.clone());
        Some(selection)
    }

    fn owns_piece_at(&self, square: Square) -> bool {
        match (self.position.piece_at(square), self.viewer_color()) {
            (Some((_, color)), Some(viewer)) => PlayerColor::from(color) == viewer,
            _ => false,
        }
    }

    /// Right-click mark. Returns whether the square is now marked.
    pub fn toggle_annotation(&mut self, square: Square) -> bool {
        if let Some(index) = self.annotations.iter().position(|s| *s == square) {
            self.annotations.remove(index);
            false
        } else {
            self.annotations.push(square);
            true
        }
    }

    /// Applies a move inserted by any client. The mover's own echo is recognised
    /// by its notation matching the newest local entry.
    pub fn apply_remote_move(
        &mut self,
        record: &MoveRecord,
    ) -> Result<RemoteMoveOutcome, ChessServiceError> {
        let is_latest = self
            .history
            .last()
            .map_or(false, |entry| entry.notation == record.notation);
        let already_recorded = (record.move_number as usize)
            .checked_sub(1)
            .and_then(|index| self.history.get(index))
            .map_or(false, |entry| {
                entry.notation == record.notation && entry.fen_after == record.fen_after
            });

        if is_latest || already_recorded {
            debug!("Ignoring echo of move {}", record.notation);
            return Ok(RemoteMoveOutcome::Duplicate);
        }

        self.position = Position::from_fen(&record.fen_after)?;
        self.history.push(HistoryEntry::from(record));
        self.selection = None;
        Ok(RemoteMoveOutcome::Applied)
    }

    /// Refreshes status and draw offer from an updated game row.
    pub fn apply_remote_game(&mut self, game: &Game) {
        self.status = game.status;
        self.draw_offered_by = game.draw_offered_by;
    }

    pub fn export(&self) -> ReplayDocument {
        ReplayDocument::new(
            self.game_id(),
            self.history.iter().map(|entry| entry.notation.clone()).collect(),
        )
    }

    pub fn load_replay(&mut self, document: ReplayDocument) -> Result<(), ReplayError> {
        let session = ReplaySession::load(document)?;
        info!(
            "Replaying {} moves of game {}",
            session.len(),
            session.game_id()
        );
        self.replay = Some(session);
        self.selection = None;
        Ok(())
    }

    pub fn replay_mut(&mut self) -> Option<&mut ReplaySession> {
        self.replay.as_mut()
    }

    /// Leaves replay mode. Returns false when no replay was active.
    pub fn exit_replay(&mut self) -> bool {
        self.replay.take().is_some()
    }
}

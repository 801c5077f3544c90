use chess::{BoardStatus, Piece, Square};
use tracing::{error, info, warn};

use crate::{
    models::{
        change_event::ChangeEvent,
        chess_move::CommittedMove,
        game::{Game, GameStatus, PlayerColor},
        replay::ReplayDocument,
    },
    services::{
        errors::{
            chess_service_errors::ChessServiceError, replay_errors::ReplayError,
            session_errors::MoveRejection,
        },
        game_session_service::{EnteredGame, GameSessionService},
        replay_service::ReplaySession,
        session_controller::{
            ClickOutcome, GameSessionController, PlayerRole, RemoteMoveOutcome, Selection,
        },
    },
};

/// A typed user gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Move {
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    },
    Click(Square),
    Mark(Square),
    OfferDraw,
    AcceptDraw,
    DeclineDraw,
    Resign,
    Export,
    Import(ReplayDocument),
    Next,
    Previous,
    GoTo(usize),
    Live,
    Quit,
}

/// Everything the session task consumes, merged into one channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Command(SessionCommand),
    Remote(ChangeEvent),
    FeedClosed,
}

/// What the view should tell the user after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Moved(CommittedMove),
    Rejected(MoveRejection),
    Selected(Selection),
    SelectionCleared,
    Marked { square: Square, marked: bool },
    RemoteMove { notation: String },
    Checkmate { winner: PlayerColor },
    Stalemate,
    StatusChanged(GameStatus),
    DrawOffered(PlayerColor),
    DrawDeclined,
    Exported(ReplayDocument),
    ReplayStarted { moves: usize },
    ReplayAt { ply: usize, notation: Option<String> },
    ReplayEnded,
    Unavailable(String),
    Failed(String),
    Disconnected,
    Left { discarded_moves: bool },
}

struct OnlineContext {
    service: GameSessionService,
    game: Game,
}

/// Owns one controller and, online, the persistence of what it commits.
pub struct Session {
    controller: GameSessionController,
    online: Option<OnlineContext>,
}

impl Session {
    pub fn local() -> Self {
        Session {
            controller: GameSessionController::local(),
            online: None,
        }
    }

    pub fn online(
        service: GameSessionService,
        entered: EnteredGame,
    ) -> Result<Self, ChessServiceError> {
        let controller =
            GameSessionController::online(&entered.game, &entered.moves, entered.role)?;
        Ok(Session {
            controller,
            online: Some(OnlineContext {
                service,
                game: entered.game,
            }),
        })
    }

    pub fn controller(&self) -> &GameSessionController {
        &self.controller
    }

    pub fn game(&self) -> Option<&Game> {
        self.online.as_ref().map(|online| &online.game)
    }

    pub async fn handle(&mut self, event: SessionEvent) -> Vec<Notice> {
        match event {
            SessionEvent::Command(command) => self.handle_command(command).await,
            SessionEvent::Remote(ChangeEvent::MoveInserted(record)) => {
                if let Some(online) = self.online.as_mut() {
                    online.game.fen = record.fen_after.clone();
                }
                match self.controller.apply_remote_move(&record) {
                    Ok(RemoteMoveOutcome::Applied) => {
                        let mut notices = vec![Notice::RemoteMove {
                            notation: record.notation.clone(),
                        }];
                        if self.controller.position().board().status() == BoardStatus::Checkmate {
                            notices.push(Notice::Checkmate {
                                winner: PlayerColor::to_move_after(self.controller.history().len())
                                    .opponent(),
                            });
                        }
                        notices
                    }
                    Ok(RemoteMoveOutcome::Duplicate) => Vec::new(),
                    Err(e) => {
                        error!("Could not apply remote move {}: {}", record.notation, e);
                        vec![Notice::Failed(e.to_string())]
                    }
                }
            }
            SessionEvent::Remote(ChangeEvent::GameUpdated(game)) => self.apply_game(game),
            SessionEvent::FeedClosed => {
                warn!("Change feed closed; remote moves will no longer arrive");
                vec![Notice::Disconnected]
            }
        }
    }

    fn apply_game(&mut self, game: Game) -> Vec<Notice> {
        let mut notices = Vec::new();
        let viewer = self.controller.viewer_color();

        if game.status != self.controller.status() {
            notices.push(Notice::StatusChanged(game.status));
        }
        match (self.controller.draw_offered_by(), game.draw_offered_by) {
            (None, Some(offered_by)) if Some(offered_by) != viewer => {
                notices.push(Notice::DrawOffered(offered_by))
            }
            (Some(offered_by), None)
                if Some(offered_by) == viewer && !game.status.is_terminal() =>
            {
                notices.push(Notice::DrawDeclined)
            }
            _ => {}
        }

        self.controller.apply_remote_game(&game);
        if let Some(online) = self.online.as_mut() {
            online.game = game;
        }
        notices
    }

    async fn handle_command(&mut self, command: SessionCommand) -> Vec<Notice> {
        match command {
            SessionCommand::Move {
                from,
                to,
                promotion,
            } => match self.controller.attempt_move(from, to, promotion) {
                Ok(committed) => self.committed(committed).await,
                Err(rejection) => vec![Notice::Rejected(rejection)],
            },
            SessionCommand::Click(square) => match self.controller.click(square) {
                ClickOutcome::Selected(selection) | ClickOutcome::Reselected(selection) => {
                    vec![Notice::Selected(selection)]
                }
                ClickOutcome::Moved(committed) => self.committed(committed).await,
                ClickOutcome::Cleared => vec![Notice::SelectionCleared],
            },
            SessionCommand::Mark(square) => vec![Notice::Marked {
                square,
                marked: self.controller.toggle_annotation(square),
            }],
            SessionCommand::OfferDraw => self.offer_draw().await,
            SessionCommand::AcceptDraw => self.accept_draw().await,
            SessionCommand::DeclineDraw => self.decline_draw().await,
            SessionCommand::Resign => self.resign().await,
            SessionCommand::Export => vec![Notice::Exported(self.controller.export())],
            SessionCommand::Import(document) => match self.controller.load_replay(document) {
                Ok(()) => vec![Notice::ReplayStarted {
                    moves: self.controller.replay().map_or(0, |replay| replay.len()),
                }],
                Err(e) => vec![Notice::Failed(e.to_string())],
            },
            SessionCommand::Next => self.step_replay(|replay| replay.step_forward().map(|_| ())),
            SessionCommand::Previous => {
                self.step_replay(|replay| replay.step_backward().map(|_| ()))
            }
            SessionCommand::GoTo(ply) => self.step_replay(|replay| replay.go_to(ply).map(|_| ())),
            SessionCommand::Live => self.exit_replay().await,
            SessionCommand::Quit => self.quit().await,
        }
    }

    async fn committed(&mut self, committed: CommittedMove) -> Vec<Notice> {
        let mut notices = vec![Notice::Moved(committed.clone())];
        if committed.checkmate {
            notices.push(Notice::Checkmate {
                winner: committed.mover,
            });
        } else if committed.stalemate {
            notices.push(Notice::Stalemate);
        }

        if let Some(online) = self.online.as_mut() {
            match online.service.record_move(&online.game, &committed).await {
                Ok(game) => online.game = game,
                Err(e) => {
                    error!("Failed to persist move {}: {}", committed.notation, e);
                    notices.push(Notice::Failed(e.to_string()));
                }
            }
        }
        notices
    }

    fn seat(&self) -> Result<PlayerColor, Vec<Notice>> {
        if self.online.is_none() {
            return Err(vec![Notice::Unavailable(
                "Draws and resignation need an online game".to_string(),
            )]);
        }
        match self.controller.role() {
            Some(PlayerRole::Player(color)) => Ok(color),
            _ => Err(vec![Notice::Rejected(MoveRejection::Spectator)]),
        }
    }

    fn playing(&self) -> Result<(), Vec<Notice>> {
        if self.controller.status().is_terminal() {
            return Err(vec![Notice::Rejected(MoveRejection::GameOver)]);
        }
        Ok(())
    }

    async fn offer_draw(&mut self) -> Vec<Notice> {
        let color = match self.seat().and_then(|color| self.playing().map(|_| color)) {
            Ok(color) => color,
            Err(notices) => return notices,
        };
        let Some(online) = self.online.as_mut() else {
            return Vec::new();
        };

        match online.service.offer_draw(&online.game.id, color).await {
            Ok(game) => {
                info!("{} offered a draw in game {}", color, game.id);
                self.controller.apply_remote_game(&game);
                online.game = game;
                Vec::new()
            }
            Err(e) => {
                error!("Failed to offer draw: {}", e);
                vec![Notice::Failed(e.to_string())]
            }
        }
    }

    async fn accept_draw(&mut self) -> Vec<Notice> {
        let color = match self.seat().and_then(|color| self.playing().map(|_| color)) {
            Ok(color) => color,
            Err(notices) => return notices,
        };
        if self.controller.draw_offered_by() != Some(color.opponent()) {
            return vec![Notice::Unavailable(
                "There is no draw offer from your opponent".to_string(),
            )];
        }
        let Some(online) = self.online.as_mut() else {
            return Vec::new();
        };

        match online.service.accept_draw(&online.game.id).await {
            Ok(game) => {
                self.controller.apply_remote_game(&game);
                online.game = game;
                vec![Notice::StatusChanged(GameStatus::Draw)]
            }
            Err(e) => {
                error!("Failed to accept draw: {}", e);
                vec![Notice::Failed(e.to_string())]
            }
        }
    }

    async fn decline_draw(&mut self) -> Vec<Notice> {
        let color = match self.seat() {
            Ok(color) => color,
            Err(notices) => return notices,
        };
        if self.controller.draw_offered_by() != Some(color.opponent()) {
            return vec![Notice::Unavailable(
                "There is no draw offer from your opponent".to_string(),
            )];
        }
        let Some(online) = self.online.as_mut() else {
            return Vec::new();
        };

        match online.service.decline_draw(&online.game.id).await {
            Ok(game) => {
                self.controller.apply_remote_game(&game);
                online.game = game;
                Vec::new()
            }
            Err(e) => {
                error!("Failed to decline draw: {}", e);
                vec![Notice::Failed(e.to_string())]
            }
        }
    }

    async fn resign(&mut self) -> Vec<Notice> {
        let color = match self.seat().and_then(|color| self.playing().map(|_| color)) {
            Ok(color) => color,
            Err(notices) => return notices,
        };
        let Some(online) = self.online.as_mut() else {
            return Vec::new();
        };

        match online.service.resign(&online.game, color).await {
            Ok(game) => {
                self.controller.apply_remote_game(&game);
                online.game = game;
                vec![Notice::StatusChanged(GameStatus::Finished)]
            }
            Err(e) => {
                error!("Failed to resign: {}", e);
                vec![Notice::Failed(e.to_string())]
            }
        }
    }

    fn step_replay<F>(&mut self, step: F) -> Vec<Notice>
    where
        F: FnOnce(&mut ReplaySession) -> Result<(), ReplayError>,
    {
        let Some(replay) = self.controller.replay_mut() else {
            return vec![Notice::Unavailable("No replay is loaded".to_string())];
        };
        match step(replay) {
            Ok(()) => vec![Notice::ReplayAt {
                ply: replay.ply(),
                notation: replay.current_notation().map(str::to_string),
            }],
            Err(e) => vec![Notice::Failed(e.to_string())],
        }
    }

    async fn exit_replay(&mut self) -> Vec<Notice> {
        if !self.controller.exit_replay() {
            return vec![Notice::Unavailable("No replay is loaded".to_string())];
        }

        let mut notices = vec![Notice::ReplayEnded];
        if let Some(online) = self.online.as_mut() {
            let reloaded = online
                .service
                .load_game(&online.game.id)
                .await
                .map_err(|e| e.to_string())
                .and_then(|(game, moves)| {
                    self.controller
                        .reload(&game, &moves)
                        .map(|_| game)
                        .map_err(|e| e.to_string())
                });
            match reloaded {
                Ok(game) => online.game = game,
                Err(e) => {
                    error!("Failed to reload game {}: {}", online.game.id, e);
                    notices.push(Notice::Failed(e));
                }
            }
        }
        notices
    }

    async fn quit(&mut self) -> Vec<Notice> {
        let Some(online) = self.online.as_ref() else {
            return vec![Notice::Left {
                discarded_moves: false,
            }];
        };

        match online.service.abandon(&online.game.id).await {
            Ok(discarded_moves) => vec![Notice::Left { discarded_moves }],
            Err(e) => {
                warn!("Could not clean up game {}: {}", online.game.id, e);
                vec![Notice::Left {
                    discarded_moves: false,
                }]
            }
        }
    }
}

//! Two players on one in-memory backend, with row changes relayed between them.

use chess::Square;
use kingside_tests::{in_memory_service, ChangeLog};
use shared::models::game::{GameStatus, PlayerColor};
use shared::services::errors::session_errors::MoveRejection;
use shared::services::game_session_service::GameSessionService;
use shared::services::session_controller::PlayerRole;
use shared::services::session_service::{Notice, Session, SessionCommand, SessionEvent};

struct Table {
    service: GameSessionService,
    changes: ChangeLog,
    white: Session,
    black: Session,
}

impl Table {
    async fn seat_two_players() -> Table {
        let (service, changes) = in_memory_service();
        let game = service.create_game("alice").await.unwrap();
        let alice = service.enter_game(&game.id, "alice").await.unwrap();
        let bob = service.enter_game(&game.id, "bob").await.unwrap();
        assert_eq!(bob.role, PlayerRole::Player(PlayerColor::Black));
        assert_eq!(bob.game.status, GameStatus::Playing);

        let mut table = Table {
            white: Session::online(service.clone(), alice).unwrap(),
            black: Session::online(service.clone(), bob).unwrap(),
            service,
            changes,
        };
        table.relay().await;
        table
    }

    /// Delivers every pending row change to both players.
    async fn relay(&mut self) -> (Vec<Notice>, Vec<Notice>) {
        let mut white_notices = Vec::new();
        let mut black_notices = Vec::new();
        for change in self.changes.drain().await {
            white_notices.extend(self.white.handle(SessionEvent::Remote(change.clone())).await);
            black_notices.extend(self.black.handle(SessionEvent::Remote(change)).await);
        }
        (white_notices, black_notices)
    }

    fn game_id(&self) -> String {
        self.white.game().map(|g| g.id.clone()).unwrap_or_default()
    }
}

fn mv(from: Square, to: Square) -> SessionEvent {
    SessionEvent::Command(SessionCommand::Move {
        from,
        to,
        promotion: None,
    })
}

fn command(command: SessionCommand) -> SessionEvent {
    SessionEvent::Command(command)
}

#[tokio::test]
async fn test_moves_reach_the_opponent_once() {
    let mut table = Table::seat_two_players().await;

    table.white.handle(mv(Square::E2, Square::E4)).await;
    let (white_notices, black_notices) = table.relay().await;

    assert!(white_notices.is_empty());
    assert_eq!(
        black_notices,
        vec![Notice::RemoteMove {
            notation: "e4".to_string()
        }]
    );
    assert_eq!(table.white.controller().history().len(), 1);
    assert_eq!(
        table.black.controller().position().fen(),
        table.white.controller().position().fen()
    );
}

#[tokio::test]
async fn test_turns_alternate_between_players() {
    let mut table = Table::seat_two_players().await;

    let early = table.black.handle(mv(Square::E7, Square::E5)).await;
    table.white.handle(mv(Square::E2, Square::E4)).await;
    table.relay().await;
    let twice = table.white.handle(mv(Square::D2, Square::D4)).await;
    let reply = table.black.handle(mv(Square::E7, Square::E5)).await;

    assert_eq!(
        early,
        vec![Notice::Rejected(MoveRejection::NotYourTurn {
            to_move: PlayerColor::White
        })]
    );
    assert_eq!(
        twice,
        vec![Notice::Rejected(MoveRejection::NotYourTurn {
            to_move: PlayerColor::Black
        })]
    );
    assert!(matches!(reply.as_slice(), [Notice::Moved(m)] if m.move_number == 2));
}

#[tokio::test]
async fn test_persisted_log_matches_board() {
    let mut table = Table::seat_two_players().await;
    for (white, black) in [
        ((Square::D2, Square::D4), (Square::D7, Square::D5)),
        ((Square::C2, Square::C4), (Square::E7, Square::E6)),
    ] {
        table.white.handle(mv(white.0, white.1)).await;
        table.relay().await;
        table.black.handle(mv(black.0, black.1)).await;
        table.relay().await;
    }

    let (game, moves) = table.service.load_game(&table.game_id()).await.unwrap();

    assert_eq!(moves.len(), 4);
    assert!(moves.windows(2).all(|pair| pair[0].fen_after == pair[1].fen_before));
    assert!(moves
        .iter()
        .zip(1..)
        .all(|(record, number)| record.move_number == number));
    assert_eq!(game.fen, moves[3].fen_after);
    assert_eq!(game.fen, table.black.controller().position().fen());
}

#[tokio::test]
async fn test_checkmate_finishes_game_for_both() {
    let mut table = Table::seat_two_players().await;
    table.white.handle(mv(Square::F2, Square::F3)).await;
    table.relay().await;
    table.black.handle(mv(Square::E7, Square::E5)).await;
    table.relay().await;
    table.white.handle(mv(Square::G2, Square::G4)).await;
    table.relay().await;

    let mating = table.black.handle(mv(Square::D8, Square::H4)).await;
    let (white_notices, _) = table.relay().await;

    let black_wins = Notice::Checkmate {
        winner: PlayerColor::Black,
    };
    assert!(mating.contains(&black_wins));
    assert!(white_notices.contains(&black_wins));
    assert!(white_notices.contains(&Notice::StatusChanged(GameStatus::Finished)));

    let game = table.service.get_game(&table.game_id()).await.unwrap();
    assert_eq!(game.status, GameStatus::Finished);
    assert_eq!(game.winner_id.as_deref(), Some("bob"));

    let late = table.white.handle(mv(Square::A2, Square::A3)).await;
    assert_eq!(late, vec![Notice::Rejected(MoveRejection::GameOver)]);
}

#[tokio::test]
async fn test_draw_offer_and_acceptance() {
    let mut table = Table::seat_two_players().await;

    table.white.handle(command(SessionCommand::OfferDraw)).await;
    let (_, offered) = table.relay().await;
    table.black.handle(command(SessionCommand::AcceptDraw)).await;
    let (accepted, _) = table.relay().await;

    assert_eq!(offered, vec![Notice::DrawOffered(PlayerColor::White)]);
    assert_eq!(accepted, vec![Notice::StatusChanged(GameStatus::Draw)]);
    let game = table.service.get_game(&table.game_id()).await.unwrap();
    assert_eq!(game.status, GameStatus::Draw);
    assert_eq!(game.winner_id, None);
    assert_eq!(game.draw_offered_by, None);
}

#[tokio::test]
async fn test_declined_draw_is_reported_to_offerer() {
    let mut table = Table::seat_two_players().await;

    table.black.handle(command(SessionCommand::OfferDraw)).await;
    table.relay().await;
    table.white.handle(command(SessionCommand::DeclineDraw)).await;
    let (_, black_notices) = table.relay().await;

    assert_eq!(black_notices, vec![Notice::DrawDeclined]);
}

#[tokio::test]
async fn test_resignation_awards_the_opponent() {
    let mut table = Table::seat_two_players().await;
    table.white.handle(mv(Square::E2, Square::E4)).await;
    table.relay().await;

    table.white.handle(command(SessionCommand::Resign)).await;

    let (game, moves) = table.service.load_game(&table.game_id()).await.unwrap();
    assert_eq!(game.status, GameStatus::Finished);
    assert_eq!(game.winner_id.as_deref(), Some("bob"));
    assert!(moves.is_empty());
}

#[tokio::test]
async fn test_third_visitor_spectates() {
    let table = Table::seat_two_players().await;

    let carol = table
        .service
        .enter_game(&table.game_id(), "carol")
        .await
        .unwrap();
    let mut spectator = Session::online(table.service.clone(), carol.clone()).unwrap();

    assert_eq!(carol.role, PlayerRole::Spectator);
    assert_eq!(
        spectator.handle(mv(Square::E2, Square::E4)).await,
        vec![Notice::Rejected(MoveRejection::Spectator)]
    );
}

#[tokio::test]
async fn test_concurrent_joiners_get_one_seat() {
    let (service, _) = in_memory_service();
    let game = service.create_game("alice").await.unwrap();

    let (bob, carol) = tokio::join!(
        service.enter_game(&game.id, "bob"),
        service.enter_game(&game.id, "carol")
    );
    let roles = [bob.unwrap().role, carol.unwrap().role];

    assert_eq!(
        roles
            .iter()
            .filter(|role| **role == PlayerRole::Player(PlayerColor::Black))
            .count(),
        1
    );
    assert!(roles.contains(&PlayerRole::Spectator));
}

#[tokio::test]
async fn test_leaving_mid_game_discards_moves() {
    let mut table = Table::seat_two_players().await;
    table.white.handle(mv(Square::E2, Square::E4)).await;

    let notices = table.white.handle(command(SessionCommand::Quit)).await;

    assert_eq!(
        notices,
        vec![Notice::Left {
            discarded_moves: true
        }]
    );
    let (_, moves) = table.service.load_game(&table.game_id()).await.unwrap();
    assert!(moves.is_empty());
}

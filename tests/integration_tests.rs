//! PostgREST repositories against a mock HTTP server.

use serde_json::json;
use shared::models::chess_move::{CommittedMove, MoveRecord};
use shared::models::game::{Game, GameStatus, GameUpdate, PlayerColor};
use shared::models::profile::Profile;
use shared::repositories::errors::repository_errors::RepositoryError;
use shared::repositories::game_repository::{GameRepository, PostgrestGameRepository};
use shared::repositories::move_repository::{MoveRepository, PostgrestMoveRepository};
use shared::repositories::postgrest::PostgrestClient;
use shared::repositories::profile_repository::{PostgrestProfileRepository, ProfileRepository};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn client(server: &MockServer) -> PostgrestClient {
    PostgrestClient::with_parts(&format!("{}/rest/v1", server.uri()), "anon-key", "user-token")
}

fn game(id: &str) -> Game {
    let mut game = Game::new();
    game.id = id.to_string();
    game.white_player_id = Some("alice".to_string());
    game
}

fn record(game_id: &str, move_number: u32, notation: &str) -> MoveRecord {
    MoveRecord::new(
        game_id,
        &CommittedMove {
            move_number,
            mover: PlayerColor::to_move_after(move_number as usize - 1),
            notation: notation.to_string(),
            from_square: "e2".to_string(),
            to_square: "e4".to_string(),
            fen_before: "before".to_string(),
            fen_after: "after".to_string(),
            checkmate: false,
            stalemate: false,
        },
    )
}

#[tokio::test]
async fn test_get_game_sends_credentials_and_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/games"))
        .and(query_param("id", "eq.g1"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([game("g1")])))
        .expect(1)
        .mount(&server)
        .await;

    let fetched = PostgrestGameRepository::new(client(&server))
        .get_game("g1")
        .await
        .unwrap();

    assert_eq!(fetched.id, "g1");
    assert_eq!(fetched.white_player_id.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_missing_game_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/games"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = PostgrestGameRepository::new(client(&server))
        .get_game("nope")
        .await;

    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

#[tokio::test]
async fn test_claim_seat_is_conditional() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/games"))
        .and(query_param("id", "eq.g1"))
        .and(query_param("black_player_id", "is.null"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({ "black_player_id": "bob" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let claimed = PostgrestGameRepository::new(client(&server))
        .claim_seat("g1", PlayerColor::Black, "bob")
        .await
        .unwrap();

    assert!(claimed.is_none());
}

#[tokio::test]
async fn test_claim_seat_returns_updated_row() {
    let server = MockServer::start().await;
    let mut seated = game("g1");
    seated.black_player_id = Some("bob".to_string());
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/games"))
        .and(query_param("black_player_id", "is.null"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([seated])))
        .mount(&server)
        .await;

    let claimed = PostgrestGameRepository::new(client(&server))
        .claim_seat("g1", PlayerColor::Black, "bob")
        .await
        .unwrap()
        .unwrap();

    assert!(claimed.has_both_players());
}

#[tokio::test]
async fn test_update_writes_explicit_nulls() {
    let server = MockServer::start().await;
    let mut drawn = game("g1");
    drawn.status = GameStatus::Draw;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/games"))
        .and(body_partial_json(
            json!({ "status": "draw", "winner_id": null, "draw_offered_by": null }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([drawn])))
        .expect(1)
        .mount(&server)
        .await;

    let update = GameUpdate::new()
        .status(GameStatus::Draw)
        .winner(None)
        .draw_offer(None);
    let updated = PostgrestGameRepository::new(client(&server))
        .update_game("g1", &update)
        .await
        .unwrap();

    assert_eq!(updated.status, GameStatus::Draw);
}

#[tokio::test]
async fn test_forbidden_write_is_permission_denied() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/games"))
        .respond_with(
            ResponseTemplate::new(403).set_body_string("new row violates row-level security policy"),
        )
        .mount(&server)
        .await;

    let result = PostgrestGameRepository::new(client(&server))
        .create_game(&game("g1"))
        .await;

    match result {
        Err(RepositoryError::PermissionDenied(msg)) => assert!(msg.contains("row-level security")),
        other => panic!("Expected permission error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/moves"))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .mount(&server)
        .await;

    let result = PostgrestMoveRepository::new(client(&server))
        .list_moves("g1")
        .await;

    assert!(matches!(result, Err(RepositoryError::Status { status: 500, .. })));
}

#[tokio::test]
async fn test_list_moves_is_ordered_by_number() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/moves"))
        .and(query_param("game_id", "eq.g1"))
        .and(query_param("order", "move_number.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            record("g1", 1, "e4"),
            record("g1", 2, "e5"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let moves = PostgrestMoveRepository::new(client(&server))
        .list_moves("g1")
        .await
        .unwrap();

    let notations: Vec<&str> = moves.iter().map(|m| m.notation.as_str()).collect();
    assert_eq!(notations, vec!["e4", "e5"]);
}

#[tokio::test]
async fn test_insert_and_delete_moves() {
    let server = MockServer::start().await;
    let inserted = record("g1", 1, "e4");
    Mock::given(method("POST"))
        .and(path("/rest/v1/moves"))
        .and(body_partial_json(json!({ "notation": "e4", "move_number": 1 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([inserted])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/moves"))
        .and(query_param("game_id", "eq.g1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let repository = PostgrestMoveRepository::new(client(&server));

    let stored = repository.insert_move(&inserted).await.unwrap();
    repository.delete_moves("g1").await.unwrap();

    assert_eq!(stored.id, inserted.id);
}

#[tokio::test]
async fn test_profile_upsert_merges_duplicates() {
    let server = MockServer::start().await;
    let profile = Profile::new("user-1", "magnus");
    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .and(|request: &Request| {
            request
                .headers
                .get("prefer")
                .and_then(|value| value.to_str().ok())
                .map_or(false, |value| value.contains("resolution=merge-duplicates"))
        })
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([profile])))
        .expect(1)
        .mount(&server)
        .await;

    let stored = PostgrestProfileRepository::new(client(&server))
        .upsert_profile(&profile)
        .await
        .unwrap();

    assert_eq!(stored.display_name(), "magnus");
}

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use shared::config::Config;
use shared::models::game::PlayerColor;
use shared::models::replay::ReplayDocument;
use shared::repositories::game_repository::PostgrestGameRepository;
use shared::repositories::move_repository::PostgrestMoveRepository;
use shared::repositories::postgrest::PostgrestClient;
use shared::repositories::profile_repository::PostgrestProfileRepository;
use shared::repositories::realtime_repository::{ChangeFeed, ChangeSubscription, SupabaseRealtime};
use shared::services::game_session_service::GameSessionService;
use shared::services::profile_service::ProfileService;
use shared::services::session_controller::PlayerRole;
use shared::services::session_service::{Notice, Session, SessionCommand, SessionEvent};

use crate::commands::{self, Input, HELP};
use crate::view;

/// Everything the session loop reacts to.
enum LoopInput {
    Line(String),
    Event(SessionEvent),
}

pub struct Services {
    pub games: GameSessionService,
    pub profiles: ProfileService,
}

impl Services {
    pub fn new(config: &Config) -> Self {
        let client = PostgrestClient::new(config);
        Services {
            games: GameSessionService::new(
                Arc::new(PostgrestGameRepository::new(client.clone())),
                Arc::new(PostgrestMoveRepository::new(client.clone())),
            ),
            profiles: ProfileService::new(Arc::new(PostgrestProfileRepository::new(client))),
        }
    }
}

pub async fn run_local() -> anyhow::Result<()> {
    println!("Sandbox board. Type `help` for commands.");
    run_session(Session::local(), None).await
}

pub async fn run_replay(file: &Path) -> anyhow::Result<()> {
    let document = read_document(file)?;
    let mut session = Session::local();
    print_notices(
        &session
            .handle(SessionEvent::Command(SessionCommand::Import(document)))
            .await,
        &session,
    );
    if !session.controller().is_replaying() {
        anyhow::bail!("Could not replay {}", file.display());
    }
    run_session(session, None).await
}

pub async fn create_game(config: &Config) -> anyhow::Result<()> {
    let services = Services::new(config);
    let game = services.games.create_game(&config.player_id).await?;
    println!("Created game {}", game.id);
    println!("Share this id with your opponent: kingside play {}", game.id);
    join_game(config, &services, &game.id).await
}

pub async fn play_game(config: &Config, game_id: &str) -> anyhow::Result<()> {
    let services = Services::new(config);
    join_game(config, &services, game_id).await
}

async fn join_game(config: &Config, services: &Services, game_id: &str) -> anyhow::Result<()> {
    let entered = services.games.enter_game(game_id, &config.player_id).await?;
    match entered.role {
        PlayerRole::Player(color) => println!("You play {}", color),
        PlayerRole::Spectator => println!("Both seats are taken; you are spectating"),
    }

    let seats: Vec<&str> = [PlayerColor::White, PlayerColor::Black]
        .iter()
        .filter_map(|color| entered.game.player_id(*color))
        .collect();
    match services.profiles.get_profiles(&seats).await {
        Ok(profiles) => {
            let find = |color: PlayerColor| {
                entered
                    .game
                    .player_id(color)
                    .and_then(|id| profiles.iter().find(|p| p.id == id))
            };
            println!(
                "{}",
                view::render_players(find(PlayerColor::White), find(PlayerColor::Black))
            );
        }
        Err(e) => debug!("Profiles unavailable: {}", e),
    }

    let feed = SupabaseRealtime::new(config)
        .subscribe(game_id)
        .await
        .context("Could not subscribe to game changes")?;
    let session = Session::online(services.games.clone(), entered)?;
    run_session(session, Some(feed)).await
}

pub async fn export_game(config: &Config, game_id: &str, out: Option<&Path>) -> anyhow::Result<()> {
    let document = Services::new(config).games.export_game(game_id).await?;
    match out {
        Some(path) => {
            write_document(&document, path)?;
            println!("Wrote {} moves to {}", document.moves.len(), path.display());
        }
        None => println!("{}", document.to_json()?),
    }
    Ok(())
}

pub async fn profile(
    config: &Config,
    username: Option<&str>,
    avatar_url: Option<&str>,
) -> anyhow::Result<()> {
    let profiles = Services::new(config).profiles;
    let profile = match username {
        Some(username) => {
            profiles
                .update_profile(&config.player_id, username, avatar_url)
                .await?
        }
        None => profiles.get_profile(&config.player_id).await?,
    };
    println!("{} ({})", profile.display_name(), profile.rating);
    if let Some(avatar_url) = &profile.avatar_url {
        println!("Avatar: {}", avatar_url);
    }
    Ok(())
}

fn read_document(path: &Path) -> anyhow::Result<ReplayDocument> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    Ok(ReplayDocument::from_json(&json)?)
}

fn write_document(document: &ReplayDocument, path: &Path) -> anyhow::Result<()> {
    std::fs::write(path, document.to_json()?)
        .with_context(|| format!("Cannot write {}", path.display()))
}

fn orientation(session: &Session) -> PlayerColor {
    match session.controller().role() {
        Some(PlayerRole::Player(color)) => color,
        _ => PlayerColor::White,
    }
}

fn print_board(session: &Session) {
    println!(
        "{}{}",
        view::render_board(session.controller(), orientation(session)),
        view::render_status(session.controller())
    );
}

fn print_notices(notices: &[Notice], session: &Session) {
    for notice in notices {
        if let Some(line) = view::render_notice(notice) {
            println!("{}", line);
        }
    }
    if notices.iter().any(view::redraws_board) {
        print_board(session);
    }
}

/// Single state-owning loop: stdin lines, change events and Ctrl-C all
/// arrive through one channel and are handled in order.
async fn run_session(mut session: Session, feed: Option<ChangeSubscription>) -> anyhow::Result<()> {
    let (sender, mut inputs) = mpsc::channel::<LoopInput>(32);

    let stdin_sender = sender.clone();
    let stdin_task = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if stdin_sender.send(LoopInput::Line(line)).await.is_err() {
                return;
            }
        }
        let _ = stdin_sender
            .send(LoopInput::Event(SessionEvent::Command(SessionCommand::Quit)))
            .await;
    });

    let feed_task = feed.map(|mut feed| {
        let feed_sender = sender.clone();
        tokio::spawn(async move {
            while let Some(event) = feed.recv().await {
                if feed_sender.send(LoopInput::Event(SessionEvent::Remote(event))).await.is_err() {
                    return;
                }
            }
            let _ = feed_sender.send(LoopInput::Event(SessionEvent::FeedClosed)).await;
        })
    });

    let signal_sender = sender.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted");
            let _ = signal_sender
                .send(LoopInput::Event(SessionEvent::Command(SessionCommand::Quit)))
                .await;
        }
    });
    drop(sender);

    print_board(&session);
    while let Some(input) = inputs.recv().await {
        let event = match input {
            LoopInput::Event(event) => event,
            LoopInput::Line(line) => match commands::parse(&line) {
                Ok(Input::Session(command)) => SessionEvent::Command(command),
                Ok(Input::Board) => {
                    print_board(&session);
                    continue;
                }
                Ok(Input::History) => {
                    println!("{}", view::render_history(session.controller().history()));
                    continue;
                }
                Ok(Input::Help) => {
                    println!("{}", HELP);
                    continue;
                }
                Ok(Input::Empty) => continue,
                Ok(Input::ExportTo(path)) => {
                    let notices = session
                        .handle(SessionEvent::Command(SessionCommand::Export))
                        .await;
                    for notice in &notices {
                        if let Notice::Exported(document) = notice {
                            match write_document(document, &path) {
                                Ok(()) => println!(
                                    "Wrote {} moves to {}",
                                    document.moves.len(),
                                    path.display()
                                ),
                                Err(e) => println!("Export failed: {:#}", e),
                            }
                        }
                    }
                    continue;
                }
                Ok(Input::ImportFrom(path)) => match read_document(&path) {
                    Ok(document) => SessionEvent::Command(SessionCommand::Import(document)),
                    Err(e) => {
                        error!("Import of {} failed: {:#}", path.display(), e);
                        println!("!! Cannot import {}: {:#}", path.display(), e);
                        continue;
                    }
                },
                Err(e) => {
                    println!("{} (type `help`)", e);
                    continue;
                }
            },
        };

        let quitting = event == SessionEvent::Command(SessionCommand::Quit);
        let notices = session.handle(event).await;
        print_notices(&notices, &session);
        if quitting {
            break;
        }
    }

    stdin_task.abort();
    signal_task.abort();
    if let Some(feed_task) = feed_task {
        feed_task.abort();
    }
    Ok(())
}

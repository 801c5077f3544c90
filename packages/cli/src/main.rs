use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shared::config::{log_level_from_env, Config};
use tracing::Level;

mod app;
mod commands;
mod view;

#[derive(Parser, Debug)]
#[command(name = "kingside")]
#[command(about = "Two-player chess in the terminal, locally or online")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sandbox board on this machine
    Local,
    /// Create an online game and join it
    Create,
    /// Join an online game by id
    Play { game_id: String },
    /// Write a game's move list as JSON
    Export {
        game_id: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Step through an exported game
    Replay { file: PathBuf },
    /// Show or update your profile
    Profile {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(log_level_from_env(Level::WARN))
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Local => app::run_local().await,
        Command::Replay { file } => app::run_replay(&file).await,
        Command::Create => app::create_game(&Config::from_env()?).await,
        Command::Play { game_id } => app::play_game(&Config::from_env()?, &game_id).await,
        Command::Export { game_id, out } => {
            app::export_game(&Config::from_env()?, &game_id, out.as_deref()).await
        }
        Command::Profile {
            username,
            avatar_url,
        } => {
            app::profile(
                &Config::from_env()?,
                username.as_deref(),
                avatar_url.as_deref(),
            )
            .await
        }
    }
}

use clap::Parser;
use shared::config::{log_level_from_env, Config, SUPABASE_ANON_KEY, SUPABASE_URL};
use shared::repositories::postgrest::PostgrestClient;
use tracing::{info, Level};

mod probe;

/// Checks what the given key may do to the games table.
#[derive(Parser, Debug)]
#[command(name = "connection-check")]
struct Args {
    /// Project URL, e.g. https://xyz.supabase.co
    #[arg(long, env = SUPABASE_URL)]
    url: String,

    /// API key sent as `apikey` and bearer token
    #[arg(long, env = SUPABASE_ANON_KEY)]
    key: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(log_level_from_env(Level::INFO))
        .with_target(false)
        .without_time()
        .init();

    let args = Args::parse();
    let config = Config::new(&args.url, &args.key);
    info!("Probing {}", config.rest_url());

    let report = probe::run_probe(&PostgrestClient::new(&config), &args.key).await;
    report.log();

    if !report.all_ok() {
        std::process::exit(1);
    }
    Ok(())
}

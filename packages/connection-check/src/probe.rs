use std::fmt;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use shared::config::decode_claims;
use shared::models::game::Game;
use shared::repositories::postgrest::{eq, PostgrestClient, RETURN_REPRESENTATION};
use tracing::{info, warn};

const GAMES_TABLE: &str = "games";

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Ok(u16),
    Denied { status: u16, reason: String },
    Failed(String),
}

impl ProbeOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ProbeOutcome::Ok(_))
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProbeOutcome::Ok(status) => write!(f, "OK ({})", status),
            ProbeOutcome::Denied { status, reason } => write!(f, "DENIED ({}) {}", status, reason),
            ProbeOutcome::Failed(msg) => write!(f, "FAILED {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub key_role: Option<String>,
    pub read: ProbeOutcome,
    pub insert: ProbeOutcome,
    pub update: ProbeOutcome,
    pub delete: ProbeOutcome,
}

impl ProbeReport {
    pub fn all_ok(&self) -> bool {
        [&self.read, &self.insert, &self.update, &self.delete]
            .iter()
            .all(|outcome| outcome.is_ok())
    }

    pub fn log(&self) {
        match &self.key_role {
            Some(role) => info!("Key role: {}", role),
            None => warn!("Key role: unknown (key is not a readable JWT)"),
        }
        for (name, outcome) in [
            ("read games", &self.read),
            ("insert probe row", &self.insert),
            ("update probe row", &self.update),
            ("delete probe row", &self.delete),
        ] {
            if outcome.is_ok() {
                info!("{}: {}", name, outcome);
            } else {
                warn!("{}: {}", name, outcome);
            }
        }
    }
}

/// Sends a request and classifies its result. With `expect_rows`, a success
/// that touched no rows counts as denied, which is how row policies answer
/// updates and deletes they filter out.
async fn attempt(request: RequestBuilder, expect_rows: bool) -> ProbeOutcome {
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => return ProbeOutcome::Failed(e.to_string()),
    };
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status.is_success() {
        let empty = serde_json::from_str::<Value>(&body)
            .map(|rows| rows.as_array().map_or(false, |rows| rows.is_empty()))
            .unwrap_or(false);
        if expect_rows && empty {
            return ProbeOutcome::Denied {
                status: status.as_u16(),
                reason: "no rows affected".to_string(),
            };
        }
        return ProbeOutcome::Ok(status.as_u16());
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProbeOutcome::Denied {
            status: status.as_u16(),
            reason: body,
        },
        _ => ProbeOutcome::Failed(format!("{} {}", status.as_u16(), body)),
    }
}

/// Reads the games table, then inserts, updates and deletes one probe row.
pub async fn run_probe(client: &PostgrestClient, api_key: &str) -> ProbeReport {
    let key_role = decode_claims(api_key).ok().and_then(|claims| claims.role);

    let read = attempt(
        client.request(
            Method::GET,
            GAMES_TABLE,
            &[("select", "id".to_string()), ("limit", "1".to_string())],
        ),
        false,
    )
    .await;

    let probe = Game::new();
    let insert = attempt(
        client
            .request(Method::POST, GAMES_TABLE, &[])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&probe),
        true,
    )
    .await;

    let update = attempt(
        client
            .request(Method::PATCH, GAMES_TABLE, &[("id", eq(&probe.id))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&json!({ "updated_at": chrono::Utc::now() })),
        true,
    )
    .await;

    let delete = attempt(
        client
            .request(Method::DELETE, GAMES_TABLE, &[("id", eq(&probe.id))])
            .header("Prefer", RETURN_REPRESENTATION),
        true,
    )
    .await;

    ProbeReport {
        key_role,
        read,
        insert,
        update,
        delete,
    }
}

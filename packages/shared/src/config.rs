use std::fmt;
use std::str::FromStr;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::Level;
use uuid::Uuid;

pub const SUPABASE_URL: &str = "SUPABASE_URL";
pub const SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const SUPABASE_ACCESS_TOKEN: &str = "SUPABASE_ACCESS_TOKEN";
pub const PLAYER_ID: &str = "KINGSIDE_PLAYER_ID";
pub const LOG_LEVEL: &str = "KINGSIDE_LOG";

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Missing(String),
    InvalidValue { name: String, value: String },
    InvalidToken(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{} environment variable must be set", name),
            ConfigError::InvalidValue { name, value } => {
                write!(f, "Invalid value for {}: {}", name, value)
            }
            ConfigError::InvalidToken(msg) => write!(f, "Invalid access token: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Claims read from a hosted-database JWT. Only the fields the client uses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    pub sub: Option<String>,
    pub role: Option<String>,
    pub exp: Option<i64>,
}

/// Reads the claims of `token` without verifying its signature. The database
/// verifies every request, the client only needs to know who it is.
pub fn decode_claims(token: &str) -> Result<Claims, ConfigError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| ConfigError::InvalidToken(e.to_string()))
}

#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub anon_key: String,
    pub access_token: Option<String>,
    pub player_id: String,
    pub guest: bool,
}

impl Config {
    pub fn new(supabase_url: &str, anon_key: &str) -> Self {
        Config {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: None,
            player_id: Uuid::new_v4().to_string(),
            guest: true,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    ///
    /// The viewer's id is `KINGSIDE_PLAYER_ID` when set, otherwise the `sub`
    /// claim of the access token, otherwise a fresh guest id.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::Missing(name.to_string()))
        };

        let supabase_url = required(SUPABASE_URL)?;
        if !supabase_url.starts_with("http://") && !supabase_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                name: SUPABASE_URL.to_string(),
                value: supabase_url,
            });
        }

        let mut config = Config::new(&supabase_url, &required(SUPABASE_ANON_KEY)?);
        config.access_token = lookup(SUPABASE_ACCESS_TOKEN).filter(|t| !t.trim().is_empty());

        if let Some(player_id) = lookup(PLAYER_ID).filter(|id| !id.trim().is_empty()) {
            config.player_id = player_id;
            config.guest = false;
        } else if let Some(token) = &config.access_token {
            if let Some(sub) = decode_claims(token)?.sub {
                config.player_id = sub;
                config.guest = false;
            }
        }

        Ok(config)
    }

    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.supabase_url)
    }

    pub fn realtime_url(&self) -> String {
        let socket_base = if let Some(host) = self.supabase_url.strip_prefix("https://") {
            format!("wss://{}", host)
        } else if let Some(host) = self.supabase_url.strip_prefix("http://") {
            format!("ws://{}", host)
        } else {
            self.supabase_url.clone()
        };
        format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            socket_base, self.anon_key
        )
    }

    /// Token sent as `Authorization: Bearer`; the anon key when signed out.
    pub fn bearer_token(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.anon_key)
    }
}

/// Log level from `KINGSIDE_LOG`, falling back to `default`.
pub fn log_level_from_env(default: Level) -> Level {
    std::env::var(LOG_LEVEL)
        .ok()
        .and_then(|value| Level::from_str(value.trim()).ok())
        .unwrap_or(default)
}

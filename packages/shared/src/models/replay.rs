use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::errors::replay_errors::ReplayError;

/// The exported move list of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayDocument {
    pub game_id: String,
    pub moves: Vec<String>,
    pub exported_at: DateTime<Utc>,
}

impl ReplayDocument {
    pub fn new(game_id: &str, moves: Vec<String>) -> Self {
        ReplayDocument {
            game_id: game_id.to_string(),
            moves,
            exported_at: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String, ReplayError> {
        serde_json::to_string_pretty(self).map_err(|e| ReplayError::Malformed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        serde_json::from_str(json).map_err(|e| ReplayError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_json_layout() {
        let document = ReplayDocument::new("game-1", vec!["e4".to_string(), "e5".to_string()]);

        let value: serde_json::Value = serde_json::from_str(&document.to_json().unwrap()).unwrap();

        assert_eq!(value["game_id"], "game-1");
        assert_eq!(value["moves"][1], "e5");
        assert!(value["exported_at"].is_string());
    }

    #[test]
    fn test_malformed_document_is_rejected() {
        let result = ReplayDocument::from_json(r#"{"game_id": "x", "moves": "e4"}"#);

        assert!(matches!(result, Err(ReplayError::Malformed(_))));
    }
}

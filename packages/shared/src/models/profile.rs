use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RATING: i32 = 1200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default = "default_rating")]
    pub rating: i32,
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_rating() -> i32 {
    DEFAULT_RATING
}

impl Profile {
    pub fn new(id: &str, username: &str) -> Self {
        Profile {
            id: id.to_string(),
            username: Some(username.to_string()),
            avatar_url: None,
            rating: DEFAULT_RATING,
            updated_at: Some(Utc::now()),
        }
    }

    /// Name shown on the board; falls back to a shortened id.
    pub fn display_name(&self) -> String {
        match self.username.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => self.id.chars().take(8).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_creation() {
        let profile = Profile::new("123", "magnus");

        assert_eq!(profile.id, "123");
        assert_eq!(profile.rating, DEFAULT_RATING);
        assert_eq!(profile.display_name(), "magnus");
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let json = r#"{"id":"0123456789abcdef","username":null,"avatar_url":null,"updated_at":null}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();

        assert_eq!(profile.display_name(), "01234567");
        assert_eq!(profile.rating, DEFAULT_RATING);
    }
}

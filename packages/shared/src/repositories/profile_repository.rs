use async_trait::async_trait;
use reqwest::Method;

use crate::models::profile::Profile;
use crate::repositories::errors::repository_errors::RepositoryError;
use crate::repositories::postgrest::{eq, PostgrestClient, RETURN_REPRESENTATION};

#[cfg(test)]
use mockall::automock;

const PROFILES_TABLE: &str = "profiles";

pub struct PostgrestProfileRepository {
    pub client: PostgrestClient,
}

impl PostgrestProfileRepository {
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
#[cfg_attr(test, automock)]
pub trait ProfileRepository: Send + Sync {
    async fn get_profile(&self, profile_id: &str) -> Result<Profile, RepositoryError>;

    /// Inserts or replaces the caller's own row. Other rows are refused by the database.
    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, RepositoryError>;
}

#[async_trait]
impl ProfileRepository for PostgrestProfileRepository {
    async fn get_profile(&self, profile_id: &str) -> Result<Profile, RepositoryError> {
        let request = self.client.request(
            Method::GET,
            PROFILES_TABLE,
            &[("id", eq(profile_id)), ("select", "*".to_string())],
        );

        self.client
            .fetch_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or(RepositoryError::NotFound)
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, RepositoryError> {
        let request = self
            .client
            .request(Method::POST, PROFILES_TABLE, &[])
            .header(
                "Prefer",
                format!("{},resolution=merge-duplicates", RETURN_REPRESENTATION),
            )
            .json(profile);

        self.client
            .fetch_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                RepositoryError::PermissionDenied(format!(
                    "Profile {} was not written",
                    profile.id
                ))
            })
    }
}

use std::sync::Arc;

use chrono::Utc;

use crate::models::profile::Profile;
use crate::repositories::errors::repository_errors::RepositoryError;
use crate::repositories::profile_repository::ProfileRepository;
use crate::services::errors::profile_service_errors::ProfileServiceError;

#[derive(Clone)]
pub struct ProfileService {
    repository: Arc<dyn ProfileRepository + Send + Sync>,
}

impl ProfileService {
    pub fn new(repository: Arc<dyn ProfileRepository + Send + Sync>) -> Self {
        ProfileService { repository }
    }

    pub async fn get_profile(&self, profile_id: &str) -> Result<Profile, ProfileServiceError> {
        if profile_id.is_empty() {
            return Err(ProfileServiceError::ValidationError(
                "Profile ID cannot be empty".to_string(),
            ));
        }
        self.repository
            .get_profile(profile_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ProfileServiceError::ProfileNotFound,
                _ => ProfileServiceError::from(e),
            })
    }

    /// Profiles for the given ids, skipping any that do not exist.
    pub async fn get_profiles(
        &self,
        profile_ids: &[&str],
    ) -> Result<Vec<Profile>, ProfileServiceError> {
        let mut profiles = Vec::new();
        for profile_id in profile_ids {
            match self.get_profile(profile_id).await {
                Ok(profile) => profiles.push(profile),
                Err(ProfileServiceError::ProfileNotFound) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(profiles)
    }

    /// Writes the owner's username and avatar, creating the row on first use.
    pub async fn update_profile(
        &self,
        owner_id: &str,
        username: &str,
        avatar_url: Option<&str>,
    ) -> Result<Profile, ProfileServiceError> {
        if owner_id.is_empty() || username.trim().is_empty() {
            return Err(ProfileServiceError::ValidationError(
                "Owner ID or username cannot be empty".to_string(),
            ));
        }

        let mut profile = match self.get_profile(owner_id).await {
            Ok(profile) => profile,
            Err(ProfileServiceError::ProfileNotFound) => Profile::new(owner_id, username),
            Err(e) => return Err(e),
        };

        if profile.rating < 0 {
            return Err(ProfileServiceError::ValidationError(
                "Rating cannot be negative".to_string(),
            ));
        }

        profile.username = Some(username.trim().to_string());
        if let Some(avatar_url) = avatar_url {
            profile.avatar_url = Some(avatar_url.to_string());
        }
        profile.updated_at = Some(Utc::now());

        Ok(self.repository.upsert_profile(&profile).await?)
    }
}

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::repositories::errors::repository_errors::RepositoryError;

pub const RETURN_REPRESENTATION: &str = "return=representation";

/// Thin HTTP client for the hosted database's REST interface.
#[derive(Clone)]
pub struct PostgrestClient {
    http: Client,
    rest_url: String,
    api_key: String,
    bearer: String,
}

impl PostgrestClient {
    pub fn new(config: &Config) -> Self {
        Self::with_parts(&config.rest_url(), &config.anon_key, config.bearer_token())
    }

    pub fn with_parts(rest_url: &str, api_key: &str, bearer: &str) -> Self {
        PostgrestClient {
            http: Client::new(),
            rest_url: rest_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            bearer: bearer.to_string(),
        }
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    /// Authenticated request against `table`. Filters go in `query`.
    pub fn request(&self, method: Method, table: &str, query: &[(&str, String)]) -> RequestBuilder {
        self.http
            .request(method, self.table_url(table))
            .query(query)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.bearer)
    }

    /// Sends the request and decodes the returned rows.
    pub async fn fetch_rows<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Vec<T>, RepositoryError> {
        let response = checked(request.send().await?).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Sends the request and discards any body.
    pub async fn execute(&self, request: RequestBuilder) -> Result<StatusCode, RepositoryError> {
        let response = checked(request.send().await?).await?;
        Ok(response.status())
    }
}

async fn checked(response: Response) -> Result<Response, RepositoryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!("Request failed with {}: {}", status, body);
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RepositoryError::PermissionDenied(
            format!("{} {}", status.as_u16(), body),
        ),
        StatusCode::NOT_FOUND => RepositoryError::NotFound,
        _ => RepositoryError::Status {
            status: status.as_u16(),
            body,
        },
    })
}

/// PostgREST equality filter value.
pub fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

//! User profile repository over the hosted data API (`/rest/v1`)
//!
//! Reads and inserts rows of the `users` table. Row-level security on the
//! backend expects the signed-in user's access token as the bearer; without
//! one the anonymous key is used.

use std::sync::Arc;

use async_trait::async_trait;
use magicbox_core::user::ports::UserProfileRepository as UserProfileRepositoryPort;
use magicbox_domain::constants::PROFILES_TABLE;
use magicbox_domain::{MagicBoxError, NewUserProfile, Result as DomainResult, UserProfile};
use reqwest::{Method, RequestBuilder};
use tracing::{debug, instrument};

use crate::auth::AccessTokenProvider;
use crate::http::HttpClient;

/// Data-API implementation of `UserProfileRepository`
pub struct RestProfileRepository {
    http: HttpClient,
    base_url: String,
    anon_key: String,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl RestProfileRepository {
    /// Repository over the `users` table at `base_url`
    pub fn new(
        http: HttpClient,
        backend_url: &str,
        anon_key: impl Into<String>,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self {
            http,
            base_url: backend_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            tokens,
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{PROFILES_TABLE}", self.base_url)
    }

    async fn authorized(&self, builder: RequestBuilder) -> DomainResult<RequestBuilder> {
        let token = self.tokens.access_token().await?.unwrap_or_else(|| self.anon_key.clone());
        Ok(builder.header("apikey", &self.anon_key).bearer_auth(token))
    }
}

#[async_trait]
impl UserProfileRepositoryPort for RestProfileRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<UserProfile>> {
        let request = self
            .http
            .request(Method::GET, self.table_url())
            .query(&[("id", format!("eq.{id}").as_str()), ("select", "*")]);
        let request = self.authorized(request).await?;

        let mut rows: Vec<UserProfile> = self.http.send_json(request).await?;
        debug!(found = !rows.is_empty(), "profile lookup");
        Ok(rows.pop())
    }

    #[instrument(skip(self, profile), fields(id = %profile.id))]
    async fn create(&self, profile: NewUserProfile) -> DomainResult<UserProfile> {
        let request = self
            .http
            .request(Method::POST, self.table_url())
            .header("Prefer", "return=representation")
            .json(&profile);
        let request = self.authorized(request).await?;

        let mut rows: Vec<UserProfile> = self.http.send_json(request).await?;
        rows.pop().ok_or_else(|| {
            MagicBoxError::Backend(format!("insert of profile {} returned no row", profile.id))
        })
    }
}

//! Client for the hosted auth API (`/auth/v1`)
//!
//! Holds the current session, runs the PKCE authorize/exchange handshake,
//! and publishes every session change on a [`SessionEventHub`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use magicbox_core::auth::{AuthSubsystem, SessionSubscription};
use magicbox_domain::{CallbackLocation, MagicBoxError, Result, Session, SessionEvent};
use parking_lot::{Mutex, RwLock};
use reqwest::Method;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::events::SessionEventHub;
use super::pkce::{PkcePair, CHALLENGE_METHOD};
use super::token::AccessTokenProvider;
use super::wire::{PkceGrant, RefreshGrant, TokenResponse};
use crate::http::{ensure_success, HttpClient};

/// Refresh this many seconds before the access token expires.
pub const REFRESH_THRESHOLD_SECS: i64 = 60;

/// Hosted auth API client
pub struct HostedAuthClient {
    http: HttpClient,
    base_url: String,
    session: RwLock<Option<Session>>,
    code_verifier: Mutex<Option<String>>,
    hub: SessionEventHub,
}

impl HostedAuthClient {
    /// # Errors
    /// Returns `MagicBoxError::Config` if `backend_url` is not a valid URL.
    pub fn new(http: HttpClient, backend_url: &str, hub: SessionEventHub) -> Result<Self> {
        Url::parse(backend_url).map_err(|err| {
            MagicBoxError::Config(format!("invalid backend URL '{backend_url}': {err}"))
        })?;

        Ok(Self {
            http,
            base_url: backend_url.trim_end_matches('/').to_string(),
            session: RwLock::new(None),
            code_verifier: Mutex::new(None),
            hub,
        })
    }

    /// Hub the client publishes session events on
    pub fn hub(&self) -> &SessionEventHub {
        &self.hub
    }

    /// Session currently held, without refreshing it
    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    /// Install a previously persisted session without publishing an event.
    pub fn restore_session(&self, session: Session) {
        *self.session.write() = Some(session);
    }

    /// Build the provider authorize URL for a PKCE sign-in.
    ///
    /// The code verifier is kept until [`exchange_code`](Self::exchange_code)
    /// consumes it. Starting a new sign-in replaces any pending verifier.
    ///
    /// # Errors
    /// Returns `MagicBoxError::Config` if the authorize URL cannot be built.
    pub fn start_sign_in(&self, provider: &str, redirect_to: &str) -> Result<String> {
        let pkce = PkcePair::generate();
        let mut url = Url::parse(&self.endpoint("authorize"))
            .map_err(|err| MagicBoxError::Config(format!("invalid authorize URL: {err}")))?;
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", &pkce.code_challenge)
            .append_pair("code_challenge_method", CHALLENGE_METHOD);

        *self.code_verifier.lock() = Some(pkce.code_verifier);
        info!(provider, redirect_to, "starting federated sign-in");
        Ok(url.into())
    }

    /// Exchange an authorization code for a session and publish `SignedIn`.
    ///
    /// # Errors
    /// Returns `MagicBoxError::Auth` when no sign-in is pending, or the
    /// mapped backend error when the exchange is rejected.
    #[instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<Session> {
        let verifier = self.code_verifier.lock().take().ok_or_else(|| {
            MagicBoxError::Auth("no pending sign-in: code verifier missing".into())
        })?;

        let request = self
            .http
            .request(Method::POST, self.endpoint("token?grant_type=pkce"))
            .json(&PkceGrant { auth_code: code, code_verifier: &verifier });
        let response: TokenResponse = self.http.send_json(request).await?;
        let session = response.into_session(Utc::now());

        info!(user_id = %session.user_id(), "authorization code exchanged");
        self.store_and_publish(session.clone(), SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    /// Run the code exchange when the callback location carries a `code`.
    ///
    /// Returns `Ok(None)` for locations with an `error` or without a code.
    ///
    /// # Errors
    /// Propagates exchange failures.
    pub async fn complete_from_location(
        &self,
        location: &CallbackLocation,
    ) -> Result<Option<Session>> {
        if location.error().is_some() {
            return Ok(None);
        }
        match location.code() {
            Some(code) => self.exchange_code(code).await.map(Some),
            None => Ok(None),
        }
    }

    /// Trade the refresh token for a new session and publish
    /// `TokenRefreshed`.
    ///
    /// # Errors
    /// Returns `MagicBoxError::Auth` when there is no refresh token, or the
    /// mapped backend error.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self) -> Result<Session> {
        let refresh_token = self
            .session
            .read()
            .as_ref()
            .and_then(|session| session.refresh_token.clone())
            .ok_or_else(|| MagicBoxError::Auth("no refresh token available".into()))?;

        let request = self
            .http
            .request(Method::POST, self.endpoint("token?grant_type=refresh_token"))
            .json(&RefreshGrant { refresh_token: &refresh_token });
        let response: TokenResponse = self.http.send_json(request).await?;
        let session = response.into_session(Utc::now());

        debug!(user_id = %session.user_id(), "session refreshed");
        self.store_and_publish(session.clone(), SessionEvent::TokenRefreshed(Some(session.clone())));
        Ok(session)
    }

    /// Revoke the session remotely, clear it locally and publish `SignedOut`.
    ///
    /// A failed logout call is logged; the local session is cleared anyway.
    pub async fn sign_out(&self) {
        let session = self.session.write().take();
        *self.code_verifier.lock() = None;

        if let Some(session) = session {
            let request = self
                .http
                .request(Method::POST, self.endpoint("logout"))
                .bearer_auth(&session.access_token);
            let result = match self.http.send(request).await {
                Ok(response) => ensure_success(response).await.map(|_| ()),
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                warn!(error = %err, "remote logout failed");
            }
        }

        self.hub.publish(&SessionEvent::SignedOut);
        info!("signed out");
    }

    /// Periodically refresh the session before it expires.
    pub fn spawn_auto_refresh(self: &Arc<Self>, check_every: Duration) -> AutoRefresh {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let client = Arc::clone(self);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    () = tokio::time::sleep(check_every) => {}
                }

                let expiring = client
                    .session
                    .read()
                    .as_ref()
                    .is_some_and(|session| session.is_expired(REFRESH_THRESHOLD_SECS));
                if expiring {
                    if let Err(err) = client.refresh_session().await {
                        warn!(error = %err, "automatic session refresh failed");
                    }
                }
            }
            debug!("auto refresh stopped");
        });

        AutoRefresh { cancel, task: Some(task) }
    }

    fn store_and_publish(&self, session: Session, event: SessionEvent) {
        *self.session.write() = Some(session);
        self.hub.publish(&event);
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }
}

#[async_trait]
impl AuthSubsystem for HostedAuthClient {
    /// Current session, refreshed first if it has already expired.
    async fn current_session(&self) -> Result<Option<Session>> {
        let current = self.session();
        match current {
            Some(session) if session.is_expired(0) && session.refresh_token.is_some() => {
                self.refresh_session().await.map(Some)
            }
            other => Ok(other),
        }
    }

    fn subscribe(&self) -> SessionSubscription {
        self.hub.subscribe()
    }
}

#[async_trait]
impl AccessTokenProvider for HostedAuthClient {
    async fn access_token(&self) -> Result<Option<String>> {
        Ok(self.current_session().await?.map(|session| session.access_token))
    }
}

/// Handle for the background refresh loop. Stops the loop on drop.
pub struct AutoRefresh {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl AutoRefresh {
    /// Stop the loop and wait for it to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

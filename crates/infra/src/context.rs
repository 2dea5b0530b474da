//! Wiring of the sign-in flow
//!
//! [`AuthContext`] owns the hosted auth client and the session resolver,
//! and exposes the two entry points the host shell needs: starting a
//! federated sign-in and handling the callback route.

use std::sync::Arc;
use std::time::Duration;

use magicbox_core::navigation::{
    capture_intended_destination, restore_intended_destination, DestinationStore, Navigator,
};
use magicbox_core::{
    ProfileProvisioner, ResolverConfig, ResolverHandle, SessionResolver, UserProfileRepository,
};
use magicbox_domain::{CallbackLocation, Config, Result};
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::auth::{HostedAuthClient, SessionEventHub};
use crate::database::RestProfileRepository;
use crate::http::HttpClient;
use crate::navigation::{ChannelNavigator, InMemoryDestinationStore, NavigationRequest};

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Sign-in flow assembled from configuration
pub struct AuthContext {
    config: Config,
    auth: Arc<HostedAuthClient>,
    resolver: SessionResolver,
    destinations: Arc<dyn DestinationStore>,
}

impl AuthContext {
    /// Build the context against the hosted backend in `config`.
    ///
    /// # Errors
    /// Returns `MagicBoxError::Config` if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(
        config: Config,
        navigator: Arc<dyn Navigator>,
        destinations: Arc<dyn DestinationStore>,
    ) -> Result<Self> {
        config.validate()?;

        let http = HttpClient::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("magicbox/", env!("CARGO_PKG_VERSION")))
            .api_key(&config.backend.anon_key)?
            .build()?;
        let auth =
            Arc::new(HostedAuthClient::new(http.clone(), &config.backend.url, SessionEventHub::new())?);
        let profiles = Arc::new(RestProfileRepository::new(
            http,
            &config.backend.url,
            config.backend.anon_key.clone(),
            auth.clone(),
        ));

        Ok(Self::from_parts(config, auth, profiles, navigator, destinations))
    }

    /// Build the context with redirects delivered on the returned channel
    /// and the intended destination kept in memory.
    ///
    /// # Errors
    /// See [`AuthContext::new`].
    pub fn with_channel(
        config: Config,
    ) -> Result<(Self, mpsc::UnboundedReceiver<NavigationRequest>)> {
        let (navigator, requests) = ChannelNavigator::new();
        let context =
            Self::new(config, Arc::new(navigator), Arc::new(InMemoryDestinationStore::new()))?;
        Ok((context, requests))
    }

    /// Assemble the context from already-built parts.
    pub fn from_parts(
        config: Config,
        auth: Arc<HostedAuthClient>,
        profiles: Arc<dyn UserProfileRepository>,
        navigator: Arc<dyn Navigator>,
        destinations: Arc<dyn DestinationStore>,
    ) -> Self {
        let resolver =
            SessionResolver::new(auth.clone(), ProfileProvisioner::new(profiles), navigator)
                .with_config(ResolverConfig::from(&config.auth));

        Self { config, auth, resolver, destinations }
    }

    /// Configuration the context was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Hosted auth client
    pub fn auth(&self) -> &Arc<HostedAuthClient> {
        &self.auth
    }

    /// Remember `current_route` and return the provider authorize URL.
    ///
    /// # Errors
    /// Propagates destination store and URL building failures.
    #[instrument(skip(self))]
    pub async fn begin_sign_in(
        &self,
        provider: &str,
        current_route: &str,
        current_origin: Option<&str>,
    ) -> Result<String> {
        capture_intended_destination(
            self.destinations.as_ref(),
            current_route,
            &self.config.auth.login_path,
        )
        .await?;

        let redirect_to = self.config.redirect_url(current_origin);
        self.auth.start_sign_in(provider, redirect_to)
    }

    /// Handle a visit to the callback route.
    ///
    /// The resolver is started before the code exchange so the `SignedIn`
    /// event from the exchange is observed. A failed exchange is logged and
    /// the resolver settles through its timeout.
    pub async fn handle_callback(&self, location: &CallbackLocation) -> ResolverHandle {
        let intended = restore_intended_destination(self.destinations.as_ref()).await;
        let handle = self.resolver.start(location, intended);

        if !handle.state().is_terminal() {
            match self.auth.complete_from_location(location).await {
                Ok(Some(session)) => info!(user_id = %session.user_id(), "callback code exchanged"),
                Ok(None) => {}
                Err(err) => warn!(error = %err, "callback code exchange failed"),
            }
        }

        handle
    }

    /// Parse `url` and handle it as a callback visit.
    ///
    /// # Errors
    /// Returns `MagicBoxError::InvalidInput` if `url` cannot be parsed.
    pub async fn handle_callback_url(&self, url: &str) -> Result<ResolverHandle> {
        let location = CallbackLocation::parse(url)?;
        Ok(self.handle_callback(&location).await)
    }

    /// Sign out of the hosted backend and drop the local session.
    pub async fn sign_out(&self) {
        self.auth.sign_out().await;
    }
}

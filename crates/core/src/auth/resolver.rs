//! Session resolver - completion of a federated sign-in
//!
//! After the provider redirects back, the resolver races a point-in-time
//! session check against the session-event feed, provisions the local
//! profile for whichever session shows up first, and hands control to the
//! [`Navigator`] exactly once.
//!
//! ```text
//! Pending ──session found──▶ provision ──ok──▶ Succeeded
//!    │                           └──err──▶ Failed(ProfileError)
//!    ├──?error=...──────────────────────▶ Failed(ProviderError)
//!    ├──signed out──────────────────────▶ Failed(SignedOut)
//!    ├──session check errored───────────▶ Failed(Unexpected)
//!    ├──task panicked───────────────────▶ Failed(Unexpected)
//!    └──timeout─────────────────────────▶ Failed(Timeout)
//! ```
//!
//! The immediate check, the event feed and the timeout run concurrently.
//! Each one claims a one-shot completion latch before acting, so whichever path
//! claims first decides the outcome and the others stand down.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use magicbox_domain::constants::{DEFAULT_DESTINATION, DEFAULT_SESSION_TIMEOUT_MS, LOGIN_PATH};
use magicbox_domain::{
    AuthConfig, AuthFailure, CallbackLocation, IntendedDestination, NavigateOptions,
    ResolverOutcome, ResolverState, Session, SessionEvent,
};
use parking_lot::{Mutex, ReentrantMutex};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::ports::{AuthSubsystem, SessionSubscription, Unsubscriber};
use crate::navigation::{resolve_destination, Navigator};
use crate::user::ProfileProvisioner;

/// Resolver settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// How long to wait for a session before failing with `Timeout`
    pub session_timeout: Duration,
    /// Landing route when no usable intended destination was captured
    pub default_destination: String,
    /// Route failures redirect to, annotated with `error=<reason>`
    pub login_path: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            session_timeout: Duration::from_millis(DEFAULT_SESSION_TIMEOUT_MS),
            default_destination: DEFAULT_DESTINATION.to_string(),
            login_path: LOGIN_PATH.to_string(),
        }
    }
}

impl From<&AuthConfig> for ResolverConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            session_timeout: config.session_timeout(),
            default_destination: config.default_destination.clone(),
            login_path: config.login_path.clone(),
        }
    }
}

/// One-shot latch for the completion routine
#[derive(Debug, Default)]
struct CompletionGuard(AtomicBool);

impl CompletionGuard {
    /// `true` for the first caller only.
    fn claim(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }
}

/// State shared between a handle and its background task.
///
/// `gate` holds the torn-down flag. Publishing an outcome and tearing down
/// both take it, so nothing is published once teardown has returned. It is
/// reentrant so a navigator may tear the handle down from inside
/// `navigate`.
struct Shared {
    gate: ReentrantMutex<Cell<bool>>,
    state: watch::Sender<ResolverState>,
    outcome: Mutex<Option<ResolverOutcome>>,
    cancel: CancellationToken,
    navigator: Arc<dyn Navigator>,
}

impl Shared {
    fn new(navigator: Arc<dyn Navigator>) -> Self {
        let (state, _) = watch::channel(ResolverState::Pending);
        Self {
            gate: ReentrantMutex::new(Cell::new(false)),
            state,
            outcome: Mutex::new(None),
            cancel: CancellationToken::new(),
            navigator,
        }
    }

    /// Publish the terminal outcome and navigate. No-op after teardown or
    /// once an outcome exists.
    fn conclude(&self, outcome: ResolverOutcome) -> bool {
        let gate = self.gate.lock();
        if gate.get() {
            debug!("resolver torn down, dropping outcome");
            return false;
        }

        {
            let mut slot = self.outcome.lock();
            if slot.is_some() {
                return false;
            }
            *slot = Some(outcome.clone());
        }

        if let Some(state) = outcome.state() {
            self.state.send_replace(state);
        }
        if let Some(destination) = outcome.destination() {
            self.navigator.navigate(destination, NavigateOptions::replace());
        }
        true
    }

    fn is_torn_down(&self) -> bool {
        self.gate.lock().get()
    }
}

/// Drives sign-in completion for callback locations
pub struct SessionResolver {
    auth: Arc<dyn AuthSubsystem>,
    provisioner: ProfileProvisioner,
    navigator: Arc<dyn Navigator>,
    config: ResolverConfig,
}

impl SessionResolver {
    /// Resolver with the default [`ResolverConfig`]
    pub fn new(
        auth: Arc<dyn AuthSubsystem>,
        provisioner: ProfileProvisioner,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self { auth, provisioner, navigator, config: ResolverConfig::default() }
    }

    /// Replace the resolver settings.
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Current resolver settings
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Start resolving `location`.
    ///
    /// The intended destination is consumed here. A location carrying an
    /// `error` parameter fails immediately without touching the auth
    /// subsystem; otherwise the work runs on a spawned task, so this must be
    /// called from within a Tokio runtime.
    pub fn start(
        &self,
        location: &CallbackLocation,
        mut intended: IntendedDestination,
    ) -> ResolverHandle {
        let success_destination = resolve_destination(
            intended.take().as_deref(),
            &self.config.login_path,
            &self.config.default_destination,
        );
        let shared = Arc::new(Shared::new(Arc::clone(&self.navigator)));

        if let Some(code) = location.error() {
            let failure = AuthFailure::ProviderError {
                code: code.to_string(),
                description: location.error_description().map(str::to_string),
            };
            warn!(reason = %failure.reason_code(), "provider returned an error");
            let destination = failure.redirect_destination(&self.config.login_path);
            shared.conclude(ResolverOutcome::Failed { failure, destination });
            return ResolverHandle::new(shared, None, None);
        }

        let subscription = self.auth.subscribe();
        let unsubscriber = subscription.unsubscriber();
        let task = ResolverTask {
            shared: Arc::clone(&shared),
            auth: Arc::clone(&self.auth),
            provisioner: self.provisioner.clone(),
            guard: CompletionGuard::default(),
            unsubscriber: unsubscriber.clone(),
            session_timeout: self.config.session_timeout,
            success_destination,
            login_path: self.config.login_path.clone(),
        };

        let span = info_span!("session_resolver", has_code = location.has_code());
        let worker = tokio::spawn(task.run(subscription).instrument(span.clone()));
        let abort = worker.abort_handle();
        tokio::spawn(
            supervise(
                Arc::clone(&shared),
                worker,
                unsubscriber.clone(),
                self.config.login_path.clone(),
            )
            .instrument(span),
        );
        ResolverHandle::new(shared, Some(unsubscriber), Some(abort))
    }
}

/// Conclude with `Unexpected` if the worker panics, so the handle never
/// stays `Pending` behind a dead task.
async fn supervise(
    shared: Arc<Shared>,
    worker: JoinHandle<()>,
    unsubscriber: Unsubscriber,
    login_path: String,
) {
    match worker.await {
        Ok(()) => {}
        Err(err) if err.is_panic() => {
            error!("session resolver task panicked");
            unsubscriber.unsubscribe();
            let failure = AuthFailure::unexpected("session resolver task panicked");
            let destination = failure.redirect_destination(&login_path);
            shared.conclude(ResolverOutcome::Failed { failure, destination });
        }
        Err(_) => debug!("session resolver task aborted"),
    }
}

struct ResolverTask {
    shared: Arc<Shared>,
    auth: Arc<dyn AuthSubsystem>,
    provisioner: ProfileProvisioner,
    guard: CompletionGuard,
    unsubscriber: Unsubscriber,
    session_timeout: Duration,
    success_destination: String,
    login_path: String,
}

impl ResolverTask {
    async fn run(self, mut subscription: SessionSubscription) {
        let cancel = self.shared.cancel.clone();
        let immediate = self.immediate_path();
        let events = self.event_path(&mut subscription);
        let timeout = tokio::time::sleep(self.session_timeout);
        tokio::pin!(immediate, events, timeout);
        let mut timed_out = false;

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => return,
                () = &mut immediate => return,
                () = &mut events => return,

                () = &mut timeout, if !timed_out => {
                    timed_out = true;
                    if self.settle(AuthFailure::Timeout) {
                        let timeout_ms = self.session_timeout.as_millis();
                        warn!(timeout_ms, "no session before timeout");
                        return;
                    }
                    debug!("timeout reached while completion is running");
                }
            }
        }
    }

    /// Point-in-time session check. Resolves only after concluding the run.
    async fn immediate_path(&self) {
        match self.auth.current_session().await {
            Ok(Some(session)) => {
                debug!("session found by immediate check");
                if self.complete(session).await {
                    return;
                }
            }
            Ok(None) => debug!("no session yet, waiting for events"),
            Err(err) => {
                warn!(error = %err, "session check failed");
                if self.settle(AuthFailure::unexpected(err.to_string())) {
                    return;
                }
            }
        }
        std::future::pending().await
    }

    /// Session-event feed. Resolves only after concluding the run.
    async fn event_path(&self, subscription: &mut SessionSubscription) {
        while let Some(event) = subscription.recv().await {
            if matches!(event, SessionEvent::SignedOut) {
                info!("signed out before sign-in completed");
                if self.settle(AuthFailure::SignedOut) {
                    return;
                }
                continue;
            }

            match event.session() {
                Some(session) => {
                    debug!(event = event.kind(), "session delivered by event");
                    if self.complete(session.clone()).await {
                        return;
                    }
                }
                None => debug!(event = event.kind(), "ignoring event without session"),
            }
        }
        debug!("session event feed closed");
        std::future::pending().await
    }

    /// Provision the profile for `session` and conclude.
    ///
    /// Returns `false` without doing anything if another path already
    /// claimed completion.
    async fn complete(&self, session: Session) -> bool {
        if !self.guard.claim() {
            debug!("completion already claimed");
            return false;
        }
        self.unsubscriber.unsubscribe();

        match self.provisioner.ensure_profile(&session.identity).await {
            Ok(outcome) => {
                info!(
                    user_id = %session.user_id(),
                    created = outcome.was_created(),
                    destination = %self.success_destination,
                    "sign-in completed"
                );
                self.shared.conclude(ResolverOutcome::Succeeded {
                    destination: self.success_destination.clone(),
                    user_id: session.user_id().to_string(),
                });
            }
            Err(err) => {
                warn!(error = %err, "profile provisioning failed");
                self.fail(AuthFailure::profile(err.to_string()));
            }
        }
        true
    }

    /// Claim completion and fail with `failure`. `false` if already claimed.
    fn settle(&self, failure: AuthFailure) -> bool {
        if !self.guard.claim() {
            debug!(reason = %failure.reason_code(), "completion already claimed");
            return false;
        }
        self.unsubscriber.unsubscribe();
        self.fail(failure);
        true
    }

    fn fail(&self, failure: AuthFailure) {
        let destination = failure.redirect_destination(&self.login_path);
        self.shared.conclude(ResolverOutcome::Failed { failure, destination });
    }
}

/// Owner of a running resolution. Dropping it tears the resolver down.
pub struct ResolverHandle {
    shared: Arc<Shared>,
    unsubscriber: Option<Unsubscriber>,
    task: Mutex<Option<AbortHandle>>,
}

impl ResolverHandle {
    fn new(
        shared: Arc<Shared>,
        unsubscriber: Option<Unsubscriber>,
        task: Option<AbortHandle>,
    ) -> Self {
        Self { shared, unsubscriber, task: Mutex::new(task) }
    }

    /// Current resolver state
    pub fn state(&self) -> ResolverState {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe_state(&self) -> watch::Receiver<ResolverState> {
        self.shared.state.subscribe()
    }

    /// Terminal outcome, if one has been reached
    pub fn outcome(&self) -> Option<ResolverOutcome> {
        self.shared.outcome.lock().clone()
    }

    /// Wait for the terminal outcome, or [`ResolverOutcome::TornDown`] if
    /// the handle is torn down first.
    pub async fn wait(&self) -> ResolverOutcome {
        let mut changes = self.shared.state.subscribe();
        loop {
            if let Some(outcome) = self.outcome() {
                return outcome;
            }
            if self.is_torn_down() {
                return ResolverOutcome::TornDown;
            }

            tokio::select! {
                () = self.shared.cancel.cancelled() => {}
                changed = changes.changed() => {
                    if changed.is_err() {
                        return self.outcome().unwrap_or(ResolverOutcome::TornDown);
                    }
                }
            }
        }
    }

    /// Release the subscription and timer and stop the background task.
    ///
    /// Synchronous and idempotent. Once this returns no state change or
    /// navigation happens.
    pub fn teardown(&self) {
        {
            let gate = self.shared.gate.lock();
            if gate.get() {
                return;
            }
            gate.set(true);
        }

        self.shared.cancel.cancel();
        if let Some(unsubscriber) = &self.unsubscriber {
            unsubscriber.unsubscribe();
        }
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
        debug!("session resolver torn down");
    }

    /// Whether [`ResolverHandle::teardown`] has run
    pub fn is_torn_down(&self) -> bool {
        self.shared.is_torn_down()
    }
}

impl Drop for ResolverHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

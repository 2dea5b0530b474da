//! Session resolver behaviour against in-memory fakes.
//!
//! Time is paused so timeouts and scripted delays run instantly.

mod support;

use std::sync::Arc;
use std::time::Duration;

use magicbox_core::{ProfileProvisioner, ResolverConfig, ResolverHandle, SessionResolver};
use magicbox_domain::{
    AuthFailure, CallbackLocation, IndicatorKind, IntendedDestination, MagicBoxError,
    NavigateOptions, NewUserProfile, ResolverOutcome, ResolverState, SessionEvent,
};
use support::auth::FakeAuth;
use support::navigation::RecordingNavigator;
use support::profiles::FakeProfiles;
use support::{identity, identity_with_name, session_for};

struct Harness {
    auth: Arc<FakeAuth>,
    profiles: Arc<FakeProfiles>,
    navigator: Arc<RecordingNavigator>,
    resolver: SessionResolver,
}

impl Harness {
    fn new(auth: Arc<FakeAuth>) -> Self {
        let profiles = FakeProfiles::new();
        let navigator = RecordingNavigator::new();
        let resolver = SessionResolver::new(
            auth.clone(),
            ProfileProvisioner::new(profiles.clone()),
            navigator.clone(),
        );
        Self { auth, profiles, navigator, resolver }
    }

    fn start(&self, location: &str, intended: IntendedDestination) -> ResolverHandle {
        let location = CallbackLocation::parse(location).unwrap();
        self.resolver.start(&location, intended)
    }
}

#[tokio::test(start_paused = true)]
async fn provider_error_fails_without_touching_backends() {
    let harness = Harness::new(FakeAuth::new());

    let handle = harness.start(
        "/auth/callback?error=access_denied&error_description=User%20cancelled",
        IntendedDestination::new("/submit"),
    );

    // Concluded synchronously inside `start`.
    let outcome = handle.outcome().unwrap();
    let ResolverOutcome::Failed { failure, destination } = outcome else {
        panic!("expected provider failure");
    };
    assert_eq!(
        failure,
        AuthFailure::ProviderError {
            code: "access_denied".into(),
            description: Some("User cancelled".into()),
        }
    );
    assert!(destination.starts_with("/login?error=access_denied"));
    assert!(destination.contains("error_description=User%20cancelled"));

    assert_eq!(harness.auth.session_calls(), 0);
    assert_eq!(harness.auth.subscribe_calls(), 0);
    assert_eq!(harness.profiles.find_calls(), 0);
    assert_eq!(harness.navigator.calls(), vec![(destination, NavigateOptions::replace())]);
}

#[tokio::test(start_paused = true)]
async fn immediate_session_creates_profile_from_email() {
    let auth = FakeAuth::with_session(session_for(identity("user-1", Some("ada@example.com"))));
    let harness = Harness::new(auth);

    let handle = harness.start("/auth/callback?code=abc", IntendedDestination::new("/submit"));
    let outcome = handle.wait().await;

    assert_eq!(
        outcome,
        ResolverOutcome::Succeeded { destination: "/submit".into(), user_id: "user-1".into() }
    );
    assert_eq!(handle.state(), ResolverState::Succeeded);

    let profile = harness.profiles.get("user-1").unwrap();
    assert_eq!(profile.name, "ada");
    assert_eq!(profile.avatar_url, None);

    assert_eq!(harness.navigator.destinations(), vec!["/submit".to_string()]);
    assert_eq!(harness.auth.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn falls_back_to_root_without_intended_destination() {
    let auth = FakeAuth::with_session(session_for(identity("user-1", Some("ada@example.com"))));
    let harness = Harness::new(auth);

    let handle = harness.start("/auth/callback", IntendedDestination::none());
    handle.wait().await;

    assert_eq!(harness.navigator.destinations(), vec!["/".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn unsafe_intended_destination_is_ignored() {
    let auth = FakeAuth::with_session(session_for(identity("user-1", None)));
    let harness = Harness::new(auth);

    let handle = harness.start("/auth/callback", IntendedDestination::new("//evil.example.com"));
    handle.wait().await;

    assert_eq!(harness.navigator.destinations(), vec!["/".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn event_only_session_with_existing_profile_is_noop() {
    let harness = Harness::new(FakeAuth::new());
    let user = identity_with_name("user-2", Some("grace@example.com"), "Grace Hopper");
    harness.profiles.seed(NewUserProfile::from_identity(&user));

    let handle = harness.start("/auth/callback?code=xyz", IntendedDestination::none());
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(handle.state(), ResolverState::Pending);

    harness.auth.emit(SessionEvent::SignedIn(session_for(user)));
    let outcome = handle.wait().await;

    assert!(matches!(outcome, ResolverOutcome::Succeeded { ref user_id, .. } if user_id == "user-2"));
    assert_eq!(harness.profiles.create_calls(), 0);
    assert_eq!(harness.profiles.len(), 1);
    assert_eq!(harness.navigator.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn completion_runs_once_when_event_arrives_first() {
    let user = identity("user-3", Some("linus@example.com"));
    let auth = FakeAuth::with_session(session_for(user.clone()));
    auth.set_delay(Duration::from_millis(500));
    let harness = Harness::new(auth);

    let handle = harness.start("/auth/callback?code=1", IntendedDestination::none());
    harness.auth.emit(SessionEvent::SignedIn(session_for(user)));
    handle.wait().await;

    // Run past the point where the immediate check would have returned.
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(harness.navigator.calls().len(), 1);
    assert_eq!(harness.profiles.find_calls(), 1);
    assert_eq!(harness.profiles.create_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn completion_runs_once_when_immediate_check_wins() {
    let user = identity("user-4", Some("barbara@example.com"));
    let harness = Harness::new(FakeAuth::with_session(session_for(user.clone())));

    let handle = harness.start("/auth/callback?code=1", IntendedDestination::none());
    harness.auth.emit(SessionEvent::SignedIn(session_for(user.clone())));
    handle.wait().await;

    harness.auth.emit(SessionEvent::SignedIn(session_for(user)));
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(harness.navigator.calls().len(), 1);
    assert_eq!(harness.profiles.find_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn times_out_without_session() {
    let harness = Harness::new(FakeAuth::new());

    let handle = harness.start("/auth/callback", IntendedDestination::new("/submit"));
    let outcome = handle.wait().await;

    assert_eq!(
        outcome,
        ResolverOutcome::Failed {
            failure: AuthFailure::Timeout,
            destination: "/login?error=timeout".into(),
        }
    );
    assert_eq!(handle.state().indicator().kind, IndicatorKind::Error);
    assert_eq!(harness.auth.listener_count(), 0);
    assert_eq!(harness.navigator.destinations(), vec!["/login?error=timeout".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn timeout_bound_is_configurable() {
    let harness = Harness::new(FakeAuth::new());
    let resolver = harness.resolver.with_config(ResolverConfig {
        session_timeout: Duration::from_secs(15),
        ..ResolverConfig::default()
    });

    let location = CallbackLocation::parse("/auth/callback").unwrap();
    let handle = resolver.start(&location, IntendedDestination::none());

    tokio::time::sleep(Duration::from_secs(12)).await;
    assert_eq!(handle.state(), ResolverState::Pending);

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(handle.state(), ResolverState::Failed(AuthFailure::Timeout));
}

#[tokio::test(start_paused = true)]
async fn teardown_before_resolution_suppresses_navigation() {
    let harness = Harness::new(FakeAuth::new());

    let handle = harness.start("/auth/callback?code=1", IntendedDestination::none());
    assert_eq!(harness.auth.listener_count(), 1);

    handle.teardown();
    assert!(handle.is_torn_down());
    assert_eq!(harness.auth.listener_count(), 0);

    harness.auth.emit(SessionEvent::SignedIn(session_for(identity("user-5", None))));
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert!(harness.navigator.calls().is_empty());
    assert_eq!(handle.state(), ResolverState::Pending);
    assert_eq!(handle.wait().await, ResolverOutcome::TornDown);
    assert_eq!(harness.profiles.find_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn teardown_during_provisioning_suppresses_navigation() {
    let auth = FakeAuth::with_session(session_for(identity("user-6", None)));
    let harness = Harness::new(auth);
    harness.profiles.set_create_delay(Duration::from_secs(1));

    let handle = harness.start("/auth/callback?code=1", IntendedDestination::none());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.profiles.create_calls(), 1);

    handle.teardown();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert!(harness.navigator.calls().is_empty());
    assert_eq!(handle.wait().await, ResolverOutcome::TornDown);
}

#[tokio::test(start_paused = true)]
async fn teardown_is_idempotent_and_runs_on_drop() {
    let harness = Harness::new(FakeAuth::new());

    let handle = harness.start("/auth/callback", IntendedDestination::none());
    handle.teardown();
    handle.teardown();

    let dropped = harness.start("/auth/callback", IntendedDestination::none());
    assert_eq!(harness.auth.listener_count(), 1);
    drop(dropped);
    assert_eq!(harness.auth.listener_count(), 0);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(harness.navigator.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn signed_out_before_sign_in_fails() {
    let harness = Harness::new(FakeAuth::new());

    let handle = harness.start("/auth/callback?code=1", IntendedDestination::none());
    harness.auth.emit(SessionEvent::SignedOut);
    let outcome = handle.wait().await;

    assert_eq!(
        outcome,
        ResolverOutcome::Failed {
            failure: AuthFailure::SignedOut,
            destination: "/login?error=signed_out".into(),
        }
    );
    assert_eq!(harness.auth.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn token_refresh_with_session_counts_as_sign_in() {
    let harness = Harness::new(FakeAuth::new());

    let handle = harness.start("/auth/callback?code=1", IntendedDestination::none());
    harness.auth.emit(SessionEvent::TokenRefreshed(None));
    harness
        .auth
        .emit(SessionEvent::TokenRefreshed(Some(session_for(identity("user-7", None)))));

    let outcome = handle.wait().await;
    assert!(matches!(outcome, ResolverOutcome::Succeeded { .. }));
    assert_eq!(harness.profiles.get("user-7").unwrap().name, "User");
}

#[tokio::test(start_paused = true)]
async fn closed_event_feed_keeps_waiting_for_immediate_check() {
    let auth = FakeAuth::with_session(session_for(identity("user-8", None)));
    auth.set_delay(Duration::from_secs(3));
    let harness = Harness::new(auth);

    let handle = harness.start("/auth/callback?code=1", IntendedDestination::none());
    harness.auth.close_feed();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(handle.state(), ResolverState::Pending);

    assert!(matches!(handle.wait().await, ResolverOutcome::Succeeded { .. }));
}

#[tokio::test(start_paused = true)]
async fn session_check_error_is_unexpected() {
    let harness = Harness::new(FakeAuth::failing("connection refused"));

    let handle = harness.start("/auth/callback?code=1", IntendedDestination::none());
    let outcome = handle.wait().await;

    let ResolverOutcome::Failed { failure, destination } = outcome else {
        panic!("expected failure");
    };
    assert!(matches!(failure, AuthFailure::Unexpected { .. }));
    assert_eq!(destination, "/login?error=auth_callback_failed");
}

#[tokio::test(start_paused = true)]
async fn panicking_session_check_fails_as_unexpected() {
    let harness = Harness::new(FakeAuth::panicking());

    let handle = harness.start("/auth/callback?code=1", IntendedDestination::new("/submit"));
    let outcome = handle.wait().await;

    assert_eq!(
        outcome,
        ResolverOutcome::Failed {
            failure: AuthFailure::unexpected("session resolver task panicked"),
            destination: "/login?error=auth_callback_failed".into(),
        }
    );
    assert!(matches!(handle.state(), ResolverState::Failed(AuthFailure::Unexpected { .. })));
    assert_eq!(
        harness.navigator.destinations(),
        vec!["/login?error=auth_callback_failed".to_string()]
    );
    assert_eq!(harness.auth.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn timeout_during_provisioning_defers_to_completion() {
    let harness = Harness::new(FakeAuth::new());
    harness.profiles.set_create_delay(Duration::from_secs(15));

    let handle = harness.start("/auth/callback?code=1", IntendedDestination::new("/submit"));
    harness.auth.emit(SessionEvent::SignedIn(session_for(identity("user-11", None))));

    tokio::time::sleep(Duration::from_secs(12)).await;
    assert_eq!(handle.state(), ResolverState::Pending);

    let outcome = handle.wait().await;
    assert_eq!(
        outcome,
        ResolverOutcome::Succeeded { destination: "/submit".into(), user_id: "user-11".into() }
    );
    assert_eq!(harness.navigator.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn late_session_check_error_defers_to_event_completion() {
    let auth = FakeAuth::failing("connection reset");
    auth.set_delay(Duration::from_millis(500));
    let harness = Harness::new(auth);
    harness.profiles.set_create_delay(Duration::from_secs(1));

    let handle = harness.start("/auth/callback?code=1", IntendedDestination::none());
    harness.auth.emit(SessionEvent::SignedIn(session_for(identity("user-12", None))));

    let outcome = handle.wait().await;
    assert!(matches!(outcome, ResolverOutcome::Succeeded { ref user_id, .. } if user_id == "user-12"));
    assert_eq!(harness.auth.session_calls(), 1);
    assert_eq!(harness.navigator.destinations(), vec!["/".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn provisioning_failure_is_profile_error() {
    let auth = FakeAuth::with_session(session_for(identity("user-9", None)));
    let harness = Harness::new(auth);
    harness.profiles.fail_creates_with(MagicBoxError::Backend("permission denied".into()));

    let handle = harness.start("/auth/callback?code=1", IntendedDestination::new("/submit"));
    let outcome = handle.wait().await;

    let ResolverOutcome::Failed { failure, destination } = outcome else {
        panic!("expected failure");
    };
    assert!(matches!(failure, AuthFailure::ProfileError { .. }));
    assert_eq!(destination, "/login?error=profile_error");
    assert_eq!(harness.navigator.destinations(), vec![destination]);
}

#[tokio::test(start_paused = true)]
async fn state_subscribers_see_pending_then_terminal() {
    let auth = FakeAuth::with_session(session_for(identity("user-10", None)));
    auth.set_delay(Duration::from_millis(200));
    let harness = Harness::new(auth);

    let handle = harness.start("/auth/callback?code=1", IntendedDestination::none());
    let mut states = handle.subscribe_state();
    assert_eq!(*states.borrow(), ResolverState::Pending);
    assert_eq!(states.borrow().indicator().message, "Completing sign in...");

    states.changed().await.unwrap();
    assert_eq!(*states.borrow(), ResolverState::Succeeded);
    assert_eq!(states.borrow().indicator().message, "Signed in! Redirecting...");
}

//! Resolver states, failures and terminal outcomes

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::constants::{ERROR_DESCRIPTION_PARAM, ERROR_PARAM};

/// Why a sign-in completion failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthFailure {
    /// The provider redirected back with an explicit `error` parameter
    ProviderError { code: String, description: Option<String> },
    /// No session showed up within the configured bound
    Timeout,
    /// A session exists but the local profile could not be ensured
    ProfileError { message: String },
    /// The auth subsystem reported sign-out before any sign-in
    SignedOut,
    /// Anything else, including a failed immediate session check
    Unexpected { message: String },
}

/// Codes the resolver uses for its own failures
const RESOLVER_CODES: [&str; 4] = ["timeout", "profile_error", "signed_out", "auth_callback_failed"];

impl AuthFailure {
    /// Profile provisioning failure with `message`
    pub fn profile(message: impl Into<String>) -> Self {
        Self::ProfileError { message: message.into() }
    }

    /// Catch-all failure with `message`
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected { message: message.into() }
    }

    /// Stable code placed in the `error=` annotation of the login route.
    ///
    /// Provider codes pass through unchanged unless they collide with one of
    /// the resolver's own codes, in which case they get a `provider_` prefix.
    pub fn reason_code(&self) -> Cow<'_, str> {
        match self {
            Self::ProviderError { code, .. } if RESOLVER_CODES.contains(&code.as_str()) => {
                Cow::Owned(format!("provider_{code}"))
            }
            Self::ProviderError { code, .. } => Cow::Borrowed(code),
            Self::Timeout => Cow::Borrowed("timeout"),
            Self::ProfileError { .. } => Cow::Borrowed("profile_error"),
            Self::SignedOut => Cow::Borrowed("signed_out"),
            Self::Unexpected { .. } => Cow::Borrowed("auth_callback_failed"),
        }
    }

    /// Text shown on the callback page
    pub fn user_message(&self) -> String {
        match self {
            Self::ProviderError { description: Some(description), .. } => {
                format!("Sign in was not completed: {description}")
            }
            Self::ProviderError { code, description: None } => {
                format!("Sign in was not completed ({code}).")
            }
            Self::Timeout => "Sign in took too long. Please try again.".to_string(),
            Self::ProfileError { .. } => {
                "We couldn't set up your profile. Please try again.".to_string()
            }
            Self::SignedOut => "You were signed out before sign in completed.".to_string(),
            Self::Unexpected { .. } => "Something went wrong while signing you in.".to_string(),
        }
    }

    /// Login route annotated with the reason code, plus the provider's
    /// description when there is one.
    pub fn redirect_destination(&self, login_path: &str) -> String {
        let mut destination = format!(
            "{login_path}?{ERROR_PARAM}={}",
            urlencoding::encode(&self.reason_code())
        );
        if let Self::ProviderError { description: Some(description), .. } = self {
            destination.push_str(&format!(
                "&{ERROR_DESCRIPTION_PARAM}={}",
                urlencoding::encode(description)
            ));
        }
        destination
    }
}

/// Observable resolver state. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "failure", rename_all = "snake_case")]
pub enum ResolverState {
    #[default]
    Pending,
    Succeeded,
    Failed(AuthFailure),
}

impl ResolverState {
    /// Anything but `Pending`
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Status indicator for the callback page
    pub fn indicator(&self) -> StatusIndicator {
        match self {
            Self::Pending => StatusIndicator {
                kind: IndicatorKind::Loading,
                message: "Completing sign in...".to_string(),
            },
            Self::Succeeded => StatusIndicator {
                kind: IndicatorKind::Success,
                message: "Signed in! Redirecting...".to_string(),
            },
            Self::Failed(failure) => {
                StatusIndicator { kind: IndicatorKind::Error, message: failure.user_message() }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Loading,
    Success,
    Error,
}

/// What the callback page shows for a state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusIndicator {
    pub kind: IndicatorKind,
    pub message: String,
}

/// Terminal result reported by a resolver handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverOutcome {
    Succeeded { destination: String, user_id: String },
    Failed { failure: AuthFailure, destination: String },
    /// The handle was torn down before a terminal state was reached
    TornDown,
}

impl ResolverOutcome {
    /// Route navigated to, if any
    pub fn destination(&self) -> Option<&str> {
        match self {
            Self::Succeeded { destination, .. } | Self::Failed { destination, .. } => {
                Some(destination)
            }
            Self::TornDown => None,
        }
    }

    /// Terminal state, or `None` for `TornDown`
    pub fn state(&self) -> Option<ResolverState> {
        match self {
            Self::Succeeded { .. } => Some(ResolverState::Succeeded),
            Self::Failed { failure, .. } => Some(ResolverState::Failed(failure.clone())),
            Self::TornDown => None,
        }
    }
}

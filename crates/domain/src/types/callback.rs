//! Callback location and navigation types

use serde::{Deserialize, Serialize};
use url::{form_urlencoded, Url};

use crate::constants::{CODE_PARAM, ERROR_DESCRIPTION_PARAM, ERROR_PARAM};
use crate::errors::{MagicBoxError, Result};

const RELATIVE_BASE: &str = "http://localhost";

/// The location the browser returned to after the provider redirect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackLocation {
    error: Option<String>,
    error_description: Option<String>,
    code: Option<String>,
}

impl CallbackLocation {
    /// Parse a full URL or a path with query string.
    ///
    /// Query parameters take precedence; the URL fragment fills in anything
    /// the query lacks, since implicit-grant providers report errors there.
    ///
    /// # Errors
    /// Returns `MagicBoxError::InvalidInput` if the location cannot be parsed.
    pub fn parse(location: &str) -> Result<Self> {
        let url = match Url::parse(location) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(RELATIVE_BASE)
                .and_then(|base| base.join(location))
                .map_err(|err| invalid_location(location, &err))?,
            Err(err) => return Err(invalid_location(location, &err)),
        };

        let mut parsed = Self::from_pairs(url.query_pairs());
        if let Some(fragment) = url.fragment() {
            let from_fragment = Self::from_pairs(form_urlencoded::parse(fragment.as_bytes()));
            parsed.error = parsed.error.or(from_fragment.error);
            parsed.error_description = parsed.error_description.or(from_fragment.error_description);
            parsed.code = parsed.code.or(from_fragment.code);
        }

        Ok(parsed)
    }

    /// Build from decoded key/value pairs. Empty values count as absent.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut location = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                ERROR_PARAM => &mut location.error,
                ERROR_DESCRIPTION_PARAM => &mut location.error_description,
                CODE_PARAM => &mut location.code,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.to_string());
            }
        }
        location
    }

    /// Provider `error` code, if present
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Provider `error_description`, if present
    pub fn error_description(&self) -> Option<&str> {
        self.error_description.as_deref()
    }

    /// Whether an authorization code came back
    pub fn has_code(&self) -> bool {
        self.code.is_some()
    }

    /// Authorization code, if present
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

fn invalid_location(location: &str, err: &url::ParseError) -> MagicBoxError {
    MagicBoxError::InvalidInput(format!("invalid callback location '{location}': {err}"))
}

/// Route captured before the user left for the login provider.
///
/// Reading it clears it: the first `take` returns the value, later calls
/// return `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntendedDestination(Option<String>);

impl IntendedDestination {
    /// Captured destination
    pub fn new(destination: impl Into<String>) -> Self {
        Self(Some(destination.into()))
    }

    /// Nothing captured
    pub fn none() -> Self {
        Self(None)
    }

    /// Consume the destination; later calls return `None`.
    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    /// Destination without consuming it
    pub fn peek(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl From<Option<String>> for IntendedDestination {
    fn from(value: Option<String>) -> Self {
        Self(value)
    }
}

/// Options passed to the redirect router
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
}

impl NavigateOptions {
    /// Replace the current history entry
    pub fn replace() -> Self {
        Self { replace: true }
    }
}

/// Accept only same-origin absolute paths that are not in `blocked`.
///
/// Rejects protocol-relative (`//host`) and backslash-prefixed paths, URLs
/// with a scheme, and any path whose route part matches a blocked route.
pub fn sanitize_destination(raw: &str, blocked: &[&str]) -> Option<String> {
    let candidate = raw.trim();
    if !candidate.starts_with('/') || candidate.starts_with("//") || candidate.starts_with("/\\") {
        return None;
    }

    let route = candidate.split(['?', '#']).next().unwrap_or(candidate);
    let route = if route.len() > 1 { route.trim_end_matches('/') } else { route };
    if blocked.iter().any(|blocked| route == *blocked) {
        return None;
    }

    Some(candidate.to_string())
}

//! Conversions from external infrastructure errors into domain errors.

use magicbox_domain::MagicBoxError;
use reqwest::Error as HttpError;
use reqwest::StatusCode;
use serde::Deserialize;

/// Postgres unique-violation SQLSTATE
const UNIQUE_VIOLATION: &str = "23505";
/// PostgREST "no rows" code for single-object requests
const NO_ROWS: &str = "PGRST116";

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct InfraError(#[from] pub MagicBoxError);

impl From<InfraError> for MagicBoxError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoMagicBoxError {
    fn into_magicbox(self) -> MagicBoxError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → MagicBoxError */
/* -------------------------------------------------------------------------- */

impl IntoMagicBoxError for HttpError {
    fn into_magicbox(self) -> MagicBoxError {
        if self.is_timeout() {
            return MagicBoxError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return MagicBoxError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return status_error(status, None);
        }

        if self.is_decode() {
            return MagicBoxError::Backend(format!("malformed response body: {self}"));
        }

        MagicBoxError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_magicbox())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error / std::io::Error → MagicBoxError */
/* -------------------------------------------------------------------------- */

impl IntoMagicBoxError for serde_json::Error {
    fn into_magicbox(self) -> MagicBoxError {
        MagicBoxError::Backend(format!("invalid JSON payload: {self}"))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        Self(value.into_magicbox())
    }
}

impl IntoMagicBoxError for std::io::Error {
    fn into_magicbox(self) -> MagicBoxError {
        match self.kind() {
            std::io::ErrorKind::NotFound => MagicBoxError::NotFound(self.to_string()),
            _ => MagicBoxError::Internal(format!("I/O error: {self}")),
        }
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        Self(value.into_magicbox())
    }
}

/* -------------------------------------------------------------------------- */
/* Backend error bodies → MagicBoxError */
/* -------------------------------------------------------------------------- */

/// Error payload returned by the hosted backend.
///
/// The data API reports `code`/`message`/`details`/`hint`; the auth API uses
/// `error`/`error_description` or `msg`. Every field is optional so one type
/// can read both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BackendErrorBody {
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl BackendErrorBody {
    /// Parse a response body, tolerating non-JSON payloads.
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| Self {
            message: Some(body.trim().to_string()).filter(|message| !message.is_empty()),
            ..Self::default()
        })
    }

    /// Error code as text. The auth API sends numeric codes.
    pub fn code(&self) -> Option<String> {
        match self.code.as_ref()? {
            serde_json::Value::String(code) => Some(code.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Most specific message in the body, if any
    pub fn summary(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.error_description.clone())
            .or_else(|| self.msg.clone())
            .or_else(|| self.error.clone())
    }

    /// Map an unsuccessful response into a domain error.
    pub fn into_error(self, status: StatusCode) -> MagicBoxError {
        let code = self.code();
        let summary = self.summary();
        let detail = match (&code, &summary) {
            (Some(code), Some(summary)) => Some(format!("{code}: {summary}")),
            (None, Some(summary)) => Some(summary.clone()),
            (Some(code), None) => Some(code.clone()),
            (None, None) => None,
        };

        match code.as_deref() {
            Some(UNIQUE_VIOLATION) => {
                return MagicBoxError::Conflict(detail.unwrap_or_default());
            }
            Some(NO_ROWS) => return MagicBoxError::NotFound(detail.unwrap_or_default()),
            _ => {}
        }

        status_error(status, detail)
    }
}

fn status_error(status: StatusCode, detail: Option<String>) -> MagicBoxError {
    let code = status.as_u16();
    let mut message = format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));
    if let Some(detail) = detail {
        message.push_str(": ");
        message.push_str(&detail);
    }

    match code {
        401 | 403 => MagicBoxError::Auth(message),
        404 => MagicBoxError::NotFound(message),
        409 => MagicBoxError::Conflict(message),
        429 => MagicBoxError::Network(message),
        400..=499 => MagicBoxError::InvalidInput(message),
        500..=599 => MagicBoxError::Backend(message),
        _ => MagicBoxError::Network(message),
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

//! Capture and restore of the route the user was trying to reach

use magicbox_domain::constants::CALLBACK_PATH;
use magicbox_domain::{sanitize_destination, IntendedDestination, Result};
use tracing::{debug, warn};

use super::ports::DestinationStore;

/// Where to send the user once signed in.
///
/// The intended route is used only if it is a same-origin path that is not
/// the login or callback route; otherwise `default_destination`.
pub fn resolve_destination(
    intended: Option<&str>,
    login_path: &str,
    default_destination: &str,
) -> String {
    intended
        .and_then(|raw| sanitize_destination(raw, &[login_path, CALLBACK_PATH]))
        .unwrap_or_else(|| default_destination.to_string())
}

/// Remember `current_route` before leaving for the login provider.
///
/// Returns `false` without touching the store when the route is not worth
/// returning to.
///
/// # Errors
/// Propagates store failures.
pub async fn capture_intended_destination(
    store: &dyn DestinationStore,
    current_route: &str,
    login_path: &str,
) -> Result<bool> {
    let Some(destination) = sanitize_destination(current_route, &[login_path, CALLBACK_PATH])
    else {
        debug!(route = %current_route, "not capturing intended destination");
        return Ok(false);
    };

    store.save(&destination).await?;
    Ok(true)
}

/// Read and clear the saved destination. Store failures count as "none".
pub async fn restore_intended_destination(store: &dyn DestinationStore) -> IntendedDestination {
    match store.take().await {
        Ok(destination) => IntendedDestination::from(destination),
        Err(err) => {
            warn!(error = %err, "failed to read intended destination");
            IntendedDestination::none()
        }
    }
}

//! Port interfaces for the hosted auth subsystem

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use magicbox_domain::{Result, Session, SessionEvent};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Point-in-time session lookup plus a session-event feed
#[async_trait]
pub trait AuthSubsystem: Send + Sync {
    /// Session currently held by the auth subsystem, if any
    async fn current_session(&self) -> Result<Option<Session>>;

    /// Register a listener for session-lifecycle events
    fn subscribe(&self) -> SessionSubscription;
}

type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Releases a listener registration exactly once.
///
/// Clones share the same registration; the first `unsubscribe` wins.
#[derive(Clone)]
pub struct Unsubscriber {
    release: Arc<Mutex<Option<ReleaseFn>>>,
}

impl Unsubscriber {
    /// Unsubscriber that runs `release` on first use
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self { release: Arc::new(Mutex::new(Some(Box::new(release)))) }
    }

    /// Unsubscriber for a registration that holds nothing to release
    pub fn noop() -> Self {
        Self { release: Arc::new(Mutex::new(None)) }
    }

    /// Release the registration. Later calls do nothing.
    pub fn unsubscribe(&self) {
        let release = self.release.lock().take();
        if let Some(release) = release {
            release();
        }
    }

    /// Whether the registration has been released
    pub fn is_released(&self) -> bool {
        self.release.lock().is_none()
    }
}

impl fmt::Debug for Unsubscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscriber").field("released", &self.is_released()).finish()
    }
}

/// Live registration on the session-event feed.
///
/// Dropping the subscription releases the registration.
#[derive(Debug)]
pub struct SessionSubscription {
    events: mpsc::UnboundedReceiver<SessionEvent>,
    unsubscriber: Unsubscriber,
}

impl SessionSubscription {
    /// Subscription reading `events`, released through `unsubscriber`
    pub fn new(events: mpsc::UnboundedReceiver<SessionEvent>, unsubscriber: Unsubscriber) -> Self {
        Self { events, unsubscriber }
    }

    /// Next event, or `None` once the feed has closed.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Handle that releases this registration from elsewhere
    pub fn unsubscriber(&self) -> Unsubscriber {
        self.unsubscriber.clone()
    }

    /// Release the registration and close the feed.
    pub fn unsubscribe(&mut self) {
        self.unsubscriber.unsubscribe();
        self.events.close();
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

//! Scriptable fake for `AuthSubsystem`

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use magicbox_core::auth::{AuthSubsystem, SessionSubscription, Unsubscriber};
use magicbox_domain::{MagicBoxError, Result as DomainResult, Session, SessionEvent};
use parking_lot::Mutex;
use tokio::sync::mpsc;

type Listeners = Arc<Mutex<Vec<(u64, mpsc::UnboundedSender<SessionEvent>)>>>;

/// Fake auth subsystem.
///
/// `current_session` returns the scripted result after an optional delay.
/// Events emitted with [`FakeAuth::emit`] reach every live subscription.
#[derive(Default)]
pub struct FakeAuth {
    current: Mutex<Option<DomainResult<Option<Session>>>>,
    panics: AtomicBool,
    delay: Mutex<Option<Duration>>,
    listeners: Listeners,
    next_id: AtomicU64,
    session_calls: AtomicUsize,
    subscribe_calls: AtomicUsize,
}

impl FakeAuth {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_session(session: Session) -> Arc<Self> {
        let auth = Self::default();
        *auth.current.lock() = Some(Ok(Some(session)));
        Arc::new(auth)
    }

    pub fn failing(message: &str) -> Arc<Self> {
        let auth = Self::default();
        *auth.current.lock() = Some(Err(MagicBoxError::Network(message.to_string())));
        Arc::new(auth)
    }

    /// Session check that panics instead of returning.
    pub fn panicking() -> Arc<Self> {
        let auth = Self::default();
        auth.panics.store(true, Ordering::SeqCst);
        Arc::new(auth)
    }

    /// Delay the immediate session check.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn emit(&self, event: SessionEvent) {
        let listeners = self.listeners.lock().clone();
        for (_, sender) in listeners {
            let _ = sender.send(event.clone());
        }
    }

    /// Drop every sender so subscribers see the feed close.
    pub fn close_feed(&self) {
        self.listeners.lock().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn session_calls(&self) -> usize {
        self.session_calls.load(Ordering::SeqCst)
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthSubsystem for FakeAuth {
    async fn current_session(&self) -> DomainResult<Option<Session>> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.panics.load(Ordering::SeqCst) {
            panic!("session store corrupted");
        }
        self.current.lock().clone().unwrap_or(Ok(None))
    }

    fn subscribe(&self) -> SessionSubscription {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = mpsc::unbounded_channel();
        self.listeners.lock().push((id, sender));

        let listeners = Arc::clone(&self.listeners);
        SessionSubscription::new(
            receiver,
            Unsubscriber::new(move || listeners.lock().retain(|(entry, _)| *entry != id)),
        )
    }
}

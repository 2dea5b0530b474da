//! In-process registry of session-event listeners

use std::sync::Arc;

use dashmap::DashMap;
use magicbox_core::auth::{SessionSubscription, Unsubscriber};
use magicbox_domain::SessionEvent;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

/// Fans session events out to every live subscription.
///
/// Cloning shares the registry.
#[derive(Clone, Default)]
pub struct SessionEventHub {
    listeners: Arc<DashMap<Uuid, mpsc::UnboundedSender<SessionEvent>>>,
}

impl SessionEventHub {
    /// Hub with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every listener, pruning ones whose receiver is
    /// gone. Returns the number of listeners reached.
    pub fn publish(&self, event: &SessionEvent) -> usize {
        let mut delivered = 0;
        self.listeners.retain(|_, sender| {
            let alive = sender.send(event.clone()).is_ok();
            delivered += usize::from(alive);
            alive
        });
        debug!(event = event.kind(), delivered, "published session event");
        delivered
    }

    /// Register a listener; it sees events published from now on
    pub fn subscribe(&self) -> SessionSubscription {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();
        self.listeners.insert(id, sender);
        trace!(%id, "session listener registered");

        let listeners = Arc::clone(&self.listeners);
        SessionSubscription::new(
            receiver,
            Unsubscriber::new(move || {
                listeners.remove(&id);
                trace!(%id, "session listener released");
            }),
        )
    }

    /// Number of live listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

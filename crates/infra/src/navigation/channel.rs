//! Navigator that hands redirects to the host shell over a channel

use magicbox_core::navigation::Navigator;
use magicbox_domain::NavigateOptions;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// One redirect for the host to perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationRequest {
    pub destination: String,
    pub replace: bool,
}

/// Non-blocking [`Navigator`] backed by an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    sender: mpsc::UnboundedSender<NavigationRequest>,
}

impl ChannelNavigator {
    /// Navigator plus the receiving end of its requests
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NavigationRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, destination: &str, options: NavigateOptions) {
        let request =
            NavigationRequest { destination: destination.to_string(), replace: options.replace };
        info!(destination, replace = options.replace, "navigating");
        if self.sender.send(request).is_err() {
            warn!(destination, "navigation dropped: host receiver closed");
        }
    }
}

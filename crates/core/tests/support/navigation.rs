//! Recording fake for `Navigator`

use std::sync::Arc;

use magicbox_core::navigation::Navigator;
use magicbox_domain::NavigateOptions;
use parking_lot::Mutex;

#[derive(Default)]
pub struct RecordingNavigator {
    calls: Mutex<Vec<(String, NavigateOptions)>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<(String, NavigateOptions)> {
        self.calls.lock().clone()
    }

    pub fn destinations(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(destination, _)| destination.clone()).collect()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: &str, options: NavigateOptions) {
        self.calls.lock().push((destination.to_string(), options));
    }
}

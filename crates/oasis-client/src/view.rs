//! Passive view contract.
//!
//! A screen implements [`View`] and never talks to the network or the store
//! itself; its view model tells it what to show.

use oasis_store::Record;

pub trait View: Send + Sync {
    /// A sync has started.
    fn show_loading(&self);

    /// Render `records`.  `empty_message` is the server's empty-state text,
    /// meant for display when `records` is empty.
    fn reload(&self, records: &[Record], empty_message: Option<&str>);

    /// A sync failed; previously shown data stays on screen.
    fn show_error(&self, message: &str);
}

/// View that only logs, for headless syncs.
#[derive(Debug, Clone)]
pub struct LogView {
    pub screen: &'static str,
}

impl View for LogView {
    fn show_loading(&self) {
        tracing::debug!(screen = self.screen, "loading");
    }

    fn reload(&self, records: &[Record], empty_message: Option<&str>) {
        if records.is_empty() {
            tracing::info!(
                screen = self.screen,
                empty_state = empty_message.unwrap_or(""),
                "nothing to show"
            );
        } else {
            tracing::info!(screen = self.screen, count = records.len(), "records loaded");
        }
    }

    fn show_error(&self, message: &str) {
        tracing::error!(screen = self.screen, reason = message, "sync failed");
    }
}

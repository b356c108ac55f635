//! Client side of the Oasis cache: REST access, view models and the
//! per-feature resources built on `oasis-store`.

pub mod api;
pub mod config;
pub mod error;
pub mod push;
pub mod requests;
pub mod resources;
pub mod session;
pub mod view;
pub mod view_model;

#[cfg(test)]
mod testing;

use tracing_subscriber::{fmt, EnvFilter};

pub use api::{HttpClient, RestClient};
pub use config::ClientConfig;
pub use error::{ApiError, Result, SyncError};
pub use session::Session;
pub use view::{LogView, View};
pub use view_model::{Phase, SyncOutcome, ViewModel};

/// Install the `fmt` subscriber.  `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("oasis_client=debug,oasis_store=info,warn"));

    // a subscriber installed earlier (by a host app or test) wins
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

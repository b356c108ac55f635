//! # oasis-sync
//!
//! Headless refresh of every cached resource for one customer.
//!
//! Usage: `oasis-sync [customer-id]`.  Without an argument the customer is
//! taken from `OASIS_CUSTOMER_ID`.

use anyhow::{bail, Context};
use oasis_client::{init_tracing, ClientConfig, Session, SyncOutcome};
use oasis_shared::constants::APP_NAME;
use oasis_shared::{CustomerId, RecordKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("Starting {APP_NAME} sync v{}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_env();
    info!(?config, "Loaded configuration");

    let customer = match std::env::args().nth(1).or_else(|| config.customer_id.clone()) {
        Some(id) => CustomerId::new(id).context("customer id must not be blank")?,
        None => bail!("no customer given: pass one as an argument or set OASIS_CUSTOMER_ID"),
    };

    let session = Session::open(&config, customer).context("failed to open session")?;

    let mut failed = 0usize;
    for kind in RecordKind::ALL {
        match session.sync_kind(kind).await {
            Ok(SyncOutcome::Synced(report)) => {
                info!(%kind, changed = report.changed(), "synced");
            }
            Ok(SyncOutcome::AlreadyLoading) => {}
            Err(e) => {
                error!(%kind, error = %e, "sync failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} syncs failed", RecordKind::ALL.len());
    }
    info!("all resources up to date");
    Ok(())
}

//! The lifecycle every screen's view model follows.
//!
//! `Idle → Loading → {Success | Failure} → Idle`.  A sync fetches once,
//! reconciles the payload in one write transaction, then reloads the view
//! from the resource's recipe.  Failures leave the store as it was and only
//! surface a message.  There is no automatic retry; pull-to-refresh simply
//! calls [`ViewModel::initialize`] again.

use std::sync::{Arc, Mutex, PoisonError};

use oasis_shared::{CustomerId, Envelope};
use oasis_store::{
    reconcile, LocalStore, Recipe, ReconcileContext, ReconcileReport, ReconcileScope, SyncRun,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::api::RestClient;
use crate::error::{Result, SyncError};
use crate::resources::SyncResource;
use crate::view::View;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced(ReconcileReport),
    /// Another sync of this view model was already running.
    AlreadyLoading,
}

pub struct ViewModel<R, C, V> {
    resource: R,
    customer: CustomerId,
    client: Arc<C>,
    store: LocalStore,
    view: V,
    recipe: Recipe,
    phase: Mutex<Phase>,
    empty_message: Mutex<Option<String>>,
}

/// Puts the phase back to `Idle` however the sync ends, including when the
/// future is dropped mid-flight.
struct IdleOnDrop<'a>(&'a Mutex<Phase>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Phase::Idle;
    }
}

impl<R, C, V> ViewModel<R, C, V>
where
    R: SyncResource,
    C: RestClient,
    V: View,
{
    pub fn new(resource: R, customer: CustomerId, client: Arc<C>, store: LocalStore, view: V) -> Self {
        let recipe = resource.recipe(&customer);
        Self {
            resource,
            customer,
            client,
            store,
            view,
            recipe,
            phase: Mutex::new(Phase::Idle),
            empty_message: Mutex::new(None),
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn customer(&self) -> &CustomerId {
        &self.customer
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Fetch, reconcile and reload.
    ///
    /// Returns [`SyncOutcome::AlreadyLoading`] without doing anything if a
    /// sync is already in flight.
    pub async fn initialize(&self) -> Result<SyncOutcome> {
        if !self.try_begin() {
            debug!(screen = self.resource.screen(), "sync already in flight, skipping");
            return Ok(SyncOutcome::AlreadyLoading);
        }
        let _idle = IdleOnDrop(&self.phase);

        self.view.show_loading();

        let synced = self.sync().await.and_then(|(report, message)| {
            self.set_phase(Phase::Success);
            *self
                .empty_message
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = message;
            self.reload()?;
            Ok(report)
        });

        match synced {
            Ok(report) => {
                info!(
                    screen = self.resource.screen(),
                    customer = %self.customer,
                    inserted = report.inserted,
                    updated = report.updated,
                    unchanged = report.unchanged,
                    skipped = report.skipped,
                    "sync complete"
                );
                Ok(SyncOutcome::Synced(report))
            }
            Err(e) => {
                warn!(screen = self.resource.screen(), error = %e, "sync failed");
                self.set_phase(Phase::Failure);
                self.view.show_error(&e.user_message());
                Err(e)
            }
        }
    }

    /// Re-query the store and hand the result to the view.  No network.
    pub fn reload(&self) -> Result<()> {
        let records = self.store.query(&self.recipe)?;
        let message = self
            .empty_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        self.view.reload(&records, message.as_deref());
        Ok(())
    }

    /// Last successful sync of this screen's records.
    pub fn last_sync(&self) -> Result<Option<SyncRun>> {
        let kind = self.resource.kind();
        Ok(self
            .store
            .read(|db| db.last_sync(kind, Some(&self.customer)))?)
    }

    /// Reload whenever a writer commits records of this kind.
    ///
    /// The view model holds its own store handle, so the change stream never
    /// closes while it exists; run this in a task and abort it when the
    /// screen goes away.  Commits made by this view model's own
    /// [`initialize`](Self::initialize) may be seen after the phase is back
    /// to `Idle` and cause one more reload.
    pub async fn follow_changes(&self) {
        let kind = self.resource.kind();
        let mut changes = self.store.subscribe();

        loop {
            match changes.recv().await {
                Ok(change) if change.kind == kind => self.reload_if_idle(),
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    debug!(screen = self.resource.screen(), missed, "store change stream lagged");
                    self.reload_if_idle();
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    fn reload_if_idle(&self) {
        if self.phase() != Phase::Idle {
            return;
        }
        if let Err(e) = self.reload() {
            warn!(screen = self.resource.screen(), error = %e, "reload after store change failed");
        }
    }

    async fn sync(&self) -> Result<(ReconcileReport, Option<String>)> {
        let kind = self.resource.kind();
        let request = self.resource.request(&self.customer);
        let Envelope { data, message } = self.client.send(&request).await?;

        let mut ctx = ReconcileContext::new(kind, Some(self.customer.clone()))
            .with_flag_keys(self.resource.flag_keys());
        if self.resource.restrict_to_known() {
            let known = self
                .store
                .read(|db| db.known_ids(kind, Some(&self.customer)))?;
            ctx = ctx.with_scope(ReconcileScope::Known(known));
        }

        let report = self
            .store
            .write(kind, move |tx| {
                let report = reconcile(tx, &ctx, &data)?;
                tx.record_sync(&report.into_sync_run(ctx.kind, ctx.owner.clone()))?;
                Ok(report)
            })
            .await
            .map_err(SyncError::Store)?;

        Ok((report, message))
    }

    fn try_begin(&self) -> bool {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if *phase != Phase::Idle {
            return false;
        }
        *phase = Phase::Loading;
        true
    }

    fn set_phase(&self, next: Phase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

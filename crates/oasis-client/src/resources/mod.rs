//! Per-feature resources.
//!
//! Each resource tells a [`ViewModel`](crate::view_model::ViewModel) what
//! to fetch, how to reconcile it and how to query it back.  Local actions
//! that outlive a single sync (mark read, set default, add address) live
//! next to the resource they touch.

pub mod appointments;
pub mod notifications;
pub mod purchases;
pub mod shipping_addresses;
pub mod skin_analysis;

use std::collections::HashSet;

use oasis_shared::{CustomerId, Envelope, RecordId, RecordKind};
use oasis_store::{
    reconcile, FlagKeys, LocalStore, Recipe, ReconcileContext, ReconcileReport, ReconcileScope,
};

use crate::error::Result;
use crate::requests::Request;

pub use appointments::{AppointmentDetails, Appointments};
pub use notifications::Notifications;
pub use purchases::Purchases;
pub use shipping_addresses::ShippingAddresses;
pub use skin_analysis::SkinAnalyses;

pub trait SyncResource: Send + Sync {
    fn kind(&self) -> RecordKind;

    /// Screen name for logs.
    fn screen(&self) -> &'static str;

    fn request(&self, customer: &CustomerId) -> Request;

    fn recipe(&self, customer: &CustomerId) -> Recipe;

    /// Payload keys seeding local flags of new records.
    fn flag_keys(&self) -> FlagKeys {
        FlagKeys::default()
    }

    /// Only update records already cached ("get X by id" flows).
    fn restrict_to_known(&self) -> bool {
        false
    }
}

/// Fold a confirmation response for one cached record back into the store.
/// Only `id` is touched; other items in the response are ignored.
pub(crate) async fn absorb_confirmation(
    store: &LocalStore,
    kind: RecordKind,
    customer: &CustomerId,
    id: &RecordId,
    envelope: Envelope,
) -> Result<ReconcileReport> {
    if envelope.is_empty() {
        return Ok(ReconcileReport::default());
    }
    let ctx = ReconcileContext::new(kind, Some(customer.clone()))
        .with_scope(ReconcileScope::Known(HashSet::from([id.clone()])));
    let data = envelope.data;
    Ok(store.write(kind, move |tx| reconcile(tx, &ctx, &data)).await?)
}

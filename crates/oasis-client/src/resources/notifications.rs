use oasis_shared::{CustomerId, RecordId, RecordKind};
use oasis_store::{Direction, Field, FlagKeys, LocalStore, Recipe};
use tracing::{debug, warn};

use crate::api::RestClient;
use crate::error::Result;
use crate::requests::{NotificationsRequest, Request};
use crate::resources::{absorb_confirmation, SyncResource};

const KIND: RecordKind = RecordKind::Notification;

/// Inbox, newest first.  The read flag is owned locally once a
/// notification is cached.
#[derive(Debug, Clone, Copy, Default)]
pub struct Notifications;

impl SyncResource for Notifications {
    fn kind(&self) -> RecordKind {
        KIND
    }

    fn screen(&self) -> &'static str {
        "notifications"
    }

    fn request(&self, customer: &CustomerId) -> Request {
        Request::Notifications(NotificationsRequest::List {
            customer: customer.clone(),
        })
    }

    fn recipe(&self, customer: &CustomerId) -> Recipe {
        Recipe::new(KIND)
            .owned_by(customer.clone())
            .sort_by(Field::data("created_at"), Direction::Descending)
    }

    fn flag_keys(&self) -> FlagKeys {
        FlagKeys {
            read: Some("is_read"),
            default: None,
        }
    }
}

/// Mark a cached notification read, then tell the server.
///
/// The local flag is committed first and stays set if the server call
/// fails; the error is still returned.  Returns whether the flag changed.
pub async fn mark_read<C: RestClient>(
    store: &LocalStore,
    client: &C,
    customer: &CustomerId,
    id: &RecordId,
) -> Result<bool> {
    let changed = {
        let owner = customer.clone();
        let id = id.clone();
        store
            .write(KIND, move |tx| tx.set_read(KIND, Some(&owner), &id, true))
            .await?
    };
    debug!(customer = %customer, id = %id, changed, "notification marked read locally");

    let request = Request::Notifications(NotificationsRequest::MarkRead {
        customer: customer.clone(),
        id: id.clone(),
    });
    let envelope = client.send(&request).await.map_err(|e| {
        warn!(customer = %customer, id = %id, error = %e, "mark-read confirmation failed");
        e
    })?;

    absorb_confirmation(store, KIND, customer, id, envelope).await?;
    Ok(changed)
}

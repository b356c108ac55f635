//! Process-wide handles a running app shares between screens.

use std::sync::Arc;

use oasis_shared::{CustomerId, PushPayload, RecordKind};
use oasis_store::{Database, LocalStore};
use tracing::{info, warn};

use crate::api::{HttpClient, RestClient};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::push::{route, Navigation};
use crate::resources::{
    Appointments, Notifications, Purchases, ShippingAddresses, SkinAnalyses, SyncResource,
};
use crate::view::{LogView, View};
use crate::view_model::{SyncOutcome, ViewModel};

/// The signed-in customer plus the store and REST client every view model
/// of theirs uses.
pub struct Session<C = HttpClient> {
    customer: CustomerId,
    store: LocalStore,
    client: Arc<C>,
}

impl Session<HttpClient> {
    /// Open the configured database and build the HTTP client.
    pub fn open(config: &ClientConfig, customer: CustomerId) -> Result<Self> {
        let db = match &config.database_path {
            Some(path) => Database::open_at(path)?,
            None => Database::new()?,
        };
        let client = HttpClient::new(config)?;
        info!(
            customer = %customer,
            api = %config.api_base_url,
            db = ?db.path(),
            "session opened"
        );
        Ok(Self::new(customer, LocalStore::new(db), Arc::new(client)))
    }
}

impl<C: RestClient> Session<C> {
    pub fn new(customer: CustomerId, store: LocalStore, client: Arc<C>) -> Self {
        Self {
            customer,
            store,
            client,
        }
    }

    pub fn customer(&self) -> &CustomerId {
        &self.customer
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn view_model<R: SyncResource, V: View>(&self, resource: R, view: V) -> ViewModel<R, C, V> {
        ViewModel::new(
            resource,
            self.customer.clone(),
            Arc::clone(&self.client),
            self.store.clone(),
            view,
        )
    }

    /// Sync one list resource without a screen attached.
    pub async fn sync_kind(&self, kind: RecordKind) -> Result<SyncOutcome> {
        match kind {
            RecordKind::Appointment => self.sync_headless(Appointments).await,
            RecordKind::Purchase => self.sync_headless(Purchases).await,
            RecordKind::Notification => self.sync_headless(Notifications).await,
            RecordKind::ShippingAddress => self.sync_headless(ShippingAddresses).await,
            RecordKind::SkinAnalysis => self.sync_headless(SkinAnalyses).await,
        }
    }

    /// Route a push payload, re-syncing whatever it asks to refresh.
    ///
    /// Each kind syncs on its own; a failed one is logged and the rest still
    /// run.  Returns where the app should navigate.
    pub async fn handle_push(&self, payload: &PushPayload) -> Navigation {
        let navigation = route(payload);
        for &kind in navigation.refresh_kinds() {
            if let Err(e) = self.sync_kind(kind).await {
                warn!(%kind, customer = %self.customer, error = %e, "push refresh failed");
            }
        }
        navigation
    }

    async fn sync_headless<R: SyncResource>(&self, resource: R) -> Result<SyncOutcome> {
        let view = LogView {
            screen: resource.screen(),
        };
        self.view_model(resource, view).initialize().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use oasis_shared::Envelope;
    use serde_json::json;

    use crate::error::ApiError;
    use crate::push::RefreshTarget;
    use crate::requests::{AppointmentsRequest, NotificationsRequest, Request};
    use crate::testing::ScriptedClient;

    fn session() -> (Session<ScriptedClient>, Arc<ScriptedClient>) {
        let client = Arc::new(ScriptedClient::new());
        let store = LocalStore::new(Database::open_in_memory().unwrap());
        let session = Session::new(CustomerId::new("c-1").unwrap(), store, Arc::clone(&client));
        (session, client)
    }

    #[tokio::test]
    async fn dashboard_push_refreshes_appointments_and_notifications() {
        let (session, client) = session();
        client.push_ok(Envelope {
            data: vec![json!({ "id": "ap1", "date": "2026-10-20" })],
            message: None,
        });
        client.push_ok(Envelope {
            data: vec![json!({ "id": "n1", "title": "Reminder" })],
            message: None,
        });

        let payload = PushPayload::from_slice(br#"{"action":"refresh-dashboard"}"#).unwrap();
        let navigation = session.handle_push(&payload).await;

        assert_eq!(navigation, Navigation::Refresh(RefreshTarget::Dashboard));
        let sent = client.sent();
        assert!(matches!(
            sent[0],
            Request::Appointments(AppointmentsRequest::List { .. })
        ));
        assert!(matches!(
            sent[1],
            Request::Notifications(NotificationsRequest::List { .. })
        ));
        let count = session
            .store()
            .read(|db| db.count_records(RecordKind::Notification, Some(session.customer())))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn failed_refresh_does_not_block_the_others() {
        let (session, client) = session();
        client.push_err(ApiError::Transport("offline".into()));
        client.push_ok(Envelope {
            data: vec![json!({ "id": "n1", "title": "Reminder" })],
            message: None,
        });

        let payload = PushPayload::from_slice(br#"{"action":"refresh-dashboard"}"#).unwrap();
        let navigation = session.handle_push(&payload).await;

        assert_eq!(navigation, Navigation::Refresh(RefreshTarget::Dashboard));
        assert_eq!(client.sent().len(), 2);
        let store = session.store();
        let appointments = store
            .read(|db| db.count_records(RecordKind::Appointment, Some(session.customer())))
            .unwrap();
        let notifications = store
            .read(|db| db.count_records(RecordKind::Notification, Some(session.customer())))
            .unwrap();
        assert_eq!((appointments, notifications), (0, 1));
    }

    #[tokio::test]
    async fn navigation_push_does_not_touch_network() {
        let (session, client) = session();
        let payload =
            PushPayload::from_slice(br#"{"action":"open-appointment-details","appointment_id":"ap1"}"#)
                .unwrap();

        let navigation = session.handle_push(&payload).await;

        assert!(matches!(navigation, Navigation::AppointmentDetails(_)));
        assert!(client.sent().is_empty());
    }
}

use oasis_shared::{CustomerId, RecordKind};
use oasis_store::{Direction, Field, Recipe};

use crate::requests::{PurchasesRequest, Request};
use crate::resources::SyncResource;

/// Order history, newest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Purchases;

impl SyncResource for Purchases {
    fn kind(&self) -> RecordKind {
        RecordKind::Purchase
    }

    fn screen(&self) -> &'static str {
        "my-purchases"
    }

    fn request(&self, customer: &CustomerId) -> Request {
        Request::Purchases(PurchasesRequest::List {
            customer: customer.clone(),
        })
    }

    fn recipe(&self, customer: &CustomerId) -> Recipe {
        Recipe::new(RecordKind::Purchase)
            .owned_by(customer.clone())
            .sort_by(Field::data("created_at"), Direction::Descending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use oasis_shared::Envelope;
    use oasis_store::{Database, LocalStore};
    use serde_json::json;

    use crate::testing::{RecordingView, ScriptedClient};
    use crate::view_model::ViewModel;

    #[tokio::test]
    async fn newest_purchase_first_and_scoped_to_customer() {
        let store = LocalStore::new(Database::open_in_memory().unwrap());
        let client = Arc::new(ScriptedClient::new());
        client.push_ok(Envelope {
            data: vec![
                json!({ "id": "p1", "created_at": "2026-09-01T10:00:00Z" }),
                json!({ "id": "p2", "created_at": "2026-10-01T10:00:00Z" }),
            ],
            message: None,
        });
        client.push_ok(Envelope {
            data: vec![json!({ "id": "p9", "created_at": "2026-10-10T10:00:00Z" })],
            message: None,
        });

        let mine = RecordingView::default();
        let vm = ViewModel::new(
            Purchases,
            CustomerId::new("c-1").unwrap(),
            Arc::clone(&client),
            store.clone(),
            mine.clone(),
        );
        vm.initialize().await.unwrap();

        let other = ViewModel::new(
            Purchases,
            CustomerId::new("c-2").unwrap(),
            Arc::clone(&client),
            store.clone(),
            RecordingView::default(),
        );
        other.initialize().await.unwrap();

        vm.reload().unwrap();
        assert_eq!(mine.last_reload_ids(), vec!["p2", "p1"]);
    }
}

use oasis_shared::{CustomerId, RecordId, RecordKind};
use oasis_store::{Direction, Field, Predicate, Recipe};

use crate::requests::{AppointmentsRequest, Request};
use crate::resources::SyncResource;

/// Upcoming and past appointments of a customer, soonest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Appointments;

impl SyncResource for Appointments {
    fn kind(&self) -> RecordKind {
        RecordKind::Appointment
    }

    fn screen(&self) -> &'static str {
        "my-appointments"
    }

    fn request(&self, customer: &CustomerId) -> Request {
        Request::Appointments(AppointmentsRequest::List {
            customer: customer.clone(),
        })
    }

    fn recipe(&self, customer: &CustomerId) -> Recipe {
        Recipe::new(RecordKind::Appointment)
            .owned_by(customer.clone())
            .sort_by(Field::data("date"), Direction::Ascending)
            .sort_by(Field::data("time"), Direction::Ascending)
    }
}

/// Refresh of one appointment the customer already has on screen.
#[derive(Debug, Clone)]
pub struct AppointmentDetails {
    pub id: RecordId,
}

impl SyncResource for AppointmentDetails {
    fn kind(&self) -> RecordKind {
        RecordKind::Appointment
    }

    fn screen(&self) -> &'static str {
        "appointment-details"
    }

    fn request(&self, customer: &CustomerId) -> Request {
        Request::Appointments(AppointmentsRequest::Details {
            customer: customer.clone(),
            id: self.id.clone(),
        })
    }

    fn recipe(&self, customer: &CustomerId) -> Recipe {
        Recipe::new(RecordKind::Appointment)
            .owned_by(customer.clone())
            .filter(Predicate::eq(Field::Id, self.id.as_str()))
    }

    fn restrict_to_known(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use oasis_shared::Envelope;
    use oasis_store::{Database, LocalStore};
    use serde_json::json;

    use crate::testing::{RecordingView, ScriptedClient, ViewEvent};
    use crate::view_model::ViewModel;

    fn customer() -> CustomerId {
        CustomerId::new("c-1").unwrap()
    }

    #[tokio::test]
    async fn list_is_ordered_by_date_then_time() {
        let store = LocalStore::new(Database::open_in_memory().unwrap());
        let client = Arc::new(ScriptedClient::new());
        client.push_ok(Envelope {
            data: vec![
                json!({ "id": "ap3", "date": "2026-11-02", "time": "09:00" }),
                json!({ "id": "ap1", "date": "2026-10-20", "time": "15:30" }),
                json!({ "id": "ap2", "date": "2026-10-20", "time": "10:00" }),
            ],
            message: None,
        });
        let view = RecordingView::default();
        let vm = ViewModel::new(Appointments, customer(), client, store, view.clone());

        vm.initialize().await.unwrap();

        assert_eq!(view.last_reload_ids(), vec!["ap2", "ap1", "ap3"]);
    }

    #[tokio::test]
    async fn details_refresh_only_touches_cached_appointment() {
        let store = LocalStore::new(Database::open_in_memory().unwrap());
        let client = Arc::new(ScriptedClient::new());
        client.push_ok(Envelope {
            data: vec![json!({ "id": "ap1", "status": "booked" })],
            message: None,
        });
        client.push_ok(Envelope {
            data: vec![json!({ "id": "ap1", "status": "confirmed", "therapist": "Mia" })],
            message: None,
        });
        // details for an appointment that was never listed
        client.push_ok(Envelope {
            data: vec![json!({ "id": "ap9", "status": "booked" })],
            message: None,
        });

        let list = ViewModel::new(
            Appointments,
            customer(),
            Arc::clone(&client),
            store.clone(),
            RecordingView::default(),
        );
        list.initialize().await.unwrap();

        let view = RecordingView::default();
        let details = ViewModel::new(
            AppointmentDetails {
                id: RecordId::new("ap1").unwrap(),
            },
            customer(),
            Arc::clone(&client),
            store.clone(),
            view.clone(),
        );
        details.initialize().await.unwrap();

        let shown = view.last_reload();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].str_field("therapist"), Some("Mia"));

        let unknown = ViewModel::new(
            AppointmentDetails {
                id: RecordId::new("ap9").unwrap(),
            },
            customer(),
            Arc::clone(&client),
            store.clone(),
            RecordingView::default(),
        );
        unknown.initialize().await.unwrap();

        let count = store
            .read(|db| db.count_records(RecordKind::Appointment, Some(&customer())))
            .unwrap();
        assert_eq!(count, 1);
        assert!(matches!(view.events().last(), Some(ViewEvent::Reload { .. })));
    }
}

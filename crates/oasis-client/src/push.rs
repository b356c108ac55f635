//! Routing of inbound push payloads.
//!
//! Delivery is the platform's business; this only decides where a tapped
//! notification should take the user.

use oasis_shared::{PushAction, PushPayload, RecordId, RecordKind};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTarget {
    Profile,
    Appointments,
    Dashboard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    None,
    OpenWebview(String),
    OpenBrowser(String),
    AppointmentDetails(RecordId),
    Refresh(RefreshTarget),
}

impl Navigation {
    /// Cached record kinds to re-sync for this navigation.
    pub fn refresh_kinds(&self) -> &'static [RecordKind] {
        match self {
            Navigation::Refresh(RefreshTarget::Appointments) => &[RecordKind::Appointment],
            Navigation::Refresh(RefreshTarget::Dashboard) => {
                &[RecordKind::Appointment, RecordKind::Notification]
            }
            Navigation::Refresh(RefreshTarget::Profile)
            | Navigation::None
            | Navigation::OpenWebview(_)
            | Navigation::OpenBrowser(_)
            | Navigation::AppointmentDetails(_) => &[],
        }
    }
}

pub fn route(payload: &PushPayload) -> Navigation {
    match payload.action {
        PushAction::None => Navigation::None,
        PushAction::OpenWebview => url_of(payload).map_or(Navigation::None, Navigation::OpenWebview),
        PushAction::OpenDefaultBrowser => {
            url_of(payload).map_or(Navigation::None, Navigation::OpenBrowser)
        }
        PushAction::OpenAppointmentDetails => {
            match payload.appointment_id.as_deref().map(RecordId::new) {
                Some(Ok(id)) => Navigation::AppointmentDetails(id),
                _ => {
                    warn!(action = payload.action.as_str(), "push payload has no appointment id");
                    Navigation::None
                }
            }
        }
        PushAction::RefreshProfile => Navigation::Refresh(RefreshTarget::Profile),
        PushAction::RefreshMyAppointments => Navigation::Refresh(RefreshTarget::Appointments),
        PushAction::RefreshDashboard => Navigation::Refresh(RefreshTarget::Dashboard),
    }
}

fn url_of(payload: &PushPayload) -> Option<String> {
    match payload.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Some(url.to_string()),
        _ => {
            warn!(action = payload.action.as_str(), "push payload has no url");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> PushPayload {
        PushPayload::from_slice(json.as_bytes()).unwrap()
    }

    #[test]
    fn webview_and_browser_carry_url() {
        assert_eq!(
            route(&payload(r#"{"action":"open-webview","url":"https://oasis.example/offer"}"#)),
            Navigation::OpenWebview("https://oasis.example/offer".into())
        );
        assert_eq!(
            route(&payload(r#"{"action":"open-default-browser","url":" https://x.example "}"#)),
            Navigation::OpenBrowser("https://x.example".into())
        );
    }

    #[test]
    fn missing_targets_degrade_to_none() {
        assert_eq!(route(&payload(r#"{"action":"open-webview"}"#)), Navigation::None);
        assert_eq!(
            route(&payload(r#"{"action":"open-default-browser","url":""}"#)),
            Navigation::None
        );
        assert_eq!(
            route(&payload(r#"{"action":"open-appointment-details"}"#)),
            Navigation::None
        );
    }

    #[test]
    fn appointment_details_accepts_numeric_id() {
        assert_eq!(
            route(&payload(r#"{"action":"open-appointment-details","appointment_id":42}"#)),
            Navigation::AppointmentDetails(RecordId::new("42").unwrap())
        );
    }

    #[test]
    fn unknown_action_is_none() {
        assert_eq!(route(&payload(r#"{"action":"dance","url":"https://x"}"#)), Navigation::None);
        assert_eq!(route(&payload(r#"{"title":"Hi"}"#)), Navigation::None);
    }

    #[test]
    fn refresh_actions_name_kinds() {
        let nav = route(&payload(r#"{"action":"refresh-my-appointments"}"#));
        assert_eq!(nav, Navigation::Refresh(RefreshTarget::Appointments));
        assert_eq!(nav.refresh_kinds(), &[RecordKind::Appointment]);

        let nav = route(&payload(r#"{"action":"refresh-dashboard"}"#));
        assert_eq!(
            nav.refresh_kinds(),
            &[RecordKind::Appointment, RecordKind::Notification]
        );

        assert!(route(&payload(r#"{"action":"refresh-profile"}"#))
            .refresh_kinds()
            .is_empty());
    }
}

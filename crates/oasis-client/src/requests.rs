//! Every REST call the app makes, as one closed type per feature area.

use oasis_shared::{CustomerId, RecordId};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Appointments(AppointmentsRequest),
    Purchases(PurchasesRequest),
    Notifications(NotificationsRequest),
    ShippingAddresses(ShippingAddressesRequest),
    SkinAnalysis(SkinAnalysisRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppointmentsRequest {
    List { customer: CustomerId },
    Details { customer: CustomerId, id: RecordId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchasesRequest {
    List { customer: CustomerId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationsRequest {
    List { customer: CustomerId },
    MarkRead { customer: CustomerId, id: RecordId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShippingAddressesRequest {
    List {
        customer: CustomerId,
    },
    Add {
        customer: CustomerId,
        address: Map<String, Value>,
    },
    SetDefault {
        customer: CustomerId,
        id: RecordId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkinAnalysisRequest {
    History { customer: CustomerId },
}

impl Request {
    pub fn method(&self) -> HttpMethod {
        match self {
            Request::Appointments(AppointmentsRequest::List { .. })
            | Request::Appointments(AppointmentsRequest::Details { .. })
            | Request::Purchases(PurchasesRequest::List { .. })
            | Request::Notifications(NotificationsRequest::List { .. })
            | Request::ShippingAddresses(ShippingAddressesRequest::List { .. })
            | Request::SkinAnalysis(SkinAnalysisRequest::History { .. }) => HttpMethod::Get,
            Request::Notifications(NotificationsRequest::MarkRead { .. })
            | Request::ShippingAddresses(ShippingAddressesRequest::Add { .. }) => HttpMethod::Post,
            Request::ShippingAddresses(ShippingAddressesRequest::SetDefault { .. }) => {
                HttpMethod::Put
            }
        }
    }

    /// Path segments relative to the API base URL (unencoded).
    pub fn segments(&self) -> Vec<String> {
        let customer_path = |customer: &CustomerId, tail: &[&str]| {
            let mut segments = vec!["customers".to_string(), customer.as_str().to_string()];
            segments.extend(tail.iter().map(|s| s.to_string()));
            segments
        };

        match self {
            Request::Appointments(AppointmentsRequest::List { customer }) => {
                customer_path(customer, &["appointments"])
            }
            Request::Appointments(AppointmentsRequest::Details { customer, id }) => {
                customer_path(customer, &["appointments", id.as_str()])
            }
            Request::Purchases(PurchasesRequest::List { customer }) => {
                customer_path(customer, &["purchases"])
            }
            Request::Notifications(NotificationsRequest::List { customer }) => {
                customer_path(customer, &["notifications"])
            }
            Request::Notifications(NotificationsRequest::MarkRead { customer, id }) => {
                customer_path(customer, &["notifications", id.as_str(), "read"])
            }
            Request::ShippingAddresses(ShippingAddressesRequest::List { customer })
            | Request::ShippingAddresses(ShippingAddressesRequest::Add { customer, .. }) => {
                customer_path(customer, &["shipping-addresses"])
            }
            Request::ShippingAddresses(ShippingAddressesRequest::SetDefault { customer, id }) => {
                customer_path(customer, &["shipping-addresses", id.as_str(), "default"])
            }
            Request::SkinAnalysis(SkinAnalysisRequest::History { customer }) => {
                customer_path(customer, &["skin-analysis"])
            }
        }
    }

    /// Joined path, for logging.
    pub fn path(&self) -> String {
        self.segments().join("/")
    }

    /// JSON body, for requests that carry one.
    pub fn body(&self) -> Option<Value> {
        match self {
            Request::ShippingAddresses(ShippingAddressesRequest::Add { address, .. }) => {
                Some(Value::Object(address.clone()))
            }
            Request::Appointments(_)
            | Request::Purchases(_)
            | Request::Notifications(_)
            | Request::ShippingAddresses(ShippingAddressesRequest::List { .. })
            | Request::ShippingAddresses(ShippingAddressesRequest::SetDefault { .. })
            | Request::SkinAnalysis(_) => None,
        }
    }
}

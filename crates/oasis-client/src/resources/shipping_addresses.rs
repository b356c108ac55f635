use oasis_shared::constants::ID_FIELD;
use oasis_shared::{CustomerId, ProtocolError, RecordId, RecordKind};
use oasis_store::{
    payload_id, reconcile, Direction, Field, FlagKeys, LocalStore, Recipe, ReconcileContext,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::api::RestClient;
use crate::error::{ApiError, Result, SyncError};
use crate::requests::{Request, ShippingAddressesRequest};
use crate::resources::{absorb_confirmation, SyncResource};

const KIND: RecordKind = RecordKind::ShippingAddress;
const DEFAULT_KEY: &str = "is_default";

/// Saved addresses, the default one first, then in the order they were
/// added.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShippingAddresses;

impl SyncResource for ShippingAddresses {
    fn kind(&self) -> RecordKind {
        KIND
    }

    fn screen(&self) -> &'static str {
        "shipping-addresses"
    }

    fn request(&self, customer: &CustomerId) -> Request {
        Request::ShippingAddresses(ShippingAddressesRequest::List {
            customer: customer.clone(),
        })
    }

    fn recipe(&self, customer: &CustomerId) -> Recipe {
        Recipe::new(KIND)
            .owned_by(customer.clone())
            .sort_by(Field::Default, Direction::Descending)
            .sort_by(Field::CreatedAt, Direction::Ascending)
    }

    fn flag_keys(&self) -> FlagKeys {
        FlagKeys {
            read: None,
            default: Some(DEFAULT_KEY),
        }
    }
}

/// Create an address on the server and cache the record it returns.
///
/// With `make_default` the request asks the server to make it the default
/// and the cached copy becomes the only local default.  Returns the id the
/// server assigned.
pub async fn add_address<C: RestClient>(
    store: &LocalStore,
    client: &C,
    customer: &CustomerId,
    address: Value,
    make_default: bool,
) -> Result<RecordId> {
    let Value::Object(mut address) = address else {
        return Err(SyncError::InvalidInput(
            "A shipping address must be a JSON object".to_string(),
        ));
    };
    if make_default {
        address.insert(DEFAULT_KEY.to_string(), Value::Bool(true));
    }

    let request = Request::ShippingAddresses(ShippingAddressesRequest::Add {
        customer: customer.clone(),
        address,
    });
    let envelope = client.send(&request).await?;

    let id = envelope
        .data
        .iter()
        .find_map(|item| payload_id(item, ID_FIELD))
        .ok_or_else(|| {
            ApiError::Decode(ProtocolError::UnexpectedShape(
                "created address carries no id".to_string(),
            ))
        })?;

    let ctx = ReconcileContext::new(KIND, Some(customer.clone()))
        .with_flag_keys(ShippingAddresses.flag_keys());
    let created = id.clone();
    let data = envelope.data;
    store
        .write(KIND, move |tx| {
            reconcile(tx, &ctx, &data)?;
            if make_default {
                tx.set_default(KIND, ctx.owner.as_ref(), &created)?;
            }
            Ok(())
        })
        .await?;

    info!(customer = %customer, id = %id, make_default, "shipping address added");
    Ok(id)
}

/// Make a cached address the customer's only default, then tell the server.
///
/// The local change is committed first and stays if the server call fails;
/// the error is still returned.  Returns whether the default changed.
pub async fn set_default<C: RestClient>(
    store: &LocalStore,
    client: &C,
    customer: &CustomerId,
    id: &RecordId,
) -> Result<bool> {
    let changed = {
        let owner = customer.clone();
        let id = id.clone();
        store
            .write(KIND, move |tx| tx.set_default(KIND, Some(&owner), &id))
            .await?
    };

    let request = Request::ShippingAddresses(ShippingAddressesRequest::SetDefault {
        customer: customer.clone(),
        id: id.clone(),
    });
    let envelope = client.send(&request).await.map_err(|e| {
        warn!(customer = %customer, id = %id, error = %e, "set-default confirmation failed");
        e
    })?;

    absorb_confirmation(store, KIND, customer, id, envelope).await?;
    Ok(changed)
}

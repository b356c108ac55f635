//! # oasis-shared
//!
//! Types shared by the store and the client: record identities and kinds,
//! the REST response envelope and the inbound push payload.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::ProtocolError;
pub use protocol::{Envelope, PushAction, PushPayload};
pub use types::{CustomerId, RecordId, RecordKind};

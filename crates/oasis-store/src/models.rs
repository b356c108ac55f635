//! Records persisted in the local cache database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the view layer.

use chrono::{DateTime, Utc};
use oasis_shared::{CustomerId, RecordId, RecordKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A locally cached mirror of one server-side resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    /// Resource class (appointment, purchase, ...).
    pub kind: RecordKind,
    /// Server-assigned identity.
    pub id: RecordId,
    /// Owning customer; `None` for records not scoped to a customer.
    pub owner: Option<CustomerId>,
    /// Mutable server fields, replaced wholesale on every fetch.
    pub fields: Map<String, Value>,
    /// Local-only state, kept across fetches.
    pub flags: LocalFlags,
    /// When the record was first written locally.
    pub created_at: DateTime<Utc>,
    /// Last time fields or flags changed.
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Build a fresh record as of `now`.
    pub fn new(
        kind: RecordKind,
        id: RecordId,
        owner: Option<CustomerId>,
        fields: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            id,
            owner,
            fields,
            flags: LocalFlags::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up a server field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Look up a server field holding a string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// Local flags
// ---------------------------------------------------------------------------

/// Flags a user may set before the server confirms them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalFlags {
    /// Notification has been opened.
    pub is_read: bool,
    /// Record is the owner's primary choice (e.g. default shipping address).
    /// At most one per (kind, owner).
    pub is_default: bool,
}

// ---------------------------------------------------------------------------
// Sync run
// ---------------------------------------------------------------------------

/// Summary of the last successful sync of a (kind, owner) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncRun {
    pub kind: RecordKind,
    pub owner: Option<CustomerId>,
    pub synced_at: DateTime<Utc>,
    pub inserted: u32,
    pub updated: u32,
    pub unchanged: u32,
    pub skipped: u32,
    pub ignored: u32,
}

//! Merge a fetched payload into the local records.
//!
//! Reconciliation upserts by id within the owner scope: an existing record
//! gets its server fields replaced wholesale, a new id gets a new record.
//! Local flags on existing records are never touched here.  Replaying the
//! same payload is a no-op.

use std::collections::HashSet;

use chrono::Utc;
use oasis_shared::constants::ID_FIELD;
use oasis_shared::{CustomerId, RecordId, RecordKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::database::WriteTx;
use crate::error::Result;
use crate::models::{LocalFlags, Record, SyncRun};

/// Which payload records may be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileScope {
    /// Insert or update anything in the payload.
    All,
    /// "Get X by id" flows: only update ids already cached; others are ignored.
    Known(HashSet<RecordId>),
}

/// Payload keys that seed local flags on newly inserted records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagKeys {
    pub read: Option<&'static str>,
    pub default: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileContext {
    pub kind: RecordKind,
    pub owner: Option<CustomerId>,
    pub scope: ReconcileScope,
    pub id_key: &'static str,
    pub flag_keys: FlagKeys,
}

impl ReconcileContext {
    pub fn new(kind: RecordKind, owner: Option<CustomerId>) -> Self {
        Self {
            kind,
            owner,
            scope: ReconcileScope::All,
            id_key: ID_FIELD,
            flag_keys: FlagKeys::default(),
        }
    }

    pub fn with_scope(mut self, scope: ReconcileScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_flag_keys(mut self, flag_keys: FlagKeys) -> Self {
        self.flag_keys = flag_keys;
        self
    }
}

/// Per-payload outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub inserted: u32,
    pub updated: u32,
    pub unchanged: u32,
    /// Malformed items (not an object, or no usable id).
    pub skipped: u32,
    /// Well-formed items outside a [`ReconcileScope::Known`] set.
    pub ignored: u32,
}

impl ReconcileReport {
    /// Whether the store was modified.
    pub fn changed(&self) -> bool {
        self.inserted > 0 || self.updated > 0
    }

    pub fn into_sync_run(self, kind: RecordKind, owner: Option<CustomerId>) -> SyncRun {
        SyncRun {
            kind,
            owner,
            synced_at: Utc::now(),
            inserted: self.inserted,
            updated: self.updated,
            unchanged: self.unchanged,
            skipped: self.skipped,
            ignored: self.ignored,
        }
    }
}

/// Reconcile `items` inside an open write transaction.
///
/// Malformed items are skipped and the rest proceed.  A store error aborts
/// and, since the caller will not commit, discards the whole payload.
pub fn reconcile(tx: &WriteTx<'_>, ctx: &ReconcileContext, items: &[Value]) -> Result<ReconcileReport> {
    let mut report = ReconcileReport::default();
    let owner = ctx.owner.as_ref();

    for (index, item) in items.iter().enumerate() {
        let Some(object) = item.as_object() else {
            warn!(kind = %ctx.kind, index, "skipping payload item that is not an object");
            report.skipped += 1;
            continue;
        };

        let Some(id) = payload_id(item, ctx.id_key) else {
            warn!(kind = %ctx.kind, index, key = ctx.id_key, "skipping payload item without id");
            report.skipped += 1;
            continue;
        };

        if let ReconcileScope::Known(known) = &ctx.scope {
            if !known.contains(&id) {
                debug!(kind = %ctx.kind, id = %id, "ignoring id outside known set");
                report.ignored += 1;
                continue;
            }
        }

        let mut fields = object.clone();
        fields.remove(ctx.id_key);

        match tx.find_record(ctx.kind, owner, &id)? {
            Some(existing) if existing.fields == fields => {
                report.unchanged += 1;
            }
            Some(mut existing) => {
                existing.fields = fields;
                existing.updated_at = Utc::now();
                tx.update_record(&existing)?;
                report.updated += 1;
            }
            None => {
                let mut record = Record::new(ctx.kind, id, ctx.owner.clone(), fields, Utc::now());
                record.flags = initial_flags(tx, ctx, &record.fields)?;
                tx.insert_record(&record)?;
                report.inserted += 1;
            }
        }
    }

    Ok(report)
}

/// Id of a payload item: non-blank strings (trimmed), numbers as decimal text.
/// Integral floats (`17.0`) read the same as the integer.
pub fn payload_id(item: &Value, id_key: &str) -> Option<RecordId> {
    match item.get(id_key)? {
        Value::String(s) => RecordId::new(s.trim()).ok(),
        Value::Number(n) => RecordId::new(number_id(n)).ok(),
        _ => None,
    }
}

// largest magnitude an f64 holds without losing integer precision
const MAX_EXACT_F64: f64 = 9_007_199_254_740_992.0;

fn number_id(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() <= MAX_EXACT_F64 => (f as i64).to_string(),
        _ => n.to_string(),
    }
}

fn initial_flags(tx: &WriteTx<'_>, ctx: &ReconcileContext, fields: &Map<String, Value>) -> Result<LocalFlags> {
    let flag = |key: Option<&str>| {
        key.and_then(|k| fields.get(k))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    };

    let is_read = flag(ctx.flag_keys.read);
    // An existing local default wins over the server's initial choice.
    let is_default = flag(ctx.flag_keys.default)
        && tx.default_id(ctx.kind, ctx.owner.as_ref())?.is_none();

    Ok(LocalFlags {
        is_read,
        is_default,
    })
}

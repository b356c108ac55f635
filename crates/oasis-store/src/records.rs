//! CRUD operations for [`Record`] rows.
//!
//! Reads are methods on [`Database`] and see the latest committed state.
//! Mutations are methods on [`WriteTx`] and only become visible on commit.

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use oasis_shared::{CustomerId, RecordId, RecordKind};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};

use crate::database::{Database, WriteTx};
use crate::error::{Result, StoreError};
use crate::models::{LocalFlags, Record, SyncRun};
use crate::query::Recipe;

const RECORD_COLUMNS: &str =
    "kind, owner_id, id, fields, is_read, is_default, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single record by id within an owner scope.
    pub fn get_record(
        &self,
        kind: RecordKind,
        owner: Option<&CustomerId>,
        id: &RecordId,
    ) -> Result<Record> {
        find_record(self.conn(), kind, owner, id)?.ok_or(StoreError::NotFound)
    }

    /// List every record of `kind` owned by `owner`, oldest first.
    pub fn list_records(&self, kind: RecordKind, owner: Option<&CustomerId>) -> Result<Vec<Record>> {
        select_records(self.conn(), kind, Some(owner_key(owner)))
    }

    /// Number of records of `kind` owned by `owner`.
    pub fn count_records(&self, kind: RecordKind, owner: Option<&CustomerId>) -> Result<usize> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM records WHERE kind = ?1 AND owner_id = ?2",
            params![kind.as_str(), owner_key(owner)],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Ids of every record of `kind` already cached for `owner`.
    pub fn known_ids(&self, kind: RecordKind, owner: Option<&CustomerId>) -> Result<HashSet<RecordId>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id FROM records WHERE kind = ?1 AND owner_id = ?2")?;
        let rows = stmt.query_map(params![kind.as_str(), owner_key(owner)], |row| {
            row.get::<_, String>(0)
        })?;

        let mut ids = HashSet::new();
        for row in rows {
            ids.insert(RecordId::new(row?)?);
        }
        Ok(ids)
    }

    /// Evaluate a recipe against the committed state.
    ///
    /// A recipe without an owner spans every owner of its kind.
    pub fn query(&self, recipe: &Recipe) -> Result<Vec<Record>> {
        let owner = recipe.owner.as_ref().map(CustomerId::as_str);
        let records = select_records(self.conn(), recipe.kind, owner)?;
        Ok(recipe.apply(records))
    }

    /// Last successful sync of `kind` for `owner`, if any.
    pub fn last_sync(&self, kind: RecordKind, owner: Option<&CustomerId>) -> Result<Option<SyncRun>> {
        self.conn()
            .query_row(
                "SELECT synced_at, inserted, updated, unchanged, skipped, ignored
                 FROM sync_runs WHERE kind = ?1 AND owner_id = ?2",
                params![kind.as_str(), owner_key(owner)],
                |row| {
                    let synced_str: String = row.get(0)?;
                    Ok(SyncRun {
                        kind,
                        owner: owner.cloned(),
                        synced_at: parse_timestamp(0, &synced_str)?,
                        inserted: row.get(1)?,
                        updated: row.get(2)?,
                        unchanged: row.get(3)?,
                        skipped: row.get(4)?,
                        ignored: row.get(5)?,
                    })
                },
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }
}

impl WriteTx<'_> {
    /// Look up a record inside the transaction (sees uncommitted changes).
    pub fn find_record(
        &self,
        kind: RecordKind,
        owner: Option<&CustomerId>,
        id: &RecordId,
    ) -> Result<Option<Record>> {
        find_record(self.conn(), kind, owner, id)
    }

    // ------------------------------------------------------------------
    // Create / update
    // ------------------------------------------------------------------

    pub fn insert_record(&self, record: &Record) -> Result<()> {
        self.conn().execute(
            "INSERT INTO records (kind, owner_id, id, fields, is_read, is_default, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.kind.as_str(),
                owner_key(record.owner.as_ref()),
                record.id.as_str(),
                serde_json::to_string(&record.fields)?,
                record.flags.is_read,
                record.flags.is_default,
                timestamp(&record.created_at),
                timestamp(&record.updated_at),
            ],
        )?;
        Ok(())
    }

    /// Overwrite fields, flags and `updated_at` of an existing record.
    pub fn update_record(&self, record: &Record) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE records SET fields = ?4, is_read = ?5, is_default = ?6, updated_at = ?7
             WHERE kind = ?1 AND owner_id = ?2 AND id = ?3",
            params![
                record.kind.as_str(),
                owner_key(record.owner.as_ref()),
                record.id.as_str(),
                serde_json::to_string(&record.fields)?,
                record.flags.is_read,
                record.flags.is_default,
                timestamp(&record.updated_at),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Set the read flag.  Returns `true` if the flag changed.
    pub fn set_read(
        &self,
        kind: RecordKind,
        owner: Option<&CustomerId>,
        id: &RecordId,
        read: bool,
    ) -> Result<bool> {
        let record = self.find_record(kind, owner, id)?.ok_or(StoreError::NotFound)?;
        if record.flags.is_read == read {
            return Ok(false);
        }
        self.conn().execute(
            "UPDATE records SET is_read = ?4, updated_at = ?5
             WHERE kind = ?1 AND owner_id = ?2 AND id = ?3",
            params![kind.as_str(), owner_key(owner), id.as_str(), read, timestamp(&Utc::now())],
        )?;
        Ok(true)
    }

    /// Make `id` the only default record of `kind` for `owner`.
    ///
    /// The previous default is cleared first.  Returns `true` if anything
    /// changed.
    pub fn set_default(
        &self,
        kind: RecordKind,
        owner: Option<&CustomerId>,
        id: &RecordId,
    ) -> Result<bool> {
        let record = self.find_record(kind, owner, id)?.ok_or(StoreError::NotFound)?;
        if record.flags.is_default {
            return Ok(false);
        }
        self.clear_default(kind, owner)?;
        self.conn().execute(
            "UPDATE records SET is_default = 1, updated_at = ?4
             WHERE kind = ?1 AND owner_id = ?2 AND id = ?3",
            params![kind.as_str(), owner_key(owner), id.as_str(), timestamp(&Utc::now())],
        )?;
        Ok(true)
    }

    /// Clear the default flag in an owner scope.  Returns the number of
    /// records touched (0 or 1).
    pub fn clear_default(&self, kind: RecordKind, owner: Option<&CustomerId>) -> Result<usize> {
        let affected = self.conn().execute(
            "UPDATE records SET is_default = 0, updated_at = ?3
             WHERE kind = ?1 AND owner_id = ?2 AND is_default = 1",
            params![kind.as_str(), owner_key(owner), timestamp(&Utc::now())],
        )?;
        Ok(affected)
    }

    /// Id of the current default record in an owner scope.
    pub fn default_id(&self, kind: RecordKind, owner: Option<&CustomerId>) -> Result<Option<RecordId>> {
        let id: Option<String> = self
            .conn()
            .query_row(
                "SELECT id FROM records WHERE kind = ?1 AND owner_id = ?2 AND is_default = 1",
                params![kind.as_str(), owner_key(owner)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(RecordId::new).transpose()?)
    }

    /// Store the summary of a completed sync, replacing the previous one.
    pub fn record_sync(&self, run: &SyncRun) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO sync_runs
                 (kind, owner_id, synced_at, inserted, updated, unchanged, skipped, ignored)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                run.kind.as_str(),
                owner_key(run.owner.as_ref()),
                timestamp(&run.synced_at),
                run.inserted,
                run.updated,
                run.unchanged,
                run.skipped,
                run.ignored,
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a record.  Returns `true` if a row was deleted.
    pub fn delete_record(
        &self,
        kind: RecordKind,
        owner: Option<&CustomerId>,
        id: &RecordId,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM records WHERE kind = ?1 AND owner_id = ?2 AND id = ?3",
            params![kind.as_str(), owner_key(owner), id.as_str()],
        )?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn owner_key(owner: Option<&CustomerId>) -> &str {
    owner.map(CustomerId::as_str).unwrap_or("")
}

fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn find_record(
    conn: &Connection,
    kind: RecordKind,
    owner: Option<&CustomerId>,
    id: &RecordId,
) -> Result<Option<Record>> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM records WHERE kind = ?1 AND owner_id = ?2 AND id = ?3"
    );
    conn.query_row(
        &sql,
        params![kind.as_str(), owner_key(owner), id.as_str()],
        row_to_record,
    )
    .optional()
    .map_err(StoreError::Sqlite)
}

/// `owner == None` spans every owner of the kind.
fn select_records(conn: &Connection, kind: RecordKind, owner: Option<&str>) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    match owner {
        Some(owner) => {
            let sql = format!(
                "SELECT {RECORD_COLUMNS} FROM records
                 WHERE kind = ?1 AND owner_id = ?2
                 ORDER BY created_at ASC, id ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![kind.as_str(), owner], row_to_record)?;
            for row in rows {
                records.push(row?);
            }
        }
        None => {
            let sql = format!(
                "SELECT {RECORD_COLUMNS} FROM records
                 WHERE kind = ?1
                 ORDER BY created_at ASC, id ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![kind.as_str()], row_to_record)?;
            for row in rows {
                records.push(row?);
            }
        }
    }
    Ok(records)
}

fn conversion_error<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

/// Map a `rusqlite::Row` (selected with `RECORD_COLUMNS`) to a [`Record`].
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
    let kind_str: String = row.get(0)?;
    let owner_str: String = row.get(1)?;
    let id_str: String = row.get(2)?;
    let fields_str: String = row.get(3)?;
    let is_read: bool = row.get(4)?;
    let is_default: bool = row.get(5)?;
    let created_str: String = row.get(6)?;
    let updated_str: String = row.get(7)?;

    let kind: RecordKind = kind_str.parse().map_err(|e| conversion_error(0, e))?;
    let owner = if owner_str.is_empty() {
        None
    } else {
        Some(CustomerId::new(owner_str).map_err(|e| conversion_error(1, e))?)
    };
    let id = RecordId::new(id_str).map_err(|e| conversion_error(2, e))?;
    let fields: Map<String, Value> =
        serde_json::from_str(&fields_str).map_err(|e| conversion_error(3, e))?;

    Ok(Record {
        kind,
        id,
        owner,
        fields,
        flags: LocalFlags {
            is_read,
            is_default,
        },
        created_at: parse_timestamp(6, &created_str)?,
        updated_at: parse_timestamp(7, &updated_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn customer(id: &str) -> CustomerId {
        CustomerId::new(id).unwrap()
    }

    fn rid(id: &str) -> RecordId {
        RecordId::new(id).unwrap()
    }

    fn address(id: &str, owner: &CustomerId, city: &str) -> Record {
        let fields = json!({ "city": city }).as_object().cloned().unwrap();
        Record::new(
            RecordKind::ShippingAddress,
            rid(id),
            Some(owner.clone()),
            fields,
            Utc::now(),
        )
    }

    #[test]
    fn insert_and_fetch_round_trip() {
        let mut db = Database::open_in_memory().unwrap();
        let owner = customer("c-1");
        let record = address("ad-1", &owner, "Lyon");

        let tx = db.begin_write().unwrap();
        tx.insert_record(&record).unwrap();
        tx.commit().unwrap();

        let fetched = db
            .get_record(RecordKind::ShippingAddress, Some(&owner), &rid("ad-1"))
            .unwrap();
        assert_eq!(fetched.str_field("city"), Some("Lyon"));
        assert_eq!(fetched.owner, Some(owner.clone()));
        assert_eq!(fetched.flags, LocalFlags::default());
    }

    #[test]
    fn lookups_are_scoped_to_owner() {
        let mut db = Database::open_in_memory().unwrap();
        let alice = customer("alice");
        let bob = customer("bob");

        let tx = db.begin_write().unwrap();
        tx.insert_record(&address("ad-1", &alice, "Lyon")).unwrap();
        tx.commit().unwrap();

        assert!(matches!(
            db.get_record(RecordKind::ShippingAddress, Some(&bob), &rid("ad-1")),
            Err(StoreError::NotFound)
        ));
        assert_eq!(db.count_records(RecordKind::ShippingAddress, Some(&alice)).unwrap(), 1);
        assert_eq!(db.count_records(RecordKind::ShippingAddress, Some(&bob)).unwrap(), 0);
        assert_eq!(db.count_records(RecordKind::Purchase, Some(&alice)).unwrap(), 0);
    }

    #[test]
    fn uncommitted_transaction_rolls_back() {
        let mut db = Database::open_in_memory().unwrap();
        let owner = customer("c-1");

        {
            let tx = db.begin_write().unwrap();
            tx.insert_record(&address("ad-1", &owner, "Lyon")).unwrap();
            // dropped without commit
        }

        assert_eq!(db.count_records(RecordKind::ShippingAddress, Some(&owner)).unwrap(), 0);
    }

    #[test]
    fn set_default_is_exclusive() {
        let mut db = Database::open_in_memory().unwrap();
        let owner = customer("c-1");

        let tx = db.begin_write().unwrap();
        for (id, city) in [("ad-1", "Lyon"), ("ad-2", "Nice"), ("ad-3", "Lille")] {
            tx.insert_record(&address(id, &owner, city)).unwrap();
        }
        assert!(tx.set_default(RecordKind::ShippingAddress, Some(&owner), &rid("ad-1")).unwrap());
        assert!(tx.set_default(RecordKind::ShippingAddress, Some(&owner), &rid("ad-3")).unwrap());
        assert!(!tx.set_default(RecordKind::ShippingAddress, Some(&owner), &rid("ad-3")).unwrap());
        assert_eq!(
            tx.default_id(RecordKind::ShippingAddress, Some(&owner)).unwrap(),
            Some(rid("ad-3"))
        );
        tx.commit().unwrap();

        let defaults: Vec<_> = db
            .list_records(RecordKind::ShippingAddress, Some(&owner))
            .unwrap()
            .into_iter()
            .filter(|r| r.flags.is_default)
            .collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, rid("ad-3"));
    }

    #[test]
    fn schema_rejects_second_default() {
        let mut db = Database::open_in_memory().unwrap();
        let owner = customer("c-1");

        let mut first = address("ad-1", &owner, "Lyon");
        first.flags.is_default = true;
        let mut second = address("ad-2", &owner, "Nice");
        second.flags.is_default = true;

        let tx = db.begin_write().unwrap();
        tx.insert_record(&first).unwrap();
        assert!(matches!(tx.insert_record(&second), Err(StoreError::Sqlite(_))));
    }

    #[test]
    fn set_flags_on_missing_record() {
        let mut db = Database::open_in_memory().unwrap();
        let owner = customer("c-1");
        let tx = db.begin_write().unwrap();

        assert!(matches!(
            tx.set_read(RecordKind::Notification, Some(&owner), &rid("n-9"), true),
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            tx.set_default(RecordKind::ShippingAddress, Some(&owner), &rid("ad-9")),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn delete_and_known_ids() {
        let mut db = Database::open_in_memory().unwrap();
        let owner = customer("c-1");

        let tx = db.begin_write().unwrap();
        tx.insert_record(&address("ad-1", &owner, "Lyon")).unwrap();
        tx.insert_record(&address("ad-2", &owner, "Nice")).unwrap();
        assert!(tx.delete_record(RecordKind::ShippingAddress, Some(&owner), &rid("ad-1")).unwrap());
        assert!(!tx.delete_record(RecordKind::ShippingAddress, Some(&owner), &rid("ad-1")).unwrap());
        tx.commit().unwrap();

        let ids = db.known_ids(RecordKind::ShippingAddress, Some(&owner)).unwrap();
        assert_eq!(ids, HashSet::from([rid("ad-2")]));
    }

    #[test]
    fn sync_run_is_replaced() {
        let mut db = Database::open_in_memory().unwrap();
        let owner = customer("c-1");
        assert!(db.last_sync(RecordKind::Purchase, Some(&owner)).unwrap().is_none());

        let mut run = SyncRun {
            kind: RecordKind::Purchase,
            owner: Some(owner.clone()),
            synced_at: Utc::now(),
            inserted: 2,
            updated: 0,
            unchanged: 0,
            skipped: 1,
            ignored: 0,
        };
        let tx = db.begin_write().unwrap();
        tx.record_sync(&run).unwrap();
        run.inserted = 0;
        run.unchanged = 2;
        tx.record_sync(&run).unwrap();
        tx.commit().unwrap();

        let stored = db.last_sync(RecordKind::Purchase, Some(&owner)).unwrap().unwrap();
        assert_eq!(stored.inserted, 0);
        assert_eq!(stored.unchanged, 2);
        assert_eq!(stored.skipped, 1);
    }
}

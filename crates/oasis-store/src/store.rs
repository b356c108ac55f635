//! Process-wide handle to the local cache.
//!
//! [`LocalStore`] is cheap to clone and shared by every view model.  Reads
//! run synchronously on the caller's thread; writes run one transaction on
//! tokio's blocking pool and resolve only after the commit.  Writes of the
//! same [`RecordKind`] are serialized by a per-kind writer lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use oasis_shared::constants::STORE_CHANGE_CAPACITY;
use oasis_shared::RecordKind;
use tokio::sync::broadcast;
use tracing::debug;

use crate::database::{Database, WriteTx};
use crate::error::{Result, StoreError};
use crate::models::Record;
use crate::query::Recipe;

/// Broadcast after every committed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChange {
    pub kind: RecordKind,
}

#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Mutex<Database>>,
    writers: Arc<HashMap<RecordKind, Arc<tokio::sync::Mutex<()>>>>,
    changes: broadcast::Sender<StoreChange>,
}

impl LocalStore {
    pub fn new(db: Database) -> Self {
        let writers = RecordKind::ALL
            .into_iter()
            .map(|kind| (kind, Arc::new(tokio::sync::Mutex::new(()))))
            .collect();
        let (changes, _) = broadcast::channel(STORE_CHANGE_CAPACITY);

        Self {
            db: Arc::new(Mutex::new(db)),
            writers: Arc::new(writers),
            changes,
        }
    }

    /// Run `f` against the latest committed state.
    pub fn read<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let guard = self.db.lock().map_err(|_| StoreError::Poisoned)?;
        f(&guard)
    }

    /// Evaluate a recipe against the latest committed state.
    pub fn query(&self, recipe: &Recipe) -> Result<Vec<Record>> {
        self.read(|db| db.query(recipe))
    }

    /// Run `f` inside one write transaction for `kind`.
    ///
    /// If `f` or the commit fails, nothing is kept.  Dropping the returned
    /// future releases the writer lock, but a transaction already handed to
    /// the blocking pool still runs to completion atomically.
    pub async fn write<T, F>(&self, kind: RecordKind, f: F) -> Result<T>
    where
        F: FnOnce(&WriteTx<'_>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let lock = self
            .writers
            .get(&kind)
            .cloned()
            .ok_or_else(|| StoreError::Background(format!("no writer for {kind}")))?;
        let _writer = lock.lock().await;

        let db = Arc::clone(&self.db);
        let out = tokio::task::spawn_blocking(move || {
            let mut guard = db.lock().map_err(|_| StoreError::Poisoned)?;
            let tx = guard.begin_write()?;
            let out = f(&tx)?;
            tx.commit()?;
            Ok::<T, StoreError>(out)
        })
        .await
        .map_err(|e| StoreError::Background(e.to_string()))??;

        debug!(kind = %kind, "write transaction committed");
        // no subscribers is fine
        let _ = self.changes.send(StoreChange { kind });

        Ok(out)
    }

    /// Receive a [`StoreChange`] for every committed write.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{reconcile, ReconcileContext};
    use oasis_shared::CustomerId;
    use serde_json::json;

    fn store() -> LocalStore {
        LocalStore::new(Database::open_in_memory().unwrap())
    }

    fn customer() -> CustomerId {
        CustomerId::new("c-1").unwrap()
    }

    #[tokio::test]
    async fn write_is_visible_after_commit() {
        let store = store();
        let ctx = ReconcileContext::new(RecordKind::Purchase, Some(customer()));

        let report = store
            .write(RecordKind::Purchase, move |tx| {
                reconcile(tx, &ctx, &[json!({ "id": "A1", "status": "processing" })])
            })
            .await
            .unwrap();
        assert_eq!(report.inserted, 1);

        let recipe = Recipe::new(RecordKind::Purchase).owned_by(customer());
        assert_eq!(store.query(&recipe).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failing_write_commits_nothing() {
        let store = store();
        let ctx = ReconcileContext::new(RecordKind::Purchase, Some(customer()));

        let result: Result<()> = store
            .write(RecordKind::Purchase, move |tx| {
                reconcile(tx, &ctx, &[json!({ "id": "A1" }), json!({ "id": "A2" })])?;
                Err(StoreError::NotFound)
            })
            .await;
        assert!(matches!(result, Err(StoreError::NotFound)));

        let count = store
            .read(|db| db.count_records(RecordKind::Purchase, Some(&customer())))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn commits_are_broadcast() {
        let store = store();
        let mut changes = store.subscribe();

        store
            .write(RecordKind::Notification, |_tx| Ok(()))
            .await
            .unwrap();

        assert_eq!(
            changes.recv().await.unwrap(),
            StoreChange {
                kind: RecordKind::Notification
            }
        );
    }

    #[tokio::test]
    async fn failed_write_is_not_broadcast() {
        let store = store();
        let mut changes = store.subscribe();

        let _ = store
            .write(RecordKind::Notification, |_tx| Err::<(), _>(StoreError::NotFound))
            .await;

        assert!(matches!(
            changes.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_syncs_of_one_kind_do_not_duplicate() {
        let store = store();
        let mut handles = Vec::new();

        for round in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let ctx = ReconcileContext::new(RecordKind::Appointment, Some(customer()));
                store
                    .write(RecordKind::Appointment, move |tx| {
                        reconcile(
                            tx,
                            &ctx,
                            &[
                                json!({ "id": "ap1", "round": round }),
                                json!({ "id": "ap2", "round": round }),
                            ],
                        )
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let count = store
            .read(|db| db.count_records(RecordKind::Appointment, Some(&customer())))
            .unwrap();
        assert_eq!(count, 2);
    }
}

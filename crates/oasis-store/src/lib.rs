//! # oasis-store
//!
//! Local cache for the Oasis app, backed by SQLite.
//!
//! Every record fetched from the REST API is mirrored into a single
//! `records` table keyed by (kind, owner, id).  Screens read it through
//! declarative [`Recipe`]s; syncs write it through [`LocalStore::write`],
//! which runs one transaction per call on a background thread.

pub mod database;
pub mod migrations;
pub mod models;
pub mod query;
pub mod reconcile;
pub mod records;
pub mod store;

mod error;

pub use database::{Database, WriteTx};
pub use error::{Result, StoreError};
pub use models::*;
pub use query::{Direction, Field, Predicate, Recipe, SortKey};
pub use reconcile::{payload_id, reconcile, FlagKeys, ReconcileContext, ReconcileReport, ReconcileScope};
pub use store::{LocalStore, StoreChange};

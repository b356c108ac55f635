//! Query recipes: "which records, in what order", as plain data.
//!
//! A [`Recipe`] never touches the database.  [`Database::query`] loads the
//! candidate rows of the recipe's kind and hands them to
//! [`Recipe::apply`], so the same recipe can be built once, kept by a view
//! model and re-evaluated after every sync.
//!
//! [`Database::query`]: crate::Database::query

use std::cmp::Ordering;

use oasis_shared::{CustomerId, RecordKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::Record;

/// A value that predicates and sort keys can read off a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    Id,
    Read,
    Default,
    CreatedAt,
    UpdatedAt,
    /// A server field, by name.
    Data(String),
}

impl Field {
    pub fn data(name: impl Into<String>) -> Self {
        Self::Data(name.into())
    }

    /// Value of this field on `record`; `None` when a server field is absent.
    pub fn read(&self, record: &Record) -> Option<Value> {
        match self {
            Self::Id => Some(Value::String(record.id.as_str().to_string())),
            Self::Read => Some(Value::Bool(record.flags.is_read)),
            Self::Default => Some(Value::Bool(record.flags.is_default)),
            Self::CreatedAt => Some(Value::String(record.created_at.to_rfc3339())),
            Self::UpdatedAt => Some(Value::String(record.updated_at.to_rfc3339())),
            Self::Data(name) => record.fields.get(name).cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Field equals the value.  `Eq(field, null)` also matches an absent field.
    Eq(Field, Value),
    /// Negation of [`Predicate::Eq`].
    Ne(Field, Value),
    /// String field contains the needle.
    Contains {
        field: Field,
        needle: String,
        ignore_case: bool,
    },
    /// Every inner predicate holds.  An empty list holds trivially.
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(field: Field, value: impl Into<Value>) -> Self {
        Self::Eq(field, value.into())
    }

    pub fn ne(field: Field, value: impl Into<Value>) -> Self {
        Self::Ne(field, value.into())
    }

    pub fn contains(field: Field, needle: impl Into<String>) -> Self {
        Self::Contains {
            field,
            needle: needle.into(),
            ignore_case: false,
        }
    }

    pub fn contains_ignore_case(field: Field, needle: impl Into<String>) -> Self {
        Self::Contains {
            field,
            needle: needle.into(),
            ignore_case: true,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Eq(field, expected) => field_equals(field.read(record), expected),
            Self::Ne(field, expected) => !field_equals(field.read(record), expected),
            Self::Contains {
                field,
                needle,
                ignore_case,
            } => match field.read(record) {
                Some(Value::String(haystack)) if *ignore_case => {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                }
                Some(Value::String(haystack)) => haystack.contains(needle.as_str()),
                _ => false,
            },
            Self::And(inner) => inner.iter().all(|p| p.matches(record)),
        }
    }
}

fn field_equals(actual: Option<Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(Value::Number(a)) => match expected {
            // 2 and 2.0 are the same price
            Value::Number(b) => a.as_f64() == b.as_f64(),
            _ => false,
        },
        Some(actual) => &actual == expected,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: Field,
    pub direction: Direction,
}

/// Which records of one kind, filtered and ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub kind: RecordKind,
    /// `None` spans every owner.
    pub owner: Option<CustomerId>,
    /// Conjunction; empty matches everything in scope.
    pub predicates: Vec<Predicate>,
    /// Applied in order; ties keep store order.
    pub sort: Vec<SortKey>,
}

impl Recipe {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            owner: None,
            predicates: Vec::new(),
            sort: Vec::new(),
        }
    }

    pub fn owned_by(mut self, owner: CustomerId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn sort_by(mut self, field: Field, direction: Direction) -> Self {
        self.sort.push(SortKey { field, direction });
        self
    }

    /// Whether `record` falls inside this recipe.
    pub fn matches(&self, record: &Record) -> bool {
        record.kind == self.kind
            && self
                .owner
                .as_ref()
                .map_or(true, |owner| record.owner.as_ref() == Some(owner))
            && self.predicates.iter().all(|p| p.matches(record))
    }

    /// Filter and order candidate records.  The sort is stable.
    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        let mut selected: Vec<Record> = records.into_iter().filter(|r| self.matches(r)).collect();
        if !self.sort.is_empty() {
            selected.sort_by(|a, b| self.compare(a, b));
        }
        selected
    }

    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        for key in &self.sort {
            let ordering = compare_values(key.field.read(a).as_ref(), key.field.read(b).as_ref());
            let ordering = match key.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

// missing/null < bool < number < string < array < object
fn rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x @ Value::Array(_)), Some(y @ Value::Array(_)))
        | (Some(x @ Value::Object(_)), Some(y @ Value::Object(_))) => {
            x.to_string().cmp(&y.to_string())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

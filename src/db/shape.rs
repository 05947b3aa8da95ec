//! Normalizes the result shapes returned by the remote backend.
//!
//! The remote driver answers a query with one of:
//! - a flat array of row objects,
//! - an object wrapping the rows in a `data` field,
//! - a single row object.
//!
//! Anything else is treated as "no rows".

use super::value::{Row, WriteResult};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const DATA_KEY: &str = "data";
const ROWS_AFFECTED_KEYS: [&str; 3] = ["changes", "rowsAffected", "rows_affected"];
const INSERTED_ID_KEYS: [&str; 4] = ["lastID", "lastInsertRowid", "lastInsertId", "last_insert_id"];

#[derive(Debug)]
pub(crate) enum ResultShape {
    Array(Vec<Value>),
    Wrapped(Vec<Value>),
    Single(Map<String, Value>),
    Unrecognized(Value),
}

impl ResultShape {
    pub(crate) fn classify(raw: Value) -> Self {
        match raw {
            Value::Array(items) => ResultShape::Array(items),
            Value::Object(mut obj) => match obj.remove(DATA_KEY) {
                Some(Value::Array(items)) => ResultShape::Wrapped(items),
                Some(Value::Object(row)) => ResultShape::Single(row),
                Some(Value::Null) => ResultShape::Wrapped(Vec::new()),
                Some(other) => {
                    obj.insert(DATA_KEY.to_string(), other);
                    ResultShape::Single(obj)
                }
                None => ResultShape::Single(obj),
            },
            other => ResultShape::Unrecognized(other),
        }
    }

    pub(crate) fn into_rows(self) -> Vec<Row> {
        match self {
            ResultShape::Array(items) | ResultShape::Wrapped(items) => rows_from_items(items),
            ResultShape::Single(row) => vec![row],
            ResultShape::Unrecognized(Value::Null) => Vec::new(),
            ResultShape::Unrecognized(other) => {
                debug!(value = %other, "Unrecognized remote result shape, treating as empty");
                Vec::new()
            }
        }
    }
}

fn rows_from_items(items: Vec<Value>) -> Vec<Row> {
    let total = items.len();
    let rows: Vec<Row> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(row) => Some(row),
            _ => None,
        })
        .collect();
    if rows.len() != total {
        warn!(
            dropped = total - rows.len(),
            "Remote result contained non-object rows; dropped"
        );
    }
    rows
}

/// Normalizes any raw remote result into a sequence of rows (possibly empty).
pub fn rows(raw: Value) -> Vec<Row> {
    ResultShape::classify(raw).into_rows()
}

/// Normalizes a raw remote result into its first row, if any.
pub fn first_row(raw: Value) -> Option<Row> {
    rows(raw).into_iter().next()
}

/// Reads write counters from a raw remote result.
pub fn write_result(raw: &Value) -> WriteResult {
    let obj = match raw {
        Value::Object(obj) => match obj.get(DATA_KEY) {
            Some(Value::Object(inner)) => inner,
            _ => obj,
        },
        _ => return WriteResult::default(),
    };

    let rows_affected = ROWS_AFFECTED_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_u64))
        .unwrap_or(0);
    let inserted_id = INSERTED_ID_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_i64))
        .filter(|id| *id > 0 && rows_affected > 0);

    WriteResult {
        inserted_id,
        rows_affected,
    }
}

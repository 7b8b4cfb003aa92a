//
//  gerrit-rest
//  api/changes.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Change Records and Pages
//!
//! A change record is one reviewable change as returned by the Gerrit
//! `/changes/` endpoint. Its internal shape (identity, project, branch,
//! status, revisions, labels, ...) is a rendering concern; this crate keeps
//! the payload opaque and only enforces structure - a record must be a JSON
//! object, never a scalar - and reads the two pagination markers Gerrit
//! embeds in the records themselves:
//!
//! - `_more_changes`: set to `true` on the last record of a page when the
//!   server has more results.
//! - `_sortkey`: on older servers, an opaque continuation token carried by
//!   each record; the last record's value anchors the next page.

use serde_json::Value;

use crate::api::error::GerritError;

/// One reviewable change, as an opaque validated JSON object.
#[derive(Debug, Clone)]
pub struct ChangeRecord(Value);

impl ChangeRecord {
    /// Validates and wraps a decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`GerritError::Parse`] when the value is not a JSON object;
    /// the offending payload is included in the error.
    pub fn from_value(value: Value) -> Result<Self, GerritError> {
        if !value.is_object() {
            return Err(GerritError::Parse {
                message: "change record is not a JSON object".to_string(),
                body: value.to_string(),
            });
        }
        Ok(Self(value))
    }

    /// The change's triplet ID (`project~branch~Change-Id`), if present.
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// The opaque continuation token carried by older servers.
    pub fn sort_key(&self) -> Option<&str> {
        self.0.get("_sortkey").and_then(Value::as_str)
    }

    /// Whether the server flagged more results after this record.
    ///
    /// Only meaningful on the last record of a page; absent means `false`.
    pub fn more_changes(&self) -> bool {
        self.0
            .get("_more_changes")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Borrow the underlying JSON payload.
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Consume the record, yielding the JSON payload.
    pub fn into_json(self) -> Value {
        self.0
    }
}

/// One page of query results with its pagination markers already read.
#[derive(Debug)]
pub struct ChangePage {
    /// The records of this page, in server order.
    pub records: Vec<ChangeRecord>,
    /// Whether the server reported more results after this page.
    pub more: bool,
    /// Continuation token taken from the last record, if the server
    /// provided one.
    pub next_sort_key: Option<String>,
}

impl ChangePage {
    /// A page with no records and no continuation.
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            more: false,
            next_sort_key: None,
        }
    }

    /// Builds a page from a decoded `/changes/` response.
    ///
    /// # Errors
    ///
    /// Returns [`GerritError::Parse`] when the response is not an array or
    /// any element is not an object.
    pub fn from_value(value: Value) -> Result<Self, GerritError> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(GerritError::Parse {
                    message: "expected a JSON array of changes".to_string(),
                    body: other.to_string(),
                })
            }
        };

        let mut records = Vec::with_capacity(items.len());
        for item in items {
            records.push(ChangeRecord::from_value(item)?);
        }

        let more = records.last().map(ChangeRecord::more_changes).unwrap_or(false);
        let next_sort_key = records
            .last()
            .and_then(|record| record.sort_key())
            .map(str::to_string);

        Ok(Self {
            records,
            more,
            next_sort_key,
        })
    }

    /// Number of records in this page.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether this page carries no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

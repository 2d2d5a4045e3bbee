//! Collection responses.
//!
//! List endpoints answer in one of two shapes:
//! - cursor-based: `{ success, data: [...], metadata: { next_cursor, has_next, total? } }`
//! - offset-based: `{ items: [...], total, totalPages }`, a bare array, or an
//!   enveloped `data` array with `{ total, total_pages }` metadata.
//!
//! [`Page::from_value`] resolves the shape once, at the boundary, so callers
//! match on the variant instead of probing fields.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, ModelResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_next: bool,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetPage<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub total_pages: u64,
}

/// One page of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Page<T> {
    Cursor(CursorPage<T>),
    Offset(OffsetPage<T>),
}

impl<T: DeserializeOwned> Page<T> {
    pub fn from_value(value: Value) -> ModelResult<Self> {
        match value {
            Value::Array(items) => {
                let items = decode_items(items)?;
                let total = items.len() as u64;
                Ok(Page::Offset(OffsetPage {
                    items,
                    total,
                    total_pages: 1,
                }))
            }
            Value::Object(mut map) => {
                let metadata = map.remove("metadata").unwrap_or(Value::Null);

                if let Some(Value::Array(items)) = map.remove("data") {
                    let items = decode_items(items)?;
                    let is_cursor = metadata.get("has_next").is_some()
                        || metadata.get("next_cursor").is_some();

                    if is_cursor {
                        let total = metadata
                            .get("total")
                            .and_then(Value::as_u64)
                            .unwrap_or(items.len() as u64);
                        return Ok(Page::Cursor(CursorPage {
                            next_cursor: metadata
                                .get("next_cursor")
                                .and_then(Value::as_str)
                                .filter(|c| !c.is_empty())
                                .map(str::to_string),
                            has_next: metadata
                                .get("has_next")
                                .and_then(Value::as_bool)
                                .unwrap_or(false),
                            total,
                            items,
                        }));
                    }

                    let total = metadata
                        .get("total")
                        .and_then(Value::as_u64)
                        .unwrap_or(items.len() as u64);
                    let total_pages = metadata
                        .get("total_pages")
                        .and_then(Value::as_u64)
                        .unwrap_or(1);
                    return Ok(Page::Offset(OffsetPage {
                        items,
                        total,
                        total_pages,
                    }));
                }

                if let Some(Value::Array(items)) = map.remove("items") {
                    let items = decode_items(items)?;
                    let total = map
                        .get("total")
                        .and_then(Value::as_u64)
                        .unwrap_or(items.len() as u64);
                    let total_pages = map
                        .get("totalPages")
                        .or_else(|| map.get("total_pages"))
                        .and_then(Value::as_u64)
                        .unwrap_or(1);
                    return Ok(Page::Offset(OffsetPage {
                        items,
                        total,
                        total_pages,
                    }));
                }

                Err(ModelError::shape("collection object has neither `data` nor `items`"))
            }
            other => Err(ModelError::shape(format!(
                "expected a collection, got {}",
                json_kind(&other)
            ))),
        }
    }
}

impl<T> Page<T> {
    pub fn items(&self) -> &[T] {
        match self {
            Page::Cursor(p) => &p.items,
            Page::Offset(p) => &p.items,
        }
    }

    /// Total number of matching records across all pages.
    pub fn total(&self) -> u64 {
        match self {
            Page::Cursor(p) => p.total,
            Page::Offset(p) => p.total,
        }
    }

    /// Continuation cursor for the next page, if the backend is cursor-based.
    pub fn next_cursor(&self) -> Option<&str> {
        match self {
            Page::Cursor(p) if p.has_next => p.next_cursor.as_deref(),
            _ => None,
        }
    }
}

fn decode_items<T: DeserializeOwned>(items: Vec<Value>) -> ModelResult<Vec<T>> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item)
                .map_err(|e| ModelError::shape(format!("item {i}: {e}")))
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Ordered waiting list for a single chat.
//!
//! Positions are 0-based here. The command layer translates to and from the
//! 1-based positions users see. Uniqueness of items is not enforced by the
//! list itself; the engine checks for duplicates before mutating.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header line of every rendered queue.
pub const QUEUE_HEADER: &str = "Current queue:";

/// Failures of the positional list primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    #[error("index {index} is out of range for a queue of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("queue is empty")]
    EmptyCollection,
}

/// Extra information attached to a queued item.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryMeta {
    /// When the item entered the queue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,

    /// Who queued the item, when it was queued on someone else's behalf.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_by: Option<String>,
}

impl EntryMeta {
    pub fn is_empty(&self) -> bool {
        self.added_at.is_none() && self.added_by.is_none()
    }
}

/// Per-field formatters used when rendering metadata next to an item.
pub struct MetaFormat {
    pub added_at: Box<dyn Fn(&DateTime<Utc>) -> String + Send + Sync>,
    pub added_by: Box<dyn Fn(&str) -> String + Send + Sync>,
}

impl MetaFormat {
    /// Replace the `added_at` formatter.
    pub fn with_added_at<F>(mut self, f: F) -> Self
    where
        F: Fn(&DateTime<Utc>) -> String + Send + Sync + 'static,
    {
        self.added_at = Box::new(f);
        self
    }

    /// Replace the `added_by` formatter.
    pub fn with_added_by<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.added_by = Box::new(f);
        self
    }

    fn suffix(&self, meta: &EntryMeta) -> String {
        let mut out = String::new();
        if let Some(at) = &meta.added_at {
            out.push(' ');
            out.push_str(&(self.added_at)(at));
        }
        if let Some(by) = &meta.added_by {
            out.push(' ');
            out.push_str(&(self.added_by)(by));
        }
        out
    }
}

impl Default for MetaFormat {
    fn default() -> Self {
        Self {
            added_at: Box::new(|at| at.to_string()),
            added_by: Box::new(|by| by.to_string()),
        }
    }
}

impl fmt::Debug for MetaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaFormat").finish_non_exhaustive()
    }
}

/// A queue of items patiently waiting in line.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryList {
    items: Vec<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    meta: HashMap<String, EntryMeta>,
}

impl EntryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item at the end of the line.
    pub fn append(&mut self, item: impl Into<String>, meta: Option<EntryMeta>) {
        let item = item.into();
        self.attach(&item, meta);
        self.items.push(item);
    }

    /// Insert an item before the given position.
    pub fn insert(
        &mut self,
        index: usize,
        item: impl Into<String>,
        meta: Option<EntryMeta>,
    ) -> Result<(), ListError> {
        if index > self.items.len() {
            return Err(ListError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        let item = item.into();
        self.attach(&item, meta);
        self.items.insert(index, item);
        Ok(())
    }

    /// Take the first item in line.
    pub fn pop_front(&mut self) -> Result<(String, Option<EntryMeta>), ListError> {
        if self.items.is_empty() {
            return Err(ListError::EmptyCollection);
        }
        self.remove_at(0)
    }

    /// Remove the item at the given position, together with its metadata.
    pub fn remove_at(&mut self, index: usize) -> Result<(String, Option<EntryMeta>), ListError> {
        if index >= self.items.len() {
            return Err(ListError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        let item = self.items.remove(index);
        let meta = self.meta.remove(&item);
        Ok((item, meta))
    }

    pub fn index_of(&self, item: &str) -> Option<usize> {
        self.items.iter().position(|i| i == item)
    }

    pub fn contains(&self, item: &str) -> bool {
        self.index_of(item).is_some()
    }

    pub fn meta(&self, item: &str) -> Option<&EntryMeta> {
        self.meta.get(item)
    }

    /// Empty the list and its metadata.
    pub fn clear(&mut self) {
        self.items.clear();
        self.meta.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Render the list as text, one line per item after a header line.
    ///
    /// Indices are 1-based and right-aligned to the widest index. Metadata is
    /// appended only when a formatter set is given.
    pub fn render(&self, format: Option<&MetaFormat>) -> String {
        let width = self.items.len().to_string().len();
        let mut out = String::from(QUEUE_HEADER);
        for (i, item) in self.items.iter().enumerate() {
            out.push('\n');
            out.push_str(&format!("  {:>width$}. {}", i + 1, item, width = width));
            if let (Some(format), Some(meta)) = (format, self.meta.get(item)) {
                out.push_str(&format.suffix(meta));
            }
        }
        out
    }

    fn attach(&mut self, item: &str, meta: Option<EntryMeta>) {
        if let Some(meta) = meta.filter(|m| !m.is_empty()) {
            self.meta.insert(item.to_string(), meta);
        }
    }
}

impl fmt::Display for EntryList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.items.join(", "))
    }
}

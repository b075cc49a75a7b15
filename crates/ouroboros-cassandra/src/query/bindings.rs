//! Categorised parameter bindings.
//!
//! Values are kept in per-category buckets and flattened on demand. The
//! flattening order is what keeps `?` placeholders and arguments aligned, so
//! every statement kind picks its order explicitly (see `Grammar`).

use std::fmt;
use std::str::FromStr;

use crate::{CqlValue, DataBridgeError, Result};

/// Binding bucket names, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Select,
    Where,
    UpdateCollection,
    Join,
}

impl BindingKind {
    /// All buckets in flattening order.
    pub const ALL: [BindingKind; 4] = [
        BindingKind::Select,
        BindingKind::Where,
        BindingKind::UpdateCollection,
        BindingKind::Join,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BindingKind::Select => "select",
            BindingKind::Where => "where",
            BindingKind::UpdateCollection => "updateCollection",
            BindingKind::Join => "join",
        }
    }

    fn index(&self) -> usize {
        match self {
            BindingKind::Select => 0,
            BindingKind::Where => 1,
            BindingKind::UpdateCollection => 2,
            BindingKind::Join => 3,
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BindingKind {
    type Err = DataBridgeError;

    fn from_str(s: &str) -> Result<Self> {
        BindingKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| DataBridgeError::Configuration(format!("Invalid binding type: {}.", s)))
    }
}

/// Append-only buckets of bound values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingStore {
    buckets: [Vec<CqlValue>; 4],
}

impl BindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value to one bucket.
    pub fn push(&mut self, kind: BindingKind, value: CqlValue) {
        self.buckets[kind.index()].push(value);
    }

    /// Values of one bucket, in insertion order.
    pub fn get(&self, kind: BindingKind) -> &[CqlValue] {
        &self.buckets[kind.index()]
    }

    /// All buckets concatenated in declaration order.
    pub fn flatten(&self) -> Vec<CqlValue> {
        self.flatten_except(&[])
    }

    /// All buckets except `skip`, concatenated in declaration order.
    pub fn flatten_except(&self, skip: &[BindingKind]) -> Vec<CqlValue> {
        BindingKind::ALL
            .iter()
            .filter(|kind| !skip.contains(kind))
            .flat_map(|kind| self.get(*kind).iter().cloned())
            .collect()
    }

    /// Total number of bound values.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }
}

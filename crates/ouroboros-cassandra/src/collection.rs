//! Collection column values (map, set, list).
//!
//! A `CollectionValue` carries its element type(s) so the grammar can pick the
//! literal syntax for each element without inspecting values at runtime.

use serde_json::Value as JsonValue;
use std::fmt;

use crate::types::{CqlType, CqlValue};
use crate::{DataBridgeError, Result};

/// The three collection kinds supported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Map,
    Set,
    List,
}

impl CollectionKind {
    pub fn name(&self) -> &'static str {
        match self {
            CollectionKind::Map => "map",
            CollectionKind::Set => "set",
            CollectionKind::List => "list",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed collection value.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionValue {
    /// `map<key_type, value_type>`; entries keep insertion order.
    Map {
        key_type: CqlType,
        value_type: CqlType,
        entries: Vec<(CqlValue, CqlValue)>,
    },
    /// `set<element_type>`; duplicates are dropped on construction.
    Set {
        element_type: CqlType,
        values: Vec<CqlValue>,
    },
    /// `list<element_type>`
    List {
        element_type: CqlType,
        values: Vec<CqlValue>,
    },
}

impl CollectionValue {
    /// Builds a map, validating every key and value against the declared types.
    ///
    /// A repeated key keeps its first position and takes the last value.
    pub fn map<K, V, I>(key_type: CqlType, value_type: CqlType, entries: I) -> Result<Self>
    where
        K: Into<CqlValue>,
        V: Into<CqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut out: Vec<(CqlValue, CqlValue)> = Vec::new();
        for (k, v) in entries {
            let k = check_element(k.into(), key_type, CollectionKind::Map)?;
            let v = check_element(v.into(), value_type, CollectionKind::Map)?;
            match out.iter_mut().find(|(existing, _)| *existing == k) {
                Some(slot) => slot.1 = v,
                None => out.push((k, v)),
            }
        }
        Ok(CollectionValue::Map {
            key_type,
            value_type,
            entries: out,
        })
    }

    /// Builds a set, dropping duplicate elements.
    pub fn set<T, I>(element_type: CqlType, values: I) -> Result<Self>
    where
        T: Into<CqlValue>,
        I: IntoIterator<Item = T>,
    {
        let mut out: Vec<CqlValue> = Vec::new();
        for v in values {
            let v = check_element(v.into(), element_type, CollectionKind::Set)?;
            if !out.contains(&v) {
                out.push(v);
            }
        }
        Ok(CollectionValue::Set {
            element_type,
            values: out,
        })
    }

    /// Builds an ordered list.
    pub fn list<T, I>(element_type: CqlType, values: I) -> Result<Self>
    where
        T: Into<CqlValue>,
        I: IntoIterator<Item = T>,
    {
        let values = values
            .into_iter()
            .map(|v| check_element(v.into(), element_type, CollectionKind::List))
            .collect::<Result<Vec<_>>>()?;
        Ok(CollectionValue::List {
            element_type,
            values,
        })
    }

    pub fn kind(&self) -> CollectionKind {
        match self {
            CollectionValue::Map { .. } => CollectionKind::Map,
            CollectionValue::Set { .. } => CollectionKind::Set,
            CollectionValue::List { .. } => CollectionKind::List,
        }
    }

    /// Number of elements (entries for a map).
    pub fn len(&self) -> usize {
        match self {
            CollectionValue::Map { entries, .. } => entries.len(),
            CollectionValue::Set { values, .. } | CollectionValue::List { values, .. } => {
                values.len()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// CQL type signature, e.g. `map<text, int>`.
    pub fn type_signature(&self) -> String {
        match self {
            CollectionValue::Map {
                key_type,
                value_type,
                ..
            } => format!("map<{}, {}>", key_type, value_type),
            CollectionValue::Set { element_type, .. } => format!("set<{}>", element_type),
            CollectionValue::List { element_type, .. } => format!("list<{}>", element_type),
        }
    }

    /// Native view of the collection: maps become objects, sets and lists arrays.
    pub fn to_json(&self) -> JsonValue {
        match self {
            CollectionValue::Map { entries, .. } => {
                let mut map = serde_json::Map::new();
                for (k, v) in entries {
                    map.insert(k.to_raw_string(), v.to_json());
                }
                JsonValue::Object(map)
            }
            CollectionValue::Set { values, .. } | CollectionValue::List { values, .. } => {
                JsonValue::Array(values.iter().map(CqlValue::to_json).collect())
            }
        }
    }
}

fn check_element(value: CqlValue, ty: CqlType, kind: CollectionKind) -> Result<CqlValue> {
    if let CqlValue::Collection(inner) = &value {
        return Err(DataBridgeError::Validation(format!(
            "Nested {} inside a {} is not supported",
            inner.kind(),
            kind
        )));
    }
    if !value.is_compatible_with(ty) {
        return Err(DataBridgeError::Validation(format!(
            "Cannot store {} value in {}<{}>",
            value.cql_type_name(),
            kind,
            ty
        )));
    }
    Ok(value)
}

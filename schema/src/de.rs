//! Deserialization: format sniffing plus a generic raw value tree
//! that both wire formats collapse into before the per-type
//! `from_fields` functions (in `crate::fields`) pick fields out of it.
//!
//! Per the spec's redesign hint, the format choice is an explicit
//! sniff on the first non-whitespace character, not an exception-
//! driven "try each deserializer in turn".

use indexmap::IndexMap;

use crate::errors::{SchemaError, SchemaResult};

/// A parsed-but-untyped manifest value. Deliberately permissive about
/// unknown keys: callers look fields up by name and anything absent
/// from a type's field table is simply never read.
#[derive(Debug, Clone)]
pub enum Raw {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Seq(Vec<Raw>),
    Map(IndexMap<String, Raw>),
}

impl Raw {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Raw::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Raw::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Raw::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Raw>> {
        match self {
            Raw::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Raw]> {
        match self {
            Raw::Seq(s) => Some(s.as_slice()),
            _ => None,
        }
    }
}

/// Format-sniff and parse manifest text into a [`Raw`] tree: a
/// structural (JSON) document starts with `{` or `[`; anything else
/// is treated as flow (YAML) text.
pub fn parse(text: &str) -> SchemaResult<Raw> {
    match text.trim_start().chars().next() {
        Some('{') | Some('[') => {
            let value: serde_json::Value =
                serde_json::from_str(text).map_err(|e| SchemaError::Parse(e.to_string()))?;
            Ok(from_json(value))
        }
        _ => {
            let value: serde_yml::Value =
                serde_yml::from_str(text).map_err(|e| SchemaError::Parse(e.to_string()))?;
            Ok(from_yaml(value))
        }
    }
}

fn from_json(value: serde_json::Value) -> Raw {
    match value {
        serde_json::Value::Null => Raw::Null,
        serde_json::Value::Bool(b) => Raw::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Raw::Int(i)
            } else {
                Raw::Str(n.to_string())
            }
        }
        serde_json::Value::String(s) => Raw::Str(s),
        serde_json::Value::Array(items) => Raw::Seq(items.into_iter().map(from_json).collect()),
        serde_json::Value::Object(map) => {
            Raw::Map(map.into_iter().map(|(k, v)| (k, from_json(v))).collect())
        }
    }
}

fn from_yaml(value: serde_yml::Value) -> Raw {
    match value {
        serde_yml::Value::Null => Raw::Null,
        serde_yml::Value::Bool(b) => Raw::Bool(b),
        serde_yml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Raw::Int(i)
            } else {
                Raw::Str(n.to_string())
            }
        }
        serde_yml::Value::String(s) => Raw::Str(s),
        serde_yml::Value::Sequence(items) => Raw::Seq(items.into_iter().map(from_yaml).collect()),
        serde_yml::Value::Mapping(map) => Raw::Map(
            map.into_iter()
                .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), from_yaml(v))))
                .collect(),
        ),
        serde_yml::Value::Tagged(tagged) => from_yaml(tagged.value),
    }
}

/// Accessor helpers shared by every `from_fields` implementation in
/// `crate::fields`.
pub(crate) mod get {
    use super::Raw;
    use crate::errors::{SchemaError, SchemaResult};
    use indexmap::IndexMap;

    pub fn str_req(map: &IndexMap<String, Raw>, key: &str, path: &str) -> SchemaResult<String> {
        map.get(key)
            .and_then(Raw::as_str)
            .map(str::to_string)
            .ok_or_else(|| SchemaError::Malformed(format!("{path}: missing required `{key}`")))
    }

    pub fn str_opt(map: &IndexMap<String, Raw>, key: &str) -> Option<String> {
        map.get(key).and_then(Raw::as_str).map(str::to_string)
    }

    pub fn str_list(map: &IndexMap<String, Raw>, key: &str) -> Vec<String> {
        map.get(key)
            .and_then(Raw::as_seq)
            .map(|items| items.iter().filter_map(Raw::as_str).map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn int_list(map: &IndexMap<String, Raw>, key: &str) -> Vec<i64> {
        map.get(key)
            .and_then(Raw::as_seq)
            .map(|items| items.iter().filter_map(Raw::as_int).collect())
            .unwrap_or_default()
    }

    pub fn map_opt<'a>(map: &'a IndexMap<String, Raw>, key: &str) -> Option<&'a IndexMap<String, Raw>> {
        map.get(key).and_then(Raw::as_map)
    }

    pub fn seq_opt<'a>(map: &'a IndexMap<String, Raw>, key: &str) -> &'a [Raw] {
        map.get(key).and_then(Raw::as_seq).unwrap_or(&[])
    }

    pub fn bool_opt(map: &IndexMap<String, Raw>, key: &str) -> bool {
        map.get(key).and_then(Raw::as_bool).unwrap_or(false)
    }

    /// Read a date field written either as a `YYYY-MM-DD` string (flow
    /// format) or a Unix timestamp (structural format), normalizing
    /// either shape back to the canonical date string the model holds
    /// (§4.J, §4.I "tree-level update").
    pub fn date_opt(map: &IndexMap<String, Raw>, key: &str) -> Option<String> {
        match map.get(key)? {
            Raw::Str(s) => Some(s.clone()),
            Raw::Int(ts) => Some(crate::ser::unix_timestamp_to_date(*ts)),
            _ => None,
        }
    }
}

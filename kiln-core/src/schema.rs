//! Declarative decoding of TOML tables onto records.
//!
//! A record type declares an ordered list of [`Field`]s, each naming a key and
//! how to apply its value. [`overlay`] walks that list and only touches the
//! fields whose key is present in the document, so anything missing keeps the
//! value it had before.

use std::collections::BTreeSet;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("key `{key}` must be {expected}")]
pub struct FieldError {
    pub key: &'static str,
    pub expected: &'static str,
}

/// One entry of a record schema.
pub struct Field<T> {
    pub key: &'static str,
    pub apply: fn(&mut T, &toml::Value) -> Result<(), FieldError>,
}

impl<T> Field<T> {
    pub const fn new(
        key: &'static str,
        apply: fn(&mut T, &toml::Value) -> Result<(), FieldError>,
    ) -> Self {
        Self { key, apply }
    }
}

/// Apply every field of `schema` that is present in `doc` onto `target`.
///
/// Keys in `doc` that the schema does not know about are ignored.
pub fn overlay<T>(target: &mut T, doc: &toml::Table, schema: &[Field<T>]) -> Result<(), FieldError> {
    for field in schema {
        if let Some(value) = doc.get(field.key) {
            (field.apply)(target, value)?;
        }
    }

    for key in doc.keys() {
        if !schema.iter().any(|f| f.key == key) {
            tracing::debug!(key = %key, "ignoring unknown key");
        }
    }

    Ok(())
}

pub fn string(key: &'static str, value: &toml::Value) -> Result<String, FieldError> {
    value.as_str().map(str::to_owned).ok_or(FieldError {
        key,
        expected: "a string",
    })
}

pub fn string_set(key: &'static str, value: &toml::Value) -> Result<BTreeSet<String>, FieldError> {
    let err = FieldError {
        key,
        expected: "an array of strings",
    };

    value
        .as_array()
        .ok_or_else(|| err.clone())?
        .iter()
        .map(|item| item.as_str().map(str::to_owned).ok_or_else(|| err.clone()))
        .collect()
}

//! Schema-shaped form records

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::EntitySchema;
use crate::value::FieldValue;

/// Field name → validation message
pub type FieldErrors = BTreeMap<String, String>;

/// One entity instance as seen by a form.
///
/// A record built through [`FormRecord::empty`] or [`FormRecord::conform`]
/// has exactly the keys its schema declares; [`FormRecord::set`] only
/// replaces existing keys, so that shape is preserved.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl FormRecord {
    /// All fields at their empty value
    pub fn empty(schema: &EntitySchema) -> Self {
        let fields = schema
            .fields()
            .iter()
            .map(|f| (f.name.clone(), FieldValue::empty_for(f.kind)))
            .collect();
        Self { fields }
    }

    /// Build a record from a backend JSON object.
    ///
    /// Missing fields get their empty value, unknown keys are dropped.
    pub fn conform(schema: &EntitySchema, raw: &serde_json::Map<String, serde_json::Value>) -> Self {
        let fields = schema
            .fields()
            .iter()
            .map(|f| {
                let value = raw
                    .get(&f.name)
                    .map(|v| FieldValue::from_json(f.kind, v))
                    .unwrap_or_else(|| FieldValue::empty_for(f.kind));
                (f.name.clone(), value)
            })
            .collect();
        Self { fields }
    }

    /// Start from the empty record and fill in the given pairs, coerced to
    /// their field kinds. Unknown names are ignored.
    pub fn from_pairs<K, V>(schema: &EntitySchema, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let mut record = Self::empty(schema);
        for (name, value) in pairs {
            if let Some(spec) = schema.field(name.as_ref()) {
                record.set(&spec.name, value.into().coerce(spec.kind));
            }
        }
        record
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Canonical text of a field, empty if absent
    pub fn text(&self, name: &str) -> Cow<'_, str> {
        self.fields
            .get(name)
            .map(FieldValue::as_text)
            .unwrap_or(Cow::Borrowed(""))
    }

    /// Replace the value of an existing field. Returns false if the record
    /// has no such field.
    pub fn set(&mut self, name: &str, value: FieldValue) -> bool {
        match self.fields.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when every field has the same canonical value in both records
    pub fn same_values(&self, other: &FormRecord) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .all(|(k, v)| other.fields.get(k).is_some_and(|o| v.same_as(o)))
    }

    /// JSON object with every field, optionally leaving one out
    pub fn to_json_without(&self, skip: Option<&str>) -> serde_json::Map<String, serde_json::Value> {
        self.fields
            .iter()
            .filter(|(k, _)| Some(k.as_str()) != skip)
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.to_json_without(None)
    }

    /// The record's primary key as a string, if filled in
    pub fn primary_key_value(&self, schema: &EntitySchema) -> Option<String> {
        self.get(schema.primary_key())
            .filter(|v| !v.is_empty())
            .map(|v| v.as_text().trim().to_string())
    }
}

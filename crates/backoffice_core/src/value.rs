//! Field values carried by form records

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::FieldKind;

/// A single form field value.
///
/// Records coming back from the backend may carry JSON numbers, booleans or
/// strings. Values typed into a form are always normalised through
/// [`FieldValue::coerce`], so number inputs stay numeric strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// The value an absent field takes for the given kind
    pub fn empty_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Boolean => FieldValue::Bool(false),
            _ => FieldValue::Text(String::new()),
        }
    }

    /// Whether the value counts as "not filled in"
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) | FieldValue::Bool(_) => false,
        }
    }

    /// Canonical text form, used for comparisons, URLs and display
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(s.as_str()),
            FieldValue::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            FieldValue::Number(n) => Cow::Owned(format_number(*n)),
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Number(n) => *n != 0.0,
            FieldValue::Text(s) => parse_flag(s),
        }
    }

    /// Two values are the same if their canonical text forms match.
    ///
    /// A record loaded with `5` (JSON number) and edited back to `"5"` has
    /// not changed.
    pub fn same_as(&self, other: &FieldValue) -> bool {
        self.as_text() == other.as_text()
    }

    /// Coerce user input to the representation the field kind expects
    pub fn coerce(self, kind: FieldKind) -> Self {
        match kind {
            FieldKind::Boolean => FieldValue::Bool(self.as_bool()),
            FieldKind::Number => match self {
                FieldValue::Text(s) => FieldValue::Text(s.trim().to_string()),
                other => FieldValue::Text(other.as_text().into_owned()),
            },
            FieldKind::Text | FieldKind::Date => match self {
                FieldValue::Text(s) => FieldValue::Text(s),
                other => FieldValue::Text(other.as_text().into_owned()),
            },
        }
    }

    /// Conform a raw JSON value coming from the backend to the field kind
    pub fn from_json(kind: FieldKind, value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match (kind, value) {
            (_, Value::Null) => FieldValue::empty_for(kind),
            (FieldKind::Boolean, Value::Bool(b)) => FieldValue::Bool(*b),
            // MySQL TINYINT(1) flags arrive as 0/1
            (FieldKind::Boolean, Value::Number(n)) => {
                FieldValue::Bool(n.as_f64().is_some_and(|n| n != 0.0))
            }
            (FieldKind::Boolean, Value::String(s)) => FieldValue::Bool(parse_flag(s)),
            (FieldKind::Number, Value::Number(n)) => match n.as_f64() {
                Some(n) => FieldValue::Number(n),
                None => FieldValue::Text(n.to_string()),
            },
            (FieldKind::Date, Value::String(s)) => {
                match crate::resolver::parse_effective_date(s) {
                    Some(date) => FieldValue::Text(date.format("%Y-%m-%d").to_string()),
                    None => FieldValue::Text(s.clone()),
                }
            }
            (_, Value::String(s)) => FieldValue::Text(s.clone()),
            (_, Value::Bool(b)) => FieldValue::Text(b.to_string()),
            (_, Value::Number(n)) => FieldValue::Text(n.to_string()),
            (_, other) => FieldValue::Text(other.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                serde_json::Value::from(*n as i64)
            }
            FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

fn parse_flag(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes" | "y"
    )
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

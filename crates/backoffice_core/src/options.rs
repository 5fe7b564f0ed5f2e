//! Dropdown options built from other entities' collections

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::record::FormRecord;
use crate::resolver::applicable_records;
use crate::schema::{self, EntitySchema};

/// One entry of a dropdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Options from `records`, skipping records without a value.
///
/// An empty label falls back to the value.
pub fn options<'a>(
    records: impl IntoIterator<Item = &'a FormRecord>,
    value_field: &str,
    label_field: &str,
) -> Vec<SelectOption> {
    records
        .into_iter()
        .filter_map(|record| {
            let value = record.text(value_field).trim().to_string();
            if value.is_empty() {
                return None;
            }
            let label = record.text(label_field).trim().to_string();
            let label = if label.is_empty() { value.clone() } else { label };
            Some(SelectOption { value, label })
        })
        .collect()
}

/// Options for a versioned entity: one per code, from the version
/// applicable on `as_of`
pub fn applicable_options(
    schema: &EntitySchema,
    records: &[FormRecord],
    as_of: NaiveDate,
    label_field: &str,
) -> schema::Result<Vec<SelectOption>> {
    let versioning = schema.require_versioning()?;
    let applicable = applicable_records(schema, records, as_of)?;
    Ok(options(applicable, &versioning.code_field, label_field))
}

/// Display label of the record whose `value_field` equals `value`.
///
/// When several records match, the last one wins, matching how a list view
/// shows the most recently loaded row.
pub fn label_for(
    records: &[FormRecord],
    value_field: &str,
    label_field: &str,
    value: &str,
) -> Option<String> {
    let value = value.trim();
    records
        .iter()
        .rev()
        .find(|record| record.text(value_field).trim() == value)
        .map(|record| record.text(label_field).into_owned())
}

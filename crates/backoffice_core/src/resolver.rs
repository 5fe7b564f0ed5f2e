//! Applicable-from resolution for versioned configuration records
//!
//! Several records may share a business code, each taking effect on its own
//! date. For a reference date the resolver keeps, per code, the most recent
//! version that has already taken effect.

use std::borrow::Cow;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

use crate::record::FormRecord;
use crate::schema::{self, EntitySchema, Versioning};

/// A record that belongs to a code and takes effect on a date
pub trait Versioned {
    fn code(&self) -> Cow<'_, str>;

    /// `None` when the date is missing or unparseable; such a record is never
    /// applicable.
    fn effective_from(&self) -> Option<NaiveDate>;
}

/// Today's date in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse an applicable-from value to a date.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and RFC 3339 timestamps. A
/// timestamp is converted to local time before its date is taken.
pub fn parse_effective_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Local).date_naive());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| ts.date())
}

/// Pick the applicable version of every code as of `as_of`.
///
/// Versions dated after `as_of` are ignored; `as_of` itself is inclusive. On
/// equal dates the version appearing later in `records` wins. Codes without a
/// past-or-present version are left out. Output follows the order in which
/// codes first appear in `records`.
pub fn resolve_applicable<T: Versioned>(records: &[T], as_of: NaiveDate) -> Vec<&T> {
    let mut order: Vec<Cow<'_, str>> = Vec::new();
    let mut best: HashMap<Cow<'_, str>, Option<(usize, NaiveDate)>> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        let effective_from = record.effective_from();
        if effective_from.is_none() {
            tracing::debug!(code = %record.code(), index, "skipping version without a valid applicable-from date");
        }

        let slot = match best.entry(record.code()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                order.push(entry.key().clone());
                entry.insert(None)
            }
        };

        let Some(date) = effective_from.filter(|date| *date <= as_of) else {
            continue;
        };

        // `>=` so that a later record with the same date replaces the earlier one
        if slot.is_none_or(|(_, current)| date >= current) {
            *slot = Some((index, date));
        }
    }

    order
        .iter()
        .filter_map(|code| best.get(code).copied().flatten())
        .map(|(index, _)| &records[index])
        .collect()
}

/// A form record read through an entity's versioning fields
#[derive(Debug, Clone, Copy)]
pub struct VersionedView<'a> {
    pub record: &'a FormRecord,
    versioning: &'a Versioning,
}

impl<'a> VersionedView<'a> {
    pub fn new(record: &'a FormRecord, versioning: &'a Versioning) -> Self {
        Self { record, versioning }
    }
}

impl Versioned for VersionedView<'_> {
    fn code(&self) -> Cow<'_, str> {
        match self.record.text(&self.versioning.code_field) {
            Cow::Borrowed(s) => Cow::Borrowed(s.trim()),
            Cow::Owned(s) => Cow::Owned(s.trim().to_string()),
        }
    }

    fn effective_from(&self) -> Option<NaiveDate> {
        parse_effective_date(&self.record.text(&self.versioning.effective_from_field))
    }
}

/// Resolve a collection of a versioned entity
pub fn applicable_records<'a>(
    schema: &'a EntitySchema,
    records: &'a [FormRecord],
    as_of: NaiveDate,
) -> schema::Result<Vec<&'a FormRecord>> {
    let versioning = schema.require_versioning()?;
    let views: Vec<VersionedView<'a>> = records
        .iter()
        .map(|record| VersionedView::new(record, versioning))
        .collect();

    Ok(resolve_applicable(&views, as_of)
        .into_iter()
        .map(|view| view.record)
        .collect())
}

//! Field rule evaluation

use crate::record::{FieldErrors, FormRecord};
use crate::resolver::parse_effective_date;
use crate::schema::{EntitySchema, FieldKind};

/// Check `form` against every field rule of `schema`.
///
/// Fields are checked in declaration order and every field is checked; per
/// field the first failing rule produces the message. `selected` is the
/// collection index of the record being edited and is excluded from the
/// uniqueness check.
pub fn validate_record(
    schema: &EntitySchema,
    form: &FormRecord,
    collection: &[FormRecord],
    selected: Option<usize>,
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for (spec, pattern) in schema.rules() {
        if schema.is_surrogate_key(&spec.name) {
            continue;
        }

        let Some(value) = form.get(&spec.name) else {
            continue;
        };
        let label = spec.display_label();

        if value.is_empty() {
            if spec.required {
                errors.insert(spec.name.clone(), format!("{label} is required"));
            }
            continue;
        }

        let text = value.as_text();
        let trimmed = text.trim();

        let message = if spec
            .max_length
            .is_some_and(|max| text.chars().count() > max)
        {
            Some(format!(
                "{label} must be at most {} characters",
                spec.max_length.unwrap_or_default()
            ))
        } else if pattern.is_some_and(|p| !p.is_match(trimmed)) {
            Some(format!("{label} has an invalid format"))
        } else if spec.kind == FieldKind::Number && trimmed.parse::<f64>().is_err() {
            Some(format!("{label} must be a number"))
        } else if spec.kind == FieldKind::Date && parse_effective_date(trimmed).is_none() {
            Some(format!("{label} must be a valid date"))
        } else if spec.unique_among_existing
            && collection.iter().enumerate().any(|(i, other)| {
                Some(i) != selected && other.text(&spec.name).trim() == trimmed
            })
        {
            Some(format!("{label} already exists"))
        } else {
            None
        };

        if let Some(message) = message {
            errors.insert(spec.name.clone(), message);
        }
    }

    errors
}

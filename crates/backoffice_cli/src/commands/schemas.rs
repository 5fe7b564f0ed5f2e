use backoffice_core::schema::KeyKind;
use miette::Result;
use owo_colors::OwoColorize;

use super::Context;
use crate::output::Output;

/// List entity types, or describe one entity's fields
pub fn show(ctx: &Context, entity: Option<&str>) -> Result<()> {
    let output = Output::new();

    let Some(entity) = entity else {
        output.section("Entities");
        let rows: Vec<Vec<String>> = ctx
            .catalog
            .iter()
            .map(|schema| {
                vec![
                    schema.name().to_string(),
                    schema.resource().to_string(),
                    schema.primary_key().to_string(),
                    schema
                        .versioning()
                        .map(|v| format!("{} by {}", v.code_field, v.effective_from_field))
                        .unwrap_or_default(),
                ]
            })
            .collect();
        output.table(
            &["Entity", "Resource", "Key", "Versioned"].map(String::from),
            &rows,
        );
        return Ok(());
    };

    let schema = ctx.schema(entity)?;
    output.section(&format!("{} ({})", schema.name(), schema.resource()));
    let key = match schema.key_kind() {
        KeyKind::Surrogate => format!("{} (assigned by backend)", schema.primary_key()),
        KeyKind::Natural => format!("{} (entered)", schema.primary_key()),
    };
    output.kv("Key", &key);
    if let Some(code) = schema.locked_code() {
        output.kv("Locked on edit", code);
    }
    println!();

    let rows: Vec<Vec<String>> = schema
        .fields()
        .iter()
        .map(|spec| {
            let mut rules = Vec::new();
            if spec.required {
                rules.push("required".to_string());
            }
            if let Some(max) = spec.max_length {
                rules.push(format!("max {max}"));
            }
            if let Some(pattern) = &spec.pattern {
                rules.push(format!("pattern {pattern}"));
            }
            if spec.unique_among_existing {
                rules.push("unique".to_string());
            }
            vec![
                spec.name.clone(),
                spec.display_label().to_string(),
                format!("{:?}", spec.kind).to_lowercase(),
                rules.join(", "),
            ]
        })
        .collect();
    output.table(&["Field", "Label", "Kind", "Rules"].map(String::from), &rows);

    if schema.versioning().is_some() {
        println!();
        println!(
            "  {}",
            "Use `applicable` to see the version in force on a date".dimmed()
        );
    }

    Ok(())
}

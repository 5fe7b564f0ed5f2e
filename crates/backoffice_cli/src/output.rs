use backoffice_core::{EntitySchema, FieldErrors, FieldKind, FormRecord, Notice, NoticeLevel};
use owo_colors::OwoColorize;

/// Standard output formatting for the CLI
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    /// Print a system/status message (indented)
    pub fn status(&self, message: &str) {
        println!("  {}", message.dimmed());
    }

    /// Print a success message (indented)
    pub fn success(&self, message: &str) {
        println!("  {} {}", "✓".bright_green(), message);
    }

    /// Print an error message (indented)
    pub fn error(&self, message: &str) {
        println!("  {} {}", "✗".bright_red(), message);
    }

    /// Print a warning message (indented)
    pub fn warning(&self, message: &str) {
        println!("  {} {}", "⚠".yellow(), message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        println!();
        println!("{}", title.bright_cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
    }

    /// Print a key-value pair (indented)
    pub fn kv(&self, key: &str, value: &str) {
        println!("  {} {}", format!("{}:", key).dimmed(), value);
    }

    pub fn notice(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Info => self.success(&notice.message),
            NoticeLevel::Error => self.error(&notice.message),
        }
    }

    /// Print each field's validation message
    pub fn field_errors(&self, schema: &EntitySchema, errors: &FieldErrors) {
        for spec in schema.fields() {
            if let Some(message) = errors.get(&spec.name) {
                println!("  {} {}", format!("{}:", spec.name).bright_red(), message);
            }
        }
    }

    /// Print a table with padded columns
    pub fn table(&self, headers: &[String], rows: &[Vec<String>]) {
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let header = join_padded(headers, &widths);
        println!("  {}", header.bright_white().bold());
        println!("  {}", "─".repeat(header.chars().count()).dimmed());
        for row in rows {
            println!("  {}", join_padded(row, &widths));
        }
    }

    /// Print the given records of `schema` with their list indices
    pub fn records<'a>(
        &self,
        schema: &EntitySchema,
        records: impl IntoIterator<Item = (usize, &'a FormRecord)>,
    ) {
        let mut headers = vec!["#".to_string()];
        headers.extend(schema.fields().iter().map(|f| f.display_label().to_string()));

        let rows: Vec<Vec<String>> = records
            .into_iter()
            .map(|(index, record)| {
                let mut row = vec![index.to_string()];
                row.extend(schema.fields().iter().map(|f| match f.kind {
                    FieldKind::Boolean => yes_no(record.get(&f.name).is_some_and(|v| v.as_bool())),
                    _ => record.text(&f.name).into_owned(),
                }));
                row
            })
            .collect();

        if rows.is_empty() {
            self.status("No records");
            return;
        }
        self.table(&headers, &rows);
    }

    /// Print one record as key-value pairs
    pub fn record(&self, schema: &EntitySchema, record: &FormRecord) {
        for spec in schema.fields() {
            let value = match spec.kind {
                FieldKind::Boolean => yes_no(record.get(&spec.name).is_some_and(|v| v.as_bool())),
                _ => record.text(&spec.name).into_owned(),
            };
            self.kv(spec.display_label(), &value);
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

fn yes_no(flag: bool) -> String {
    let text = if flag { "yes" } else { "no" };
    text.to_string()
}

fn join_padded(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}

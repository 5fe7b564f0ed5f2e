use backoffice_core::resolver;
use chrono::NaiveDate;
use miette::Result;
use owo_colors::OwoColorize;

use super::Context;
use crate::output::Output;

/// Show all records of an entity
pub async fn list(ctx: &Context, entity: &str) -> Result<()> {
    let output = Output::new();
    let screen = ctx.screen(entity).await?;
    let schema = screen.controller().schema().clone();

    output.section(&format!("{} ({} records)", schema.name(), screen.records().len()));
    output.records(&schema, screen.records().iter().enumerate());
    Ok(())
}

/// Show, per code, the version in force on `as_of`
pub async fn applicable(ctx: &Context, entity: &str, as_of: Option<NaiveDate>) -> Result<()> {
    let output = Output::new();
    let as_of = as_of.unwrap_or_else(resolver::today);
    let screen = ctx.screen(entity).await?;
    let schema = screen.controller().schema().clone();

    let applicable = screen.applicable(as_of)?;
    output.section(&format!(
        "{} applicable on {}",
        schema.name(),
        as_of.to_string().bright_white()
    ));

    // Keep the list indices so `edit`/`delete` can target these rows
    let records = screen.records();
    let indexed = applicable.into_iter().filter_map(|record| {
        records
            .iter()
            .position(|candidate| std::ptr::eq(candidate, record))
            .map(|index| (index, record))
    });
    output.records(&schema, indexed);
    Ok(())
}

/// Show records where any field contains `query`
pub async fn search(ctx: &Context, entity: &str, query: &str) -> Result<()> {
    let output = Output::new();
    let screen = ctx.screen(entity).await?;
    let schema = screen.controller().schema().clone();

    let matches = screen.controller().search(query);
    output.section(&format!(
        "{} matching \"{}\" ({})",
        schema.name(),
        query,
        matches.len()
    ));
    let records = screen.records();
    output.records(&schema, matches.into_iter().map(|index| (index, &records[index])));
    Ok(())
}

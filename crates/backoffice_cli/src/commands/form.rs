use backoffice_core::{ActionOutcome, FormError, Mode, Notice, Screen, SubmitOutcome};
use miette::Result;

use super::{CliError, Context, apply_fields};
use crate::output::Output;

/// Add a record from `name=value` assignments
pub async fn add(ctx: &Context, entity: &str, fields: &[(String, String)]) -> Result<()> {
    let output = Output::new();
    let mut screen = ctx.screen(entity).await?;

    apply_fields(screen.controller_mut(), fields)?;
    save(ctx, &output, &mut screen).await
}

/// Edit the record at `index`
pub async fn edit(
    ctx: &Context,
    entity: &str,
    index: usize,
    fields: &[(String, String)],
) -> Result<()> {
    let output = Output::new();
    let mut screen = ctx.screen(entity).await?;

    if !start(ctx, &output, &mut screen, Mode::Edit)? {
        return Ok(());
    }
    let controller = screen.controller_mut();
    controller.select_record(index)?;
    apply_fields(controller, fields)?;
    save(ctx, &output, &mut screen).await
}

/// Delete the record at `index`, asking first unless `yes`
pub async fn delete(ctx: &Context, entity: &str, index: usize, yes: bool) -> Result<()> {
    let output = Output::new();
    let mut screen = ctx.screen(entity).await?;

    if !start(ctx, &output, &mut screen, Mode::Delete)? {
        return Ok(());
    }
    screen.controller_mut().select_record(index)?;

    let schema = screen.controller().schema().clone();
    output.section(&format!("Delete from {}", schema.name()));
    output.record(&schema, &screen.controller().state().current_form);
    println!();

    if !yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt("Delete this record?")
            .default(false)
            .interact()
            .map_err(CliError::from)?;
        if !confirmed {
            screen.controller_mut().clear();
            output.warning("Deletion cancelled");
            return Ok(());
        }
    }

    let outcome = screen.confirm_delete().await?;
    if let Some(notice) = Notice::for_delete(outcome, ctx.dismiss_after()) {
        output.notice(&notice);
    }
    Ok(())
}

/// Switch to `mode`; false when there is nothing to select
fn start(ctx: &Context, output: &Output, screen: &mut Screen, mode: Mode) -> Result<bool> {
    let outcome = screen.controller_mut().select_action(mode)?;
    if let Some(notice) = Notice::for_action(outcome, ctx.dismiss_after()) {
        output.notice(&notice);
    }
    Ok(outcome != ActionOutcome::NoRecordsAvailable)
}

async fn save(ctx: &Context, output: &Output, screen: &mut Screen) -> Result<()> {
    let schema = screen.controller().schema().clone();
    match screen.submit().await {
        Ok(outcome) => {
            if let Some(notice) = Notice::for_submit(&outcome, ctx.dismiss_after()) {
                output.notice(&notice);
            }
            if let SubmitOutcome::Created(Some(record)) = &outcome {
                output.record(&schema, record);
            }
            Ok(())
        }
        Err(FormError::ValidationFailed { errors }) => {
            output.field_errors(&schema, &errors);
            Err(FormError::ValidationFailed { errors }.into())
        }
        Err(err) => Err(err.into()),
    }
}

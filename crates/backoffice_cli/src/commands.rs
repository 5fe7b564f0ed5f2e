pub mod config;
pub mod form;
pub mod records;
pub mod schemas;

use std::sync::Arc;
use std::time::Duration;

use backoffice_api::ApiClient;
use backoffice_core::{BackofficeConfig, Catalog, EntitySchema, FormController, Screen};
use miette::{Diagnostic, Result};
use thiserror::Error;

/// Errors raised by the CLI itself, before or around the form controller
#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error("Unknown field '{field}' for {entity}")]
    #[diagnostic(
        code(backoffice_cli::unknown_field),
        help("Known fields: {}", known.join(", "))
    )]
    UnknownField {
        entity: String,
        field: String,
        known: Vec<String>,
    },

    #[error("Field '{field}' cannot be changed here")]
    #[diagnostic(
        code(backoffice_cli::read_only_field),
        help("Keys assigned by the backend and locked codes are read-only")
    )]
    ReadOnlyField { field: String },

    #[error("Prompt failed")]
    #[diagnostic(code(backoffice_cli::prompt))]
    Prompt(#[from] dialoguer::Error),
}

/// Everything a command needs: configuration, schemas and the API client
pub struct Context {
    pub config: BackofficeConfig,
    pub catalog: Catalog,
    pub client: ApiClient,
}

impl Context {
    pub fn new(config: BackofficeConfig) -> Result<Self> {
        let catalog = config.catalog()?;
        let client = ApiClient::from_config(&config.api)?;
        Ok(Self {
            config,
            catalog,
            client,
        })
    }

    pub fn schema(&self, entity: &str) -> Result<Arc<EntitySchema>> {
        Ok(self.catalog.resolve(entity)?)
    }

    /// Mount a screen for `entity`, loading its records from the backend
    pub async fn screen(&self, entity: &str) -> Result<Screen> {
        let schema = self.schema(entity)?;
        let repository = Arc::new(self.client.repository(schema.clone()));
        Ok(Screen::mount(schema, repository).await?)
    }

    pub fn dismiss_after(&self) -> Duration {
        self.config.notices.dismiss_after()
    }
}

/// Parse a `name=value` argument
pub fn parse_assignment(raw: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Write each assignment into the form
pub fn apply_fields(controller: &mut FormController, fields: &[(String, String)]) -> Result<()> {
    for (name, value) in fields {
        let schema = controller.schema().clone();
        if schema.field(name).is_none() {
            return Err(CliError::UnknownField {
                entity: schema.name().to_string(),
                field: name.clone(),
                known: schema.fields().iter().map(|f| f.name.clone()).collect(),
            }
            .into());
        }
        if !controller.update_field(name, value.as_str()) {
            return Err(CliError::ReadOnlyField { field: name.clone() }.into());
        }
    }
    Ok(())
}

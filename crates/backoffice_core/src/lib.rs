//! Backoffice Core - schema-driven master data screens
//!
//! This crate provides the form controller, validation and applicable-from
//! resolution shared by every POS back-office management screen, on top of a
//! repository abstraction over the backend's REST API.

pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod notice;
pub mod options;
pub mod record;
pub mod repository;
pub mod resolver;
pub mod schema;
pub mod screen;
pub mod validation;
pub mod value;

pub use catalog::Catalog;
pub use config::BackofficeConfig;
pub use controller::{
    ActionOutcome, ControllerState, DeleteOutcome, Effect, FormController, FormError, Mode,
    Pending, SelectOutcome, Submission, SubmitOutcome,
};
pub use error::{CoreError, Result};
pub use notice::{Notice, NoticeLevel};
pub use options::SelectOption;
pub use record::{FieldErrors, FormRecord};
pub use repository::{MemoryRepository, Repository, RepositoryError};
pub use resolver::{Versioned, resolve_applicable};
pub use schema::{EntitySchema, EntitySchemaDef, FieldKind, FieldSpec, KeyKind, SchemaError};
pub use screen::Screen;
pub use value::FieldValue;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        ActionOutcome, BackofficeConfig, Catalog, CoreError, DeleteOutcome, EntitySchema,
        FieldErrors, FieldKind, FieldSpec, FieldValue, FormController, FormError, FormRecord,
        Mode, Notice, Repository, RepositoryError, Result, Screen, SelectOutcome, SubmitOutcome,
    };
}

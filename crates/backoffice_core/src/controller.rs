//! The per-screen form state machine
//!
//! A [`FormController`] drives one entity type's management screen through
//! its Add / Edit / Delete / Search lifecycle. It never performs I/O: the two
//! operations that reach the backend are split into a `begin_*` half, which
//! validates, marks the controller as submitting and hands back an
//! [`Effect`] describing the repository call, and a `finish_*` half, which
//! applies the call's result. [`crate::screen::Screen`] wires both halves to
//! a [`crate::repository::Repository`].

use std::fmt;
use std::sync::Arc;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{FieldErrors, FormRecord};
use crate::repository::RepositoryError;
use crate::schema::EntitySchema;
use crate::validation::validate_record;
use crate::value::FieldValue;

/// Which action the screen is performing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Add,
    Edit,
    Delete,
    Search,
}

impl Mode {
    /// Edit, Delete and Search all operate on an existing record
    pub fn needs_selection(self) -> bool {
        !matches!(self, Mode::Add)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Add => "add",
            Mode::Edit => "edit",
            Mode::Delete => "delete",
            Mode::Search => "search",
        };
        f.write_str(name)
    }
}

/// What the screen is waiting on from the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pending {
    #[default]
    Nothing,
    /// A record must be picked from the collection
    Selection,
    /// The selected record is shown and deletion must be confirmed
    ConfirmDelete,
}

/// The full state of one screen's form
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    pub mode: Mode,
    pub current_form: FormRecord,
    pub selected_index: Option<usize>,
    pub is_dirty: bool,
    pub field_errors: FieldErrors,
    /// A repository call is in flight; Save/Delete must stay disabled
    pub is_submitting: bool,
    pub pending: Pending,
    /// The schema's locked code field is read-only (edit of a code-locked entity)
    pub key_locked: bool,
}

impl ControllerState {
    /// Add mode with an empty form
    pub fn initial(schema: &EntitySchema) -> Self {
        Self {
            mode: Mode::Add,
            current_form: FormRecord::empty(schema),
            selected_index: None,
            is_dirty: false,
            field_errors: FieldErrors::new(),
            is_submitting: false,
            pending: Pending::Nothing,
            key_locked: false,
        }
    }

    /// Same mode, nothing selected, empty form
    fn cleared(self, schema: &EntitySchema) -> Self {
        let pending = if self.mode.needs_selection() {
            Pending::Selection
        } else {
            Pending::Nothing
        };
        Self {
            pending,
            ..Self::initial(schema).with_mode_only(self.mode)
        }
    }

    fn with_mode_only(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    fn with_selection(self, index: usize, record: FormRecord, key_locked: bool) -> Self {
        let pending = if self.mode == Mode::Delete {
            Pending::ConfirmDelete
        } else {
            Pending::Nothing
        };
        Self {
            current_form: record,
            selected_index: Some(index),
            is_dirty: false,
            field_errors: FieldErrors::new(),
            pending,
            key_locked,
            ..self
        }
    }

    fn with_field(mut self, name: &str, value: FieldValue) -> Self {
        self.current_form.set(name, value);
        self.field_errors.remove(name);
        self.is_dirty = true;
        self
    }

    fn submitting(mut self, is_submitting: bool) -> Self {
        self.is_submitting = is_submitting;
        self
    }
}

/// Result of choosing an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Add mode, empty form ready for input
    Ready,
    /// The caller must present the record picker
    SelectionRequired,
    /// The collection is empty; nothing changed
    NoRecordsAvailable,
}

/// Result of picking a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected,
    /// Delete mode: ask the user to confirm
    ConfirmDeletion,
}

/// A repository call the caller must perform
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Create { record: FormRecord },
    Update { id: String, record: FormRecord },
    Delete { id: String },
}

/// First half of a submit
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Edit without real changes; no repository call needed
    NoChange,
    Effect(Effect),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Created; carries the stored record when the backend returned it
    Created(Option<FormRecord>),
    Updated,
    NoChange,
    /// The screen was unmounted while the call was in flight
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    Create,
    Update,
    Delete,
}

/// Why a controller operation did not go ahead
#[derive(Error, Diagnostic, Debug)]
pub enum FormError {
    #[error("Validation failed for {} field(s)", errors.len())]
    #[diagnostic(
        code(backoffice_core::form::validation_failed),
        help("Correct the highlighted fields and save again")
    )]
    ValidationFailed { errors: FieldErrors },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Repository(#[from] RepositoryError),

    #[error("A save or delete is already in progress")]
    #[diagnostic(code(backoffice_core::form::submission_in_flight))]
    SubmissionInFlight,

    #[error("No record selected for {mode}")]
    #[diagnostic(
        code(backoffice_core::form::no_selection),
        help("Select a record from the list first")
    )]
    NoSelection { mode: Mode },

    #[error("Record {index} does not exist (collection has {len})")]
    #[diagnostic(code(backoffice_core::form::invalid_index))]
    InvalidIndex { index: usize, len: usize },

    #[error("Cannot {operation} in {mode} mode")]
    #[diagnostic(code(backoffice_core::form::invalid_mode))]
    InvalidMode { operation: &'static str, mode: Mode },

    #[error("Selected record has no {field} value")]
    #[diagnostic(code(backoffice_core::form::missing_key))]
    MissingKey { field: String },

    #[error("No repository call is in flight")]
    #[diagnostic(code(backoffice_core::form::nothing_in_flight))]
    NothingInFlight,
}

pub type Result<T> = std::result::Result<T, FormError>;

/// Form state machine for one entity type
#[derive(Debug, Clone)]
pub struct FormController {
    schema: Arc<EntitySchema>,
    records: Vec<FormRecord>,
    state: ControllerState,
    /// The record as loaded by `select_record`, for change detection
    loaded: Option<FormRecord>,
    in_flight: Option<InFlight>,
    mounted: bool,
    stale: bool,
}

impl FormController {
    pub fn new(schema: Arc<EntitySchema>) -> Self {
        let state = ControllerState::initial(&schema);
        Self {
            schema,
            records: Vec::new(),
            state,
            loaded: None,
            in_flight: None,
            mounted: true,
            stale: true,
        }
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Cached copy of the record collection
    pub fn records(&self) -> &[FormRecord] {
        &self.records
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// True until the first load and after every commit until the next refresh
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Replace the cached collection with a freshly fetched one
    pub fn set_records(&mut self, records: Vec<FormRecord>) {
        if !self.mounted {
            tracing::debug!(entity = self.schema.name(), "discarding refresh after unmount");
            return;
        }

        self.records = records;
        self.stale = false;

        let Some(index) = self.state.selected_index else {
            return;
        };
        let same_record = match (self.records.get(index), &self.loaded) {
            (Some(now), Some(loaded)) => {
                now.primary_key_value(&self.schema) == loaded.primary_key_value(&self.schema)
            }
            _ => false,
        };
        if !same_record {
            let schema = self.schema.clone();
            tracing::debug!(entity = schema.name(), index, "selected record moved or vanished on refresh");
            self.loaded = None;
            self.state = self.take_state().cleared(&schema);
        }
    }

    /// Switch action.
    ///
    /// Edit, Delete and Search need a record; with an empty collection the
    /// state is left untouched and [`ActionOutcome::NoRecordsAvailable`] is
    /// returned.
    pub fn select_action(&mut self, mode: Mode) -> Result<ActionOutcome> {
        self.ensure_idle()?;

        if mode.needs_selection() && self.records.is_empty() {
            return Ok(ActionOutcome::NoRecordsAvailable);
        }

        tracing::debug!(entity = self.schema.name(), %mode, "action selected");
        self.loaded = None;

        if mode == Mode::Add {
            self.state = ControllerState::initial(&self.schema);
            return Ok(ActionOutcome::Ready);
        }

        let schema = self.schema.clone();
        self.state = self.take_state().with_mode_only(mode).cleared(&schema);
        Ok(ActionOutcome::SelectionRequired)
    }

    /// Load `records[index]` into the form
    pub fn select_record(&mut self, index: usize) -> Result<SelectOutcome> {
        self.ensure_idle()?;

        if !self.state.mode.needs_selection() {
            return Err(FormError::InvalidMode {
                operation: "select a record",
                mode: self.state.mode,
            });
        }
        let record = self
            .records
            .get(index)
            .cloned()
            .ok_or(FormError::InvalidIndex {
                index,
                len: self.records.len(),
            })?;

        let key_locked = self.state.mode == Mode::Edit && self.schema.code_lock_on_edit();
        self.loaded = Some(record.clone());
        self.state = self.take_state().with_selection(index, record, key_locked);

        tracing::debug!(entity = self.schema.name(), index, mode = %self.state.mode, "record selected");
        Ok(match self.state.pending {
            Pending::ConfirmDelete => SelectOutcome::ConfirmDeletion,
            _ => SelectOutcome::Selected,
        })
    }

    /// Whether the user may currently edit `name`
    pub fn is_field_editable(&self, name: &str) -> bool {
        if self.state.mode == Mode::Search || self.state.is_submitting {
            return false;
        }
        if self.schema.field(name).is_none() || self.schema.is_surrogate_key(name) {
            return false;
        }
        !(self.state.key_locked && self.schema.locked_code() == Some(name))
    }

    /// Write a field value. Returns false (and changes nothing) when the
    /// field is read-only in the current state or unknown.
    pub fn update_field(&mut self, name: &str, value: impl Into<FieldValue>) -> bool {
        if !self.is_field_editable(name) {
            tracing::debug!(entity = self.schema.name(), field = name, mode = %self.state.mode, "ignoring edit of read-only field");
            return false;
        }
        let Some(kind) = self.schema.field(name).map(|spec| spec.kind) else {
            return false;
        };

        let value = value.into().coerce(kind);
        self.state = self.take_state().with_field(name, value);
        true
    }

    /// Run every field rule and store the resulting errors
    pub fn validate(&mut self) -> FieldErrors {
        let errors = validate_record(
            &self.schema,
            &self.state.current_form,
            &self.records,
            self.state.selected_index,
        );
        self.state.field_errors = errors.clone();
        errors
    }

    /// True when the form differs from the record it was loaded from
    pub fn has_changes(&self) -> bool {
        match &self.loaded {
            Some(loaded) => !loaded.same_values(&self.state.current_form),
            None => self.state.is_dirty,
        }
    }

    /// Start a save.
    ///
    /// Returns [`Submission::NoChange`] for an unchanged edit. Otherwise
    /// validates, marks the controller as submitting and describes the
    /// create/update call to make.
    pub fn begin_submit(&mut self) -> Result<Submission> {
        self.ensure_idle()?;

        let in_flight = match self.state.mode {
            Mode::Add => InFlight::Create,
            Mode::Edit => {
                if self.state.selected_index.is_none() {
                    return Err(FormError::NoSelection { mode: Mode::Edit });
                }
                if !self.has_changes() {
                    tracing::debug!(entity = self.schema.name(), "edit has no changes");
                    return Ok(Submission::NoChange);
                }
                InFlight::Update
            }
            mode => {
                return Err(FormError::InvalidMode {
                    operation: "save",
                    mode,
                });
            }
        };

        let errors = self.validate();
        if !errors.is_empty() {
            tracing::debug!(entity = self.schema.name(), count = errors.len(), "validation failed");
            return Err(FormError::ValidationFailed { errors });
        }

        let record = self.state.current_form.clone();
        let effect = match in_flight {
            InFlight::Update => Effect::Update {
                id: self.loaded_key()?,
                record,
            },
            _ => Effect::Create { record },
        };

        self.in_flight = Some(in_flight);
        self.state = self.take_state().submitting(true);
        Ok(Submission::Effect(effect))
    }

    /// Apply the result of the call started by [`Self::begin_submit`].
    ///
    /// Success resets to Add with an empty form and marks the collection
    /// stale. Failure keeps the form as it was so the user can retry.
    pub fn finish_submit(
        &mut self,
        result: std::result::Result<Option<FormRecord>, RepositoryError>,
    ) -> Result<SubmitOutcome> {
        let in_flight = match self.in_flight {
            Some(kind @ (InFlight::Create | InFlight::Update)) => kind,
            _ => return Err(FormError::NothingInFlight),
        };
        self.in_flight = None;

        if !self.mounted {
            tracing::debug!(entity = self.schema.name(), "discarding save result after unmount");
            return Ok(SubmitOutcome::Discarded);
        }

        match result {
            Ok(created) => {
                tracing::info!(entity = self.schema.name(), "record saved");
                self.reset_after_commit();
                Ok(match in_flight {
                    InFlight::Create => SubmitOutcome::Created(created),
                    _ => SubmitOutcome::Updated,
                })
            }
            Err(err) => {
                tracing::warn!(entity = self.schema.name(), error = %err, "save failed");
                self.state = self.take_state().submitting(false);
                Err(FormError::Repository(err))
            }
        }
    }

    /// Start deleting the record awaiting confirmation
    pub fn begin_delete(&mut self) -> Result<Effect> {
        self.ensure_idle()?;

        if self.state.mode != Mode::Delete {
            return Err(FormError::InvalidMode {
                operation: "delete",
                mode: self.state.mode,
            });
        }
        if self.state.pending != Pending::ConfirmDelete {
            return Err(FormError::NoSelection { mode: Mode::Delete });
        }

        let id = self.loaded_key()?;
        self.in_flight = Some(InFlight::Delete);
        self.state = self.take_state().submitting(true);
        Ok(Effect::Delete { id })
    }

    /// Apply the result of the call started by [`Self::begin_delete`].
    ///
    /// On failure the delete confirmation and the selection stay as they
    /// were.
    pub fn finish_delete(
        &mut self,
        result: std::result::Result<(), RepositoryError>,
    ) -> Result<DeleteOutcome> {
        if self.in_flight != Some(InFlight::Delete) {
            return Err(FormError::NothingInFlight);
        }
        self.in_flight = None;

        if !self.mounted {
            tracing::debug!(entity = self.schema.name(), "discarding delete result after unmount");
            return Ok(DeleteOutcome::Discarded);
        }

        match result {
            Ok(()) => {
                tracing::info!(entity = self.schema.name(), "record deleted");
                self.reset_after_commit();
                Ok(DeleteOutcome::Deleted)
            }
            Err(err) => {
                tracing::warn!(entity = self.schema.name(), error = %err, "delete failed");
                self.state = self.take_state().submitting(false);
                Err(FormError::Repository(err))
            }
        }
    }

    /// Empty the form and drop the selection; the mode stays as it is
    pub fn clear(&mut self) {
        if self.state.is_submitting {
            tracing::debug!(entity = self.schema.name(), "ignoring clear while submitting");
            return;
        }
        self.loaded = None;
        let schema = self.schema.clone();
        self.state = self.take_state().cleared(&schema);
    }

    /// Indices of records where any field contains `query`, ignoring case
    pub fn search(&self, query: &str) -> Vec<usize> {
        let needle = query.trim().to_lowercase();
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                needle.is_empty()
                    || record
                        .iter()
                        .any(|(_, value)| value.as_text().to_lowercase().contains(&needle))
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// The screen went away; late results are dropped from now on
    pub fn unmount(&mut self) {
        self.mounted = false;
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.state.is_submitting {
            Err(FormError::SubmissionInFlight)
        } else {
            Ok(())
        }
    }

    fn loaded_key(&self) -> Result<String> {
        self.loaded
            .as_ref()
            .and_then(|record| record.primary_key_value(&self.schema))
            .ok_or_else(|| FormError::MissingKey {
                field: self.schema.primary_key().to_string(),
            })
    }

    fn reset_after_commit(&mut self) {
        self.loaded = None;
        self.stale = true;
        self.state = ControllerState::initial(&self.schema);
    }

    fn take_state(&mut self) -> ControllerState {
        std::mem::replace(&mut self.state, ControllerState::initial(&self.schema))
    }
}

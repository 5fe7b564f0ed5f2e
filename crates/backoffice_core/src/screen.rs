//! Async driver tying a [`FormController`] to its [`Repository`]

use std::sync::Arc;

use chrono::NaiveDate;

use crate::controller::{DeleteOutcome, Effect, FormController, Result, Submission, SubmitOutcome};
use crate::record::FormRecord;
use crate::repository::{self, Repository};
use crate::resolver::applicable_records;
use crate::schema::{self, EntitySchema};

/// One management screen: a controller plus the repository its effects run
/// against
pub struct Screen {
    controller: FormController,
    repository: Arc<dyn Repository>,
}

impl std::fmt::Debug for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

impl Screen {
    /// A screen with an empty, stale collection
    pub fn new(schema: Arc<EntitySchema>, repository: Arc<dyn Repository>) -> Self {
        Self {
            controller: FormController::new(schema),
            repository,
        }
    }

    /// Create the screen and load its collection
    pub async fn mount(
        schema: Arc<EntitySchema>,
        repository: Arc<dyn Repository>,
    ) -> Result<Self> {
        let mut screen = Self::new(schema, repository);
        screen.refresh().await?;
        Ok(screen)
    }

    pub fn controller(&self) -> &FormController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut FormController {
        &mut self.controller
    }

    pub fn records(&self) -> &[FormRecord] {
        self.controller.records()
    }

    /// Re-fetch the collection
    pub async fn refresh(&mut self) -> Result<()> {
        let records = self.repository.list().await?;
        tracing::debug!(
            entity = self.controller.schema().name(),
            count = records.len(),
            "collection loaded"
        );
        self.controller.set_records(records);
        Ok(())
    }

    /// Save the form: create in Add mode, update in Edit mode.
    ///
    /// After a successful commit the collection is re-fetched. A failed
    /// re-fetch is logged and leaves the controller stale; the save itself
    /// still counts as done.
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        let effect = match self.controller.begin_submit()? {
            Submission::NoChange => return Ok(SubmitOutcome::NoChange),
            Submission::Effect(effect) => effect,
        };

        let result = self.run(effect).await;
        let outcome = self.controller.finish_submit(result)?;
        if matches!(outcome, SubmitOutcome::Created(_) | SubmitOutcome::Updated) {
            self.refresh_after_commit().await;
        }
        Ok(outcome)
    }

    /// Delete the record awaiting confirmation
    pub async fn confirm_delete(&mut self) -> Result<DeleteOutcome> {
        let effect = self.controller.begin_delete()?;
        let result = self.run(effect).await.map(|_| ());
        let outcome = self.controller.finish_delete(result)?;
        if outcome == DeleteOutcome::Deleted {
            self.refresh_after_commit().await;
        }
        Ok(outcome)
    }

    pub fn unmount(&mut self) {
        self.controller.unmount();
    }

    /// For versioned entities, the records applicable on `as_of`
    pub fn applicable(&self, as_of: NaiveDate) -> schema::Result<Vec<&FormRecord>> {
        applicable_records(self.controller.schema(), self.controller.records(), as_of)
    }

    async fn run(&self, effect: Effect) -> repository::Result<Option<FormRecord>> {
        let entity = self.controller.schema().name();
        match effect {
            Effect::Create { record } => {
                tracing::debug!(entity, "creating record");
                self.repository.create(&record).await
            }
            Effect::Update { id, record } => {
                tracing::debug!(entity, %id, "updating record");
                self.repository.update(&id, &record).await.map(|()| None)
            }
            Effect::Delete { id } => {
                tracing::debug!(entity, %id, "deleting record");
                self.repository.delete(&id).await.map(|()| None)
            }
        }
    }

    async fn refresh_after_commit(&mut self) {
        if let Err(err) = self.refresh().await {
            tracing::warn!(
                entity = self.controller.schema().name(),
                error = %err,
                "refresh after commit failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ControllerState, FormError, Mode, Pending};
    use crate::repository::{MockRepository, RepositoryError};
    use crate::schema::{EntitySchemaDef, FieldSpec};
    use crate::value::FieldValue;
    use pretty_assertions::assert_eq;

    fn table_schema() -> Arc<EntitySchema> {
        Arc::new(
            EntitySchemaDef::new("table_settings", "table-settings", "id")
                .field(FieldSpec::number("id"))
                .field(FieldSpec::text("table_number").required().unique())
                .field(FieldSpec::number("capacity").required())
                .build()
                .unwrap(),
        )
    }

    fn tables(schema: &EntitySchema, count: i64) -> Vec<FormRecord> {
        (1..=count)
            .map(|i| {
                FormRecord::from_pairs(
                    schema,
                    [
                        ("id", FieldValue::from(i)),
                        ("table_number", FieldValue::from(format!("T{i}"))),
                        ("capacity", FieldValue::from(4_i64)),
                    ],
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_add_creates_once_and_resets() {
        let schema = table_schema();
        let mut repo = MockRepository::new();
        let seeded = tables(&schema, 2);
        repo.expect_list()
            .times(2)
            .returning(move || Ok(seeded.clone()));
        repo.expect_create()
            .times(1)
            .withf(|record| record.text("table_number") == "T9" && record.text("capacity") == "6")
            .returning(|_| Ok(None));

        let mut screen = Screen::mount(schema.clone(), Arc::new(repo)).await.unwrap();
        let controller = screen.controller_mut();
        assert!(controller.update_field("table_number", "T9"));
        assert!(controller.update_field("capacity", "6"));

        let outcome = screen.submit().await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Created(None));
        assert_eq!(screen.controller().state(), &ControllerState::initial(&schema));
        assert!(!screen.controller().is_stale());
    }

    #[tokio::test]
    async fn test_unchanged_edit_makes_no_call() {
        let schema = table_schema();
        let mut repo = MockRepository::new();
        let seeded = tables(&schema, 3);
        repo.expect_list()
            .times(1)
            .returning(move || Ok(seeded.clone()));
        repo.expect_update().never();
        repo.expect_create().never();

        let mut screen = Screen::mount(schema, Arc::new(repo)).await.unwrap();
        screen.controller_mut().select_action(Mode::Edit).unwrap();
        screen.controller_mut().select_record(1).unwrap();

        assert_eq!(screen.submit().await.unwrap(), SubmitOutcome::NoChange);
    }

    #[tokio::test]
    async fn test_delete_calls_repository_with_selected_key() {
        let schema = table_schema();
        let mut repo = MockRepository::new();
        let seeded = tables(&schema, 5);
        repo.expect_list()
            .times(2)
            .returning(move || Ok(seeded.clone()));
        repo.expect_delete()
            .times(1)
            .withf(|id| id == "3")
            .returning(|_| Ok(()));

        let mut screen = Screen::mount(schema, Arc::new(repo)).await.unwrap();
        screen.controller_mut().select_action(Mode::Delete).unwrap();
        screen.controller_mut().select_record(2).unwrap();

        assert_eq!(screen.confirm_delete().await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(screen.controller().state().mode, Mode::Add);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_confirmation() {
        let schema = table_schema();
        let mut repo = MockRepository::new();
        let seeded = tables(&schema, 5);
        repo.expect_list()
            .times(1)
            .returning(move || Ok(seeded.clone()));
        repo.expect_delete().times(1).returning(|_| {
            Err(RepositoryError::from_server_message(Some(
                "Table has open orders".to_string(),
            )))
        });

        let mut screen = Screen::mount(schema, Arc::new(repo)).await.unwrap();
        screen.controller_mut().select_action(Mode::Delete).unwrap();
        screen.controller_mut().select_record(2).unwrap();

        let err = screen.confirm_delete().await.unwrap_err();
        assert_eq!(err.to_string(), "Table has open orders");

        let state = screen.controller().state();
        assert_eq!(state.mode, Mode::Delete);
        assert_eq!(state.pending, Pending::ConfirmDelete);
        assert_eq!(state.selected_index, Some(2));
        assert!(!state.is_submitting);
    }

    #[tokio::test]
    async fn test_refresh_failure_after_commit_keeps_success() {
        let schema = table_schema();
        let mut repo = MockRepository::new();
        let seeded = tables(&schema, 1);
        let mut calls = 0;
        repo.expect_list().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Ok(seeded.clone())
            } else {
                Err(RepositoryError::from_server_message(None))
            }
        });
        repo.expect_create().times(1).returning(|_| Ok(None));

        let mut screen = Screen::mount(schema, Arc::new(repo)).await.unwrap();
        screen.controller_mut().update_field("table_number", "T2");
        screen.controller_mut().update_field("capacity", "2");

        assert_eq!(screen.submit().await.unwrap(), SubmitOutcome::Created(None));
        assert!(screen.controller().is_stale());
    }

    #[tokio::test]
    async fn test_failed_initial_load() {
        let mut repo = MockRepository::new();
        repo.expect_list()
            .times(1)
            .returning(|| Err(RepositoryError::from_server_message(None)));

        let err = Screen::mount(table_schema(), Arc::new(repo))
            .await
            .unwrap_err();
        assert!(matches!(err, FormError::Repository(_)));
    }
}

//! In-process repository backed by a vector of records

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Repository, RepositoryError, Result};
use crate::record::FormRecord;
use crate::schema::{EntitySchema, KeyKind};
use crate::value::FieldValue;

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<FormRecord>,
    next_id: i64,
    fail_next: Option<String>,
}

/// A [`Repository`] that keeps records in memory.
///
/// Enforces the same constraints a backend would: primary keys and
/// `unique_among_existing` fields are unique, and surrogate ids are assigned
/// on create.
#[derive(Debug)]
pub struct MemoryRepository {
    schema: Arc<EntitySchema>,
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    pub fn new(schema: Arc<EntitySchema>) -> Self {
        Self::with_records(schema, Vec::new())
    }

    /// Seed with existing records; surrogate ids continue after the highest one
    pub fn with_records(schema: Arc<EntitySchema>, records: Vec<FormRecord>) -> Self {
        let next_id = records
            .iter()
            .filter_map(|r| r.text(schema.primary_key()).trim().parse::<i64>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        Self {
            schema,
            state: Mutex::new(MemoryState {
                records,
                next_id,
                fail_next: None,
            }),
        }
    }

    /// Snapshot of the stored records
    pub fn records(&self) -> Vec<FormRecord> {
        self.state.lock().records.clone()
    }

    /// Make the next mutating call fail with `message`, as a backend would
    /// with `success: false`
    pub fn fail_next(&self, message: impl Into<String>) {
        self.state.lock().fail_next = Some(message.into());
    }

    fn position(&self, records: &[FormRecord], id: &str) -> Option<usize> {
        records
            .iter()
            .position(|r| r.primary_key_value(&self.schema).as_deref() == Some(id))
    }

    fn check_unique(
        &self,
        records: &[FormRecord],
        record: &FormRecord,
        skip: Option<usize>,
    ) -> Result<()> {
        for spec in self.schema.fields() {
            let is_natural_key =
                self.schema.key_kind() == KeyKind::Natural && spec.name == self.schema.primary_key();
            if !(spec.unique_among_existing || is_natural_key) {
                continue;
            }

            let value = record.text(&spec.name);
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            let clash = records
                .iter()
                .enumerate()
                .any(|(i, other)| Some(i) != skip && other.text(&spec.name).trim() == value);
            if clash {
                return Err(RepositoryError::duplicate(format!(
                    "Duplicate entry '{value}' for key '{}'",
                    spec.name
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list(&self) -> Result<Vec<FormRecord>> {
        Ok(self.records())
    }

    async fn create(&self, record: &FormRecord) -> Result<Option<FormRecord>> {
        let mut state = self.state.lock();
        if let Some(message) = state.fail_next.take() {
            return Err(RepositoryError::from_server_message(Some(message)));
        }

        self.check_unique(&state.records, record, None)?;

        let mut stored = record.clone();
        if self.schema.key_kind() == KeyKind::Surrogate {
            let id = state.next_id;
            state.next_id += 1;
            stored.set(self.schema.primary_key(), FieldValue::from(id));
        }

        state.records.push(stored.clone());
        tracing::debug!(entity = self.schema.name(), "memory repository created record");
        Ok(Some(stored))
    }

    async fn update(&self, id: &str, record: &FormRecord) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(message) = state.fail_next.take() {
            return Err(RepositoryError::from_server_message(Some(message)));
        }

        let index = self
            .position(&state.records, id)
            .ok_or_else(|| RepositoryError::NotFound { id: id.to_string() })?;
        self.check_unique(&state.records, record, Some(index))?;

        let mut stored = record.clone();
        if self.schema.key_kind() == KeyKind::Surrogate {
            // The surrogate key is owned by the store
            let key = self.schema.primary_key();
            if let Some(original) = state.records[index].get(key).cloned() {
                stored.set(key, original);
            }
        }
        state.records[index] = stored;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(message) = state.fail_next.take() {
            return Err(RepositoryError::from_server_message(Some(message)));
        }

        let index = self
            .position(&state.records, id)
            .ok_or_else(|| RepositoryError::NotFound { id: id.to_string() })?;
        state.records.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntitySchemaDef, FieldSpec};

    fn schema() -> Arc<EntitySchema> {
        Arc::new(
            EntitySchemaDef::new("outlets", "outlets", "id")
                .field(FieldSpec::number("id"))
                .field(FieldSpec::text("outlet_code").required().unique())
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_create_assigns_surrogate_ids() {
        let schema = schema();
        let repo = MemoryRepository::new(schema.clone());

        let first = repo
            .create(&FormRecord::from_pairs(&schema, [("outlet_code", "A")]))
            .await
            .unwrap()
            .unwrap();
        let second = repo
            .create(&FormRecord::from_pairs(&schema, [("outlet_code", "B")]))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.primary_key_value(&schema).as_deref(), Some("1"));
        assert_eq!(second.primary_key_value(&schema).as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_duplicate_unique_field_rejected() {
        let schema = schema();
        let repo = MemoryRepository::new(schema.clone());
        let record = FormRecord::from_pairs(&schema, [("outlet_code", "A")]);

        repo.create(&record).await.unwrap();
        let err = repo.create(&record).await.unwrap_err();
        assert!(err.is_duplicate_key());
    }

    #[tokio::test]
    async fn test_delete_unknown_id() {
        let repo = MemoryRepository::new(schema());
        let err = repo.delete("42").await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let schema = schema();
        let repo = MemoryRepository::new(schema.clone());
        repo.fail_next("Backend offline");

        let record = FormRecord::from_pairs(&schema, [("outlet_code", "A")]);
        let err = repo.create(&record).await.unwrap_err();
        assert_eq!(err.user_message(), "Backend offline");
        assert!(repo.create(&record).await.is_ok());
    }
}

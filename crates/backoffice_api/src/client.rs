//! reqwest-backed repository over the backend's REST API

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoffice_core::config::ApiConfig;
use backoffice_core::record::FormRecord;
use backoffice_core::repository::{self, Repository};
use backoffice_core::schema::EntitySchema;
use backoffice_core::value::FieldValue;
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::envelope::Envelope;
use crate::error::{ClientError, Result};

/// Shared HTTP client rooted at the API base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "URL cannot carry a path".to_string(),
            });
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: parsed,
            client,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Repository for one entity type
    pub fn repository(&self, schema: Arc<EntitySchema>) -> HttpRepository {
        HttpRepository {
            client: self.clone(),
            schema,
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.url(segments)?;
        tracing::debug!(%method, %url, "sending request");
        Ok(self.client.request(method, url))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Envelope<Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.message);
            tracing::warn!(status = status.as_u16(), message = ?message, "request failed");
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_slice(&body).map_err(|cause| ClientError::Decode {
                status: status.as_u16(),
                cause,
            })?;
        envelope.into_result()
    }
}

/// [`Repository`] for one entity type, talking to
/// `<base_url>/<resource>[/<id>]`
#[derive(Debug, Clone)]
pub struct HttpRepository {
    client: ApiClient,
    schema: Arc<EntitySchema>,
}

impl HttpRepository {
    pub fn new(client: ApiClient, schema: Arc<EntitySchema>) -> Self {
        Self { client, schema }
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    async fn fetch_all(&self) -> Result<Vec<FormRecord>> {
        let request = self.client.request(Method::GET, &[self.schema.resource()])?;
        let rows: Vec<Map<String, Value>> = self.client.send(request).await?.unwrap_or_default();
        Ok(rows
            .iter()
            .map(|row| FormRecord::conform(&self.schema, row))
            .collect())
    }

    async fn post(&self, record: &FormRecord) -> Result<Option<FormRecord>> {
        let surrogate = self
            .schema
            .is_surrogate_key(self.schema.primary_key())
            .then(|| self.schema.primary_key());
        let body = record.to_json_without(surrogate);

        let request = self
            .client
            .request(Method::POST, &[self.schema.resource()])?
            .json(&body);
        let data: Option<Value> = self.client.send(request).await?;
        Ok(data.map(|data| self.merge_created(record, data)))
    }

    async fn put(&self, id: &str, record: &FormRecord) -> Result<()> {
        let request = self
            .client
            .request(Method::PUT, &[self.schema.resource(), id])?
            .json(&record.to_json());
        self.client.send::<Value>(request).await?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let request = self
            .client
            .request(Method::DELETE, &[self.schema.resource(), id])?;
        self.client.send::<Value>(request).await?;
        Ok(())
    }

    /// The submitted record overlaid with whatever the backend echoed back.
    ///
    /// A bare scalar is taken as the new surrogate key.
    fn merge_created(&self, submitted: &FormRecord, data: Value) -> FormRecord {
        let mut stored = submitted.clone();
        match data {
            Value::Object(fields) => {
                for (name, value) in &fields {
                    if let Some(spec) = self.schema.field(name) {
                        stored.set(name, FieldValue::from_json(spec.kind, value));
                    }
                }
            }
            scalar @ (Value::Number(_) | Value::String(_)) => {
                let key = self.schema.primary_key();
                if let Some(spec) = self
                    .schema
                    .field(key)
                    .filter(|_| self.schema.is_surrogate_key(key))
                {
                    stored.set(key, FieldValue::from_json(spec.kind, &scalar));
                }
            }
            _ => {}
        }
        stored
    }
}

#[async_trait]
impl Repository for HttpRepository {
    async fn list(&self) -> repository::Result<Vec<FormRecord>> {
        Ok(self.fetch_all().await?)
    }

    async fn create(&self, record: &FormRecord) -> repository::Result<Option<FormRecord>> {
        let created = self.post(record).await?;
        tracing::info!(entity = self.schema.name(), "record created");
        Ok(created)
    }

    async fn update(&self, id: &str, record: &FormRecord) -> repository::Result<()> {
        self.put(id, record).await?;
        tracing::info!(entity = self.schema.name(), id, "record updated");
        Ok(())
    }

    async fn delete(&self, id: &str) -> repository::Result<()> {
        self.remove(id).await?;
        tracing::info!(entity = self.schema.name(), id, "record deleted");
        Ok(())
    }
}

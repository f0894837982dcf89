use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::Context;
use secrecy::ExposeSecret;
use secrecy::Secret;

use crate::collaborators::PropertyStore;
use crate::domain::sync_visibility;
use crate::domain::ListField;
use crate::domain::ListSchema;
use crate::mailchimp_client::ListProvider;
use crate::mailchimp_client::ProviderUnavailable;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum SchemaCacheError {
    #[error(transparent)]
    ProviderUnavailable(#[from] ProviderUnavailable),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SchemaCacheError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Property under which a list's schema is stored
pub fn schema_key(list_id: &str) -> String { format!("mailchimp.schema.{list_id}") }

type ListLock = Arc<tokio::sync::Mutex<()>>;

/// Merge-field schemas rarely change and each fetch is a round trip to
/// Mailchimp, so they are kept in the widget's property store until someone
/// explicitly asks for a refresh.
pub struct ListSchemaCache<P> {
    provider: Arc<P>,
    store: Arc<dyn PropertyStore>,
    /// One lock per (api key, list id); only writers take it. Entries are
    /// never removed, which is fine for the handful of lists a widget uses.
    locks: Mutex<HashMap<(String, String), ListLock>>,
}

impl<P: ListProvider> ListSchemaCache<P> {
    pub fn new(
        provider: Arc<P>,
        store: Arc<dyn PropertyStore>,
    ) -> Self {
        Self {
            provider,
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(
        &self,
        api_key: &Secret<String>,
        list_id: &str,
    ) -> ListLock {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry((api_key.expose_secret().clone(), list_id.to_string()))
            .or_default()
            .clone()
    }

    fn cached(
        &self,
        list_id: &str,
    ) -> Option<ListSchema> {
        let raw = self.store.get(&schema_key(list_id))?;
        match serde_json::from_str(&raw) {
            Ok(schema) => Some(schema),
            Err(e) => {
                // a stale format from an older version; treat as never fetched
                tracing::warn!(error.message = %e, list_id, "discarding undecodable cached schema");
                None
            }
        }
    }

    fn persist(
        &self,
        list_id: &str,
        schema: &ListSchema,
    ) -> Result<(), anyhow::Error> {
        let raw = serde_json::to_string(schema).context("could not serialize schema")?;
        // single write: the stored schema is always one complete fetch
        self.store.set(&schema_key(list_id), raw);
        Ok(())
    }

    /// Fetch from Mailchimp and replace the cached schema. Nothing is written
    /// if the fetch fails.
    async fn refresh(
        &self,
        api_key: &Secret<String>,
        list_id: &str,
    ) -> Result<ListSchema, SchemaCacheError> {
        let schema: ListSchema = self
            .provider
            .fetch_merge_fields(api_key, list_id)
            .await?
            .into_iter()
            .map(ListField::from)
            .collect();
        self.persist(list_id, &schema)?;
        tracing::info!(list_id, fields = schema.fields().len(), "cached list schema");
        Ok(schema)
    }

    /// The cached schema, unless there is none or `force_refresh` is set
    #[tracing::instrument(name = "Getting list schema", skip(self, api_key))]
    pub async fn get_schema(
        &self,
        api_key: &Secret<String>,
        list_id: &str,
        force_refresh: bool,
    ) -> Result<ListSchema, SchemaCacheError> {
        if !force_refresh {
            if let Some(schema) = self.cached(list_id) {
                return Ok(schema);
            }
        }
        let lock = self.lock_for(api_key, list_id);
        let _guard = lock.lock().await;
        // whoever held the lock may have cached (or edited) the schema meanwhile
        if !force_refresh {
            if let Some(schema) = self.cached(list_id) {
                return Ok(schema);
            }
        }
        self.refresh(api_key, list_id).await
    }

    /// Save visibility toggles from the properties form. Mailchimp is only
    /// contacted when nothing has been cached yet.
    #[tracing::instrument(name = "Updating field visibility", skip(self, api_key, submitted))]
    pub async fn update_visibility(
        &self,
        api_key: &Secret<String>,
        list_id: &str,
        submitted: &HashMap<String, String>,
    ) -> Result<ListSchema, SchemaCacheError> {
        let lock = self.lock_for(api_key, list_id);
        let _guard = lock.lock().await;

        let schema = match self.cached(list_id) {
            Some(schema) => schema,
            None => self.refresh(api_key, list_id).await?,
        };
        let schema = sync_visibility(schema, submitted);
        self.persist(list_id, &schema)?;
        Ok(schema)
    }
}

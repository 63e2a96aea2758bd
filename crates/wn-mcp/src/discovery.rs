//! Schema discovery: walk `?_schema` and build object profiles.

use wn_protocol::ObjectProfile;
use wn_wapi::WapiClient;

use crate::cache::{SchemaCache, schema_hash};
use crate::error::McpResult;

/// Default cap on objects fetched per discovery run.
pub const DEFAULT_MAX_OBJECTS: usize = 50;

/// Discovers WAPI objects and their schemas through a cache.
pub struct SchemaDiscoverer {
    client: WapiClient,
    cache: SchemaCache,
    max_objects: usize,
}

impl SchemaDiscoverer {
    pub fn new(client: WapiClient, cache: SchemaCache) -> Self {
        Self {
            client,
            cache,
            max_objects: DEFAULT_MAX_OBJECTS,
        }
    }

    pub fn with_max_objects(mut self, max_objects: usize) -> Self {
        self.max_objects = max_objects;
        self
    }

    /// Fetch the object list, then one profile per object (index order,
    /// capped at `max_objects`). Objects that fail are skipped.
    pub async fn discover(&self) -> Vec<ObjectProfile> {
        let index = match self.client.schema_index().await {
            Ok(index) => index,
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch WAPI schema index");
                return Vec::new();
            }
        };
        tracing::info!(
            objects = index.supported_objects.len(),
            limit = self.max_objects,
            "discovered WAPI objects"
        );

        let mut profiles = Vec::new();
        for object in index.supported_objects.iter().take(self.max_objects) {
            match self.profile(object).await {
                Ok(profile) => profiles.push(profile),
                Err(e) => {
                    tracing::warn!(object = %object, error = %e, "skipping object schema");
                }
            }
        }
        profiles
    }

    /// Profile for one object, from cache when fresh.
    pub async fn profile(&self, object: &str) -> McpResult<ObjectProfile> {
        if let Some(profile) = self.cache.load(object) {
            tracing::debug!(object, "schema served from cache");
            return Ok(profile);
        }

        let schema = self.client.object_schema(object).await?;
        let profile = ObjectProfile::from_schema(object, &schema)?;

        if let Err(e) = self.cache.store(&profile) {
            tracing::warn!(object, error = %e, "failed to cache schema");
        }
        Ok(profile)
    }

    /// Hash of the schema index when it differs from the stored one. Nothing
    /// is stored here; call [`Self::mark_applied`] once the change has been
    /// acted on. An unreachable grid reports no change.
    pub async fn check_for_updates(&self) -> Option<String> {
        let document = match self.client.schema_index_raw().await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = %e, "schema update check failed");
                return None;
            }
        };

        let current = schema_hash(&document);
        if self.cache.stored_hash().as_deref() == Some(current.as_str()) {
            return None;
        }
        tracing::info!(hash = %current, "WAPI schema changed");
        Some(current)
    }

    /// Record `hash` as the schema the current tools were built from.
    pub fn mark_applied(&self, hash: &str) {
        if let Err(e) = self.cache.store_hash(hash) {
            tracing::warn!(error = %e, "failed to store schema hash");
        }
    }
}

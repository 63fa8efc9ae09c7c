//! Neo4j-backed durable store
//!
//! Each record is one `(:Address)` node:
//!
//! ```text
//! (:Address {id: <uuid>, key: "01001000", payload: "<record json>", created_at: <rfc3339>})
//! ```
//!
//! `id` is the store-owned identity and is dropped when the record is read
//! back. Duplicate nodes for a key are allowed; reads return the oldest.

use crate::connection::Neo4jClient;
use crate::durable::DurableStore;
use crate::error::{Result, StoreError};
use crate::record::{AddressRecord, LookupKey, StoredRecord};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use neo4rs::query;
use tracing::{debug, info};
use uuid::Uuid;

/// Durable tier on top of a [`Neo4jClient`]
pub struct Neo4jStore {
    client: Neo4jClient,
}

impl Neo4jStore {
    /// Wrap a connected client and make sure the key index exists
    pub async fn new(client: Neo4jClient) -> Result<Self> {
        let store = Self { client };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.client
            .graph()
            .run(query(
                "CREATE INDEX address_key IF NOT EXISTS FOR (a:Address) ON (a.key)",
            ))
            .await
            .map_err(|e| StoreError::QueryError(format!("Failed to create address index: {}", e)))?;

        info!("Address key index ready");
        Ok(())
    }
}

#[async_trait]
impl DurableStore for Neo4jStore {
    fn backend(&self) -> &'static str {
        "neo4j"
    }

    async fn find(&self, key: &LookupKey) -> Result<Option<AddressRecord>> {
        let cypher = query(
            "MATCH (a:Address {key: $key})
             RETURN a.id AS id, a.payload AS payload
             ORDER BY a.created_at
             LIMIT 1",
        )
        .param("key", key.to_string());

        let mut result = self
            .client
            .graph()
            .execute(cypher)
            .await
            .map_err(|e| StoreError::QueryError(format!("Failed to find address: {}", e)))?;

        let Some(row) = result
            .next()
            .await
            .map_err(|e| StoreError::QueryError(format!("Failed to read address result: {}", e)))?
        else {
            debug!("Neo4j miss: {}", key);
            return Ok(None);
        };

        let id: String = row
            .get("id")
            .map_err(|e| StoreError::QueryError(format!("Failed to extract address id: {}", e)))?;
        let payload: String = row.get("payload").map_err(|e| {
            StoreError::QueryError(format!("Failed to extract address payload: {}", e))
        })?;

        let id = Uuid::parse_str(&id)
            .map_err(|e| StoreError::SerializationError(format!("Invalid address id: {}", e)))?;
        let record = AddressRecord::from_json_str(&payload)?;

        debug!("Neo4j hit: {} (id: {})", key, id);
        Ok(Some(StoredRecord::with_id(id, key.clone(), record).into_record()))
    }

    async fn insert(&self, key: &LookupKey, record: &AddressRecord) -> Result<Uuid> {
        let id = Uuid::new_v4();

        let cypher = query(
            "CREATE (a:Address {
                id: $id,
                key: $key,
                payload: $payload,
                created_at: $created_at
            })",
        )
        .param("id", id.to_string())
        .param("key", key.to_string())
        .param("payload", record.to_json_string()?)
        // Fixed-width timestamps so ORDER BY created_at sorts chronologically
        .param(
            "created_at",
            Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
        );

        self.client
            .graph()
            .run(cypher)
            .await
            .map_err(|e| StoreError::QueryError(format!("Failed to insert address: {}", e)))?;

        debug!("Neo4j insert: {} (id: {})", key, id);
        Ok(id)
    }

    async fn ping(&self) -> Result<()> {
        self.client.health_check().await
    }
}

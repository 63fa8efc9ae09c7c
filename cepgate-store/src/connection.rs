//! Neo4j connection management
//!
//! The durable tier keeps address records in Neo4j. This module owns the
//! connection pool and the liveness probe; the record queries live in
//! [`crate::durable::neo4j`].

use crate::error::{Result, StoreError};
use neo4rs::{query, ConfigBuilder, Graph};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Connection settings for Neo4j
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    /// Connection URI (e.g., "bolt://localhost:7687")
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: usize,
    pub fetch_size: usize,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "password".to_string(),
            database: "neo4j".to_string(),
            max_connections: 16,
            fetch_size: 500,
        }
    }
}

/// Neo4j client with connection pooling
pub struct Neo4jClient {
    graph: Graph,
}

impl Neo4jClient {
    /// Connect using the given settings
    ///
    /// # Example
    /// ```no_run
    /// use cepgate_store::{Neo4jClient, Neo4jConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let client = Neo4jClient::connect(&Neo4jConfig::default()).await?;
    ///     client.health_check().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(config: &Neo4jConfig) -> Result<Self> {
        info!(
            "Connecting to Neo4j at {} (database: {})",
            config.uri, config.database
        );

        let neo_config = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_str())
            .db(config.database.as_str())
            .fetch_size(config.fetch_size)
            .max_connections(config.max_connections)
            .build()
            .map_err(|e| StoreError::ConfigError(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        info!("Successfully connected to Neo4j");

        Ok(Self { graph })
    }

    /// Liveness probe using `RETURN 1`
    pub async fn health_check(&self) -> Result<()> {
        debug!("Executing Neo4j health check (RETURN 1)");

        self.graph
            .run(query("RETURN 1"))
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        debug!("Neo4j health check passed");
        Ok(())
    }

    /// Direct access to the neo4rs Graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }
}

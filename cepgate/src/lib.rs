//! # cepgate
//!
//! Resolves Brazilian postal codes (CEP) to address records through a tiered
//! pipeline: fast cache → durable store → ViaCEP origin.
//!
//! ```no_run
//! use cepgate::{LookupService, ViaCepClient};
//! use cepgate_store::{CacheConfig, MemoryCache, MemoryStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = LookupService::new(Arc::new(ViaCepClient::with_defaults()?))
//!         .with_cache(Arc::new(MemoryCache::new(CacheConfig::default())))
//!         .with_store(Arc::new(MemoryStore::new()));
//!
//!     let resolved = service.resolve("01001000").await?;
//!     println!("{:?}: {:?}", resolved.source, resolved.data);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod lookup;
pub mod origin;

pub use config::AppConfig;
pub use error::LookupError;
pub use lookup::{LookupOutcome, LookupService, Resolved, Source};
pub use origin::{OriginResolver, OriginResponse, ViaCepClient};

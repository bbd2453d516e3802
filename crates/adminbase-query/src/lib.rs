//! # adminbase-query
//!
//! Engine-agnostic query service for the Adminbase dashboard generator.
//!
//! Adminbase connects to external relational data sources, introspects their
//! schemas, and exposes generic CRUD, filtering, and column-model computation
//! over arbitrary tables. This crate holds everything that is not
//! engine-specific:
//!
//! - **Credentials**: decryption and parsing of stored connection credentials
//!   ([`CredentialStore`], [`DataSourceCredentials`])
//! - **QueryEngine**: the capability interface each engine family implements
//!   once (client construction, catalog queries, native-type inference)
//! - **EngineRegistry**: static kind -> factory registry, populated at startup
//! - **Column pipeline**: semantic field-type inference merged with stored
//!   column configuration ([`columns::get_columns`])
//! - **Translator**: declarative filter/sort/pagination requests compiled to
//!   dialect-correct SQL ([`filter`])
//! - **QueryService**: per-request facade tying the above to record CRUD
//!
//! ## Example
//!
//! ```rust,no_run
//! use adminbase_query::{
//!     CredentialStore, EngineRegistry, FieldOptionsRegistry, QueryService, SelectOptions,
//! };
//! use adminbase_core::EncryptionService;
//! use std::sync::Arc;
//!
//! # async fn example(encrypted_blob: &str) -> adminbase_query::Result<()> {
//! let encryption = Arc::new(EncryptionService::new_from_password("master-key"));
//! let credentials = CredentialStore::new(encryption);
//!
//! let mut engines = EngineRegistry::new();
//! // engines.register(Arc::new(PostgresFactory)); // from adminbase-query-postgres
//!
//! let service = QueryService::connect(
//!     Some(encrypted_blob),
//!     &credentials,
//!     &engines,
//!     Arc::new(FieldOptionsRegistry::with_builtin()),
//! )
//! .await?;
//!
//! let rows = service.get_records("users", &SelectOptions::default()).await?;
//! service.disconnect().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Engine implementation
//!
//! To add an engine family:
//!
//! 1. Implement [`QueryEngine`] over the engine's client
//! 2. Implement [`EngineFactory`] to open connections from credentials
//! 3. Register the factory with [`EngineRegistry`] at startup
//!
//! Driver crates: `adminbase-query-postgres`, `adminbase-query-mysql`.

pub mod columns;
pub mod credentials;
pub mod error;
pub mod filter;
pub mod registry;
pub mod service;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items
pub use credentials::{
    CredentialStore, DataSourceCredentials, DataSourceDefinition, DataSourceOptions,
    SqlCredentials,
};
pub use error::{QueryError, Result};
pub use filter::Dialect;
pub use registry::{EngineFactory, EngineRegistry, FieldOptionsProvider, FieldOptionsRegistry};
pub use service::QueryService;
pub use traits::QueryEngine;
pub use types::{
    Column, DataRow, FieldType, Filter, FilterCondition, ForeignKeyInfo, OrderDirection,
    RawColumnInfo, SelectOptions, SourceKind, StoredColumn, StoredColumns, TableInfo,
};

use thiserror::Error;

/// Unified error type for all query-service operations
#[derive(Error, Debug)]
pub enum QueryError {
    /// Invalid or missing data-source configuration (credentials, engine kind)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A record-level operation was attempted on a table without a primary key
    #[error("Table '{table}' has no discoverable primary key column")]
    MissingPrimaryKey { table: String },

    /// The engine reported a multi-column primary key, which is not modeled
    #[error("Table '{table}' has a composite primary key, which is not supported")]
    CompositePrimaryKey { table: String },

    /// Connection failed (authentication, network, etc.)
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema/introspection error
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Table or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl QueryError {
    /// Create a configuration error with a custom message
    pub fn configuration(msg: impl Into<String>) -> Self {
        QueryError::Configuration(msg.into())
    }

    /// Create a "not found" error with a custom message
    pub fn not_found(msg: impl Into<String>) -> Self {
        QueryError::NotFound(msg.into())
    }

    /// Create a query-failed error with a custom message
    pub fn query_failed(msg: impl Into<String>) -> Self {
        QueryError::QueryFailed(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;

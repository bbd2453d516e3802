use crate::error::Result;
use crate::filter::Dialect;
use crate::types::*;
use async_trait::async_trait;

/// Capability interface implemented once per engine family.
///
/// The shared pipeline (column inference, filter translation, record CRUD)
/// is generic over this trait; engines contribute client construction, the
/// catalog queries, and their native-type inference table. One engine
/// instance is scoped to one (data source, request) lifetime and operations
/// run sequentially against it.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Engine family of this connection
    fn kind(&self) -> SourceKind;

    /// SQL dialect used by the translator for this engine
    fn dialect(&self) -> Dialect;

    /// Engine-specific native type name -> semantic field type.
    ///
    /// Pure lookup; foreign-key and naming heuristics are applied on top by
    /// the shared pipeline, not here.
    fn infer_field_type(&self, native_type: &str) -> FieldType;

    /// Lists all tables visible to the connection
    async fn list_tables(&self) -> Result<Vec<TableInfo>>;

    /// Raw column metadata for a table, in ordinal order
    async fn raw_columns(&self, table: &str) -> Result<Vec<RawColumnInfo>>;

    /// The single primary-key column of a table.
    ///
    /// Returns `None` when the engine reports no primary key and
    /// [`QueryError::CompositePrimaryKey`](crate::QueryError::CompositePrimaryKey)
    /// when it reports more than one column.
    async fn primary_key_column(&self, table: &str) -> Result<Option<String>>;

    /// All foreign-key constraints whose owning table matches
    async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyInfo>>;

    /// Executes a SELECT and returns the rows
    async fn fetch(&self, sql: &str) -> Result<Vec<DataRow>>;

    /// Executes a statement and returns the affected-row count
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Executes an INSERT and returns the new primary-key value
    async fn insert(&self, sql: &str, pk_column: &str) -> Result<serde_json::Value>;

    /// Releases the underlying connection. The engine must not be used
    /// afterwards.
    async fn close(&self) -> Result<()>;
}

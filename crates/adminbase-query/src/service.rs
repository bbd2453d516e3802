//! The per-request query service: one data source, one connection, a set of
//! schema and record operations, then an explicit disconnect.

use crate::columns;
use crate::credentials::CredentialStore;
use crate::error::{QueryError, Result};
use crate::filter;
use crate::registry::{EngineRegistry, FieldOptionsRegistry};
use crate::traits::QueryEngine;
use crate::types::*;
use std::sync::Arc;
use tracing::debug;

/// A query service scoped to one (data source, request) lifetime.
///
/// The connection is opened by [`connect`](Self::connect) and released by
/// [`disconnect`](Self::disconnect); operations in between run sequentially
/// against the same engine. All collaborators (decryption, engine factories,
/// field-option providers) are injected, never ambient.
pub struct QueryService {
    engine: Box<dyn QueryEngine>,
    field_options: Arc<FieldOptionsRegistry>,
}

impl QueryService {
    /// Opens a connection for a stored data source: decrypt credentials,
    /// look up the engine factory, connect.
    pub async fn connect(
        encrypted_credentials: Option<&str>,
        credential_store: &CredentialStore,
        engines: &EngineRegistry,
        field_options: Arc<FieldOptionsRegistry>,
    ) -> Result<Self> {
        let credentials = credential_store.resolve(encrypted_credentials)?;
        debug!(target = %credentials.redacted(), "Opening data source connection");
        let engine = engines.connect(&credentials).await?;
        Ok(Self {
            engine,
            field_options,
        })
    }

    /// Wraps an already-open engine connection
    pub fn from_engine(
        engine: Box<dyn QueryEngine>,
        field_options: Arc<FieldOptionsRegistry>,
    ) -> Self {
        Self {
            engine,
            field_options,
        }
    }

    /// Releases the underlying connection
    pub async fn disconnect(self) -> Result<()> {
        self.engine.close().await
    }

    pub fn kind(&self) -> SourceKind {
        self.engine.kind()
    }

    /// Lists all tables visible to the connection
    pub async fn get_tables(&self) -> Result<Vec<TableInfo>> {
        self.engine.list_tables().await
    }

    /// The full column model for a table, merged with stored configuration
    pub async fn get_columns(
        &self,
        table: &str,
        stored: Option<&StoredColumns>,
    ) -> Result<Vec<Column>> {
        columns::get_columns(self.engine.as_ref(), table, stored, &self.field_options).await
    }

    /// Rows matching a declarative select request
    pub async fn get_records(&self, table: &str, opts: &SelectOptions) -> Result<Vec<DataRow>> {
        let sql = filter::build_select(self.engine.dialect(), table, opts);
        debug!(table = table, sql = %sql, "get_records");
        self.engine.fetch(&sql).await
    }

    /// Total row count for a table. Not filter-aware: the count is
    /// unconditional regardless of any active filters on the caller's side.
    pub async fn get_records_count(&self, table: &str) -> Result<u64> {
        let sql = filter::build_count(self.engine.dialect(), table);
        let rows = self.engine.fetch(&sql).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::query_failed("Count query returned no rows"))?;
        count_from_row(&row)
    }

    /// One record by primary key, optionally projected
    pub async fn get_record(
        &self,
        table: &str,
        record_id: &serde_json::Value,
        select: &[String],
    ) -> Result<Option<DataRow>> {
        let pk = self.require_primary_key(table).await?;
        let sql = filter::build_select_by_pk(self.engine.dialect(), table, &pk, record_id, select);
        let rows = self.engine.fetch(&sql).await?;
        Ok(rows.into_iter().next())
    }

    /// Inserts a record and returns the new primary-key value
    pub async fn create_record(
        &self,
        table: &str,
        data: &DataRow,
    ) -> Result<serde_json::Value> {
        let pk = self.require_primary_key(table).await?;
        let sql = filter::build_insert(self.engine.dialect(), table, data);
        debug!(table = table, "create_record");
        self.engine.insert(&sql, &pk).await
    }

    /// Updates a record by primary key; returns the affected-row count
    pub async fn update_record(
        &self,
        table: &str,
        record_id: &serde_json::Value,
        data: &DataRow,
    ) -> Result<u64> {
        let pk = self.require_primary_key(table).await?;
        let sql = filter::build_update(self.engine.dialect(), table, &pk, record_id, data);
        self.engine.execute(&sql).await
    }

    /// Deletes a record by primary key; returns the affected-row count
    pub async fn delete_record(&self, table: &str, record_id: &serde_json::Value) -> Result<u64> {
        let pk = self.require_primary_key(table).await?;
        let sql = filter::build_delete(self.engine.dialect(), table, &pk, record_id);
        self.engine.execute(&sql).await
    }

    /// Deletes a set of records with one `IN`-keyed statement
    pub async fn delete_records(
        &self,
        table: &str,
        record_ids: &[serde_json::Value],
    ) -> Result<u64> {
        if record_ids.is_empty() {
            return Ok(0);
        }
        let pk = self.require_primary_key(table).await?;
        let sql = filter::build_delete_many(self.engine.dialect(), table, &pk, record_ids);
        self.engine.execute(&sql).await
    }

    /// Every record-level operation needs the primary key; its absence is a
    /// data-source configuration error and fails before any statement runs.
    async fn require_primary_key(&self, table: &str) -> Result<String> {
        self.engine
            .primary_key_column(table)
            .await?
            .ok_or_else(|| QueryError::MissingPrimaryKey {
                table: table.to_string(),
            })
    }
}

fn count_from_row(row: &DataRow) -> Result<u64> {
    let value = row
        .get("count")
        .or_else(|| row.values().next())
        .ok_or_else(|| QueryError::query_failed("Count query returned an empty row"))?;

    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_i64().and_then(|v| u64::try_from(v).ok()))
            .ok_or_else(|| QueryError::query_failed(format!("Invalid count value: {}", n))),
        serde_json::Value::String(s) => s
            .parse::<u64>()
            .map_err(|_| QueryError::query_failed(format!("Invalid count value: {}", s))),
        other => Err(QueryError::query_failed(format!(
            "Invalid count value: {}",
            other
        ))),
    }
}

//! In-memory engine used by the crate's own tests.

use crate::error::{QueryError, Result};
use crate::filter::Dialect;
use crate::traits::QueryEngine;
use crate::types::*;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A canned [`QueryEngine`] over fixture data. Records every executed SQL
/// statement so tests can assert on the translator output.
pub(crate) struct MockEngine {
    pub tables: Vec<TableInfo>,
    pub columns: HashMap<String, Vec<RawColumnInfo>>,
    pub primary_keys: HashMap<String, String>,
    pub composite_pk_tables: Vec<String>,
    pub foreign_keys: HashMap<String, Vec<ForeignKeyInfo>>,
    pub rows: Vec<DataRow>,
    pub insert_id: serde_json::Value,
    pub executed: Arc<Mutex<Vec<String>>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self {
            tables: Vec::new(),
            columns: HashMap::new(),
            primary_keys: HashMap::new(),
            composite_pk_tables: Vec::new(),
            foreign_keys: HashMap::new(),
            rows: Vec::new(),
            insert_id: json!(1),
            executed: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

fn raw(name: &str, data_type: &str, nullable: bool) -> RawColumnInfo {
    RawColumnInfo {
        name: name.to_string(),
        data_type: data_type.to_string(),
        is_nullable: nullable,
        column_default: None,
        label: None,
    }
}

impl MockEngine {
    /// `users(id serial PK, email varchar, manager_id int FK -> users.id)`
    pub fn users_fixture() -> Self {
        let mut engine = Self::default();
        engine.tables.push(TableInfo {
            name: "users".to_string(),
            schema: Some("public".to_string()),
            entity_type: "table".to_string(),
        });
        engine.columns.insert(
            "users".to_string(),
            vec![
                raw("id", "serial", false),
                raw("email", "character varying", false),
                raw("manager_id", "integer", true),
            ],
        );
        engine
            .primary_keys
            .insert("users".to_string(), "id".to_string());
        engine.foreign_keys.insert(
            "users".to_string(),
            vec![ForeignKeyInfo {
                constraint_name: "users_manager_id_fkey".to_string(),
                table_name: "users".to_string(),
                column_name: "manager_id".to_string(),
                foreign_table_schema: Some("public".to_string()),
                foreign_table_name: "users".to_string(),
                foreign_column_name: "id".to_string(),
                on_update: Some("NO ACTION".to_string()),
                on_delete: Some("SET NULL".to_string()),
            }],
        );
        engine
    }

    pub fn executed_sql(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    /// Handle to the SQL log that stays valid after the engine is boxed
    pub fn sql_log(&self) -> Arc<Mutex<Vec<String>>> {
        self.executed.clone()
    }

    fn record(&self, sql: &str) {
        self.executed.lock().unwrap().push(sql.to_string());
    }
}

#[async_trait]
impl QueryEngine for MockEngine {
    fn kind(&self) -> SourceKind {
        SourceKind::PostgreSql
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn infer_field_type(&self, native_type: &str) -> FieldType {
        match native_type {
            "boolean" => FieldType::Boolean,
            "timestamp" | "date" => FieldType::DateTime,
            "json" | "jsonb" => FieldType::Json,
            "text" => FieldType::Textarea,
            "character varying" | "varchar" | "uuid" => FieldType::Text,
            "serial" | "integer" | "bigint" | "numeric" => FieldType::Number,
            _ => FieldType::Text,
        }
    }

    async fn list_tables(&self) -> Result<Vec<TableInfo>> {
        Ok(self.tables.clone())
    }

    async fn raw_columns(&self, table: &str) -> Result<Vec<RawColumnInfo>> {
        self.columns
            .get(table)
            .cloned()
            .ok_or_else(|| QueryError::not_found(format!("table '{}'", table)))
    }

    async fn primary_key_column(&self, table: &str) -> Result<Option<String>> {
        if self.composite_pk_tables.iter().any(|t| t == table) {
            return Err(QueryError::CompositePrimaryKey {
                table: table.to_string(),
            });
        }
        Ok(self.primary_keys.get(table).cloned())
    }

    async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyInfo>> {
        Ok(self.foreign_keys.get(table).cloned().unwrap_or_default())
    }

    async fn fetch(&self, sql: &str) -> Result<Vec<DataRow>> {
        self.record(sql);
        Ok(self.rows.clone())
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        self.record(sql);
        Ok(1)
    }

    async fn insert(&self, sql: &str, _pk_column: &str) -> Result<serde_json::Value> {
        self.record(sql);
        Ok(self.insert_id.clone())
    }

    async fn close(&self) -> Result<()> {
        self.record("-- close --");
        Ok(())
    }
}

//! PostgreSQL driver for adminbase-query
//!
//! Implements the [`QueryEngine`] capability interface over tokio-postgres:
//! catalog introspection through `information_schema`/`pg_index`, the
//! PostgreSQL native-type inference table, and SQL execution.

use adminbase_query::{
    DataRow, DataSourceCredentials, Dialect, EngineFactory, FieldType, ForeignKeyInfo,
    QueryEngine, QueryError, RawColumnInfo, Result, SourceKind, SqlCredentials, TableInfo,
};
use async_trait::async_trait;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error};

/// PostgreSQL engine connection
pub struct PostgresEngine {
    client: Client,
}

impl PostgresEngine {
    /// Opens a connection from decrypted credentials.
    ///
    /// A connection URL takes precedence over discrete host parts; the
    /// background connection task is spawned onto the tokio runtime and ends
    /// when the client drops.
    pub async fn connect(credentials: &SqlCredentials) -> Result<Self> {
        let config = connection_config(credentials)?;

        let (client, connection) = tokio_postgres::connect(&config, NoTls).await.map_err(|e| {
            QueryError::ConnectionFailed(format!("PostgreSQL connection failed: {}", e))
        })?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {}", e);
            }
        });

        debug!("Connected to PostgreSQL");
        Ok(Self { client })
    }

    fn query_error(e: tokio_postgres::Error, sql: &str) -> QueryError {
        // Surface the server-side detail when there is one
        let message = match e.as_db_error() {
            Some(db_error) => db_error.message().to_string(),
            None => e.to_string(),
        };
        QueryError::QueryFailed(format!("{} (query: {})", message, sql))
    }

    fn row_to_datarow(row: &Row) -> DataRow {
        let mut data_row = DataRow::new();
        for (idx, column) in row.columns().iter().enumerate() {
            data_row.insert(column.name().to_string(), extract_value(row, idx));
        }
        data_row
    }
}

fn connection_config(credentials: &SqlCredentials) -> Result<String> {
    if let Some(url) = &credentials.url {
        return Ok(url.clone());
    }

    let host = credentials
        .host
        .as_deref()
        .ok_or_else(|| QueryError::configuration("PostgreSQL credentials missing host"))?;
    let database = credentials
        .database
        .as_deref()
        .ok_or_else(|| QueryError::configuration("PostgreSQL credentials missing database"))?;

    let mut config = format!("host={} dbname={}", host, database);
    if let Some(port) = credentials.port {
        config.push_str(&format!(" port={}", port));
    }
    if let Some(user) = &credentials.user {
        config.push_str(&format!(" user={}", user));
    }
    if let Some(password) = &credentials.password {
        config.push_str(&format!(" password={}", password));
    }
    Ok(config)
}

/// PostgreSQL native type name -> semantic field type
fn map_native_type(native_type: &str) -> FieldType {
    match native_type {
        "boolean" | "bool" => FieldType::Boolean,
        "smallint" | "int2" | "integer" | "int" | "int4" | "bigint" | "int8" | "serial"
        | "bigserial" | "numeric" | "decimal" | "real" | "float4" | "double precision"
        | "float8" | "money" => FieldType::Number,
        "text" | "citext" => FieldType::Textarea,
        "character varying" | "varchar" | "character" | "char" | "bpchar" | "uuid" | "inet"
        | "cidr" | "macaddr" => FieldType::Text,
        "date" | "time without time zone" | "time with time zone" | "timestamp"
        | "timestamp without time zone" | "timestamp with time zone" | "timestamptz" => {
            FieldType::DateTime
        }
        "json" | "jsonb" => FieldType::Json,
        // Postgres enums surface as USER-DEFINED in information_schema
        "USER-DEFINED" => FieldType::Select,
        _ => FieldType::Text,
    }
}

fn extract_value(row: &Row, idx: usize) -> serde_json::Value {
    let type_name = row.columns()[idx].type_().name();

    match type_name {
        "bool" => row
            .try_get::<_, Option<bool>>(idx)
            .ok()
            .flatten()
            .map(serde_json::Value::Bool)
            .unwrap_or(serde_json::Value::Null),

        "int2" | "int4" => row
            .try_get::<_, Option<i32>>(idx)
            .ok()
            .flatten()
            .map(|v| serde_json::Value::Number(v.into()))
            .unwrap_or(serde_json::Value::Null),

        "int8" => row
            .try_get::<_, Option<i64>>(idx)
            .ok()
            .flatten()
            .map(|v| serde_json::Value::Number(v.into()))
            .unwrap_or(serde_json::Value::Null),

        "float4" => row
            .try_get::<_, Option<f32>>(idx)
            .ok()
            .flatten()
            .and_then(|v| serde_json::Number::from_f64(v as f64))
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),

        "float8" => row
            .try_get::<_, Option<f64>>(idx)
            .ok()
            .flatten()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),

        "date" => row
            .try_get::<_, Option<chrono::NaiveDate>>(idx)
            .ok()
            .flatten()
            .map(|v| serde_json::Value::String(v.to_string()))
            .unwrap_or(serde_json::Value::Null),

        "timestamp" => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)
            .ok()
            .flatten()
            .map(|v| serde_json::Value::String(v.to_string()))
            .unwrap_or(serde_json::Value::Null),

        "timestamptz" => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)
            .ok()
            .flatten()
            .map(|v| serde_json::Value::String(v.to_rfc3339()))
            .unwrap_or(serde_json::Value::Null),

        "json" | "jsonb" => row
            .try_get::<_, Option<serde_json::Value>>(idx)
            .ok()
            .flatten()
            .unwrap_or(serde_json::Value::Null),

        "uuid" => row
            .try_get::<_, Option<uuid::Uuid>>(idx)
            .ok()
            .flatten()
            .map(|v| serde_json::Value::String(v.to_string()))
            .unwrap_or(serde_json::Value::Null),

        // Strings and anything else that decodes as text
        _ => row
            .try_get::<_, Option<String>>(idx)
            .ok()
            .flatten()
            .map(serde_json::Value::String)
            .unwrap_or(serde_json::Value::Null),
    }
}

#[async_trait]
impl QueryEngine for PostgresEngine {
    fn kind(&self) -> SourceKind {
        SourceKind::PostgreSql
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn infer_field_type(&self, native_type: &str) -> FieldType {
        map_native_type(native_type)
    }

    async fn list_tables(&self) -> Result<Vec<TableInfo>> {
        let sql = r#"
            SELECT table_schema, table_name, table_type
            FROM information_schema.tables
            WHERE table_schema = 'public'
            ORDER BY table_name
        "#;

        let rows = self
            .client
            .query(sql, &[])
            .await
            .map_err(|e| QueryError::SchemaError(format!("Failed to list tables: {}", e)))?;

        Ok(rows
            .iter()
            .map(|row| {
                let table_type: String = row.get(2);
                TableInfo {
                    schema: Some(row.get(0)),
                    name: row.get(1),
                    entity_type: match table_type.as_str() {
                        "VIEW" => "view".to_string(),
                        _ => "table".to_string(),
                    },
                }
            })
            .collect())
    }

    async fn raw_columns(&self, table: &str) -> Result<Vec<RawColumnInfo>> {
        let sql = r#"
            SELECT column_name, data_type, is_nullable, column_default
            FROM information_schema.columns
            WHERE table_schema = 'public' AND table_name = $1
            ORDER BY ordinal_position
        "#;

        let rows = self.client.query(sql, &[&table]).await.map_err(|e| {
            QueryError::SchemaError(format!("Failed to get columns for '{}': {}", table, e))
        })?;

        if rows.is_empty() {
            return Err(QueryError::not_found(format!("table '{}'", table)));
        }

        Ok(rows
            .iter()
            .map(|row| {
                let is_nullable: String = row.get(2);
                RawColumnInfo {
                    name: row.get(0),
                    data_type: row.get(1),
                    is_nullable: is_nullable == "YES",
                    column_default: row.get(3),
                    label: None,
                }
            })
            .collect())
    }

    async fn primary_key_column(&self, table: &str) -> Result<Option<String>> {
        let sql = r#"
            SELECT a.attname
            FROM pg_index i
            JOIN pg_attribute a
              ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey)
            WHERE i.indrelid = $1::regclass AND i.indisprimary
            ORDER BY a.attnum
        "#;

        let rows = self.client.query(sql, &[&table]).await.map_err(|e| {
            QueryError::SchemaError(format!(
                "Failed to get primary key for '{}': {}",
                table, e
            ))
        })?;

        match rows.len() {
            0 => Ok(None),
            1 => Ok(Some(rows[0].get(0))),
            _ => Err(QueryError::CompositePrimaryKey {
                table: table.to_string(),
            }),
        }
    }

    async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyInfo>> {
        let sql = r#"
            SELECT
                tc.constraint_name,
                tc.table_name,
                kcu.column_name,
                ccu.table_schema AS foreign_table_schema,
                ccu.table_name AS foreign_table_name,
                ccu.column_name AS foreign_column_name,
                rc.update_rule,
                rc.delete_rule
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON tc.constraint_name = kcu.constraint_name
             AND tc.table_schema = kcu.table_schema
            JOIN information_schema.constraint_column_usage ccu
              ON ccu.constraint_name = tc.constraint_name
             AND ccu.table_schema = tc.table_schema
            JOIN information_schema.referential_constraints rc
              ON rc.constraint_name = tc.constraint_name
             AND rc.constraint_schema = tc.table_schema
            WHERE tc.constraint_type = 'FOREIGN KEY'
              AND tc.table_schema = 'public'
              AND tc.table_name = $1
        "#;

        let rows = self.client.query(sql, &[&table]).await.map_err(|e| {
            QueryError::SchemaError(format!(
                "Failed to get foreign keys for '{}': {}",
                table, e
            ))
        })?;

        Ok(rows
            .iter()
            .map(|row| ForeignKeyInfo {
                constraint_name: row.get(0),
                table_name: row.get(1),
                column_name: row.get(2),
                foreign_table_schema: row.get(3),
                foreign_table_name: row.get(4),
                foreign_column_name: row.get(5),
                on_update: row.get(6),
                on_delete: row.get(7),
            })
            .collect())
    }

    async fn fetch(&self, sql: &str) -> Result<Vec<DataRow>> {
        debug!(sql = sql, "Executing query");
        let rows = self
            .client
            .query(sql, &[])
            .await
            .map_err(|e| Self::query_error(e, sql))?;
        Ok(rows.iter().map(Self::row_to_datarow).collect())
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        debug!(sql = sql, "Executing statement");
        self.client
            .execute(sql, &[])
            .await
            .map_err(|e| Self::query_error(e, sql))
    }

    async fn insert(&self, sql: &str, pk_column: &str) -> Result<serde_json::Value> {
        let sql = format!("{} RETURNING \"{}\"", sql, pk_column.replace('"', "\"\""));
        debug!(sql = %sql, "Executing insert");
        let row = self
            .client
            .query_one(&sql, &[])
            .await
            .map_err(|e| Self::query_error(e, &sql))?;
        Ok(extract_value(&row, 0))
    }

    async fn close(&self) -> Result<()> {
        debug!("Closing PostgreSQL connection");
        // The spawned connection task ends when the client drops
        Ok(())
    }
}

/// Opens [`PostgresEngine`] connections for `postgresql` credentials
pub struct PostgresFactory;

#[async_trait]
impl EngineFactory for PostgresFactory {
    fn kind(&self) -> SourceKind {
        SourceKind::PostgreSql
    }

    async fn connect(&self, credentials: &DataSourceCredentials) -> Result<Box<dyn QueryEngine>> {
        match credentials {
            DataSourceCredentials::PostgreSql(sql) => {
                Ok(Box::new(PostgresEngine::connect(sql).await?))
            }
            other => Err(QueryError::Configuration(format!(
                "PostgreSQL factory cannot open '{}' credentials",
                other.kind()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_type_mapping() {
        assert_eq!(map_native_type("integer"), FieldType::Number);
        assert_eq!(map_native_type("bigint"), FieldType::Number);
        assert_eq!(map_native_type("numeric"), FieldType::Number);
        assert_eq!(map_native_type("character varying"), FieldType::Text);
        assert_eq!(map_native_type("uuid"), FieldType::Text);
        assert_eq!(map_native_type("text"), FieldType::Textarea);
        assert_eq!(map_native_type("boolean"), FieldType::Boolean);
        assert_eq!(
            map_native_type("timestamp without time zone"),
            FieldType::DateTime
        );
        assert_eq!(map_native_type("date"), FieldType::DateTime);
        assert_eq!(map_native_type("jsonb"), FieldType::Json);
        assert_eq!(map_native_type("USER-DEFINED"), FieldType::Select);
        // Unknown types fall back to Text
        assert_eq!(map_native_type("tsvector"), FieldType::Text);
    }

    #[test]
    fn test_connection_config_from_parts() {
        let credentials = SqlCredentials {
            host: Some("db.internal".into()),
            port: Some(5432),
            user: Some("admin".into()),
            password: Some("secret".into()),
            database: Some("app".into()),
            ..Default::default()
        };
        assert_eq!(
            connection_config(&credentials).unwrap(),
            "host=db.internal dbname=app port=5432 user=admin password=secret"
        );
    }

    #[test]
    fn test_connection_url_takes_precedence() {
        let credentials = SqlCredentials {
            url: Some("postgresql://admin@db/app".into()),
            host: Some("ignored".into()),
            ..Default::default()
        };
        assert_eq!(
            connection_config(&credentials).unwrap(),
            "postgresql://admin@db/app"
        );
    }

    #[test]
    fn test_missing_host_is_configuration_error() {
        let credentials = SqlCredentials {
            database: Some("app".into()),
            ..Default::default()
        };
        assert!(matches!(
            connection_config(&credentials),
            Err(QueryError::Configuration(_))
        ));
    }
}

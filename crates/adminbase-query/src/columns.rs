//! Column model assembly: schema introspection merged with inferred field
//! types and stored configuration.
//!
//! The pipeline is staged, each stage total over all columns before the next
//! begins: raw columns + primary key, foreign keys, field-type inference,
//! concurrent field-option resolution, option merge, label computation.

use crate::error::{QueryError, Result};
use crate::registry::FieldOptionsRegistry;
use crate::traits::QueryEngine;
use crate::types::*;
use adminbase_core::humanize_column_name;
use futures::future::join_all;
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;

/// Resolves the semantic field type of one column.
///
/// Deterministic and pure given its inputs. Precedence, highest first:
/// 1. A foreign key on the column forces `Association` -- FK status comes
///    from the live schema and outranks potentially-stale stored config.
/// 2. A stored `field_type` override is used verbatim.
/// 3. The engine's native-type lookup result, with one adjustment: `Number`
///    columns whose name follows the id convention (`id`, `*_id`) become
///    `Id`.
pub fn resolve_field_type(
    native: FieldType,
    stored: Option<FieldType>,
    has_foreign_key: bool,
    column_name: &str,
) -> FieldType {
    if has_foreign_key {
        return FieldType::Association;
    }
    if let Some(field_type) = stored {
        return field_type;
    }
    match native {
        FieldType::Number if is_id_like(column_name) => FieldType::Id,
        other => other,
    }
}

fn is_id_like(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower == "id" || lower.ends_with("_id")
}

/// Shallow merge: stored keys fully replace the default value at that key,
/// unset keys retain defaults. No recursion into nested objects.
pub fn merge_options(
    mut defaults: serde_json::Map<String, serde_json::Value>,
    stored: Option<&serde_json::Map<String, serde_json::Value>>,
) -> serde_json::Map<String, serde_json::Value> {
    if let Some(stored) = stored {
        for (key, value) in stored {
            defaults.insert(key.clone(), value.clone());
        }
    }
    defaults
}

fn default_base_options(raw: &RawColumnInfo) -> serde_json::Map<String, serde_json::Value> {
    let mut options = serde_json::Map::new();
    options.insert(
        "required".to_string(),
        json!(!raw.is_nullable && raw.column_default.is_none()),
    );
    options.insert("nullable".to_string(), json!(raw.is_nullable));
    options.insert("readonly".to_string(), json!(false));
    options.insert("placeholder".to_string(), json!(""));
    options.insert("help".to_string(), json!(""));
    options
}

/// Assembles the full column model for a table.
///
/// The returned set mirrors the live schema's column set exactly, decorated
/// with inferred field types and stored overrides.
pub async fn get_columns(
    engine: &dyn QueryEngine,
    table: &str,
    stored: Option<&StoredColumns>,
    field_options: &FieldOptionsRegistry,
) -> Result<Vec<Column>> {
    let raw_columns = engine.raw_columns(table).await?;
    let primary_key = engine.primary_key_column(table).await?;

    let fk_by_column: HashMap<String, ForeignKeyInfo> = engine
        .foreign_keys(table)
        .await?
        .into_iter()
        .map(|fk| (fk.column_name.clone(), fk))
        .collect();

    debug!(
        table = table,
        columns = raw_columns.len(),
        foreign_keys = fk_by_column.len(),
        "Assembling column model"
    );

    let field_types: Vec<FieldType> = raw_columns
        .iter()
        .map(|raw| {
            let stored_type = stored
                .and_then(|s| s.get(&raw.name))
                .and_then(|s| s.field_type);
            resolve_field_type(
                engine.infer_field_type(&raw.data_type),
                stored_type,
                fk_by_column.contains_key(&raw.name),
                &raw.name,
            )
        })
        .collect();

    // One option lookup per column; order-independent, so they fan out
    // concurrently and all complete before assembly proceeds.
    let default_field_options =
        join_all(field_types.iter().map(|ft| field_options.resolve(*ft))).await;

    let mut columns = Vec::with_capacity(raw_columns.len());
    for ((raw, field_type), option_defaults) in raw_columns
        .into_iter()
        .zip(field_types)
        .zip(default_field_options)
    {
        let stored_column = stored.and_then(|s| s.get(&raw.name));

        let base_options = merge_options(
            default_base_options(&raw),
            stored_column.map(|s| &s.base_options),
        );
        let field_options = merge_options(
            option_defaults,
            stored_column.map(|s| &s.field_options),
        );

        let label = stored_column
            .and_then(|s| s.label.clone())
            .or_else(|| raw.label.clone())
            .unwrap_or_else(|| humanize_column_name(&raw.name));

        let data_source_info = serde_json::to_value(&raw)
            .map_err(|e| QueryError::Serialization(e.to_string()))?;

        columns.push(Column {
            primary_key: primary_key.as_deref() == Some(raw.name.as_str()),
            foreign_key_info: fk_by_column.get(&raw.name).cloned(),
            label,
            field_type,
            data_source_info,
            base_options,
            field_options,
            name: raw.name,
        });
    }

    Ok(columns)
}

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Supported engine families
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "postgresql")]
    PostgreSql,
    #[serde(rename = "mysql")]
    MySql,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::PostgreSql => "postgresql",
            SourceKind::MySql => "mysql",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic field type of a column, distinct from the engine's native type.
///
/// This drives widget selection and validation in the dashboard; it is either
/// inferred from the native type or taken from stored column configuration.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Text,
    Boolean,
    DateTime,
    Json,
    Textarea,
    Number,
    Id,
    Select,
    Association,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "Text",
            FieldType::Boolean => "Boolean",
            FieldType::DateTime => "DateTime",
            FieldType::Json => "Json",
            FieldType::Textarea => "Textarea",
            FieldType::Number => "Number",
            FieldType::Id => "Id",
            FieldType::Select => "Select",
            FieldType::Association => "Association",
        };
        f.write_str(name)
    }
}

/// A table (or view) visible to the connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub name: String,
    /// Engine schema/namespace the table lives in, when the engine has one
    pub schema: Option<String>,
    /// "table", "view", etc.
    pub entity_type: String,
}

/// Raw column metadata as reported by the engine's catalog.
///
/// Kept verbatim on the assembled [`Column`] as `data_source_info` so callers
/// can reach engine-specific details the semantic model does not cover.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawColumnInfo {
    pub name: String,
    /// Engine-native type name (e.g. "character varying", "tinyint(1)")
    pub data_type: String,
    pub is_nullable: bool,
    pub column_default: Option<String>,
    /// Native label override, when the engine catalog carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// One outgoing foreign-key edge: many-to-one from the owning column to a
/// (table, column) target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyInfo {
    pub constraint_name: String,
    pub table_name: String,
    pub column_name: String,
    pub foreign_table_schema: Option<String>,
    pub foreign_table_name: String,
    pub foreign_column_name: String,
    pub on_update: Option<String>,
    pub on_delete: Option<String>,
}

/// The canonical column record exposed to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    pub label: String,
    pub primary_key: bool,
    pub field_type: FieldType,
    /// Raw engine metadata, opaque passthrough
    pub data_source_info: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_key_info: Option<ForeignKeyInfo>,
    /// Universal per-field configuration, defaults merged with stored overrides
    pub base_options: serde_json::Map<String, serde_json::Value>,
    /// Field-type-specific configuration, defaults merged with stored overrides
    pub field_options: serde_json::Map<String, serde_json::Value>,
}

/// User-authored column overrides persisted independently of the live schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredColumn {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub base_options: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub field_options: serde_json::Map<String, serde_json::Value>,
}

/// Stored column configuration for a whole table, keyed by column name
pub type StoredColumns = HashMap<String, StoredColumn>;

/// Declarative filter condition vocabulary.
///
/// Unrecognized condition strings deserialize to [`FilterCondition::Is`]; the
/// translator favors availability over strict rejection, so callers wanting
/// hard validation must check conditions before they reach this layer.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FilterCondition {
    Is,
    IsNot,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl FilterCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterCondition::Is => "is",
            FilterCondition::IsNot => "is_not",
            FilterCondition::Contains => "contains",
            FilterCondition::NotContains => "not_contains",
            FilterCondition::StartsWith => "starts_with",
            FilterCondition::EndsWith => "ends_with",
            FilterCondition::IsEmpty => "is_empty",
            FilterCondition::IsNotEmpty => "is_not_empty",
            FilterCondition::GreaterThan => ">",
            FilterCondition::GreaterThanOrEqual => ">=",
            FilterCondition::LessThan => "<",
            FilterCondition::LessThanOrEqual => "<=",
        }
    }

    /// Parses a condition name; anything unrecognized collapses to equality.
    pub fn parse(s: &str) -> Self {
        match s {
            "is" => FilterCondition::Is,
            "is_not" => FilterCondition::IsNot,
            "contains" => FilterCondition::Contains,
            "not_contains" => FilterCondition::NotContains,
            "starts_with" => FilterCondition::StartsWith,
            "ends_with" => FilterCondition::EndsWith,
            "is_empty" => FilterCondition::IsEmpty,
            "is_not_empty" => FilterCondition::IsNotEmpty,
            ">" => FilterCondition::GreaterThan,
            ">=" => FilterCondition::GreaterThanOrEqual,
            "<" => FilterCondition::LessThan,
            "<=" => FilterCondition::LessThanOrEqual,
            _ => FilterCondition::Is,
        }
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FilterCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FilterCondition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(FilterCondition::parse(&s))
    }
}

/// One declarative filter; filters on a request combine with implicit AND
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub column_name: String,
    pub condition: FilterCondition,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Declarative select request: filters, ordering, pagination, projection.
///
/// Pagination and projection only take effect when both `limit` and `offset`
/// are present; a request with one of the two runs unpaginated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOptions {
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default)]
    pub order_direction: OrderDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default)]
    pub select: Vec<String>,
}

/// A row of data as column-name/value pairs
pub type DataRow = HashMap<String, serde_json::Value>;

use crate::credentials::DataSourceCredentials;
use crate::error::{QueryError, Result};
use crate::traits::QueryEngine;
use crate::types::{FieldType, SourceKind};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Factory trait for opening engine connections from credentials
#[async_trait]
pub trait EngineFactory: Send + Sync {
    /// The engine family this factory handles
    fn kind(&self) -> SourceKind;

    /// Opens a live connection for the given credentials
    async fn connect(&self, credentials: &DataSourceCredentials) -> Result<Box<dyn QueryEngine>>;
}

/// Static registry mapping engine kinds to factories, populated at startup
#[derive(Default)]
pub struct EngineRegistry {
    factories: HashMap<SourceKind, Arc<dyn EngineFactory>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Arc<dyn EngineFactory>) {
        let kind = factory.kind();
        if self.factories.insert(kind, factory).is_some() {
            warn!(kind = %kind, "Overwriting existing engine factory");
        } else {
            debug!(kind = %kind, "Registered engine factory");
        }
    }

    /// Opens a connection for the credentials' engine kind.
    ///
    /// An unregistered kind is a configuration error, not a connection error.
    pub async fn connect(
        &self,
        credentials: &DataSourceCredentials,
    ) -> Result<Box<dyn QueryEngine>> {
        let kind = credentials.kind();
        let factory = self.factories.get(&kind).ok_or_else(|| {
            QueryError::Configuration(format!("No engine registered for kind: {}", kind))
        })?;
        factory.connect(credentials).await
    }

    pub fn kinds(&self) -> Vec<SourceKind> {
        self.factories.keys().copied().collect()
    }

    pub fn has_kind(&self, kind: SourceKind) -> bool {
        self.factories.contains_key(&kind)
    }
}

/// Provider of default field-type-specific options
#[async_trait]
pub trait FieldOptionsProvider: Send + Sync {
    fn field_type(&self) -> FieldType;

    /// The default `field_options` for this field type
    async fn default_options(&self) -> serde_json::Map<String, serde_json::Value>;
}

/// Static registry mapping field types to their options providers.
///
/// Not every field type defines extra options; a registry miss is normal and
/// resolves to an empty option set after a warning log.
#[derive(Default)]
pub struct FieldOptionsRegistry {
    providers: HashMap<FieldType, Arc<dyn FieldOptionsProvider>>,
}

impl FieldOptionsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in providers
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SelectFieldOptions));
        registry.register(Arc::new(TextareaFieldOptions));
        registry
    }

    pub fn register(&mut self, provider: Arc<dyn FieldOptionsProvider>) {
        self.providers.insert(provider.field_type(), provider);
    }

    /// Default options for a field type; misses are non-fatal.
    pub async fn resolve(
        &self,
        field_type: FieldType,
    ) -> serde_json::Map<String, serde_json::Value> {
        match self.providers.get(&field_type) {
            Some(provider) => provider.default_options().await,
            None => {
                warn!(field_type = %field_type, "No field options provider registered, using empty options");
                serde_json::Map::new()
            }
        }
    }
}

/// Built-in options for `Select` fields: the choice list and null handling
struct SelectFieldOptions;

#[async_trait]
impl FieldOptionsProvider for SelectFieldOptions {
    fn field_type(&self) -> FieldType {
        FieldType::Select
    }

    async fn default_options(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut options = serde_json::Map::new();
        options.insert("options".to_string(), json!([]));
        options.insert("allowNull".to_string(), json!(false));
        options
    }
}

/// Built-in options for `Textarea` fields
struct TextareaFieldOptions;

#[async_trait]
impl FieldOptionsProvider for TextareaFieldOptions {
    fn field_type(&self) -> FieldType {
        FieldType::Textarea
    }

    async fn default_options(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut options = serde_json::Map::new();
        options.insert("rows".to_string(), json!(5));
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builtin_select_options() {
        let registry = FieldOptionsRegistry::with_builtin();
        let options = registry.resolve(FieldType::Select).await;
        assert_eq!(options.get("options"), Some(&json!([])));
        assert_eq!(options.get("allowNull"), Some(&json!(false)));
    }

    #[tokio::test]
    async fn test_registry_miss_is_empty_not_error() {
        let registry = FieldOptionsRegistry::with_builtin();
        let options = registry.resolve(FieldType::Boolean).await;
        assert!(options.is_empty());
    }

    #[test]
    fn test_engine_registry_starts_empty() {
        let registry = EngineRegistry::new();
        assert!(registry.kinds().is_empty());
        assert!(!registry.has_kind(SourceKind::PostgreSql));
    }

    #[tokio::test]
    async fn test_unknown_kind_is_configuration_error() {
        let registry = EngineRegistry::new();
        let credentials = DataSourceCredentials::PostgreSql(Default::default());
        match registry.connect(&credentials).await {
            Err(QueryError::Configuration(msg)) => assert!(msg.contains("postgresql")),
            other => panic!("expected configuration error, got {:?}", other.map(|_| ())),
        }
    }
}

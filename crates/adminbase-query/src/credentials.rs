//! Decryption and parsing of stored data-source credentials.
//!
//! Credentials are persisted as an opaque AES-256-GCM blob and decrypted on
//! demand through an injected [`EncryptionService`]; the plaintext never
//! outlives the resolving call.

use crate::error::{QueryError, Result};
use crate::types::SourceKind;
use adminbase_core::EncryptionService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Connection parameters for a SQL engine: either a connection URL or
/// discrete host parts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SqlCredentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

/// Decrypted connection credentials, one variant per supported engine.
///
/// The serialized form is tagged by the data source `type` field
/// (`"postgresql"`, `"mysql"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DataSourceCredentials {
    #[serde(rename = "postgresql")]
    PostgreSql(SqlCredentials),
    #[serde(rename = "mysql")]
    MySql(SqlCredentials),
}

impl DataSourceCredentials {
    pub fn kind(&self) -> SourceKind {
        match self {
            DataSourceCredentials::PostgreSql(_) => SourceKind::PostgreSql,
            DataSourceCredentials::MySql(_) => SourceKind::MySql,
        }
    }

    pub fn sql(&self) -> &SqlCredentials {
        match self {
            DataSourceCredentials::PostgreSql(c) | DataSourceCredentials::MySql(c) => c,
        }
    }

    /// Password-free rendering for logs: `kind://user@host:port/db`
    pub fn redacted(&self) -> String {
        let c = self.sql();
        if c.url.is_some() {
            return format!("{}://<url>", self.kind());
        }

        let mut out = format!("{}://", self.kind());
        if let Some(user) = &c.user {
            out.push_str(user);
            out.push('@');
        }
        if let Some(host) = &c.host {
            out.push_str(host);
            if let Some(port) = c.port {
                out.push_str(&format!(":{}", port));
            }
        }
        if let Some(database) = &c.database {
            out.push('/');
            out.push_str(database);
        }
        out
    }
}

/// Resolves encrypted credential blobs into typed credentials.
///
/// The encryption service is injected at construction; there is no ambient
/// decrypt singleton.
pub struct CredentialStore {
    encryption: Arc<EncryptionService>,
}

impl CredentialStore {
    pub fn new(encryption: Arc<EncryptionService>) -> Self {
        Self { encryption }
    }

    /// Decrypts and parses a stored credential blob.
    ///
    /// Missing or unparsable credentials are configuration errors: they are
    /// not retried and surface directly to the caller.
    pub fn resolve(&self, encrypted_blob: Option<&str>) -> Result<DataSourceCredentials> {
        let blob = encrypted_blob.filter(|b| !b.is_empty()).ok_or_else(|| {
            QueryError::configuration("Data source has no stored credentials")
        })?;

        let plaintext = self
            .encryption
            .decrypt_string(blob)
            .map_err(|e| QueryError::Configuration(format!("Credentials cannot be decrypted: {}", e)))?;

        serde_json::from_str(&plaintext).map_err(|e| {
            QueryError::Configuration(format!("Credentials cannot be parsed: {}", e))
        })
    }
}

/// A new data-source definition as submitted by the calling layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub options: DataSourceOptions,
}

/// Engine-specific options of a data-source definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSourceOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DataSourceDefinition {
    /// Validates a submitted definition: name length and engine options shape.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().len() < 3 {
            return Err(QueryError::configuration(
                "Data source name must be at least 3 characters",
            ));
        }

        // Both supported engines are URL-based
        match self.options.url.as_deref() {
            Some(url) if !url.trim().is_empty() => Ok(()),
            _ => Err(QueryError::configuration(
                "Data source options must include a connection url",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(key: &str) -> (CredentialStore, Arc<EncryptionService>) {
        let encryption = Arc::new(EncryptionService::new_from_password(key));
        (CredentialStore::new(encryption.clone()), encryption)
    }

    #[test]
    fn test_resolve_round_trip() {
        let (store, encryption) = store("master");
        let blob = encryption
            .encrypt_string(
                r#"{"type":"postgresql","host":"db.internal","port":5432,"user":"admin","password":"s3cret","database":"app"}"#,
            )
            .unwrap();

        let credentials = store.resolve(Some(&blob)).unwrap();
        assert_eq!(credentials.kind(), SourceKind::PostgreSql);
        assert_eq!(credentials.sql().host.as_deref(), Some("db.internal"));
        assert_eq!(credentials.sql().password.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_resolve_missing_blob_is_configuration_error() {
        let (store, _) = store("master");
        for blob in [None, Some("")] {
            match store.resolve(blob) {
                Err(QueryError::Configuration(_)) => {}
                other => panic!("expected configuration error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_resolve_unparsable_plaintext_is_configuration_error() {
        let (store, encryption) = store("master");
        let blob = encryption.encrypt_string("not json at all").unwrap();
        assert!(matches!(
            store.resolve(Some(&blob)),
            Err(QueryError::Configuration(_))
        ));
    }

    #[test]
    fn test_redacted_hides_password() {
        let credentials = DataSourceCredentials::MySql(SqlCredentials {
            host: Some("db".into()),
            port: Some(3306),
            user: Some("root".into()),
            password: Some("hunter2".into()),
            database: Some("app".into()),
            ..Default::default()
        });
        let redacted = credentials.redacted();
        assert_eq!(redacted, "mysql://root@db:3306/app");
        assert!(!redacted.contains("hunter2"));
    }

    #[test]
    fn test_definition_validation() {
        let mut def = DataSourceDefinition {
            name: "Prod".into(),
            kind: SourceKind::PostgreSql,
            options: DataSourceOptions {
                url: Some("postgresql://db/app".into()),
                ..Default::default()
            },
        };
        assert!(def.validate().is_ok());

        def.name = "ab".into();
        assert!(def.validate().is_err());

        def.name = "Prod".into();
        def.options.url = None;
        assert!(def.validate().is_err());
    }
}

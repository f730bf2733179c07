//! Record storage
//!
//! Certificates and classes are JSON documents in two collections. The
//! backend is chosen at startup and handed to handlers through [`Storage`].

use async_trait::async_trait;
use certificate_common::{CertificateRecord, ClassRecord, Error, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Document collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Certificates,
    Classes,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Certificates => "certificates",
            Collection::Classes => "classes",
        }
    }
}

/// Key-value document access.
///
/// `get` returns `Ok(None)` for a missing key and `Err` only when the backend
/// itself failed, so callers can tell "not found" from "unreachable".
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn set(&self, collection: Collection, key: &str, document: &Value) -> Result<()>;

    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>>;

    async fn list(&self, collection: Collection) -> Result<Vec<Value>>;
}

/// Redis backend: each document is a JSON string under `<collection>:<key>`,
/// with keys indexed in the set `<collection>:all`
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis
    pub async fn new(redis_url: &str) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;

        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        info!("Connected to Redis at {}", redis_url);

        Ok(Self { conn })
    }

    fn document_key(collection: Collection, key: &str) -> String {
        format!("{}:{}", collection.name(), key)
    }

    fn index_key(collection: Collection) -> String {
        format!("{}:all", collection.name())
    }
}

fn store_error(err: redis::RedisError) -> Error {
    Error::Store(err.to_string())
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn set(&self, collection: Collection, key: &str, document: &Value) -> Result<()> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(document)?;

        let _: () = conn
            .set(Self::document_key(collection, key), json)
            .await
            .map_err(store_error)?;

        let _: () = conn
            .sadd(Self::index_key(collection), key)
            .await
            .map_err(store_error)?;

        debug!("Stored {} document {}", collection.name(), key);
        Ok(())
    }

    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>> {
        let mut conn = self.conn.clone();

        let json: Option<String> = conn
            .get(Self::document_key(collection, key))
            .await
            .map_err(store_error)?;

        match json {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Value>> {
        let mut conn = self.conn.clone();

        let keys: Vec<String> = conn
            .smembers(Self::index_key(collection))
            .await
            .map_err(store_error)?;

        let mut documents = Vec::with_capacity(keys.len());
        for key in &keys {
            if let Some(document) = self.get(collection, key).await? {
                documents.push(document);
            }
        }

        Ok(documents)
    }
}

/// In-process backend for local runs and tests
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<(Collection, String), Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn set(&self, collection: Collection, key: &str, document: &Value) -> Result<()> {
        self.documents
            .write()
            .await
            .insert((collection, key.to_string()), document.clone());
        Ok(())
    }

    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>> {
        Ok(self
            .documents
            .read()
            .await
            .get(&(collection, key.to_string()))
            .cloned())
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Value>> {
        Ok(self
            .documents
            .read()
            .await
            .iter()
            .filter(|((c, _), _)| *c == collection)
            .map(|(_, document)| document.clone())
            .collect())
    }
}

/// Typed access to certificate and class records
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn DocumentStore>,
}

impl Storage {
    pub fn new(backend: Arc<dyn DocumentStore>) -> Self {
        Self { backend }
    }

    /// Storage over a fresh [`MemoryStore`]
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub async fn put_certificate(&self, record: &CertificateRecord) -> Result<()> {
        let document = serde_json::to_value(record)?;
        self.backend
            .set(Collection::Certificates, &record.code, &document)
            .await
    }

    pub async fn get_certificate(&self, code: &str) -> Result<Option<CertificateRecord>> {
        self.get_typed(Collection::Certificates, code).await
    }

    pub async fn list_certificates(&self) -> Result<Vec<CertificateRecord>> {
        self.list_typed(Collection::Certificates).await
    }

    pub async fn put_class(&self, class: &ClassRecord) -> Result<()> {
        let document = serde_json::to_value(class)?;
        self.backend
            .set(Collection::Classes, &class.id, &document)
            .await
    }

    pub async fn get_class(&self, id: &str) -> Result<Option<ClassRecord>> {
        self.get_typed(Collection::Classes, id).await
    }

    pub async fn list_classes(&self) -> Result<Vec<ClassRecord>> {
        self.list_typed(Collection::Classes).await
    }

    async fn get_typed<T: DeserializeOwned>(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<T>> {
        match self.backend.get(collection, key).await? {
            Some(document) => Ok(Some(serde_json::from_value(document)?)),
            None => Ok(None),
        }
    }

    async fn list_typed<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        self.backend
            .list(collection)
            .await?
            .into_iter()
            .map(|document| serde_json::from_value(document).map_err(Error::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, name: &str) -> CertificateRecord {
        CertificateRecord::new(code.to_string(), name.to_string(), "today".to_string(), None)
    }

    #[tokio::test]
    async fn test_put_and_get_certificate() {
        let storage = Storage::memory();
        storage.put_certificate(&record("abc", "Ana Silva")).await.unwrap();

        let retrieved = storage
            .get_certificate("abc")
            .await
            .unwrap()
            .expect("Certificate not found");

        assert_eq!(retrieved.participant_name, "Ana Silva");
        assert!(storage.get_certificate("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_collections_are_separate() {
        let storage = Storage::memory();
        storage.put_certificate(&record("shared-key", "Ana Silva")).await.unwrap();

        assert!(storage.get_class("shared-key").await.unwrap().is_none());
        assert!(storage.list_classes().await.unwrap().is_empty());
        assert_eq!(storage.list_certificates().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let storage = Storage::memory();
        storage.put_certificate(&record("abc", "First")).await.unwrap();
        storage.put_certificate(&record("abc", "Second")).await.unwrap();

        let retrieved = storage.get_certificate("abc").await.unwrap().unwrap();
        assert_eq!(retrieved.participant_name, "Second");
        assert_eq!(storage.list_certificates().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_class_round_trip() {
        let storage = Storage::memory();
        let class = ClassRecord {
            id: "class-1".to_string(),
            name: "Turma A".to_string(),
            event_date: "2025-03-10".to_string(),
            client_name: None,
            training_name: Some("NR-35".to_string()),
            hours_duration: Some("8".to_string()),
        };

        storage.put_class(&class).await.unwrap();

        assert_eq!(storage.get_class("class-1").await.unwrap(), Some(class));
    }

    #[tokio::test]
    async fn test_malformed_document_is_an_error() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .set(
                Collection::Certificates,
                "bad",
                &serde_json::json!({"unexpected": true}),
            )
            .await
            .unwrap();
        let storage = Storage::new(backend);

        assert!(matches!(
            storage.get_certificate("bad").await,
            Err(Error::JsonSerialization(_))
        ));
    }

    #[test]
    fn test_redis_key_layout() {
        assert_eq!(
            RedisStore::document_key(Collection::Certificates, "abc"),
            "certificates:abc"
        );
        assert_eq!(RedisStore::index_key(Collection::Classes), "classes:all");
    }
}

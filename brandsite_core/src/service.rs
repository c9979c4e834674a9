//! Read/merge/write cycle used by the admin API and CLI

use crate::errors::{AdminError, Result};
use crate::merge::{ConfigPatch, merge, sanitize_texts};
use crate::model::{Configuration, Texts};
use crate::registry::SiteRegistry;
use crate::store::ConfigStore;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of a text-only update
#[derive(Debug, Clone)]
pub struct TextsUpdate {
    pub texts: Texts,
    pub fields_updated: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ConfigService {
    store: Arc<dyn ConfigStore>,
    registry: Arc<SiteRegistry>,
}

impl ConfigService {
    pub fn new(store: Arc<dyn ConfigStore>, registry: Arc<SiteRegistry>) -> Self {
        Self { store, registry }
    }

    fn bootstrap(&self) -> Configuration {
        Configuration::bootstrap(
            self.registry
                .iter()
                .map(|s| (s.id.as_str(), s.public_url.as_str())),
        )
    }

    /// Current configuration; unreadable stores degrade to defaults
    pub async fn current(&self) -> Result<Configuration> {
        match self.store.load().await {
            Ok(Some(config)) => Ok(config),
            Ok(None) => {
                info!("No stored configuration yet, using defaults");
                Ok(self.bootstrap())
            }
            Err(e @ AdminError::NotFound(_)) => Err(e),
            Err(e) => {
                warn!(
                    "Could not read configuration from {}: {}; serving defaults",
                    self.store.describe(),
                    e
                );
                Ok(self.bootstrap())
            }
        }
    }

    /// Stored configuration for a write or deploy; only an empty store yields defaults
    async fn stored(&self) -> Result<Configuration> {
        match self.store.load().await? {
            Some(config) => Ok(config),
            None => Ok(self.bootstrap()),
        }
    }

    /// Stored configuration, provided every global link has a value
    pub async fn deployable(&self) -> Result<Configuration> {
        let config = self.stored().await?;
        config.ensure_deployable()?;
        Ok(config)
    }

    /// Merge `patch` into the stored configuration and persist the result
    pub async fn apply(&self, patch: &ConfigPatch) -> Result<Configuration> {
        if let Some(unknown) = patch.site_ids().find(|id| !self.registry.contains(id)) {
            return Err(AdminError::NotFound(format!(
                "site '{}' is not configured",
                unknown
            )));
        }

        let current = self.stored().await?;
        let next = merge(&current, patch)?;
        self.store.save(&next).await?;

        info!(
            "Configuration updated by {} at {}",
            next.meta.updated_by, next.meta.last_updated
        );
        Ok(next)
    }

    /// Sanitize and apply a `texts` object
    pub async fn update_texts(&self, raw: &Map<String, Value>) -> Result<TextsUpdate> {
        let texts = sanitize_texts(raw);
        if texts.is_empty() {
            return Err(AdminError::InvalidInput(
                "no recognised text fields in update".to_string(),
            ));
        }

        let fields_updated = texts.fields();
        let patch = ConfigPatch {
            texts: Some(texts),
            ..ConfigPatch::default()
        };
        let next = self.apply(&patch).await?;

        Ok(TextsUpdate {
            texts: next.texts,
            fields_updated,
            updated_at: next.meta.last_updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DeployTrigger, SiteTarget};
    use crate::store::{FileStore, MemoryStore};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct BrokenStore {
        saved: AtomicBool,
    }

    #[async_trait]
    impl ConfigStore for BrokenStore {
        async fn load(&self) -> Result<Option<Configuration>> {
            Err(AdminError::Persistence("disk on fire".into()))
        }

        async fn save(&self, _config: &Configuration) -> Result<()> {
            self.saved.store(true, Ordering::SeqCst);
            Err(AdminError::Persistence("read-only".into()))
        }

        fn describe(&self) -> String {
            "broken".into()
        }
    }

    fn registry() -> Arc<SiteRegistry> {
        Arc::new(
            SiteRegistry::new(vec![
                SiteTarget::new("vegas", "https://vegas.example", DeployTrigger::Unconfigured),
                SiteTarget::new("royal", "https://royal.example", DeployTrigger::Unconfigured),
            ])
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_first_read_bootstraps_from_registry() {
        let service = ConfigService::new(Arc::new(MemoryStore::new()), registry());
        let config = service.current().await.unwrap();
        assert_eq!(config.sites.len(), 2);
        assert_eq!(config.site("royal").unwrap().main_url, "https://royal.example");
    }

    #[tokio::test]
    async fn test_apply_persists() {
        let store = Arc::new(MemoryStore::new());
        let service = ConfigService::new(store.clone(), registry());

        let patch = ConfigPatch::from_value(&json!({"globalLinks": {"whatsappUrl": "B"}})).unwrap();
        service.apply(&patch).await.unwrap();

        let stored = store.load().await.unwrap().unwrap();
        assert_eq!(stored.global_links["whatsappUrl"], "B");
        assert_eq!(stored.sites.len(), 2);
    }

    #[tokio::test]
    async fn test_patch_for_unregistered_site_rejected() {
        let service = ConfigService::new(Arc::new(MemoryStore::new()), registry());
        let patch = ConfigPatch::from_value(&json!({"sites": {"atlantis": {
            "brandName": "Atlantis", "brandType": "casino", "mainUrl": "https://a.example"
        }}}))
        .unwrap();
        assert!(matches!(service.apply(&patch).await, Err(AdminError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unreadable_store_serves_defaults_but_refuses_writes() {
        let store = Arc::new(BrokenStore {
            saved: AtomicBool::new(false),
        });
        let service = ConfigService::new(store.clone(), registry());

        let config = service.current().await.unwrap();
        assert_eq!(config.sites.len(), 2);

        let patch = ConfigPatch::from_value(&json!({"texts": {"subtitle": "x"}})).unwrap();
        let err = service.apply(&patch).await.unwrap_err();
        assert!(matches!(err, AdminError::Persistence(_)));
        assert!(!store.saved.load(Ordering::SeqCst));

        assert!(matches!(
            service.deployable().await,
            Err(AdminError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn test_newer_schema_document_is_left_untouched() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("site-config.json");
        let mut config = Configuration::bootstrap([("vegas", "https://vegas.example")]);
        config.global_links.insert("telegramUrl".into(), "https://t.me/REAL".into());
        if let Some(site) = config.sites.get_mut("vegas") {
            site.brand_name = "Vegas Royale".into();
        }
        FileStore::new(&path).save(&config).await.unwrap();

        // a document written by a newer release
        let mut document: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap())
            .unwrap();
        document["schemaVersion"] = json!(2);
        let original = document.to_string();
        std::fs::write(&path, &original).unwrap();

        let service = ConfigService::new(Arc::new(FileStore::new(&path)), registry());
        let patch = ConfigPatch::from_value(&json!({"texts": {"subtitle": "new"}})).unwrap();

        assert!(matches!(
            service.apply(&patch).await,
            Err(AdminError::Persistence(_))
        ));
        assert!(matches!(
            service.deployable().await,
            Err(AdminError::Persistence(_))
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[tokio::test]
    async fn test_deployable_reports_blank_links() {
        let service = ConfigService::new(Arc::new(MemoryStore::new()), registry());
        let err = service.deployable().await.unwrap_err();
        assert!(err.to_string().contains("whatsappUrl"));
    }

    #[tokio::test]
    async fn test_unresolvable_store_propagates() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("missing").join("config.json"));
        let service = ConfigService::new(Arc::new(store), registry());
        assert!(matches!(service.current().await, Err(AdminError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_texts_reports_fields() {
        let service = ConfigService::new(Arc::new(MemoryStore::new()), registry());
        let raw = json!({"mainTitle": " hi ", "unknownField": "x", "buttons": {"play": "Go"}});

        let update = service.update_texts(raw.as_object().unwrap()).await.unwrap();
        assert_eq!(update.texts.main_title, "hi");
        assert_eq!(update.texts.buttons.play, "Go");
        assert_eq!(update.fields_updated, vec!["mainTitle", "buttons.play"]);
    }

    #[tokio::test]
    async fn test_update_texts_rejects_nothing_recognised() {
        let service = ConfigService::new(Arc::new(MemoryStore::new()), registry());
        let raw = json!({"footer": "x"});
        assert!(matches!(
            service.update_texts(raw.as_object().unwrap()).await,
            Err(AdminError::InvalidInput(_))
        ));
    }
}

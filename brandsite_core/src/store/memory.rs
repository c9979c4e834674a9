use super::ConfigStore;
use crate::errors::Result;
use crate::model::Configuration;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Process-local store; contents vanish on restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    config: RwLock<Option<Configuration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Configuration) -> Self {
        Self {
            config: RwLock::new(Some(config)),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn load(&self) -> Result<Option<Configuration>> {
        Ok(self.config.read().await.clone())
    }

    async fn save(&self, config: &Configuration) -> Result<()> {
        *self.config.write().await = Some(config.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_starts_empty_then_holds_last_write() {
        let store = MemoryStore::new();
        assert!(store.load().await.unwrap().is_none());

        let mut config = Configuration::default();
        config.texts.subtitle = "first".into();
        store.save(&config).await.unwrap();
        config.texts.subtitle = "second".into();
        store.save(&config).await.unwrap();

        assert_eq!(store.load().await.unwrap().unwrap().texts.subtitle, "second");
    }
}

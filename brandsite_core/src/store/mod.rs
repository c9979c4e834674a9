//! Persistence backends for the site configuration

mod file;
mod memory;
mod supabase;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

use crate::config::{Settings, StoreBackend};
use crate::errors::{AdminError, Result};
use crate::model::Configuration;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::info;

/// Storage for the single configuration document
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// `Ok(None)` when nothing has been written yet
    async fn load(&self) -> Result<Option<Configuration>>;

    async fn save(&self, config: &Configuration) -> Result<()>;

    fn describe(&self) -> String;
}

/// Build the backend selected in settings
pub fn from_settings(settings: &Settings, client: reqwest::Client) -> Result<Arc<dyn ConfigStore>> {
    let store: Arc<dyn ConfigStore> = match settings.store {
        StoreBackend::File => Arc::new(FileStore::new(settings.config_file.clone())),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Supabase => {
            let (Some(url), Some(key)) = (&settings.supabase_url, &settings.supabase_key) else {
                return Err(AdminError::Config(
                    "supabase store requires SUPABASE_URL and SUPABASE_ANON_KEY".to_string(),
                ));
            };
            Arc::new(SupabaseStore::new(
                client,
                url.clone(),
                SecretString::from(key.expose_secret().to_owned()),
                settings.supabase_table.clone(),
                settings.supabase_row_id.clone(),
            ))
        }
    };

    info!("Using config store: {}", store.describe());
    Ok(store)
}

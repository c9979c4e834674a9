//! Wiring of settings, registry, store, dispatcher and probe

use crate::config::Settings;
use crate::deploy_log::DeployLog;
use crate::dispatcher::Dispatcher;
use crate::errors::{AdminError, Result};
use crate::probe::StatusProbe;
use crate::registry::SiteRegistry;
use crate::service::ConfigService;
use crate::store::{self, ConfigStore};
use crate::transport::{HttpTransport, Transport};
use std::sync::Arc;
use tracing::info;

/// Everything an entry point needs, built once at startup
#[derive(Clone)]
pub struct AdminContext {
    pub registry: Arc<SiteRegistry>,
    pub config: ConfigService,
    pub dispatcher: Dispatcher,
    pub probe: Arc<StatusProbe>,
}

impl AdminContext {
    /// Build from the environment-derived settings and registry
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate().map_err(AdminError::Config)?;

        let registry = Arc::new(SiteRegistry::from_env(settings)?);
        let transport = HttpTransport::new()?;
        let store = store::from_settings(settings, transport.client().clone())?;

        info!(
            "Admin context ready: {} site(s), store {}",
            registry.len(),
            store.describe()
        );
        Ok(Self::assemble(settings, registry, store, Arc::new(transport)))
    }

    /// Build from explicit collaborators
    pub fn assemble(
        settings: &Settings,
        registry: Arc<SiteRegistry>,
        store: Arc<dyn ConfigStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let log = Arc::new(DeployLog::new(settings.deploy_log_capacity));
        let dispatcher = Dispatcher::new(
            Arc::clone(&transport),
            Arc::clone(&registry),
            log,
            settings,
        );
        let probe = Arc::new(StatusProbe::new(
            transport,
            Arc::clone(&registry),
            settings.probe_timeout,
        ));

        Self {
            config: ConfigService::new(store, Arc::clone(&registry)),
            registry,
            dispatcher,
            probe,
        }
    }
}

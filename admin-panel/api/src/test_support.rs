use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use std::sync::Arc;

use brandsite_core::store::{FileStore, MemoryStore};
use brandsite_core::{
    AdminContext, ConfigStore, Configuration, DeployTrigger, HttpTransport, Settings, SiteRegistry,
    SiteTarget,
};
use secrecy::SecretString;

use crate::routes::{configure, cors};
use crate::state::AppState;

pub const SITE_IDS: [&str; 4] = ["vegas", "royal", "lucky", "golden"];

// Sites with optional build hooks and public URLs: (id, hook, public_url)
pub fn sites(targets: &[(&str, Option<String>, Option<String>)]) -> Vec<SiteTarget> {
    SITE_IDS
        .iter()
        .map(|id| {
            let found = targets.iter().find(|(t, _, _)| t == id);
            let hook = found.and_then(|(_, hook, _)| hook.clone());
            let public_url = found
                .and_then(|(_, _, url)| url.clone())
                .unwrap_or_else(|| format!("https://{}.example", id));
            let trigger = match hook {
                Some(url) => DeployTrigger::BuildHook {
                    url: SecretString::from(url),
                },
                None => DeployTrigger::Unconfigured,
            };
            SiteTarget::new(*id, public_url, trigger)
        })
        .collect()
}

pub fn deployable_config(registry: &SiteRegistry) -> Configuration {
    let mut config = Configuration::bootstrap(
        registry.iter().map(|s| (s.id.as_str(), s.public_url.as_str())),
    );
    config.global_links.insert("whatsappUrl".into(), "https://wa.me/100".into());
    config.global_links.insert("telegramUrl".into(), "https://t.me/brand".into());
    config
}

// File store holding a deployable document stamped with a future schema version
pub async fn newer_schema_store(dir: &tempfile::TempDir) -> FileStore {
    let path = dir.path().join("site-config.json");
    let registry = SiteRegistry::new(sites(&[])).unwrap();
    let store = FileStore::new(&path);
    store.save(&deployable_config(&registry)).await.unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let mut document: serde_json::Value = serde_json::from_str(&raw).unwrap();
    document["schemaVersion"] = serde_json::json!(2);
    std::fs::write(&path, document.to_string()).unwrap();
    store
}

pub fn state_with(
    sites: Vec<SiteTarget>,
    store: Option<Arc<dyn ConfigStore>>,
) -> web::Data<AppState> {
    let settings = Settings {
        probe_timeout: std::time::Duration::from_millis(500),
        ..Settings::default()
    };
    let registry = Arc::new(SiteRegistry::new(sites).unwrap());
    let store = store
        .unwrap_or_else(|| Arc::new(MemoryStore::with_config(deployable_config(&registry))));
    let context = AdminContext::assemble(
        &settings,
        registry,
        store,
        Arc::new(HttpTransport::new().unwrap()),
    );
    web::Data::new(AppState { context })
}

// Deployable state; `hooks` maps site id to build hook URL
pub fn app_state(hooks: &[(&str, String)]) -> web::Data<AppState> {
    let targets: Vec<(&str, Option<String>, Option<String>)> = hooks
        .iter()
        .map(|(id, url)| (*id, Some(url.clone()), None))
        .collect();
    state_with(sites(&targets), None)
}

pub async fn init_app(
    state: web::Data<AppState>,
) -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    test::init_service(App::new().app_data(state).wrap(cors()).configure(configure)).await
}

pub async fn init_app_with_store(
    store: Arc<dyn ConfigStore>,
    hooks: &[(&str, String)],
) -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    let targets: Vec<(&str, Option<String>, Option<String>)> = hooks
        .iter()
        .map(|(id, url)| (*id, Some(url.clone()), None))
        .collect();
    init_app(state_with(sites(&targets), Some(store))).await
}

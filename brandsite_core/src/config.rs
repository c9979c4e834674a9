//! Runtime settings for the admin backend

use secrecy::SecretString;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Default site ids when `SITE_IDS` is not set
pub const DEFAULT_SITE_IDS: [&str; 4] = ["vegas", "royal", "lucky", "golden"];

/// Where the site configuration is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    File,
    Supabase,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StoreBackend::File),
            "supabase" => Ok(StoreBackend::Supabase),
            "memory" | "local" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown config store '{}'", other)),
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::File => write!(f, "file"),
            StoreBackend::Supabase => write!(f, "supabase"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug)]
pub struct Settings {
    /// Selected persistence backend
    pub store: StoreBackend,

    /// JSON document used by the file backend
    pub config_file: PathBuf,

    /// Supabase project URL
    pub supabase_url: Option<String>,

    /// Supabase anon/service key
    pub supabase_key: Option<SecretString>,

    /// Table holding the configuration row
    pub supabase_table: String,

    /// Primary key of the configuration row
    pub supabase_row_id: String,

    /// Netlify REST base URL
    pub netlify_api_url: String,

    /// GitHub REST base URL
    pub github_api_url: String,

    pub netlify_token: Option<SecretString>,

    pub github_token: Option<SecretString>,

    /// Registered site ids, in fan-out order
    pub site_ids: Vec<String>,

    /// Timeout for a single-site deploy trigger
    pub deploy_timeout: Duration,

    /// Per-site timeout during mass dispatch
    pub deploy_all_timeout: Duration,

    /// Timeout for each status probe
    pub probe_timeout: Duration,

    /// Entries kept in the deploy log
    pub deploy_log_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: StoreBackend::File,
            config_file: PathBuf::from("data/site-config.json"),
            supabase_url: None,
            supabase_key: None,
            supabase_table: "site_config".to_string(),
            supabase_row_id: "main".to_string(),
            netlify_api_url: "https://api.netlify.com/api/v1".to_string(),
            github_api_url: "https://api.github.com".to_string(),
            netlify_token: None,
            github_token: None,
            site_ids: DEFAULT_SITE_IDS.iter().map(|s| s.to_string()).collect(),
            deploy_timeout: Duration::from_secs(30),
            deploy_all_timeout: Duration::from_secs(45),
            probe_timeout: Duration::from_secs(10),
            deploy_log_capacity: 50,
        }
    }
}

fn seconds(value: Option<String>) -> Option<Duration> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Settings::default();

        if let Some(store) = lookup("CONFIG_STORE") {
            match store.parse() {
                Ok(backend) => settings.store = backend,
                Err(e) => warn!("{}, falling back to {}", e, settings.store),
            }
        }

        if let Some(path) = lookup("CONFIG_FILE") {
            settings.config_file = PathBuf::from(path);
        }

        settings.supabase_url = lookup("SUPABASE_URL").filter(|v| !v.is_empty());
        settings.supabase_key = lookup("SUPABASE_ANON_KEY")
            .filter(|v| !v.is_empty())
            .map(SecretString::from);

        if let Some(table) = lookup("SUPABASE_TABLE") {
            settings.supabase_table = table;
        }

        if let Some(row_id) = lookup("SUPABASE_ROW_ID") {
            settings.supabase_row_id = row_id;
        }

        if let Some(url) = lookup("NETLIFY_API_URL") {
            settings.netlify_api_url = url.trim_end_matches('/').to_string();
        }

        if let Some(url) = lookup("GITHUB_API_URL") {
            settings.github_api_url = url.trim_end_matches('/').to_string();
        }

        settings.netlify_token = lookup("NETLIFY_TOKEN")
            .filter(|v| !v.is_empty())
            .map(SecretString::from);
        settings.github_token = lookup("GITHUB_TOKEN")
            .filter(|v| !v.is_empty())
            .map(SecretString::from);

        if let Some(ids) = lookup("SITE_IDS") {
            settings.site_ids = ids
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(timeout) = seconds(lookup("DEPLOY_TIMEOUT_SECONDS")) {
            settings.deploy_timeout = timeout;
        }

        if let Some(timeout) = seconds(lookup("DEPLOY_ALL_TIMEOUT_SECONDS")) {
            settings.deploy_all_timeout = timeout;
        }

        if let Some(timeout) = seconds(lookup("PROBE_TIMEOUT_SECONDS")) {
            settings.probe_timeout = timeout;
        }

        if let Some(capacity) = lookup("DEPLOY_LOG_CAPACITY") {
            if let Ok(capacity) = capacity.parse() {
                settings.deploy_log_capacity = capacity;
            }
        }

        settings
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.store == StoreBackend::Supabase
            && (self.supabase_url.is_none() || self.supabase_key.is_none())
        {
            return Err(
                "supabase store requires SUPABASE_URL and SUPABASE_ANON_KEY".to_string(),
            );
        }

        if self.site_ids.is_empty() {
            return Err("at least one site id must be configured".to_string());
        }

        for (i, id) in self.site_ids.iter().enumerate() {
            if self.site_ids[..i].contains(id) {
                return Err(format!("duplicate site id '{}'", id));
            }
        }

        if self.deploy_timeout.is_zero()
            || self.deploy_all_timeout.is_zero()
            || self.probe_timeout.is_zero()
        {
            return Err("timeouts must be greater than 0".to_string());
        }

        if self.deploy_log_capacity == 0 {
            return Err("deploy_log_capacity must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Env var prefix for a site id, e.g. `golden-slots` -> `SITE_GOLDEN_SLOTS`
pub fn site_env_prefix(site_id: &str) -> String {
    let normalized: String = site_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("SITE_{}", normalized)
}

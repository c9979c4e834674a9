//! Site configuration data structures

use crate::errors::{AdminError, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Version written into every persisted document
pub const SCHEMA_VERSION: u32 = 1;

/// Tag stamped into `meta.updatedBy` by every merge
pub const UPDATED_BY: &str = "admin-panel";

/// Placeholder the static sites replace with their brand name
pub const BRAND_PLACEHOLDER: &str = "{BRAND}";

/// Brand URLs shared by every site; not editable through patches
pub const FIXED_LINKS: [(&str, &str); 2] = [
    ("officialSiteUrl", "https://brandsite.example/official"),
    ("supportUrl", "https://brandsite.example/support"),
];

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BrandType {
    Casino,
    Sportsbook,
    Slots,
    Poker,
}

impl std::fmt::Display for BrandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrandType::Casino => write!(f, "casino"),
            BrandType::Sportsbook => write!(f, "sportsbook"),
            BrandType::Slots => write!(f, "slots"),
            BrandType::Poker => write!(f, "poker"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteMeta {
    pub brand_name: String,
    pub brand_type: BrandType,
    pub main_url: String,
    #[serde(default)]
    pub deploy_url: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ButtonLabels {
    pub whatsapp: String,
    pub telegram: String,
    pub play: String,
    pub bonus: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Texts {
    pub main_title: String,
    pub subtitle: String,
    pub description: String,
    pub telegram_text: String,
    #[serde(default)]
    pub buttons: ButtonLabels,
}

impl Default for Texts {
    fn default() -> Self {
        Self {
            main_title: "Welcome to {BRAND}".to_string(),
            subtitle: "Play with {BRAND} today".to_string(),
            description: "Contact us for bonuses and support.".to_string(),
            telegram_text: "Join the {BRAND} channel".to_string(),
            buttons: ButtonLabels {
                whatsapp: "WhatsApp".to_string(),
                telegram: "Telegram".to_string(),
                play: "Play now".to_string(),
                bonus: "Get bonus".to_string(),
            },
        }
    }
}

impl Texts {
    /// Substitute `{BRAND}` in every slot
    pub fn render_for(&self, brand: &str) -> Texts {
        let sub = |s: &str| s.replace(BRAND_PLACEHOLDER, brand);
        Texts {
            main_title: sub(&self.main_title),
            subtitle: sub(&self.subtitle),
            description: sub(&self.description),
            telegram_text: sub(&self.telegram_text),
            buttons: ButtonLabels {
                whatsapp: sub(&self.buttons.whatsapp),
                telegram: sub(&self.buttons.telegram),
                play: sub(&self.buttons.play),
                bonus: sub(&self.buttons.bonus),
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub last_updated: DateTime<Utc>,
    pub updated_by: String,
}

/// Canonical configuration shared by all sites
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub global_links: IndexMap<String, String>,
    pub sites: IndexMap<String, SiteMeta>,
    pub texts: Texts,
    pub meta: Meta,
}

impl Default for Configuration {
    fn default() -> Self {
        let mut global_links = IndexMap::new();
        global_links.insert("whatsappUrl".to_string(), String::new());
        global_links.insert("telegramUrl".to_string(), String::new());

        Self {
            global_links,
            sites: IndexMap::new(),
            texts: Texts::default(),
            meta: Meta {
                last_updated: Utc::now(),
                updated_by: "bootstrap".to_string(),
            },
        }
    }
}

impl Configuration {
    /// Default configuration with one entry per registered site
    pub fn bootstrap<'a>(sites: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut config = Configuration::default();
        for (id, public_url) in sites {
            config.sites.insert(
                id.to_string(),
                SiteMeta {
                    brand_name: id.to_string(),
                    brand_type: BrandType::Casino,
                    main_url: public_url.to_string(),
                    deploy_url: String::new(),
                },
            );
        }
        config
    }

    pub fn site(&self, site_id: &str) -> Option<&SiteMeta> {
        self.sites.get(site_id)
    }

    pub fn fixed_links() -> IndexMap<String, String> {
        FIXED_LINKS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Keys in `globalLinks` whose value is blank
    pub fn missing_links(&self) -> Vec<String> {
        self.global_links
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Deploys are refused while any global link is blank
    pub fn ensure_deployable(&self) -> Result<()> {
        let missing = self.missing_links();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AdminError::InvalidInput(format!(
                "global links missing values: {}",
                missing.join(", ")
            )))
        }
    }

    /// List of problems; empty when the configuration is publishable
    pub fn validate(&self) -> Vec<String> {
        let mut problems: Vec<String> = self
            .missing_links()
            .into_iter()
            .map(|k| format!("globalLinks.{} is empty", k))
            .collect();

        for (id, site) in &self.sites {
            if site.brand_name.trim().is_empty() {
                problems.push(format!("sites.{}.brandName is empty", id));
            }
            if !site.main_url.starts_with("http://") && !site.main_url.starts_with("https://") {
                problems.push(format!("sites.{}.mainUrl is not an http(s) URL", id));
            }
        }

        if self.texts.main_title.trim().is_empty() {
            problems.push("texts.mainTitle is empty".to_string());
        }

        problems
    }
}

/// On-disk / on-row envelope around a configuration
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub schema_version: u32,
    pub config: Configuration,
}

impl StoredDocument {
    pub fn new(config: Configuration) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            config,
        }
    }

    pub fn into_config(self) -> Result<Configuration> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(AdminError::Persistence(format!(
                "unsupported schema version {} (expected {})",
                self.schema_version, SCHEMA_VERSION
            )));
        }
        Ok(self.config)
    }
}

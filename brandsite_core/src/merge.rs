//! Partial updates and how they fold into a configuration

use crate::errors::{AdminError, Result};
use crate::model::{BrandType, Configuration, FIXED_LINKS, Meta, SiteMeta, UPDATED_BY};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Max length for title, subtitle, description and telegram text
pub const PROSE_MAX_CHARS: usize = 500;

/// Max length for button labels
pub const LABEL_MAX_CHARS: usize = 200;

const PROSE_FIELDS: [&str; 4] = ["mainTitle", "subtitle", "description", "telegramText"];
const BUTTON_FIELDS: [&str; 4] = ["whatsapp", "telegram", "play", "bonus"];

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SitePatch {
    pub brand_name: Option<String>,
    pub brand_type: Option<BrandType>,
    pub main_url: Option<String>,
    pub deploy_url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ButtonLabelsPatch {
    pub whatsapp: Option<String>,
    pub telegram: Option<String>,
    pub play: Option<String>,
    pub bonus: Option<String>,
}

/// Sanitized text update; only allow-listed slots survive
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextsPatch {
    pub main_title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub telegram_text: Option<String>,
    pub buttons: ButtonLabelsPatch,
}

impl TextsPatch {
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Dotted names of the slots this patch sets
    pub fn fields(&self) -> Vec<String> {
        let prose = [
            ("mainTitle", &self.main_title),
            ("subtitle", &self.subtitle),
            ("description", &self.description),
            ("telegramText", &self.telegram_text),
        ];
        let buttons = [
            ("whatsapp", &self.buttons.whatsapp),
            ("telegram", &self.buttons.telegram),
            ("play", &self.buttons.play),
            ("bonus", &self.buttons.bonus),
        ];

        prose
            .iter()
            .filter(|(_, v)| v.is_some())
            .map(|(k, _)| k.to_string())
            .chain(
                buttons
                    .iter()
                    .filter(|(_, v)| v.is_some())
                    .map(|(k, _)| format!("buttons.{}", k)),
            )
            .collect()
    }
}

/// Partial configuration as received from the admin UI
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigPatch {
    pub global_links: Option<IndexMap<String, String>>,
    pub sites: Option<IndexMap<String, SitePatch>>,
    pub texts: Option<TextsPatch>,
}

impl ConfigPatch {
    /// Parse a request body; texts go through the sanitizer
    pub fn from_value(body: &Value) -> Result<Self> {
        let object = body
            .as_object()
            .ok_or_else(|| AdminError::InvalidInput("body must be a JSON object".to_string()))?;

        let global_links = match object.get("globalLinks") {
            Some(v) => Some(
                IndexMap::<String, String>::deserialize(v)
                    .map_err(|e| AdminError::InvalidInput(format!("globalLinks: {}", e)))?,
            ),
            None => None,
        };

        let sites = match object.get("sites") {
            Some(v) => Some(
                IndexMap::<String, SitePatch>::deserialize(v)
                    .map_err(|e| AdminError::InvalidInput(format!("sites: {}", e)))?,
            ),
            None => None,
        };

        let texts = match object.get("texts") {
            Some(Value::Object(raw)) => Some(sanitize_texts(raw)),
            Some(_) => {
                return Err(AdminError::InvalidInput(
                    "texts must be an object".to_string(),
                ));
            }
            None => None,
        };

        let patch = ConfigPatch {
            global_links,
            sites,
            texts,
        };

        if patch.is_empty() {
            return Err(AdminError::InvalidPatch);
        }
        Ok(patch)
    }

    /// True when none of the recognised keys is present
    pub fn is_empty(&self) -> bool {
        self.global_links.is_none() && self.sites.is_none() && self.texts.is_none()
    }

    pub fn site_ids(&self) -> impl Iterator<Item = &str> {
        self.sites.iter().flat_map(|s| s.keys().map(String::as_str))
    }
}

fn clean(value: &Value, max_chars: usize) -> Option<String> {
    value
        .as_str()
        .map(|s| s.trim().chars().take(max_chars).collect())
}

/// Copy allow-listed text slots, trimmed and length-capped; everything else is dropped
pub fn sanitize_texts(raw: &Map<String, Value>) -> TextsPatch {
    let prose = |key: &str| raw.get(key).and_then(|v| clean(v, PROSE_MAX_CHARS));

    let buttons = raw.get("buttons").and_then(Value::as_object);
    let label = |key: &str| {
        buttons
            .and_then(|b| b.get(key))
            .and_then(|v| clean(v, LABEL_MAX_CHARS))
    };

    let dropped: Vec<&String> = raw
        .keys()
        .filter(|k| !PROSE_FIELDS.contains(&k.as_str()) && k.as_str() != "buttons")
        .chain(
            buttons
                .into_iter()
                .flat_map(|b| b.keys())
                .filter(|k| !BUTTON_FIELDS.contains(&k.as_str())),
        )
        .collect();
    if !dropped.is_empty() {
        debug!("Dropping unknown text fields: {:?}", dropped);
    }

    TextsPatch {
        main_title: prose("mainTitle"),
        subtitle: prose("subtitle"),
        description: prose("description"),
        telegram_text: prose("telegramText"),
        buttons: ButtonLabelsPatch {
            whatsapp: label("whatsapp"),
            telegram: label("telegram"),
            play: label("play"),
            bonus: label("bonus"),
        },
    }
}

fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *slot = v.clone();
    }
}

fn new_site(site_id: &str, patch: &SitePatch) -> Result<SiteMeta> {
    match (&patch.brand_name, patch.brand_type, &patch.main_url) {
        (Some(brand_name), Some(brand_type), Some(main_url)) => Ok(SiteMeta {
            brand_name: brand_name.clone(),
            brand_type,
            main_url: main_url.clone(),
            deploy_url: patch.deploy_url.clone().unwrap_or_default(),
        }),
        _ => Err(AdminError::InvalidInput(format!(
            "site '{}' is not in the configuration yet and needs brandName, brandType and mainUrl",
            site_id
        ))),
    }
}

/// Fold `patch` into a copy of `current`, stamping `meta` with `at`
pub fn merge_at(
    current: &Configuration,
    patch: &ConfigPatch,
    at: DateTime<Utc>,
) -> Result<Configuration> {
    if patch.is_empty() {
        return Err(AdminError::InvalidPatch);
    }

    let mut next = current.clone();

    if let Some(links) = &patch.global_links {
        for (name, url) in links {
            if FIXED_LINKS.iter().any(|(fixed, _)| fixed == name) {
                warn!("Ignoring update to fixed link '{}'", name);
                continue;
            }
            let url = url.trim();
            if url.is_empty() && !next.global_links.contains_key(name) {
                return Err(AdminError::InvalidInput(format!(
                    "new global link '{}' needs a value",
                    name
                )));
            }
            next.global_links.insert(name.clone(), url.to_string());
        }
    }

    if let Some(sites) = &patch.sites {
        for (site_id, site_patch) in sites {
            match next.sites.get_mut(site_id) {
                Some(site) => {
                    set(&mut site.brand_name, &site_patch.brand_name);
                    set(&mut site.brand_type, &site_patch.brand_type);
                    set(&mut site.main_url, &site_patch.main_url);
                    set(&mut site.deploy_url, &site_patch.deploy_url);
                }
                None => {
                    let site = new_site(site_id, site_patch)?;
                    next.sites.insert(site_id.clone(), site);
                }
            }
        }
    }

    if let Some(texts) = &patch.texts {
        let target = &mut next.texts;
        set(&mut target.main_title, &texts.main_title);
        set(&mut target.subtitle, &texts.subtitle);
        set(&mut target.description, &texts.description);
        set(&mut target.telegram_text, &texts.telegram_text);
        set(&mut target.buttons.whatsapp, &texts.buttons.whatsapp);
        set(&mut target.buttons.telegram, &texts.buttons.telegram);
        set(&mut target.buttons.play, &texts.buttons.play);
        set(&mut target.buttons.bonus, &texts.buttons.bonus);
    }

    next.meta = Meta {
        last_updated: at,
        updated_by: UPDATED_BY.to_string(),
    };

    Ok(next)
}

pub fn merge(current: &Configuration, patch: &ConfigPatch) -> Result<Configuration> {
    merge_at(current, patch, Utc::now())
}

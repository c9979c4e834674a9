//! Static table of deployable sites

use crate::config::{Settings, site_env_prefix};
use crate::errors::{AdminError, Result};
use secrecy::{ExposeSecret, SecretString};
use std::env;
use tracing::{debug, warn};

/// How a site's rebuild is started
#[derive(Debug)]
pub enum DeployTrigger {
    /// Netlify build hook; the URL itself is the credential
    BuildHook { url: SecretString },

    /// Netlify REST `POST /sites/{id}/builds`
    NetlifyApi { site_id: String, token: SecretString },

    /// GitHub `repository_dispatch` on `owner/repo`
    GithubDispatch { repo: String, token: SecretString },

    /// Registered for probing only
    Unconfigured,
}

impl DeployTrigger {
    pub fn kind(&self) -> &'static str {
        match self {
            DeployTrigger::BuildHook { .. } => "build-hook",
            DeployTrigger::NetlifyApi { .. } => "netlify-api",
            DeployTrigger::GithubDispatch { .. } => "github-dispatch",
            DeployTrigger::Unconfigured => "none",
        }
    }
}

#[derive(Debug)]
pub struct SiteTarget {
    pub id: String,
    pub public_url: String,
    pub trigger: DeployTrigger,
}

impl SiteTarget {
    pub fn new(
        id: impl Into<String>,
        public_url: impl Into<String>,
        trigger: DeployTrigger,
    ) -> Self {
        Self {
            id: id.into(),
            public_url: public_url.into(),
            trigger,
        }
    }
}

fn copy_secret(secret: &Option<SecretString>) -> Option<SecretString> {
    secret
        .as_ref()
        .map(|s| SecretString::from(s.expose_secret().to_owned()))
}

/// Ordered registry of sites; order is the fan-out order
#[derive(Debug, Default)]
pub struct SiteRegistry {
    sites: Vec<SiteTarget>,
}

impl SiteRegistry {
    pub fn new(sites: Vec<SiteTarget>) -> Result<Self> {
        for (i, site) in sites.iter().enumerate() {
            if sites[..i].iter().any(|s| s.id == site.id) {
                return Err(AdminError::Config(format!("duplicate site id '{}'", site.id)));
            }
        }
        Ok(Self { sites })
    }

    /// Build the registry from `SITE_<ID>_*` environment variables
    pub fn from_env(settings: &Settings) -> Result<Self> {
        Self::from_lookup(settings, |key| env::var(key).ok())
    }

    pub fn from_lookup(
        settings: &Settings,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut sites = Vec::with_capacity(settings.site_ids.len());

        for id in &settings.site_ids {
            let prefix = site_env_prefix(id);
            let var = |suffix: &str| {
                lookup(&format!("{}_{}", prefix, suffix)).filter(|v| !v.is_empty())
            };

            let public_url = var("URL").unwrap_or_else(|| {
                warn!("{}_URL not set; site '{}' cannot be probed", prefix, id);
                String::new()
            });

            let trigger = if let Some(url) = var("BUILD_HOOK") {
                DeployTrigger::BuildHook {
                    url: SecretString::from(url),
                }
            } else if let Some(site_id) = var("NETLIFY_SITE_ID") {
                let token = copy_secret(&settings.netlify_token).ok_or_else(|| {
                    AdminError::Config(format!("{}_NETLIFY_SITE_ID requires NETLIFY_TOKEN", prefix))
                })?;
                DeployTrigger::NetlifyApi { site_id, token }
            } else if let Some(repo) = var("GITHUB_REPO") {
                if repo.split('/').filter(|p| !p.is_empty()).count() != 2 {
                    return Err(AdminError::Config(format!(
                        "{}_GITHUB_REPO must look like owner/repo",
                        prefix
                    )));
                }
                let token = copy_secret(&settings.github_token).ok_or_else(|| {
                    AdminError::Config(format!("{}_GITHUB_REPO requires GITHUB_TOKEN", prefix))
                })?;
                DeployTrigger::GithubDispatch { repo, token }
            } else {
                warn!("No deploy trigger configured for site '{}'", id);
                DeployTrigger::Unconfigured
            };

            debug!("Registered site '{}' ({})", id, trigger.kind());
            sites.push(SiteTarget::new(id.clone(), public_url, trigger));
        }

        Self::new(sites)
    }

    pub fn resolve(&self, site_id: &str) -> Result<&SiteTarget> {
        self.sites
            .iter()
            .find(|s| s.id == site_id)
            .ok_or_else(|| AdminError::NotFound(format!("site '{}' is not configured", site_id)))
    }

    pub fn contains(&self, site_id: &str) -> bool {
        self.sites.iter().any(|s| s.id == site_id)
    }

    /// Site ids in registration order
    pub fn list_all(&self) -> Vec<&str> {
        self.sites.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SiteTarget> {
        self.sites.iter()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

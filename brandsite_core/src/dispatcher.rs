//! Deploy fan-out across registered sites

use crate::config::Settings;
use crate::deploy_log::DeployLog;
use crate::errors::{AdminError, Result};
use crate::model::UPDATED_BY;
use crate::registry::{DeployTrigger, SiteRegistry, SiteTarget};
use crate::transport::{TriggerResponse, Transport};
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

/// Literal accepted by the API in place of a site id
pub const ALL_SITES: &str = "ALL";

const GITHUB_HEADERS: [(&str, &str); 2] = [
    ("accept", "application/vnd.github+json"),
    ("x-github-api-version", "2022-11-28"),
];

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeployResult {
    pub site_id: String,
    pub success: bool,
    pub build_id: Option<String>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DeployResult {
    pub fn succeeded(site_id: &str, build_id: Option<String>) -> Self {
        Self {
            site_id: site_id.to_string(),
            success: true,
            build_id,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(site_id: &str, error: impl Into<String>) -> Self {
        Self {
            site_id: site_id.to_string(),
            success: false,
            build_id: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct DeploySummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

impl DeploySummary {
    pub fn from_results(results: &[DeployResult]) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            successful,
            failed: results.len() - successful,
        }
    }
}

/// Aggregate classification of a fan-out
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeployOutcome {
    AllSucceeded,
    Partial,
    AllFailed,
}

impl DeployOutcome {
    pub fn from_summary(summary: &DeploySummary) -> Self {
        if summary.total > 0 && summary.failed == 0 {
            DeployOutcome::AllSucceeded
        } else if summary.successful == 0 {
            DeployOutcome::AllFailed
        } else {
            DeployOutcome::Partial
        }
    }

    /// 200 all ok, 207 mixed, 500 nothing worked
    pub fn status_code(&self) -> u16 {
        match self {
            DeployOutcome::AllSucceeded => 200,
            DeployOutcome::Partial => 207,
            DeployOutcome::AllFailed => 500,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteFailure {
    pub site_id: String,
    pub error: String,
}

/// Settled result of `deploy_all`
#[derive(Clone, Debug)]
pub struct DeployReport {
    pub summary: DeploySummary,
    pub outcome: DeployOutcome,
    pub results: Vec<DeployResult>,
}

impl DeployReport {
    pub fn from_results(results: Vec<DeployResult>) -> Self {
        let summary = DeploySummary::from_results(&results);
        Self {
            outcome: DeployOutcome::from_summary(&summary),
            summary,
            results,
        }
    }

    pub fn errors(&self) -> Vec<SiteFailure> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .map(|r| SiteFailure {
                site_id: r.site_id.clone(),
                error: r.error.clone().unwrap_or_else(|| "unknown error".to_string()),
            })
            .collect()
    }

    pub fn message(&self) -> String {
        let DeploySummary {
            total,
            successful,
            failed,
        } = self.summary;

        match self.outcome {
            _ if total == 0 => "no sites configured".to_string(),
            DeployOutcome::AllSucceeded => format!("All {} sites deployed successfully", total),
            DeployOutcome::AllFailed => format!("All {} deploys failed", total),
            DeployOutcome::Partial => {
                let names: Vec<String> = self.errors().into_iter().map(|f| f.site_id).collect();
                format!(
                    "{} of {} sites deployed, {} failed ({})",
                    successful,
                    total,
                    failed,
                    names.join(", ")
                )
            }
        }
    }
}

/// Fans deploy requests out to each site's trigger
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    registry: Arc<SiteRegistry>,
    log: Arc<DeployLog>,
    netlify_api_url: String,
    github_api_url: String,
    single_timeout: Duration,
    fanout_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: Arc<SiteRegistry>,
        log: Arc<DeployLog>,
        settings: &Settings,
    ) -> Self {
        Self {
            transport,
            registry,
            log,
            netlify_api_url: settings.netlify_api_url.clone(),
            github_api_url: settings.github_api_url.clone(),
            single_timeout: settings.deploy_timeout,
            fanout_timeout: settings.deploy_all_timeout,
        }
    }

    pub fn log(&self) -> &DeployLog {
        &self.log
    }

    /// Trigger one site; failures come back as a result, never an error
    #[instrument(skip(self))]
    pub async fn deploy_one(&self, site_id: &str) -> DeployResult {
        let result = self.trigger(site_id, self.single_timeout).await;
        self.log.record(&result).await;
        result
    }

    /// Trigger every registered site concurrently and wait for all of them
    #[instrument(skip(self))]
    pub async fn deploy_all(&self) -> DeployReport {
        let order = self.registry.list_all();
        let mut tasks = JoinSet::new();

        for site_id in &order {
            let this = self.clone();
            let site_id = site_id.to_string();
            tasks.spawn(async move { this.trigger(&site_id, this.fanout_timeout).await });
        }

        let mut settled: HashMap<String, DeployResult> = HashMap::with_capacity(order.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    self.log.record(&result).await;
                    settled.insert(result.site_id.clone(), result);
                }
                Err(e) => error!("Deploy task aborted: {}", e),
            }
        }

        let mut results = Vec::with_capacity(order.len());
        for site_id in order {
            let result = match settled.remove(site_id) {
                Some(result) => result,
                None => {
                    let result = DeployResult::failed(site_id, "deploy task aborted");
                    self.log.record(&result).await;
                    result
                }
            };
            results.push(result);
        }

        let report = DeployReport::from_results(results);
        info!(
            "Mass deploy finished: {} total, {} successful, {} failed",
            report.summary.total, report.summary.successful, report.summary.failed
        );
        report
    }

    async fn trigger(&self, site_id: &str, budget: Duration) -> DeployResult {
        let Ok(site) = self.registry.resolve(site_id) else {
            warn!("Deploy requested for unknown site '{}'", site_id);
            return DeployResult::failed(
                site_id,
                format!("site not found: '{}' is not configured", site_id),
            );
        };

        match timeout(budget, self.send(site)).await {
            Ok(Ok(build_id)) => {
                info!("Deploy triggered for {} via {}", site.id, site.trigger.kind());
                DeployResult::succeeded(site_id, build_id)
            }
            Ok(Err(e)) => {
                warn!("Deploy failed for {}: {}", site.id, e);
                DeployResult::failed(site_id, e.site_message())
            }
            Err(_) => {
                warn!("Deploy for {} timed out after {:?}", site.id, budget);
                DeployResult::failed(site_id, "timeout")
            }
        }
    }

    fn trigger_body(site: &SiteTarget) -> Value {
        json!({
            "triggeredBy": UPDATED_BY,
            "timestamp": Utc::now().to_rfc3339(),
            "trigger_title": format!("{} config update for {}", UPDATED_BY, site.id),
        })
    }

    /// Call the site's trigger, returning a build id when the endpoint provides one
    async fn send(&self, site: &SiteTarget) -> Result<Option<String>> {
        let body = Self::trigger_body(site);

        match &site.trigger {
            DeployTrigger::BuildHook { url } => {
                let response = self
                    .transport
                    .post_json(url.expose_secret(), None, &[], &body)
                    .await?;
                check_status(&response)?;
                Ok(None)
            }
            DeployTrigger::NetlifyApi { site_id, token } => {
                let url = format!("{}/sites/{}/builds", self.netlify_api_url, site_id);
                let response = self
                    .transport
                    .post_json(&url, Some(token), &[], &body)
                    .await?;
                check_status(&response)?;
                parse_build_id(&response.body).map(Some)
            }
            DeployTrigger::GithubDispatch { repo, token } => {
                let url = format!("{}/repos/{}/dispatches", self.github_api_url, repo);
                let payload = json!({
                    "event_type": "redeploy",
                    "client_payload": body,
                });
                let response = self
                    .transport
                    .post_json(&url, Some(token), &GITHUB_HEADERS, &payload)
                    .await?;
                check_status(&response)?;
                Ok(None)
            }
            DeployTrigger::Unconfigured => Err(AdminError::Config(
                "no deploy trigger configured".to_string(),
            )),
        }
    }
}

fn check_status(response: &TriggerResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }

    let detail: String = response.body.chars().take(200).collect();
    let message = match response.status {
        401 | 403 => format!("trigger rejected credentials (HTTP {})", response.status),
        404 => "trigger endpoint not found (HTTP 404)".to_string(),
        422 => format!("trigger rejected request (HTTP 422): {}", detail),
        429 => "trigger rate limited (HTTP 429)".to_string(),
        500..=599 => format!("trigger server error (HTTP {}): {}", response.status, detail),
        status => format!("unexpected trigger response (HTTP {}): {}", status, detail),
    };

    Err(AdminError::Upstream(message))
}

fn parse_build_id(body: &str) -> Result<String> {
    let value: Value = serde_json::from_str(body)
        .map_err(|_| AdminError::Upstream("malformed trigger response".to_string()))?;

    value["id"]
        .as_str()
        .or_else(|| value["deploy_id"].as_str())
        .map(str::to_string)
        .ok_or_else(|| AdminError::Upstream("trigger response carried no build id".to_string()))
}

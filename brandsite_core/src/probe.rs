//! Liveness checks against each site's public URL

use crate::registry::SiteRegistry;
use crate::transport::Transport;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, warn};

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatus {
    pub site_id: String,
    pub online: bool,
    pub status_code: Option<u16>,
    pub response_time_ms: Option<u64>,
    pub last_checked: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SiteStatus {
    fn offline(site_id: &str, error: impl Into<String>) -> Self {
        Self {
            site_id: site_id.to_string(),
            online: false,
            status_code: None,
            response_time_ms: None,
            last_checked: Utc::now(),
            error: Some(error.into()),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub health_percentage: u32,
}

impl StatusSummary {
    pub fn from_statuses<'a>(statuses: impl IntoIterator<Item = &'a SiteStatus>) -> Self {
        let (mut total, mut online) = (0usize, 0usize);
        for status in statuses {
            total += 1;
            if status.online {
                online += 1;
            }
        }

        let health_percentage = if total == 0 {
            0
        } else {
            (online as f64 * 100.0 / total as f64).round() as u32
        };

        Self {
            total,
            online,
            offline: total - online,
            health_percentage,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub summary: StatusSummary,
    pub sites: IndexMap<String, SiteStatus>,
    pub last_checked: DateTime<Utc>,
}

pub fn is_online(status_code: u16) -> bool {
    (200..400).contains(&status_code)
}

pub struct StatusProbe {
    transport: Arc<dyn Transport>,
    registry: Arc<SiteRegistry>,
    timeout: Duration,
}

impl StatusProbe {
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: Arc<SiteRegistry>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            registry,
            timeout,
        }
    }

    /// HEAD every site concurrently; one slow or broken site never holds back the rest
    pub async fn check_all(&self) -> StatusReport {
        let mut tasks = JoinSet::new();

        for site in self.registry.iter() {
            let transport = Arc::clone(&self.transport);
            let site_id = site.id.clone();
            let url = site.public_url.clone();
            let budget = self.timeout;
            tasks.spawn(async move { probe(transport.as_ref(), &site_id, &url, budget).await });
        }

        let mut settled: HashMap<String, SiteStatus> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(status) => {
                    settled.insert(status.site_id.clone(), status);
                }
                Err(e) => warn!("Status probe task aborted: {}", e),
            }
        }

        let sites: IndexMap<String, SiteStatus> = self
            .registry
            .list_all()
            .into_iter()
            .map(|id| {
                let status = settled
                    .remove(id)
                    .unwrap_or_else(|| SiteStatus::offline(id, "probe task aborted"));
                (id.to_string(), status)
            })
            .collect();

        StatusReport {
            summary: StatusSummary::from_statuses(sites.values()),
            sites,
            last_checked: Utc::now(),
        }
    }
}

async fn probe(
    transport: &dyn Transport,
    site_id: &str,
    url: &str,
    budget: Duration,
) -> SiteStatus {
    if url.is_empty() {
        return SiteStatus::offline(site_id, "no public URL configured");
    }

    let started = Instant::now();
    match timeout(budget, transport.head(url)).await {
        Ok(Ok(code)) => {
            let elapsed = started.elapsed().as_millis() as u64;
            debug!("{} answered {} in {}ms", site_id, code, elapsed);
            SiteStatus {
                site_id: site_id.to_string(),
                online: is_online(code),
                status_code: Some(code),
                response_time_ms: Some(elapsed),
                last_checked: Utc::now(),
                error: None,
            }
        }
        Ok(Err(e)) => {
            warn!("Status check failed for {}: {}", site_id, e);
            SiteStatus::offline(site_id, e.site_message())
        }
        Err(_) => {
            warn!("Status check for {} timed out after {:?}", site_id, budget);
            SiteStatus::offline(site_id, "timeout")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DeployTrigger, SiteTarget};
    use crate::transport::HttpTransport;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry(server: &MockServer, ids: &[&str]) -> Arc<SiteRegistry> {
        let sites = ids
            .iter()
            .map(|id| {
                let url = format!("{}/{}", server.uri(), id);
                SiteTarget::new(*id, url, DeployTrigger::Unconfigured)
            })
            .collect();
        Arc::new(SiteRegistry::new(sites).unwrap())
    }

    #[test]
    fn test_online_classification() {
        assert!(is_online(200));
        assert!(is_online(301));
        assert!(is_online(399));
        assert!(!is_online(400));
        assert!(!is_online(503));
        assert!(!is_online(199));
    }

    #[tokio::test]
    async fn test_timeout_isolated_to_one_site() {
        let server = MockServer::start().await;
        for id in ["vegas", "royal", "lucky"] {
            Mock::given(method("HEAD"))
                .and(path(format!("/{}", id)))
                .respond_with(ResponseTemplate::new(200))
                .mount(&server)
                .await;
        }
        Mock::given(method("HEAD"))
            .and(path("/golden"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let probe = StatusProbe::new(
            Arc::new(HttpTransport::new().unwrap()),
            registry(&server, &["vegas", "royal", "lucky", "golden"]),
            Duration::from_millis(500),
        );

        let started = Instant::now();
        let report = probe.check_all().await;
        assert!(started.elapsed() < Duration::from_secs(3));

        assert_eq!(report.summary.total, 4);
        assert_eq!(report.summary.online, 3);
        assert_eq!(report.summary.offline, 1);
        assert_eq!(report.summary.health_percentage, 75);

        let golden = &report.sites["golden"];
        assert!(!golden.online);
        assert_eq!(golden.error.as_deref(), Some("timeout"));
        assert!(report.sites["vegas"].response_time_ms.is_some());

        let order: Vec<&str> = report.sites.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["vegas", "royal", "lucky", "golden"]);
    }

    #[tokio::test]
    async fn test_error_status_counts_offline() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/vegas"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/royal"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/lucky"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let probe = StatusProbe::new(
            Arc::new(HttpTransport::new().unwrap()),
            registry(&server, &["vegas", "royal", "lucky"]),
            Duration::from_secs(2),
        );
        let report = probe.check_all().await;

        assert_eq!(report.sites["vegas"].status_code, Some(404));
        assert!(!report.sites["vegas"].online);
        assert_eq!(report.summary.health_percentage, 67);
    }

    #[tokio::test]
    async fn test_missing_url_skips_network() {
        let site = SiteTarget::new("vegas", "", DeployTrigger::Unconfigured);
        let registry = Arc::new(SiteRegistry::new(vec![site]).unwrap());
        let probe = StatusProbe::new(
            Arc::new(HttpTransport::new().unwrap()),
            registry,
            Duration::from_secs(1),
        );
        let report = probe.check_all().await;
        assert_eq!(
            report.sites["vegas"].error.as_deref(),
            Some("no public URL configured")
        );
    }

    #[test]
    fn test_empty_summary() {
        let summary = StatusSummary::from_statuses(std::iter::empty());
        assert_eq!(summary.health_percentage, 0);
        assert_eq!(summary.total, 0);
    }
}

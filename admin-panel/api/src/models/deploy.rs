use brandsite_core::dispatcher::SiteFailure;
use brandsite_core::{DeployResult, DeploySummary, LogEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploySiteRequest {
   pub site_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploySiteResponse {
   pub success: bool,
   pub message: String,
   pub site_name: String,
   pub build_id: Option<String>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub error: Option<String>,
   pub timestamp: DateTime<Utc>,
}

impl From<DeployResult> for DeploySiteResponse {
   fn from(result: DeployResult) -> Self {
      let message = if result.success {
         format!("Deploy triggered for {}", result.site_id)
      } else {
         format!("Deploy failed for {}", result.site_id)
      };

      Self {
         success: result.success,
         message,
         site_name: result.site_id,
         build_id: result.build_id,
         error: result.error,
         timestamp: result.timestamp,
      }
   }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployAllResponse {
   pub success: bool,
   pub message: String,
   pub summary: DeploySummary,
   pub results: Vec<DeployResult>,
   pub errors: Vec<SiteFailure>,
   pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DeployLogResponse {
   pub success: bool,
   pub entries: Vec<LogEntry>,
}

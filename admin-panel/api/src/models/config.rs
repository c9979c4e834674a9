use brandsite_core::{Configuration, Texts};
use indexmap::IndexMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
   pub success: bool,
   pub config: Configuration,
   pub last_modified: DateTime<Utc>,
   pub fixed_links: IndexMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfigResponse {
   pub success: bool,
   pub config: Configuration,
   pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTextsRequest {
   pub texts: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTextsResponse {
   pub success: bool,
   pub texts: Texts,
   pub updated_at: DateTime<Utc>,
   pub fields_updated: Vec<String>,
}

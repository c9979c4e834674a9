use super::ConfigStore;
use crate::errors::{AdminError, Result};
use crate::model::{Configuration, StoredDocument};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// One PostgREST row whose `data` column holds the versioned document
#[derive(Debug)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    key: SecretString,
    table: String,
    row_id: String,
}

#[derive(Debug, Deserialize)]
struct ConfigRow {
    data: StoredDocument,
}

impl SupabaseStore {
    pub fn new(
        client: Client,
        base_url: String,
        key: SecretString,
        table: String,
        row_id: String,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            key,
            table,
            row_id,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", self.key.expose_secret())
            .bearer_auth(self.key.expose_secret())
    }
}

fn unreachable_store(e: reqwest::Error) -> AdminError {
    AdminError::Persistence(format!("supabase unreachable: {}", e))
}

#[async_trait]
impl ConfigStore for SupabaseStore {
    async fn load(&self) -> Result<Option<Configuration>> {
        let url = format!("{}?id=eq.{}&select=data", self.endpoint(), self.row_id);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(unreachable_store)?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(AdminError::NotFound(format!("supabase table '{}'", self.table)));
            }
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(AdminError::Persistence(format!(
                    "supabase load failed: {} {}",
                    status, body
                )));
            }
            _ => {}
        }

        let rows: Vec<ConfigRow> = response
            .json()
            .await
            .map_err(|e| AdminError::Persistence(format!("unexpected supabase row shape: {}", e)))?;
        debug!("Loaded {} config row(s) from supabase", rows.len());

        match rows.into_iter().next() {
            Some(row) => row.data.into_config().map(Some),
            None => Ok(None),
        }
    }

    async fn save(&self, config: &Configuration) -> Result<()> {
        let body = json!([{
            "id": self.row_id,
            "data": StoredDocument::new(config.clone()),
            "updated_at": Utc::now(),
        }]);

        let response = self
            .authorized(self.client.post(self.endpoint()))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&body)
            .send()
            .await
            .map_err(unreachable_store)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AdminError::NotFound(format!("supabase table '{}'", self.table)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdminError::Persistence(format!(
                "supabase save failed: {} {}",
                status, body
            )));
        }

        Ok(())
    }

    fn describe(&self) -> String {
        format!("supabase ({}/{})", self.table, self.row_id)
    }
}

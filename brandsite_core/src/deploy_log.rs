//! Bounded in-memory trail of deploy outcomes shown to operators

use crate::dispatcher::DeployResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: Uuid,
    pub site_id: String,
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn from_result(result: &DeployResult) -> Self {
        let detail = if result.success {
            match &result.build_id {
                Some(build_id) => format!("deploy triggered (build {})", build_id),
                None => "deploy triggered".to_string(),
            }
        } else {
            format!(
                "deploy failed: {}",
                result.error.as_deref().unwrap_or("unknown error")
            )
        };

        Self {
            id: Uuid::new_v4(),
            site_id: result.site_id.clone(),
            success: result.success,
            message: format!(
                "[{}] {}: {}",
                result.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                result.site_id,
                detail
            ),
            timestamp: result.timestamp,
        }
    }
}

/// Append-only log that drops its oldest entry once full
#[derive(Debug)]
pub struct DeployLog {
    entries: RwLock<VecDeque<LogEntry>>,
    capacity: usize,
}

impl DeployLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    pub async fn record(&self, result: &DeployResult) {
        self.push(LogEntry::from_result(result)).await;
    }

    pub async fn push(&self, entry: LogEntry) {
        let mut entries = self.entries.write().await;

        if entries.len() >= self.capacity {
            entries.pop_front();
        }

        debug!("{}", entry.message);
        entries.push_back(entry);
    }

    /// Entries, newest first
    pub async fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().await.iter().rev().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

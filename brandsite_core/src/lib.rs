//! Brandsite admin core
//!
//! Shared configuration for a set of static brand sites: merging partial edits,
//! persisting them, and fanning redeploys and status checks out to every site.

pub mod config;
pub mod context;
pub mod deploy_log;
pub mod dispatcher;
pub mod errors;
pub mod merge;
pub mod model;
pub mod probe;
pub mod registry;
pub mod service;
pub mod store;
pub mod transport;

pub use config::{Settings, StoreBackend};
pub use context::AdminContext;
pub use deploy_log::{DeployLog, LogEntry};
pub use dispatcher::{
    ALL_SITES, DeployOutcome, DeployReport, DeployResult, DeploySummary, Dispatcher,
};
pub use errors::{AdminError, ErrorKind, Result};
pub use merge::{ConfigPatch, merge, merge_at, sanitize_texts};
pub use model::{Configuration, SiteMeta, Texts};
pub use probe::{SiteStatus, StatusProbe, StatusReport, StatusSummary};
pub use registry::{DeployTrigger, SiteRegistry, SiteTarget};
pub use service::{ConfigService, TextsUpdate};
pub use store::ConfigStore;
pub use transport::{HttpTransport, Transport};

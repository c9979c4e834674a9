use actix_web::{web, HttpResponse};
use log::info;
use serde_json::json;

use crate::state::AppState;

// Probe every site and summarise health
pub async fn check_sites_status(data: web::Data<AppState>) -> HttpResponse {
    info!("Request to check status of all sites");
    let report = data.context.probe.check_all().await;
    info!(
        "{} of {} sites online ({}%)",
        report.summary.online, report.summary.total, report.summary.health_percentage
    );

    HttpResponse::Ok().json(json!({
        "success": true,
        "summary": report.summary,
        "sites": report.sites,
        "lastChecked": report.last_checked,
    }))
}

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use brandsite_core::{AdminError, DeployOutcome, ALL_SITES};
use chrono::Utc;
use log::{error, info, warn};

use crate::error::ApiError;
use crate::models::deploy::{
    DeployAllResponse, DeployLogResponse, DeploySiteRequest, DeploySiteResponse,
};
use crate::state::AppState;

// Refuse to deploy while any global link is blank or the store is unreadable
async fn ensure_deployable(data: &AppState) -> Result<(), ApiError> {
    data.context.config.deployable().await?;
    Ok(())
}

// Trigger a single site's redeploy
pub async fn deploy_site(
    data: web::Data<AppState>,
    body: web::Json<DeploySiteRequest>,
) -> Result<HttpResponse, ApiError> {
    let site_name = body.into_inner().site_name;
    info!("Request to deploy site: {}", site_name);

    if site_name == ALL_SITES {
        return deploy_all_sites(data).await;
    }

    if !data.context.registry.contains(&site_name) {
        warn!("Deploy requested for unknown site: {}", site_name);
        return Err(ApiError(AdminError::InvalidInput(format!(
            "unknown site '{}'",
            site_name
        ))));
    }

    ensure_deployable(&data).await?;

    let result = data.context.dispatcher.deploy_one(&site_name).await;
    if result.success {
        Ok(HttpResponse::Ok().json(DeploySiteResponse::from(result)))
    } else {
        error!(
            "Deploy of {} failed: {}",
            site_name,
            result.error.as_deref().unwrap_or("unknown error")
        );
        Ok(HttpResponse::InternalServerError().json(DeploySiteResponse::from(result)))
    }
}

// Trigger every site; 200 all ok, 207 partial, 500 none
pub async fn deploy_all_sites(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    info!("Request to deploy all sites");
    ensure_deployable(&data).await?;

    let report = data.context.dispatcher.deploy_all().await;
    let status = StatusCode::from_u16(report.outcome.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    info!("{}", report.message());

    Ok(HttpResponse::build(status).json(DeployAllResponse {
        success: report.outcome == DeployOutcome::AllSucceeded,
        message: report.message(),
        summary: report.summary,
        errors: report.errors(),
        results: report.results,
        timestamp: Utc::now(),
    }))
}

// Recent deploy outcomes, newest first
pub async fn deploy_log(data: web::Data<AppState>) -> HttpResponse {
    let entries = data.context.dispatcher.log().entries().await;
    info!("Returning {} deploy log entries", entries.len());

    HttpResponse::Ok().json(DeployLogResponse {
        success: true,
        entries,
    })
}

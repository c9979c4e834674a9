use actix_web::{web, HttpResponse};
use brandsite_core::{ConfigPatch, Configuration};
use log::info;
use serde_json::Value;

use crate::error::ApiError;
use crate::models::config::{
    ConfigResponse, UpdateConfigResponse, UpdateTextsRequest, UpdateTextsResponse,
};
use crate::state::AppState;

// Current configuration, or defaults when the store is unreadable
pub async fn get_config(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    info!("Request for current configuration");
    let config = data.context.config.current().await?;

    Ok(HttpResponse::Ok().json(ConfigResponse {
        success: true,
        last_modified: config.meta.last_updated,
        config,
        fixed_links: Configuration::fixed_links(),
    }))
}

// Merge a partial update into the stored configuration
pub async fn update_config(
    data: web::Data<AppState>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let patch = ConfigPatch::from_value(&body)?;
    info!(
        "Request to update configuration (links: {}, sites: {}, texts: {})",
        patch.global_links.is_some(),
        patch.sites.is_some(),
        patch.texts.is_some()
    );

    let config = data.context.config.apply(&patch).await?;

    Ok(HttpResponse::Ok().json(UpdateConfigResponse {
        success: true,
        updated_at: config.meta.last_updated,
        config,
    }))
}

// Sanitized text-only update
pub async fn update_texts(
    data: web::Data<AppState>,
    body: web::Json<UpdateTextsRequest>,
) -> Result<HttpResponse, ApiError> {
    let update = data.context.config.update_texts(&body.texts).await?;
    info!("Updated text fields: {}", update.fields_updated.join(", "));

    Ok(HttpResponse::Ok().json(UpdateTextsResponse {
        success: true,
        texts: update.texts,
        updated_at: update.updated_at,
        fields_updated: update.fields_updated,
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::test;
    use serde_json::{json, Value};

    use crate::test_support::{app_state, init_app, init_app_with_store, newer_schema_store};

    #[actix_web::test]
    async fn test_get_config_bootstraps_defaults() {
        let app = init_app(app_state(&[])).await;
        let req = test::TestRequest::get().uri("/get-config").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert!(body["config"]["sites"]["vegas"].is_object());
        assert!(body["lastModified"].is_string());
        assert!(body["fixedLinks"]["officialSiteUrl"].is_string());
        assert!(body["fixedLinks"]["supportUrl"].is_string());
    }

    #[actix_web::test]
    async fn test_update_config_merges_links() {
        let app = init_app(app_state(&[])).await;

        let req = test::TestRequest::post()
            .uri("/update-config")
            .set_json(json!({"globalLinks": {"whatsappUrl": "A", "telegramUrl": "T"}}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::post()
            .uri("/update-config")
            .set_json(json!({"globalLinks": {"whatsappUrl": "B"}}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["config"]["globalLinks"]["whatsappUrl"], "B");
        assert_eq!(body["config"]["globalLinks"]["telegramUrl"], "T");
        assert_eq!(body["config"]["meta"]["updatedBy"], "admin-panel");
        assert!(body["updatedAt"].is_string());
    }

    #[actix_web::test]
    async fn test_update_config_without_keys_is_400() {
        let app = init_app(app_state(&[])).await;
        let req = test::TestRequest::post()
            .uri("/update-config")
            .set_json(json!({"theme": "dark"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("invalid patch"));
    }

    #[actix_web::test]
    async fn test_malformed_json_is_400() {
        let app = init_app(app_state(&[])).await;
        let req = test::TestRequest::post()
            .uri("/update-config")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_update_unknown_site_is_404() {
        let app = init_app(app_state(&[])).await;
        let req = test::TestRequest::post()
            .uri("/update-config")
            .set_json(json!({"sites": {"atlantis": {"brandName": "A"}}}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_web::test]
    async fn test_update_texts_sanitizes() {
        let app = init_app(app_state(&[])).await;
        let req = test::TestRequest::post()
            .uri("/update-texts")
            .set_json(json!({"texts": {"mainTitle": " hi ", "unknownField": "x"}}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["texts"]["mainTitle"], "hi");
        assert!(body["texts"].get("unknownField").is_none());
        assert_eq!(body["fieldsUpdated"], json!(["mainTitle"]));
    }

    #[actix_web::test]
    async fn test_missing_store_directory_is_404() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("gone").join("config.json");
        let store = brandsite_core::store::FileStore::new(path);
        let app = init_app_with_store(std::sync::Arc::new(store), &[]).await;

        let req = test::TestRequest::get().uri("/get-config").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_web::test]
    async fn test_update_on_unreadable_store_keeps_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = newer_schema_store(&dir).await;
        let path = dir.path().join("site-config.json");
        let before = std::fs::read_to_string(&path).unwrap();
        let app = init_app_with_store(std::sync::Arc::new(store), &[]).await;

        let req = test::TestRequest::post()
            .uri("/update-config")
            .set_json(json!({"texts": {"subtitle": "new"}}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 500);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[actix_web::test]
    async fn test_options_preflight() {
        let app = init_app(app_state(&[])).await;
        let req = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/update-config")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
        let body = test::read_body(resp).await;
        assert!(body.is_empty());
    }
}

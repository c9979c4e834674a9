use actix_web::http::Method;
use actix_web::middleware::DefaultHeaders;
use actix_web::web;

use crate::controllers::{config, deploy, status};
use crate::error::ApiError;
use crate::services::health;
use brandsite_core::AdminError;

// Every response is CORS-open
pub fn cors() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Headers", "Content-Type"))
        .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
}

fn options() -> actix_web::Route {
    web::method(Method::OPTIONS).to(health::preflight)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        ApiError(AdminError::InvalidInput(err.to_string())).into()
    });

    cfg.app_data(json_config)
        .service(
            web::resource("/ping")
                .route(web::get().to(health::ping))
                .route(options()),
        )
        .service(
            web::resource("/get-config")
                .route(web::get().to(config::get_config))
                .route(options()),
        )
        .service(
            web::resource("/update-config")
                .route(web::post().to(config::update_config))
                .route(options()),
        )
        .service(
            web::resource("/update-texts")
                .route(web::post().to(config::update_texts))
                .route(options()),
        )
        .service(
            web::resource("/check-sites-status")
                .route(web::get().to(status::check_sites_status))
                .route(options()),
        )
        .service(
            web::resource("/deploy-site")
                .route(web::post().to(deploy::deploy_site))
                .route(options()),
        )
        .service(
            web::resource("/deploy-all-sites")
                .route(web::post().to(deploy::deploy_all_sites))
                .route(options()),
        )
        .service(
            web::resource("/deploy-log")
                .route(web::get().to(deploy::deploy_log))
                .route(options()),
        );
}

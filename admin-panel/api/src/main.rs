use actix_web::{web, App, HttpServer};
use brandsite_core::{AdminContext, Settings};
use clap::Parser;
use log::{error, info};

mod controllers;
mod error;
mod models;
mod routes;
mod services;
mod state;
#[cfg(test)]
mod test_support;

use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "admin-panel-api", about = "Brand site admin API")]
struct Args {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let settings = Settings::from_env();
    let context = match AdminContext::from_settings(&settings) {
        Ok(context) => context,
        Err(e) => {
            error!("Failed to start admin API: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Admin API managing {} site(s), listening on http://{}:{}",
        context.registry.len(),
        args.host,
        args.port
    );

    let data = web::Data::new(AppState { context });

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(routes::cors())
            .configure(routes::configure)
    })
    .bind((args.host.as_str(), args.port))?
    .run()
    .await
}

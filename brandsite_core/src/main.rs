//! Operator CLI for the brandsite admin core

use brandsite_core::{
    ALL_SITES, AdminContext, AdminError, Configuration, DeployOutcome, Result, Settings,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "brandsite", version, about = "Manage brand site configuration and deploys")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the current configuration
    ShowConfig,

    /// Trigger a redeploy of one site, or ALL
    Deploy {
        #[arg(value_name = "SITE|ALL")]
        site: String,
    },

    /// Probe every site's public URL
    Status,

    /// Show the texts rendered for one site's brand
    Preview { site: String },

    /// Report problems that would make the configuration unpublishable
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    initialize_tracing();

    let cli = Cli::parse();
    let settings = Settings::from_env();
    info!("Starting brandsite CLI v{}", env!("CARGO_PKG_VERSION"));

    let context = match AdminContext::from_settings(&settings) {
        Ok(context) => context,
        Err(e) => {
            error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    let code = run(cli.command, &context).await?;
    std::process::exit(code);
}

async fn run(command: Command, context: &AdminContext) -> Result<i32> {
    match command {
        Command::ShowConfig => {
            let config = context.config.current().await?;
            print_json(&json!({
                "config": config,
                "fixedLinks": Configuration::fixed_links(),
            }))?;
            Ok(0)
        }
        Command::Deploy { site } => {
            context.config.deployable().await?;

            if site == ALL_SITES {
                let report = context.dispatcher.deploy_all().await;
                println!("{}", report.message());
                print_json(&report.results)?;
                Ok(match report.outcome {
                    DeployOutcome::AllSucceeded => 0,
                    DeployOutcome::Partial => 2,
                    DeployOutcome::AllFailed => 1,
                })
            } else {
                context.registry.resolve(&site)?;
                let result = context.dispatcher.deploy_one(&site).await;
                print_json(&result)?;
                Ok(if result.success { 0 } else { 1 })
            }
        }
        Command::Status => {
            let report = context.probe.check_all().await;
            print_json(&report)?;
            Ok(if report.summary.offline == 0 { 0 } else { 1 })
        }
        Command::Preview { site } => {
            let config = context.config.current().await?;
            let meta = config
                .site(&site)
                .ok_or_else(|| AdminError::NotFound(format!("site '{}' is not configured", site)))?;
            print_json(&config.texts.render_for(&meta.brand_name))?;
            Ok(0)
        }
        Command::Validate => {
            let problems = context.config.current().await?.validate();
            for problem in &problems {
                println!("- {}", problem);
            }
            if problems.is_empty() {
                println!("configuration is valid");
                Ok(0)
            } else {
                Ok(1)
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize structured logging
fn initialize_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

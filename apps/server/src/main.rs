#![warn(clippy::all, clippy::pedantic)]

use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use clap::Parser;
use printwatch_monitor::{MonitorLoop, TargetRegistry};
use tracing::info;

mod config;
mod database;
mod error;
mod pool;
mod routes;
mod state;

use config::Config;
use database::{DatabaseImpl, initialize_database};
use error::AppError;
use logger::init_tracing;
use state::AppState;

/// Printer reachability monitor with a JSON API
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the config file (defaults to $XDG_CONFIG_HOME/printwatch/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::from_config(cli.config.as_ref())?;
    config.apply_env_overrides()?;

    if cli.print_config {
        println!("{config}");
        return Ok(());
    }

    run_server(config).await
}

async fn run_server(config: Config) -> Result<(), AppError> {
    let addr = config.socket_addr()?;

    let pool = pool::open_pool(&config.database.path).await?;
    {
        let conn = pool.get().await.map_err(anyhow::Error::from)?;
        initialize_database(&conn).await?;
    }
    let store = Arc::new(DatabaseImpl::new_from_pool(pool));

    let registry = Arc::new(TargetRegistry::load(store.as_ref()).await?);
    let monitor = MonitorLoop::from_config(Arc::clone(&registry), &config.monitor).spawn();
    let state = AppState::new(store, registry, monitor.trigger());

    info!(%addr, database = %config.database.path.display(), "Starting HTTP server");
    let served = HttpServer::new(move || {
        App::new()
            .wrap(routes::cors_headers())
            .app_data(web::Data::new(state.clone()))
            .configure(routes::routes)
    })
    .bind(addr)?
    .run()
    .await;

    monitor.shutdown().await;
    info!("Server stopped");

    Ok(served?)
}

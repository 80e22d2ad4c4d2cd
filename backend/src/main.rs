// src/main.rs
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use tokio::sync::watch;

use trivia_backend::colors::ColorResolver;
use trivia_backend::config::Config;
use trivia_backend::cookies::CookieSigner;
use trivia_backend::handlers::{self, security_headers};
use trivia_backend::question_store::QuestionStore;
use trivia_backend::reload::spawn_periodic_reload;
use trivia_backend::render::VERSION;
use trivia_backend::watcher::start_watcher;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = Config::parse();

    let filter = if config.verbose {
        "info,trivia_backend=debug,trivia=debug"
    } else {
        "info,trivia_backend=info"
    };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(filter));

    info!("trivia v{}", VERSION);

    if let Err(e) = run(config).await {
        error!("CRITICAL: {:?}. Exiting.", e);
        process::exit(1);
    }

    Ok(())
}

async fn run(config: Config) -> Result<()> {
    let addr = SocketAddr::new(config.bind_addr()?, config.port);
    let options = config.load_options().context("No usable question paths")?;
    let reload_every = config.reload_every()?;

    let store = Arc::new(
        web::block(move || QuestionStore::new(options))
            .await
            .context("Initial question load failed")?,
    );

    let colors = match &config.colors {
        Some(path) => ColorResolver::from_file(path).unwrap_or_else(|e| {
            error!("Could not read color mappings from {}: {}", path.display(), e);
            ColorResolver::default()
        }),
        None => ColorResolver::default(),
    };

    let signer = match &config.secret {
        Some(secret) => CookieSigner::new(secret.as_bytes(), config.secure_cookies)?,
        None => CookieSigner::random(config.secure_cookies)?,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    if let Some(every) = reload_every {
        spawn_periodic_reload(store.clone(), every, shutdown_rx.clone());
    }

    if config.watch {
        let watcher_store = store.clone();
        let watcher_shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            info!("Starting filesystem watcher...");
            if let Err(e) = start_watcher(watcher_store, watcher_shutdown).await {
                error!("File watcher task failed: {}", e);
            }
        });
    }

    let features = config.features();
    info!("Listening on http://{}/ with {} workers", addr, config.workers);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(security_headers())
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(colors.clone()))
            .app_data(web::Data::new(signer.clone()))
            .configure(|cfg| handlers::configure(cfg, features))
    })
    .bind(addr)
    .with_context(|| format!("Failed to bind {}", addr))?
    .workers(config.workers)
    .run()
    .await
    .context("HTTP server stopped with an error")?;

    let _ = shutdown_tx.send(true);
    Ok(())
}

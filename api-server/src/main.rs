mod config;
mod handlers;
mod response;
mod sessions;

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use quiver_core::{Clock, SystemClock};
use quiver_host::{LogStore, RecorderConfig};

use config::ServerConfig;
use sessions::SessionRegistry;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) sessions: Arc<SessionRegistry>,
    /// Single writer for the shot log; every volley is appended under this lock.
    pub(crate) store: Arc<Mutex<LogStore>>,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) defaults: RecorderConfig,
}

pub(crate) fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/api/score", web::get().to(handlers::score))
        .route("/api/distances", web::get().to(handlers::distances))
        .route("/api/history", web::get().to(handlers::history))
        .route("/api/sessions", web::post().to(handlers::create_session))
        .route("/api/sessions/{handle}", web::get().to(handlers::get_session))
        .route("/api/sessions/{handle}", web::delete().to(handlers::delete_session))
        .route("/api/sessions/{handle}/shots", web::post().to(handlers::add_shot))
        .route("/api/sessions/{handle}/commit", web::post().to(handlers::commit));
}

fn spawn_session_sweep_task(sessions: Arc<SessionRegistry>, ttl_secs: u64, sweep_secs: u64) {
    tokio::spawn(async move {
        let sweep = Duration::from_secs(sweep_secs);
        let ttl = Duration::from_secs(ttl_secs);
        loop {
            tokio::time::sleep(sweep).await;
            match sessions.sweep(ttl).await {
                0 => {}
                n => tracing::info!(reaped = n, "idle sessions swept"),
            }
        }
    });
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = ServerConfig::from_env();

    tracing::info!(
        "Starting quiver API: bind_addr={} log_file={} max_sessions={} session_ttl_secs={}",
        config.bind_addr,
        config.recorder.log_file.display(),
        config.max_sessions,
        config.session_ttl_secs
    );

    let store = LogStore::open(&config.recorder.log_file)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let state = AppState {
        sessions: Arc::new(SessionRegistry::new(config.max_sessions)),
        store: Arc::new(Mutex::new(store)),
        clock: Arc::new(SystemClock),
        defaults: config.recorder.clone(),
    };
    spawn_session_sweep_task(
        state.sessions.clone(),
        config.session_ttl_secs,
        config.session_sweep_secs,
    );

    let json_limit = config.json_limit;
    HttpServer::new(move || {
        // Configure CORS to allow all origins
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .expose_any_header()
            .max_age(86400);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::JsonConfig::default().limit(json_limit))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(routes)
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}

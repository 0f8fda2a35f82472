use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

mod config;
mod error;
mod handlers;
mod models;
mod sheets;

use config::Config;
use sheets::credentials::ServiceAccountKey;
use sheets::{GoogleEndpoints, RowSink, Worksheet};

#[derive(Clone)]
pub struct AppState {
    pub sink: Arc<dyn RowSink>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route(
            "/guardar_registro",
            post(handlers::registros::guardar_registro),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let allow_origin = if config.cors_allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(hv) => Some(hv),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "entrenamiento_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Config::from_env()?;

    // Credentials and the spreadsheet handle are required before serving.
    let key = ServiceAccountKey::load(
        config.google_credentials.as_deref(),
        &config.google_credentials_file,
    )
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to load Google credentials");
        e
    })?;

    let worksheet = Worksheet::open(&config, key, GoogleEndpoints::default())
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                spreadsheet = %config.spreadsheet_name,
                "Failed to open spreadsheet"
            );
            e
        })?;

    let state = AppState {
        sink: Arc::new(worksheet),
    };

    let app = app(state).layer(cors_layer(&config));

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

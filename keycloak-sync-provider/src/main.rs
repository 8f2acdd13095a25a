use keycloak_sync_domain::{
    application::ports::{LogFormat, LoggingConfig},
    infrastructure::adapters::EnvConfigurationAdapter,
};
use keycloak_sync_provider::{router, AppState, Config};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &logging.level;
        format!("keycloak_sync_provider={level},keycloak_sync_domain={level},tower_http={level}")
            .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Compact => registry.with(tracing_subscriber::fmt::layer().compact()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    init_tracing(&config.app.logging);

    let state = AppState::new(&EnvConfigurationAdapter::from_config(config.app.clone()))?;
    info!(
        resources = state.registry.type_names().count(),
        "Resource registry ready"
    );

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

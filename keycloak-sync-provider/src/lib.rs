pub mod config;
pub mod error;
pub mod handlers;
pub mod import;
pub mod resource_data;
pub mod resources;
pub mod schema;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::{ProviderError, ProviderResult};
pub use resource_data::ResourceData;
pub use resources::{Operation, Registry, Resource};
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/v1/schemas", get(handlers::list_schemas))
        .route(
            "/v1/resources/:type_name/:operation",
            post(handlers::invoke_resource),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

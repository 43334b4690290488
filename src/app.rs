use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::Authenticator;
use crate::database::DataStore;
use crate::handlers;
use crate::middleware::access_middleware;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataStore>,
    pub dev_bypass: bool,
}

/// Full router. Every route, health included, sits behind the access gate.
pub fn app(authenticator: Arc<Authenticator>, store: Arc<dyn DataStore>) -> Router {
    let state = AppState {
        store,
        dev_bypass: authenticator.is_bypass(),
    };

    Router::new()
        .route("/", get(handlers::system::root))
        .route("/health", get(handlers::system::health))
        .merge(auth_routes())
        .merge(data_routes())
        .with_state(state)
        .layer(middleware::from_fn_with_state(authenticator, access_middleware))
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

fn auth_routes() -> Router<AppState> {
    Router::new().route("/api/auth/whoami", get(handlers::auth::whoami))
}

fn data_routes() -> Router<AppState> {
    use handlers::resources;

    Router::new()
        .route(
            "/api/data/:resource",
            get(resources::resource_list).post(resources::resource_post),
        )
        .route(
            "/api/data/:resource/:id",
            get(resources::resource_get).delete(resources::resource_delete),
        )
}

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::handlers;
use crate::state::AppState;

/// Mount point for artifacts written by the local storage backend. Its
/// `public_base_url` should end with this path.
pub const ARTIFACTS_ROUTE: &str = "/artifacts";

pub fn build_router(state: AppState) -> Router {
    let mut router: Router<AppState> = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .route("/menus", get(handlers::menu::list_menus))
        .route("/menu", post(handlers::menu::create_menu))
        .route(
            "/menu/{id}",
            get(handlers::menu::get_menu)
                .put(handlers::menu::update_menu)
                .delete(handlers::menu::delete_menu),
        );

    if let Some(dir) = &state.artifact_dir {
        router = router.nest_service(ARTIFACTS_ROUTE, ServeDir::new(dir));
    }

    router
        .with_state(state)
        // CORS
        .layer(CorsLayer::permissive())
        // Tracing
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}

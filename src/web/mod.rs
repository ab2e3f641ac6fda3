pub mod routes;

use std::path::Path;

use axum::{
    response::Redirect,
    routing::{delete, get, get_service, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::database::ActivityStore;
use routes::activities;

pub const INDEX_PATH: &str = "/static/index.html";

pub fn build_router(store: ActivityStore, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::temporary(INDEX_PATH) }))
        .route("/activities", get(activities::list_activities_handler))
        .route(
            "/activities/:activity_name/signup",
            post(activities::signup_handler),
        )
        .route(
            "/activities/:activity_name/unregister",
            delete(activities::unregister_handler),
        )
        // Client assets
        .nest_service(
            "/static",
            get_service(ServeDir::new(static_dir.as_ref())).layer(
                SetResponseHeaderLayer::if_not_present(
                    CACHE_CONTROL,
                    HeaderValue::from_static("no-store"),
                ),
            ),
        )
        // Layers
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(store)
}

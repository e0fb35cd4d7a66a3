use axum::Router;
use axum::routing::get;

use crate::handlers;
use crate::state::AppState;

/// Anonymous catalogue routes. The session layer still runs so a signed-in
/// viewer is attributed on label scans.
pub(super) fn build_public_catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/public/summary",
            get(handlers::public::catalog_summary_handler),
        )
        .route(
            "/public/statistics",
            get(handlers::public::catalog_statistics_handler),
        )
        .route(
            "/public/specimens",
            get(handlers::public::public_search_handler),
        )
        .route(
            "/public/specimens/{specimen_id}",
            get(handlers::public::public_specimen_handler),
        )
        .route(
            "/public/filters",
            get(handlers::public::filter_options_handler),
        )
        .route("/public/gallery", get(handlers::public::gallery_handler))
        .route(
            "/public/suggestions",
            get(handlers::public::suggestions_handler),
        )
        .route(
            "/public/images/{image_id}",
            get(handlers::images::image_content_handler),
        )
}

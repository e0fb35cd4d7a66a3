mod cors;
mod public_catalog;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use herbarium_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

use self::cors::build_cors_layer;
use self::public_catalog::build_public_catalog_routes;

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    max_upload_bytes: usize,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/api/specimens",
            get(handlers::specimens::list_specimens_handler)
                .post(handlers::specimens::create_specimen_handler),
        )
        .route(
            "/api/specimens/next-code",
            get(handlers::specimens::next_code_handler),
        )
        .route(
            "/api/specimens/{specimen_id}",
            get(handlers::specimens::get_specimen_handler)
                .put(handlers::specimens::update_specimen_handler)
                .delete(handlers::specimens::delete_specimen_handler),
        )
        .route(
            "/api/specimens/{specimen_id}/history",
            get(handlers::specimens::specimen_history_handler),
        )
        .route(
            "/api/specimens/{specimen_id}/sites",
            get(handlers::specimens::list_sites_handler)
                .post(handlers::specimens::add_site_handler),
        )
        .route(
            "/api/sites/{site_id}",
            put(handlers::specimens::update_site_handler)
                .delete(handlers::specimens::remove_site_handler),
        )
        .route(
            "/api/sites/{site_id}/primary",
            post(handlers::specimens::set_primary_site_handler),
        )
        .route(
            "/api/sites/{site_id}/copy-vicinity-coordinates",
            post(handlers::specimens::copy_vicinity_coordinates_handler),
        )
        .route(
            "/api/specimens/{specimen_id}/qr-codes",
            get(handlers::qr::list_specimen_qr_codes_handler)
                .post(handlers::qr::generate_qr_code_handler),
        )
        .route(
            "/api/qr-codes/{qr_id}/regenerate",
            post(handlers::qr::regenerate_qr_code_handler),
        )
        .route(
            "/api/qr-codes/{qr_id}/activate",
            post(handlers::qr::activate_qr_code_handler),
        )
        .route(
            "/api/qr-codes/{qr_id}/deactivate",
            post(handlers::qr::deactivate_qr_code_handler),
        )
        .route(
            "/api/qr-codes/{qr_id}/deprecate",
            post(handlers::qr::deprecate_qr_code_handler),
        )
        .route(
            "/api/qr-codes/{qr_id}/download",
            get(handlers::qr::download_qr_code_handler),
        )
        .route(
            "/api/qr-codes/{qr_id}/scans",
            get(handlers::qr::list_qr_scans_handler),
        )
        .route(
            "/api/families",
            get(handlers::taxonomy::list_families_handler)
                .post(handlers::taxonomy::create_family_handler),
        )
        .route(
            "/api/taxa",
            get(handlers::taxonomy::list_taxa_handler)
                .post(handlers::taxonomy::create_taxon_handler),
        )
        .route(
            "/api/taxa/{taxon_id}",
            get(handlers::taxonomy::get_taxon_handler),
        )
        .route(
            "/api/taxa/{taxon_id}/images",
            get(handlers::images::list_images_handler)
                .post(handlers::images::upload_image_handler)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/api/images/{image_id}",
            put(handlers::images::update_image_handler)
                .delete(handlers::images::remove_image_handler),
        )
        .route(
            "/api/images/{image_id}/primary",
            post(handlers::images::set_primary_image_handler),
        )
        .route(
            "/api/contributors",
            get(handlers::taxonomy::list_contributors_handler)
                .post(handlers::taxonomy::create_contributor_handler),
        )
        .route(
            "/api/herbaria",
            get(handlers::taxonomy::list_herbaria_handler)
                .post(handlers::taxonomy::create_herbarium_handler),
        )
        .route(
            "/api/geography/nodes",
            get(handlers::geography::list_geo_nodes_handler)
                .post(handlers::geography::create_geo_node_handler),
        )
        .route(
            "/api/geography/vicinities/{vicinity_id}/reference-points",
            get(handlers::geography::list_reference_points_handler)
                .post(handlers::geography::create_reference_point_handler),
        )
        .route(
            "/api/geography/location-preview",
            post(handlers::geography::preview_location_handler),
        )
        .route(
            "/api/geography/coordinate-preview",
            post(handlers::geography::preview_coordinate_handler),
        )
        .route(
            "/api/users",
            get(handlers::users::list_users_handler).post(handlers::users::create_user_handler),
        )
        .route(
            "/api/users/{user_id}/role",
            put(handlers::users::update_user_role_handler),
        )
        .route(
            "/api/users/{user_id}/active",
            put(handlers::users::update_user_active_handler),
        )
        .route(
            "/api/users/{user_id}/unlock",
            post(handlers::users::unlock_user_handler),
        )
        .route(
            "/api/users/{user_id}/activity",
            get(handlers::users::user_activity_handler),
        )
        .route(
            "/api/settings",
            get(handlers::users::account_policy_handler),
        )
        .route(
            "/api/audit-log",
            get(handlers::audit::list_audit_log_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(build_public_catalog_routes())
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(frontend_url)?)
        .layer(session_layer)
        .with_state(app_state))
}

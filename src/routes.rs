// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn create_router(app_state: AppState) -> Router {
    // Define as rotas públicas
    let public_routes = Router::new().route("/login", post(handlers::auth::login));

    // Todo o resto passa pelo auth_guard
    let protected_routes = Router::new()
        .route(
            "/clients",
            get(handlers::clients::list_clients)
                .post(handlers::clients::create_client)
                .delete(handlers::clients::delete_client),
        )
        .route("/clients/{id}", put(handlers::clients::update_client))
        .route(
            "/products",
            get(handlers::products::list_products)
                .post(handlers::products::create_product)
                .delete(handlers::products::delete_product),
        )
        .route("/products/{id}", put(handlers::products::update_product))
        .route(
            "/rents",
            get(handlers::rents::list_rents)
                .post(handlers::rents::create_rent)
                .put(handlers::rents::update_rent)
                .delete(handlers::rents::delete_rent),
        )
        .route("/rents/finish", patch(handlers::rents::finish_rent))
        .route("/users", get(handlers::users::get_users))
        .route("/users/membership", put(handlers::users::update_membership))
        .route("/backup", post(handlers::backup::manual_backup))
        .route("/files", post(handlers::files::presign_file))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", public_routes.merge(protected_routes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

use crate::handlers::{
    health::health_check,
    products::{create_product, delete_product, list_products, show_product, update_product},
    users::{create_user, delete_user, list_users, show_user, update_user},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.uploads_dir);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // User routes
        .route("/user", get(list_users).post(create_user))
        .route("/user/", get(list_users).post(create_user))
        .route(
            "/user/:id",
            get(show_user).put(update_user).delete(delete_user),
        )
        // Product routes; POST on an id deletes it
        .route("/product", get(list_products))
        .route("/product/", get(list_products))
        .route("/product/create", post(create_product))
        .route(
            "/product/:id",
            get(show_product)
                .patch(update_product)
                .post(delete_product)
                .delete(delete_product),
        )
        // Stored product images
        .nest_service("/uploads", uploads)
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

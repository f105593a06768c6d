use crate::config::AppConfig;
use crate::handlers::{
    products::{CreatedProductResponse, ProductDetails, ProductListItem},
    users::{UserDetails, UserListItem},
};
use crate::password::PasswordHasher;
use crate::uploads::UploadStore;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Loaded configuration
    pub config: Arc<AppConfig>,
    /// Hashes user passwords before they are stored
    pub hasher: Arc<dyn PasswordHasher>,
    /// Destination for uploaded product images
    pub uploads: Arc<dyn UploadStore>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Plain message response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::users::list_users,
        crate::handlers::users::create_user,
        crate::handlers::users::show_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::products::list_products,
        crate::handlers::products::create_product,
        crate::handlers::products::show_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
    ),
    components(
        schemas(
            ErrorResponse,
            MessageResponse,
            HealthResponse,
            crate::forms::UserForm,
            crate::forms::ProductForm,
            UserListItem,
            UserDetails,
            ProductListItem,
            ProductDetails,
            CreatedProductResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "User registration and profile endpoints"),
        (name = "products", description = "Product catalogue endpoints"),
    ),
    info(
        title = "Storefront API",
        description = "CRUD backend for users and the products they list",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;

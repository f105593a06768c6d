use crate::errors::ApiError;
use crate::extract::{FormInput, ProductId};
use crate::forms::{bind, parse_f64, ProductForm, NOT_VALID};
use crate::schemas::{AppState, MessageResponse};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use model::entities::{product, user};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Entry of the product listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductListItem {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub description: String,
    /// Username of the owner, `null` for products without one
    pub user: Option<String>,
    /// Stored image file name, served under `/uploads/`
    pub image: Option<String>,
}

impl From<(product::Model, Option<user::Model>)> for ProductListItem {
    fn from((product, owner): (product::Model, Option<user::Model>)) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            description: product.description,
            user: owner.map(|u| u.username),
            image: product.image,
        }
    }
}

/// A single product
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductDetails {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub description: String,
}

impl From<product::Model> for ProductDetails {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            price: model.price,
            description: model.description,
        }
    }
}

/// Body returned after a product was created
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedProductResponse {
    pub id: i32,
}

async fn find_product(state: &AppState, product_id: i32) -> Result<product::Model, ApiError> {
    product::Entity::find_by_id(product_id)
        .one(&state.db)
        .await?
        .ok_or(ApiError::ProductNotFound(product_id))
}

/// List all products with their owner's username
#[utoipa::path(
    get,
    path = "/product/",
    tag = "products",
    responses(
        (status = 200, description = "All products", body = Vec<ProductListItem>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductListItem>>, ApiError> {
    trace!("Entering list_products function");

    let rows = product::Entity::find()
        .find_also_related(user::Entity)
        .order_by_asc(product::Column::Id)
        .all(&state.db)
        .await?;

    info!("Retrieved {} products", rows.len());
    Ok(Json(rows.into_iter().map(ProductListItem::from).collect()))
}

/// Create a product
///
/// Accepts JSON, urlencoded or multipart bodies. A multipart part named
/// `file` is stored in the uploads directory under a generated name and
/// recorded as the product image.
#[utoipa::path(
    post,
    path = "/product/create",
    tag = "products",
    request_body = ProductForm,
    responses(
        (status = 201, description = "Product created", body = CreatedProductResponse),
        (status = 400, description = "Empty body or invalid form data", body = ErrorResponse),
        (status = 500, description = "Image upload or database failure", body = ErrorResponse)
    )
)]
#[instrument(skip(state, input))]
pub async fn create_product(
    State(state): State<AppState>,
    input: FormInput,
) -> Result<(StatusCode, Json<CreatedProductResponse>), ApiError> {
    trace!("Entering create_product function");

    if input.fields.is_empty() && input.files.is_empty() {
        return Err(ApiError::EmptyBody);
    }

    let form: ProductForm = bind(&input.fields).map_err(|errors| {
        debug!("Product form rejected: {}", errors);
        ApiError::BadRequest(errors.to_string())
    })?;

    let (Some(name), Some(price), Some(description)) = (form.name, form.price, form.description)
    else {
        return Err(ApiError::BadRequest("Invalid form data".to_string()));
    };

    if let Some(owner_id) = form.user {
        let owner = user::Entity::find_by_id(owner_id).one(&state.db).await?;
        if owner.is_none() {
            warn!("Product owner {} does not exist", owner_id);
            return Err(ApiError::BadRequest(format!("user: {}", NOT_VALID)));
        }
    }

    let image = match input.file("file") {
        Some(file) => {
            debug!(
                "Storing uploaded image '{}' ({} bytes, {})",
                file.file_name,
                file.body.len(),
                file.content_type.as_deref().unwrap_or("no content type")
            );
            let stored = state
                .uploads
                .store(&file.file_name, file.body.clone())
                .await
                .map_err(ApiError::Upload)?;
            Some(stored)
        }
        None => None,
    };

    let new_product = product::ActiveModel {
        name: Set(name),
        price: Set(price),
        description: Set(description),
        image: Set(image),
        user_id: Set(form.user),
        ..Default::default()
    };

    let created = new_product.insert(&state.db).await?;
    info!(
        "Product created with ID: {}, name: {}, image: {:?}",
        created.id, created.name, created.image
    );
    Ok((
        StatusCode::CREATED,
        Json(CreatedProductResponse { id: created.id }),
    ))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/product/{id}",
    tag = "products",
    params(
        ("id" = i32, Path, description = "Product ID"),
    ),
    responses(
        (status = 200, description = "Product found", body = ProductDetails),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn show_product(
    ProductId(product_id): ProductId,
    State(state): State<AppState>,
) -> Result<Json<ProductDetails>, ApiError> {
    trace!("Entering show_product function for product_id: {}", product_id);

    let product = find_product(&state, product_id).await?;
    Ok(Json(ProductDetails::from(product)))
}

/// Partially update a product
///
/// Only `name`, `price` and `description` present in the body change.
#[utoipa::path(
    patch,
    path = "/product/{id}",
    tag = "products",
    params(
        ("id" = i32, Path, description = "Product ID"),
    ),
    request_body = ProductForm,
    responses(
        (status = 200, description = "Product updated", body = ProductDetails),
        (status = 400, description = "Bad or empty body", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, input))]
pub async fn update_product(
    ProductId(product_id): ProductId,
    State(state): State<AppState>,
    input: FormInput,
) -> Result<Json<ProductDetails>, ApiError> {
    trace!("Entering update_product function for product_id: {}", product_id);

    let fields = input.into_update_fields()?;
    let existing = find_product(&state, product_id).await?;

    if fields.is_empty() {
        return Err(ApiError::EmptyBody);
    }

    let mut active: product::ActiveModel = existing.into();
    let mut updated_fields = Vec::new();

    if let Some(name) = fields.text("name")? {
        active.name = Set(name);
        updated_fields.push("name");
    }
    if let Some(raw_price) = fields.text("price")? {
        let price = parse_f64(&raw_price).map_err(|e| {
            debug!("Rejected price for product {}: {}", product_id, e);
            ApiError::BadRequest(format!("price: {}", NOT_VALID))
        })?;
        if let Some(price) = price {
            active.price = Set(price);
            updated_fields.push("price");
        }
    }
    if let Some(description) = fields.text("description")? {
        active.description = Set(description);
        updated_fields.push("description");
    }

    if updated_fields.is_empty() {
        debug!("No known fields to update for product ID: {}", product_id);
    }

    let updated = active.update(&state.db).await?;
    info!(
        "Product with ID {} updated. Updated fields: {}",
        product_id,
        if updated_fields.is_empty() {
            "none".to_string()
        } else {
            updated_fields.join(", ")
        }
    );
    Ok(Json(ProductDetails::from(updated)))
}

/// Delete a product
///
/// Served on both `POST /product/{id}` and `DELETE /product/{id}`.
#[utoipa::path(
    delete,
    path = "/product/{id}",
    tag = "products",
    params(
        ("id" = i32, Path, description = "Product ID"),
    ),
    responses(
        (status = 200, description = "Product deleted", body = MessageResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_product(
    ProductId(product_id): ProductId,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    trace!("Entering delete_product function for product_id: {}", product_id);

    let existing = find_product(&state, product_id).await?;
    product::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await?;

    info!("Product with ID {} deleted successfully", product_id);
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}

use crate::errors::ApiError;
use crate::extract::{ContentKind, FormInput, UserId};
use crate::forms::{bind, UserForm};
use crate::schemas::{AppState, MessageResponse};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use model::entities::{product, user};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Entry of the user listing. The username is exposed as `name`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserListItem {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<user::Model> for UserListItem {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.username,
            email: model.email,
        }
    }
}

/// A single user. The password hash is never part of it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDetails {
    pub id: i32,
    pub email: String,
    pub username: String,
}

impl From<user::Model> for UserDetails {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
        }
    }
}

async fn find_user(state: &AppState, user_id: i32) -> Result<user::Model, ApiError> {
    user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or(ApiError::UserNotFound(user_id))
}

/// List all users
#[utoipa::path(
    get,
    path = "/user/",
    tag = "users",
    responses(
        (status = 200, description = "All users, or a message when there are none", body = Vec<UserListItem>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Response, ApiError> {
    trace!("Entering list_users function");

    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(&state.db)
        .await?;

    if users.is_empty() {
        debug!("No users in database");
        return Ok(Json(MessageResponse::new("No users found")).into_response());
    }

    info!("Retrieved {} users", users.len());
    let items: Vec<UserListItem> = users.into_iter().map(UserListItem::from).collect();
    Ok(Json(items).into_response())
}

/// Register a new user
///
/// Accepts JSON, urlencoded or multipart bodies with `email`, `username` and
/// `password`. The password is hashed before it is stored.
#[utoipa::path(
    post,
    path = "/user/",
    tag = "users",
    request_body = UserForm,
    responses(
        (status = 201, description = "User registered", body = MessageResponse),
        (status = 400, description = "Empty body or invalid form data", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, input))]
pub async fn create_user(
    State(state): State<AppState>,
    input: FormInput,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    trace!("Entering create_user function");

    if input.fields.is_empty() {
        return Err(ApiError::EmptyBody);
    }

    let form: UserForm = bind(&input.fields).map_err(|errors| {
        debug!("User form rejected: {}", errors);
        ApiError::BadRequest("Invalid form data".to_string())
    })?;

    // bind() guarantees all three are present
    let (Some(email), Some(username), Some(plain_password)) =
        (form.email, form.username, form.password)
    else {
        return Err(ApiError::BadRequest("Invalid form data".to_string()));
    };

    let password = state.hasher.hash_password(&plain_password)?;

    let new_user = user::ActiveModel {
        email: Set(email.clone()),
        username: Set(username),
        password: Set(password),
        ..Default::default()
    };

    let created = new_user
        .insert(&state.db)
        .await
        .map_err(|e| ApiError::from_user_write(e, &email))?;

    info!("User registered with ID: {}, email: {}", created.id, created.email);
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/user/{id}",
    tag = "users",
    params(
        ("id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User found", body = UserDetails),
        (status = 400, description = "User not found (empty error message)", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn show_user(
    UserId(user_id): UserId,
    State(state): State<AppState>,
) -> Result<Json<UserDetails>, ApiError> {
    trace!("Entering show_user function for user_id: {}", user_id);

    let user = find_user(&state, user_id).await?;
    debug!("Found user {} ({})", user.id, user.username);
    Ok(Json(UserDetails::from(user)))
}

/// Update a user's email and/or username
///
/// Only the keys present in the body change. Multipart values shorter than
/// three characters after trimming are rejected.
#[utoipa::path(
    put,
    path = "/user/{id}",
    tag = "users",
    params(
        ("id" = i32, Path, description = "User ID"),
    ),
    request_body = UserForm,
    responses(
        (status = 200, description = "User updated", body = UserDetails),
        (status = 400, description = "Bad body, unsupported content type or user not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, input))]
pub async fn update_user(
    UserId(user_id): UserId,
    State(state): State<AppState>,
    input: FormInput,
) -> Result<Json<UserDetails>, ApiError> {
    trace!("Entering update_user function for user_id: {}", user_id);

    if input.kind == ContentKind::Unsupported {
        return Err(ApiError::UnsupportedContentType);
    }
    let fields = input.into_update_fields()?;

    let existing = find_user(&state, user_id).await?;
    let email = fields.text("email")?;
    let username = fields.text("username")?;

    if email.is_none() && username.is_none() {
        debug!("No fields to update for user ID: {}", user_id);
        return Ok(Json(UserDetails::from(existing)));
    }

    let mut active: user::ActiveModel = existing.into();
    let mut updated_fields = Vec::new();
    if let Some(email) = &email {
        active.email = Set(email.clone());
        updated_fields.push("email");
    }
    if let Some(username) = username {
        active.username = Set(username);
        updated_fields.push("username");
    }

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| ApiError::from_user_write(e, email.as_deref().unwrap_or_default()))?;

    info!(
        "User with ID {} updated. Updated fields: {}",
        user_id,
        updated_fields.join(", ")
    );
    Ok(Json(UserDetails::from(updated)))
}

/// Delete a user
///
/// Products owned by the user are kept and lose their owner.
#[utoipa::path(
    delete,
    path = "/user/{id}",
    tag = "users",
    params(
        ("id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "User not found (empty error message)", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_user(
    UserId(user_id): UserId,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    trace!("Entering delete_user function for user_id: {}", user_id);

    let existing = find_user(&state, user_id).await?;

    // Same effect as the ON DELETE SET NULL foreign key, which SQLite only
    // honours with foreign_keys enabled.
    let orphaned = product::Entity::update_many()
        .col_expr(product::Column::UserId, Expr::value(Option::<i32>::None))
        .filter(product::Column::UserId.eq(existing.id))
        .exec(&state.db)
        .await?;
    debug!(
        "Cleared owner on {} product(s) of user {}",
        orphaned.rows_affected, user_id
    );

    let result = user::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        warn!("User with ID {} vanished before deletion", user_id);
        return Err(ApiError::UserNotFound(user_id));
    }

    info!("User with ID {} deleted successfully", user_id);
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> user::Model {
        user::Model {
            id: 4,
            email: "ana@example.com".to_string(),
            username: "ana".to_string(),
            password: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        }
    }

    #[test]
    fn test_list_item_renames_username() {
        let json = serde_json::to_value(UserListItem::from(sample())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": 4, "name": "ana", "email": "ana@example.com" })
        );
    }

    #[test]
    fn test_details_never_expose_password() {
        let json = serde_json::to_value(UserDetails::from(sample())).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "ana");
    }
}

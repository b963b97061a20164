use std::net::SocketAddr;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        ConnectInfo, Path, State,
    },
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    error::AppError,
    state::AppState,
    users::{
        dto::{
            CreateUserRequest, CreatedUserResponse, MessageResponse, UpdateUserRequest,
            UpdatedUserResponse, UserListResponse,
        },
        repo_types::User,
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidFormat(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidFormat(rejection.body_text())
    }
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<CreatedUserResponse>, AppError> {
    let Json(req) = payload?;
    let user_id = services::create_user(&state, req).await?;
    Ok(Json(CreatedUserResponse {
        message: "User created successfully",
        user_id,
    }))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Json<UserListResponse>, AppError> {
    let client_ip = addr.ip().to_string();
    info!(%client_ip, "listing users");
    let users = services::list_users(&state).await?;
    Ok(Json(UserListResponse { client_ip, users }))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<User>, AppError> {
    let Path(id) = id?;
    Ok(Json(services::get_user(&state, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UpdatedUserResponse>, AppError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let user = services::update_user(&state, id, req).await?;
    Ok(Json(UpdatedUserResponse {
        message: "User updated successfully",
        user,
    }))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = id?;
    services::delete_user(&state, id).await?;
    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}

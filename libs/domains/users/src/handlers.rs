use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::ValidatedJson;
use std::sync::Arc;

use crate::error::UserResult;
use crate::events::UserEventPublisher;
use crate::models::{CreateUserRequest, UpdateUserRequest, UserListResponse, UserQuery, UserResponse};
use crate::repository::UserRepository;
use crate::service::UserService;

/// Create the users router with all HTTP endpoints
pub fn router<R, P>(service: UserService<R, P>) -> Router
where
    R: UserRepository + 'static,
    P: UserEventPublisher + 'static,
{
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/health", get(health_check))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .with_state(shared_service)
}

/// Service health check
///
/// GET /users/health
async fn health_check() -> &'static str {
    "User Management Service is running"
}

/// List users with pagination, sorting and filtering
///
/// GET /users?page=0&size=10&sortBy=name&sortDir=desc&role=ADMIN
async fn list_users<R: UserRepository, P: UserEventPublisher>(
    State(service): State<Arc<UserService<R, P>>>,
    Query(query): Query<UserQuery>,
) -> UserResult<Json<UserListResponse>> {
    let response = service.list_users(query).await?;
    Ok(Json(response))
}

/// Create a new user
///
/// POST /users
async fn create_user<R: UserRepository, P: UserEventPublisher>(
    State(service): State<Arc<UserService<R, P>>>,
    ValidatedJson(input): ValidatedJson<CreateUserRequest>,
) -> UserResult<impl IntoResponse> {
    let user = service.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a user by ID
///
/// GET /users/:id
async fn get_user<R: UserRepository, P: UserEventPublisher>(
    State(service): State<Arc<UserService<R, P>>>,
    Path(id): Path<i64>,
) -> UserResult<Json<UserResponse>> {
    let user = service.get_user(id).await?;
    Ok(Json(user))
}

/// Update a user (partial)
///
/// PUT /users/:id
async fn update_user<R: UserRepository, P: UserEventPublisher>(
    State(service): State<Arc<UserService<R, P>>>,
    Path(id): Path<i64>,
    ValidatedJson(input): ValidatedJson<UpdateUserRequest>,
) -> UserResult<Json<UserResponse>> {
    let user = service.update_user(id, input).await?;
    Ok(Json(user))
}

/// Delete a user
///
/// DELETE /users/:id
async fn delete_user<R: UserRepository, P: UserEventPublisher>(
    State(service): State<Arc<UserService<R, P>>>,
    Path(id): Path<i64>,
) -> UserResult<impl IntoResponse> {
    service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

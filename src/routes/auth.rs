use axum::{Json, extract::State, http::StatusCode, routing::post, Router};

use crate::{
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest},
    dto::users::UserOut,
    db::DbPool,
    error::AppResult,
    response::ApiResponse,
    services::auth_service::{login_user, register_user},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<UserOut>),
        (status = 400, description = "Email or username already taken")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(pool): State<DbPool>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserOut>>)> {
    let resp = register_user(&pool, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(pool): State<DbPool>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = login_user(&pool, payload).await?;
    Ok(Json(resp))
}

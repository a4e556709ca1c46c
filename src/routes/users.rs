use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::users::{SubscriptionList, SubscriptionOut, UserList, UserOut},
    error::AppResult,
    middleware::auth::{AuthUser, MaybeAuthUser},
    response::ApiResponse,
    routes::params::{Pagination, SubscriptionsQuery},
    services::user_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(me))
        .route("/subscriptions", get(subscriptions))
        .route("/{id}", get(get_user))
        .route("/{id}/subscribe", axum::routing::post(subscribe).delete(unsubscribe))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List users", body = ApiResponse<UserList>)
    ),
    tag = "Users"
)]
pub async fn list_users(
    State(pool): State<DbPool>,
    viewer: MaybeAuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = user_service::list_users(&pool, viewer.user_id(), pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserOut>)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn me(
    State(pool): State<DbPool>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserOut>>> {
    let resp = user_service::get_user(&pool, Some(user.user_id), user.user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Get user", body = ApiResponse<UserOut>),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
pub async fn get_user(
    State(pool): State<DbPool>,
    viewer: MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserOut>>> {
    let resp = user_service::get_user(&pool, viewer.user_id(), id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("recipes_limit" = Option<i64>, Query, description = "Max recipes per author, default 6")
    ),
    responses(
        (status = 200, description = "Followed authors", body = ApiResponse<SubscriptionList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn subscriptions(
    State(pool): State<DbPool>,
    user: AuthUser,
    Query(query): Query<SubscriptionsQuery>,
) -> AppResult<Json<ApiResponse<SubscriptionList>>> {
    let resp = user_service::subscriptions(&pool, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe",
    params(
        ("id" = Uuid, Path, description = "Author ID")
    ),
    responses(
        (status = 201, description = "Subscribed", body = ApiResponse<SubscriptionOut>),
        (status = 400, description = "Already following or self-follow"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn subscribe(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<ApiResponse<SubscriptionOut>>)> {
    let resp = user_service::subscribe(&pool, &user, id).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe",
    params(
        ("id" = Uuid, Path, description = "Author ID")
    ),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn unsubscribe(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user_service::unsubscribe(&pool, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::{AppError, AppResult},
    models::Tag,
    response::ApiResponse,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags))
        .route("/{id}", get(get_tag))
}

#[utoipa::path(
    get,
    path = "/api/tags",
    responses(
        (status = 200, description = "List tags", body = ApiResponse<Vec<Tag>>)
    ),
    tag = "Tags"
)]
pub async fn list_tags(State(pool): State<DbPool>) -> AppResult<Json<ApiResponse<Vec<Tag>>>> {
    let tags = sqlx::query_as::<_, Tag>("SELECT * FROM tags ORDER BY name")
        .fetch_all(&pool)
        .await?;
    Ok(Json(ApiResponse::success("Tags", tags, None)))
}

#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    params(
        ("id" = Uuid, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "Get tag", body = ApiResponse<Tag>),
        (status = 404, description = "Tag not found"),
    ),
    tag = "Tags"
)]
pub async fn get_tag(
    Path(id): Path<Uuid>,
    State(pool): State<DbPool>,
) -> AppResult<Json<ApiResponse<Tag>>> {
    let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    let tag = match tag {
        Some(t) => t,
        None => return Err(AppError::NotFound),
    };
    Ok(Json(ApiResponse::success("Tag", tag, None)))
}

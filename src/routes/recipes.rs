use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::recipes::{CreateRecipeRequest, RecipeList, RecipeOut, RecipeShort, UpdateRecipeRequest},
    error::AppResult,
    middleware::auth::{AuthUser, MaybeAuthUser},
    response::ApiResponse,
    routes::params::RecipeListQuery,
    services::{cart_service, favorite_service, recipe_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_recipes).post(create_recipe))
        .route("/download_shopping_cart", get(download_shopping_cart))
        .route(
            "/{id}",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .route("/{id}/favorite", post(add_favorite).delete(remove_favorite))
        .route(
            "/{id}/shopping_cart",
            post(add_to_cart).delete(remove_from_cart),
        )
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("author" = Option<Uuid>, Query, description = "Filter by author"),
        ("tags" = Option<String>, Query, description = "Comma-separated tag slugs"),
        ("is_favorited" = Option<bool>, Query, description = "Only recipes the viewer favorited"),
        ("is_in_shopping_cart" = Option<bool>, Query, description = "Only recipes in the viewer's cart")
    ),
    responses(
        (status = 200, description = "List recipes", body = ApiResponse<RecipeList>)
    ),
    tag = "Recipes"
)]
pub async fn list_recipes(
    State(pool): State<DbPool>,
    viewer: MaybeAuthUser,
    Query(query): Query<RecipeListQuery>,
) -> AppResult<Json<ApiResponse<RecipeList>>> {
    let resp = recipe_service::list_recipes(&pool, viewer.user_id(), query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Get recipe", body = ApiResponse<RecipeOut>),
        (status = 404, description = "Recipe not found"),
    ),
    tag = "Recipes"
)]
pub async fn get_recipe(
    State(pool): State<DbPool>,
    viewer: MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RecipeOut>>> {
    let resp = recipe_service::get_recipe(&pool, viewer.user_id(), id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = ApiResponse<RecipeOut>),
        (status = 400, description = "Validation error")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn create_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateRecipeRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RecipeOut>>)> {
    let resp = recipe_service::create_recipe(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = ApiResponse<RecipeOut>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn update_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRecipeRequest>,
) -> AppResult<Json<ApiResponse<RecipeOut>>> {
    let resp = recipe_service::update_recipe(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn delete_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    recipe_service::delete_recipe(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/favorite",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Added to favorites", body = ApiResponse<RecipeShort>),
        (status = 400, description = "Already favorited"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn add_favorite(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<ApiResponse<RecipeShort>>)> {
    let resp = favorite_service::add_favorite(&pool, &user, id).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/favorite",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn remove_favorite(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    favorite_service::remove_favorite(&pool, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Added to shopping cart", body = ApiResponse<RecipeShort>),
        (status = 400, description = "Already in the cart"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<ApiResponse<RecipeShort>>)> {
    let resp = cart_service::add_to_cart(&pool, &user, id).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from shopping cart"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    cart_service::remove_from_cart(&pool, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    responses(
        (status = 200, description = "Plain-text shopping list attachment"),
        (status = 400, description = "Shopping cart is empty")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn download_shopping_cart(
    State(pool): State<DbPool>,
    user: AuthUser,
) -> AppResult<Response> {
    let body = cart_service::download_shopping_cart(&pool, &user).await?;
    let headers = [
        (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"shopping_list.txt\"",
        ),
    ];
    Ok((headers, body).into_response())
}

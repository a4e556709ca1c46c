use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::recipes::RecipeShort,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::recipe_service::get_recipe_short,
};

pub async fn add_favorite(
    pool: &DbPool,
    user: &AuthUser,
    recipe_id: Uuid,
) -> AppResult<ApiResponse<RecipeShort>> {
    let recipe = get_recipe_short(pool, recipe_id).await?;

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM favorites WHERE user_id = $1 AND recipe_id = $2")
            .bind(user.user_id)
            .bind(recipe_id)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(
            "Recipe is already in favorites".to_string(),
        ));
    }

    sqlx::query("INSERT INTO favorites (id, user_id, recipe_id) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "favorite_add",
        Some("favorites"),
        Some(serde_json::json!({ "recipe_id": recipe_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Added to favorites",
        recipe,
        Some(Meta::empty()),
    ))
}

/// Removing an absent favorite is not an error; the relation just ends up
/// absent either way.
pub async fn remove_favorite(pool: &DbPool, user: &AuthUser, recipe_id: Uuid) -> AppResult<()> {
    get_recipe_short(pool, recipe_id).await?;

    sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(user.user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "favorite_remove",
        Some("favorites"),
        Some(serde_json::json!({ "recipe_id": recipe_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(())
}

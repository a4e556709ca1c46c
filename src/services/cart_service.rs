use sqlx::FromRow;
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

#[derive(Debug, FromRow)]
struct ShoppingListRow {
    name: String,
    measurement_unit: String,
    total: i64,
}

pub async fn add_to_cart(
    pool: &DbPool,
    user: &AuthUser,
    recipe_id: Uuid,
) -> AppResult<ApiResponse<RecipeShort>> {
    let recipe = get_recipe_short(pool, recipe_id).await?;

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM shopping_cart WHERE user_id = $1 AND recipe_id = $2")
            .bind(user.user_id)
            .bind(recipe_id)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(
            "Recipe is already in the shopping cart".to_string(),
        ));
    }

    sqlx::query("INSERT INTO shopping_cart (id, user_id, recipe_id) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_add",
        Some("shopping_cart"),
        Some(serde_json::json!({ "recipe_id": recipe_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Added to shopping cart",
        recipe,
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_cart(pool: &DbPool, user: &AuthUser, recipe_id: Uuid) -> AppResult<()> {
    get_recipe_short(pool, recipe_id).await?;

    sqlx::query("DELETE FROM shopping_cart WHERE user_id = $1 AND recipe_id = $2")
        .bind(user.user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_remove",
        Some("shopping_cart"),
        Some(serde_json::json!({ "recipe_id": recipe_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(())
}

/// Sum the quantities of every distinct ingredient used across the cart
/// recipes and render them as a flat text shopping list.
pub async fn download_shopping_cart(pool: &DbPool, user: &AuthUser) -> AppResult<String> {
    let cart_size: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM shopping_cart WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;
    if cart_size.0 == 0 {
        return Err(AppError::BadRequest("Shopping cart is empty".to_string()));
    }

    let rows = sqlx::query_as::<_, ShoppingListRow>(
        r#"
        SELECT i.name, i.measurement_unit, SUM(ri.amount)::BIGINT AS total
        FROM shopping_cart sc
        JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
        GROUP BY i.name, i.measurement_unit
        ORDER BY i.name
        "#,
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_download",
        Some("shopping_cart"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(render_shopping_list(&rows))
}

fn render_shopping_list(rows: &[ShoppingListRow]) -> String {
    let mut out = String::from("Shopping list\n\n");
    for row in rows {
        out.push_str(&format!(
            "{} {} {}\n",
            row.name, row.total, row.measurement_unit
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{ShoppingListRow, render_shopping_list};

    fn row(name: &str, total: i64, unit: &str) -> ShoppingListRow {
        ShoppingListRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            total,
        }
    }

    #[test]
    fn renders_header_and_one_line_per_ingredient() {
        let rows = vec![row("flour", 500, "g"), row("milk", 750, "ml")];
        let text = render_shopping_list(&rows);
        assert_eq!(text, "Shopping list\n\nflour 500 g\nmilk 750 ml\n");
    }

    #[test]
    fn renders_only_header_for_no_rows() {
        assert_eq!(render_shopping_list(&[]), "Shopping list\n\n");
    }
}

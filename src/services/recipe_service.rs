use std::collections::{HashMap, HashSet};

use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::recipes::{
        CreateRecipeRequest, IngredientAmountIn, IngredientAmountOut, RecipeList, RecipeOut,
        RecipeShort, UpdateRecipeRequest,
    },
    dto::users::UserOut,
    entity::{
        recipe_ingredients::ActiveModel as RecipeIngredientActive,
        recipe_ingredients::Column as RecipeIngredientCol,
        recipe_tags::ActiveModel as RecipeTagActive, recipe_tags::Column as RecipeTagCol,
        recipes::ActiveModel as RecipeActive, recipes::Column as RecipeCol,
        Ingredients, RecipeIngredients, RecipeTags, Recipes, Tags,
        ingredients::Column as IngredientCol, tags::Column as TagCol,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Tag,
    response::{ApiResponse, Meta},
    routes::params::RecipeListQuery,
    state::AppState,
};

#[derive(Debug, FromRow)]
struct RecipeRow {
    id: Uuid,
    author_id: Uuid,
    name: String,
    image: String,
    text: String,
    cooking_time: i32,
    is_favorited: bool,
    is_in_shopping_cart: bool,
}

#[derive(Debug, FromRow)]
struct RecipeTagRow {
    recipe_id: Uuid,
    id: Uuid,
    name: String,
    color: String,
    slug: String,
}

#[derive(Debug, FromRow)]
struct RecipeIngredientRow {
    recipe_id: Uuid,
    id: Uuid,
    name: String,
    measurement_unit: String,
    amount: i32,
}

#[derive(Debug, FromRow)]
struct AuthorRow {
    id: Uuid,
    email: String,
    username: String,
    first_name: String,
    last_name: String,
    is_subscribed: bool,
}

const RECIPE_FLAGS_SELECT: &str = r#"
    SELECT r.id, r.author_id, r.name, r.image, r.text, r.cooking_time,
           EXISTS(SELECT 1 FROM favorites f
                  WHERE f.user_id = $1 AND f.recipe_id = r.id) AS is_favorited,
           EXISTS(SELECT 1 FROM shopping_cart sc
                  WHERE sc.user_id = $1 AND sc.recipe_id = r.id) AS is_in_shopping_cart
    FROM recipes r
"#;

const RECIPE_FILTERS: &str = r#"
    WHERE ($2::uuid IS NULL OR r.author_id = $2)
      AND ($3::text[] IS NULL OR EXISTS(
             SELECT 1 FROM recipe_tags rt
             JOIN tags t ON t.id = rt.tag_id
             WHERE rt.recipe_id = r.id AND t.slug = ANY($3::text[])))
      AND ($4::bool IS NULL OR EXISTS(SELECT 1 FROM favorites f
             WHERE f.user_id = $1 AND f.recipe_id = r.id) = $4)
      AND ($5::bool IS NULL OR EXISTS(SELECT 1 FROM shopping_cart sc
             WHERE sc.user_id = $1 AND sc.recipe_id = r.id) = $5)
"#;

pub async fn list_recipes(
    pool: &DbPool,
    viewer: Option<Uuid>,
    query: RecipeListQuery,
) -> AppResult<ApiResponse<RecipeList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let slugs = query.tag_slugs();

    let sql = format!("{RECIPE_FLAGS_SELECT} {RECIPE_FILTERS} ORDER BY r.pub_date DESC LIMIT $6 OFFSET $7");
    let rows = sqlx::query_as::<_, RecipeRow>(&sql)
        .bind(viewer)
        .bind(query.author)
        .bind(&slugs)
        .bind(query.is_favorited)
        .bind(query.is_in_shopping_cart)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let count_sql = format!("SELECT COUNT(*) FROM recipes r {RECIPE_FILTERS}");
    let total: (i64,) = sqlx::query_as(&count_sql)
        .bind(viewer)
        .bind(query.author)
        .bind(&slugs)
        .bind(query.is_favorited)
        .bind(query.is_in_shopping_cart)
        .fetch_one(pool)
        .await?;

    let items = build_recipe_outs(pool, viewer, rows).await?;
    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Recipes", RecipeList { items }, Some(meta)))
}

pub async fn get_recipe(
    pool: &DbPool,
    viewer: Option<Uuid>,
    recipe_id: Uuid,
) -> AppResult<ApiResponse<RecipeOut>> {
    let recipe = fetch_recipe_out(pool, viewer, recipe_id).await?;
    Ok(ApiResponse::success("Recipe", recipe, None))
}

pub async fn create_recipe(
    state: &AppState,
    user: &AuthUser,
    payload: CreateRecipeRequest,
) -> AppResult<ApiResponse<RecipeOut>> {
    validate_ingredients(&payload.ingredients)?;
    validate_cooking_time(payload.cooking_time)?;
    let tag_ids = dedup_ids(&payload.tags);

    let duplicate = Recipes::find()
        .filter(RecipeCol::AuthorId.eq(user.user_id))
        .filter(RecipeCol::Name.eq(payload.name.as_str()))
        .count(&state.orm)
        .await?;
    if duplicate > 0 {
        return Err(AppError::BadRequest(
            "You already have a recipe with this name".to_string(),
        ));
    }

    ensure_tags_exist(&state.orm, &tag_ids).await?;
    let ingredient_ids: Vec<Uuid> = payload.ingredients.iter().map(|i| i.id).collect();
    ensure_ingredients_exist(&state.orm, &ingredient_ids).await?;

    let recipe_id = Uuid::new_v4();
    let txn = state.orm.begin().await?;
    RecipeActive {
        id: Set(recipe_id),
        author_id: Set(user.user_id),
        name: Set(payload.name.clone()),
        image: Set(payload.image.clone()),
        text: Set(payload.text.clone()),
        cooking_time: Set(payload.cooking_time),
        pub_date: NotSet,
    }
    .insert(&txn)
    .await?;
    insert_recipe_ingredients(&txn, recipe_id, &payload.ingredients).await?;
    insert_recipe_tags(&txn, recipe_id, &tag_ids).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "recipe_create",
        Some("recipes"),
        Some(serde_json::json!({ "recipe_id": recipe_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let recipe = fetch_recipe_out(&state.pool, Some(user.user_id), recipe_id).await?;
    Ok(ApiResponse::success(
        "Recipe created",
        recipe,
        Some(Meta::empty()),
    ))
}

pub async fn update_recipe(
    state: &AppState,
    user: &AuthUser,
    recipe_id: Uuid,
    payload: UpdateRecipeRequest,
) -> AppResult<ApiResponse<RecipeOut>> {
    let existing = Recipes::find_by_id(recipe_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if existing.author_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    if let Some(ingredients) = payload.ingredients.as_deref() {
        validate_ingredients(ingredients)?;
        let ingredient_ids: Vec<Uuid> = ingredients.iter().map(|i| i.id).collect();
        ensure_ingredients_exist(&state.orm, &ingredient_ids).await?;
    }
    let tag_ids = payload.tags.as_ref().map(|tags| dedup_ids(tags));
    if let Some(tag_ids) = tag_ids.as_deref() {
        ensure_tags_exist(&state.orm, tag_ids).await?;
    }

    let name = payload.name.unwrap_or_else(|| existing.name.clone());
    let image = payload.image.unwrap_or_else(|| existing.image.clone());
    let text = payload.text.unwrap_or_else(|| existing.text.clone());
    let cooking_time = payload.cooking_time.unwrap_or(existing.cooking_time);
    validate_cooking_time(cooking_time)?;

    if name != existing.name {
        let duplicate = Recipes::find()
            .filter(RecipeCol::AuthorId.eq(user.user_id))
            .filter(RecipeCol::Name.eq(name.as_str()))
            .count(&state.orm)
            .await?;
        if duplicate > 0 {
            return Err(AppError::BadRequest(
                "You already have a recipe with this name".to_string(),
            ));
        }
    }

    let txn = state.orm.begin().await?;
    let mut active: RecipeActive = existing.into();
    active.name = Set(name);
    active.image = Set(image);
    active.text = Set(text);
    active.cooking_time = Set(cooking_time);
    active.update(&txn).await?;

    if let Some(ingredients) = payload.ingredients.as_deref() {
        RecipeIngredients::delete_many()
            .filter(RecipeIngredientCol::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        insert_recipe_ingredients(&txn, recipe_id, ingredients).await?;
    }
    if let Some(tag_ids) = tag_ids.as_deref() {
        RecipeTags::delete_many()
            .filter(RecipeTagCol::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        insert_recipe_tags(&txn, recipe_id, tag_ids).await?;
    }
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "recipe_update",
        Some("recipes"),
        Some(serde_json::json!({ "recipe_id": recipe_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let recipe = fetch_recipe_out(&state.pool, Some(user.user_id), recipe_id).await?;
    Ok(ApiResponse::success("Recipe updated", recipe, Some(Meta::empty())))
}

pub async fn delete_recipe(state: &AppState, user: &AuthUser, recipe_id: Uuid) -> AppResult<()> {
    let existing = Recipes::find_by_id(recipe_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if existing.author_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    Recipes::delete_by_id(recipe_id).exec(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "recipe_delete",
        Some("recipes"),
        Some(serde_json::json!({ "recipe_id": recipe_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(())
}

/// Compact recipe lookup shared by the favorite and cart toggles.
pub async fn get_recipe_short(pool: &DbPool, recipe_id: Uuid) -> AppResult<RecipeShort> {
    let recipe = sqlx::query_as::<_, RecipeShort>(
        "SELECT id, name, image, cooking_time FROM recipes WHERE id = $1",
    )
    .bind(recipe_id)
    .fetch_optional(pool)
    .await?;
    recipe.ok_or(AppError::NotFound)
}

async fn fetch_recipe_out(
    pool: &DbPool,
    viewer: Option<Uuid>,
    recipe_id: Uuid,
) -> AppResult<RecipeOut> {
    let sql = format!("{RECIPE_FLAGS_SELECT} WHERE r.id = $2");
    let row = sqlx::query_as::<_, RecipeRow>(&sql)
        .bind(viewer)
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut outs = build_recipe_outs(pool, viewer, vec![row]).await?;
    outs.pop().ok_or(AppError::NotFound)
}

async fn build_recipe_outs(
    pool: &DbPool,
    viewer: Option<Uuid>,
    rows: Vec<RecipeRow>,
) -> AppResult<Vec<RecipeOut>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let author_ids: Vec<Uuid> = rows
        .iter()
        .map(|r| r.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let tag_rows = sqlx::query_as::<_, RecipeTagRow>(
        r#"
        SELECT rt.recipe_id, t.id, t.name, t.color, t.slug
        FROM recipe_tags rt
        JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = ANY($1)
        ORDER BY t.name
        "#,
    )
    .bind(&recipe_ids)
    .fetch_all(pool)
    .await?;

    let ingredient_rows = sqlx::query_as::<_, RecipeIngredientRow>(
        r#"
        SELECT ri.recipe_id, i.id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ANY($1)
        ORDER BY i.name
        "#,
    )
    .bind(&recipe_ids)
    .fetch_all(pool)
    .await?;

    let author_rows = sqlx::query_as::<_, AuthorRow>(
        r#"
        SELECT u.id, u.email, u.username, u.first_name, u.last_name,
               EXISTS(SELECT 1 FROM follows fo
                      WHERE fo.user_id = $2 AND fo.author_id = u.id) AS is_subscribed
        FROM users u
        WHERE u.id = ANY($1)
        "#,
    )
    .bind(&author_ids)
    .bind(viewer)
    .fetch_all(pool)
    .await?;

    let mut tags_by_recipe: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for row in tag_rows {
        tags_by_recipe.entry(row.recipe_id).or_default().push(Tag {
            id: row.id,
            name: row.name,
            color: row.color,
            slug: row.slug,
        });
    }

    let mut ingredients_by_recipe: HashMap<Uuid, Vec<IngredientAmountOut>> = HashMap::new();
    for row in ingredient_rows {
        ingredients_by_recipe
            .entry(row.recipe_id)
            .or_default()
            .push(IngredientAmountOut {
                id: row.id,
                name: row.name,
                measurement_unit: row.measurement_unit,
                amount: row.amount,
            });
    }

    let authors: HashMap<Uuid, UserOut> = author_rows
        .into_iter()
        .map(|row| {
            (
                row.id,
                UserOut {
                    id: row.id,
                    email: row.email,
                    username: row.username,
                    first_name: row.first_name,
                    last_name: row.last_name,
                    is_subscribed: row.is_subscribed,
                },
            )
        })
        .collect();

    let mut outs = Vec::with_capacity(rows.len());
    for row in rows {
        let author = authors
            .get(&row.author_id)
            .cloned()
            .ok_or(AppError::NotFound)?;
        outs.push(RecipeOut {
            id: row.id,
            tags: tags_by_recipe.remove(&row.id).unwrap_or_default(),
            author,
            ingredients: ingredients_by_recipe.remove(&row.id).unwrap_or_default(),
            is_favorited: row.is_favorited,
            is_in_shopping_cart: row.is_in_shopping_cart,
            name: row.name,
            image: row.image,
            text: row.text,
            cooking_time: row.cooking_time,
        });
    }
    Ok(outs)
}

fn validate_cooking_time(cooking_time: i32) -> AppResult<()> {
    if cooking_time < 1 {
        return Err(AppError::BadRequest(
            "Cooking time must be at least 1 minute".to_string(),
        ));
    }
    Ok(())
}

fn validate_ingredients(ingredients: &[IngredientAmountIn]) -> AppResult<()> {
    if ingredients.is_empty() {
        return Err(AppError::BadRequest(
            "Recipe needs at least one ingredient".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for item in ingredients {
        if !seen.insert(item.id) {
            return Err(AppError::BadRequest(
                "Ingredients must not repeat".to_string(),
            ));
        }
        if item.amount < 1 {
            return Err(AppError::BadRequest(
                "Ingredient amount must be at least 1".to_string(),
            ));
        }
    }
    Ok(())
}

fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

async fn ensure_tags_exist(conn: &crate::db::OrmConn, tag_ids: &[Uuid]) -> AppResult<()> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    let found = Tags::find()
        .filter(TagCol::Id.is_in(tag_ids.iter().copied()))
        .count(conn)
        .await?;
    if found as usize != tag_ids.len() {
        return Err(AppError::BadRequest("Unknown tag id".to_string()));
    }
    Ok(())
}

async fn ensure_ingredients_exist(
    conn: &crate::db::OrmConn,
    ingredient_ids: &[Uuid],
) -> AppResult<()> {
    let found = Ingredients::find()
        .filter(IngredientCol::Id.is_in(ingredient_ids.iter().copied()))
        .count(conn)
        .await?;
    if found as usize != ingredient_ids.len() {
        return Err(AppError::BadRequest("Unknown ingredient id".to_string()));
    }
    Ok(())
}

async fn insert_recipe_ingredients<C: ConnectionTrait>(
    conn: &C,
    recipe_id: Uuid,
    ingredients: &[IngredientAmountIn],
) -> AppResult<()> {
    for item in ingredients {
        RecipeIngredientActive {
            id: Set(Uuid::new_v4()),
            recipe_id: Set(recipe_id),
            ingredient_id: Set(item.id),
            amount: Set(item.amount),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

async fn insert_recipe_tags<C: ConnectionTrait>(
    conn: &C,
    recipe_id: Uuid,
    tag_ids: &[Uuid],
) -> AppResult<()> {
    for tag_id in tag_ids {
        RecipeTagActive {
            id: Set(Uuid::new_v4()),
            recipe_id: Set(recipe_id),
            tag_id: Set(*tag_id),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{dedup_ids, validate_cooking_time, validate_ingredients};
    use crate::dto::recipes::IngredientAmountIn;
    use crate::error::AppError;

    fn item(id: Uuid, amount: i32) -> IngredientAmountIn {
        IngredientAmountIn { id, amount }
    }

    #[test]
    fn rejects_empty_ingredient_list() {
        assert!(matches!(
            validate_ingredients(&[]),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_repeated_ingredient_ids() {
        let id = Uuid::new_v4();
        let result = validate_ingredients(&[item(id, 2), item(id, 3)]);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn rejects_non_positive_amounts() {
        let result = validate_ingredients(&[item(Uuid::new_v4(), 0)]);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn accepts_distinct_positive_ingredients() {
        let result = validate_ingredients(&[item(Uuid::new_v4(), 1), item(Uuid::new_v4(), 500)]);
        assert!(result.is_ok());
    }

    #[test]
    fn cooking_time_must_be_positive() {
        assert!(matches!(
            validate_cooking_time(0),
            Err(AppError::BadRequest(_))
        ));
        assert!(validate_cooking_time(1).is_ok());
    }

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dedup_ids(&[a, b, a]), vec![a, b]);
    }
}

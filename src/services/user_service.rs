use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::recipes::RecipeShort,
    dto::users::{SubscriptionList, SubscriptionOut, UserList, UserOut},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    routes::params::{Pagination, SubscriptionsQuery},
};

#[derive(Debug, FromRow)]
struct UserFlagRow {
    id: Uuid,
    email: String,
    username: String,
    first_name: String,
    last_name: String,
    is_subscribed: bool,
}

impl From<UserFlagRow> for UserOut {
    fn from(row: UserFlagRow) -> Self {
        UserOut {
            id: row.id,
            email: row.email,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            is_subscribed: row.is_subscribed,
        }
    }
}

pub async fn list_users(
    pool: &DbPool,
    viewer: Option<Uuid>,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    let (page, limit, offset) = pagination.normalize();
    let rows = sqlx::query_as::<_, UserFlagRow>(
        r#"
        SELECT u.id, u.email, u.username, u.first_name, u.last_name,
               EXISTS(SELECT 1 FROM follows fo
                      WHERE fo.user_id = $1 AND fo.author_id = u.id) AS is_subscribed
        FROM users u
        ORDER BY u.created_at
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(viewer)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let items = rows.into_iter().map(UserOut::from).collect();
    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn get_user(
    pool: &DbPool,
    viewer: Option<Uuid>,
    user_id: Uuid,
) -> AppResult<ApiResponse<UserOut>> {
    let row = fetch_user_row(pool, viewer, user_id).await?;
    Ok(ApiResponse::success("User", UserOut::from(row), None))
}

pub async fn subscribe(
    pool: &DbPool,
    user: &AuthUser,
    author_id: Uuid,
) -> AppResult<ApiResponse<SubscriptionOut>> {
    if author_id == user.user_id {
        return Err(AppError::BadRequest(
            "You cannot follow yourself".to_string(),
        ));
    }
    let author = fetch_user_row(pool, Some(user.user_id), author_id).await?;

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(user.user_id)
            .bind(author_id)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(
            "Already following this user".to_string(),
        ));
    }

    sqlx::query("INSERT INTO follows (id, user_id, author_id) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "follow_add",
        Some("follows"),
        Some(serde_json::json!({ "author_id": author_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let mut subscription = build_subscription(pool, author, DEFAULT_RECIPES_PREVIEW).await?;
    subscription.is_subscribed = true;
    Ok(ApiResponse::success(
        "Subscribed",
        subscription,
        Some(Meta::empty()),
    ))
}

/// Unsubscribing when no follow row exists still succeeds; only an unknown
/// author is an error.
pub async fn unsubscribe(pool: &DbPool, user: &AuthUser, author_id: Uuid) -> AppResult<()> {
    fetch_user_row(pool, None, author_id).await?;

    sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
        .bind(user.user_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "follow_remove",
        Some("follows"),
        Some(serde_json::json!({ "author_id": author_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(())
}

pub async fn subscriptions(
    pool: &DbPool,
    user: &AuthUser,
    query: SubscriptionsQuery,
) -> AppResult<ApiResponse<SubscriptionList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let recipes_limit = query
        .recipes_limit
        .unwrap_or(DEFAULT_RECIPES_PREVIEW)
        .clamp(0, 100);

    let authors = sqlx::query_as::<_, UserFlagRow>(
        r#"
        SELECT u.id, u.email, u.username, u.first_name, u.last_name, TRUE AS is_subscribed
        FROM follows fo
        JOIN users u ON u.id = fo.author_id
        WHERE fo.user_id = $1
        ORDER BY fo.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM follows WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    let mut items = Vec::with_capacity(authors.len());
    for author in authors {
        items.push(build_subscription(pool, author, recipes_limit).await?);
    }

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Subscriptions",
        SubscriptionList { items },
        Some(meta),
    ))
}

const DEFAULT_RECIPES_PREVIEW: i64 = 6;

async fn fetch_user_row(
    pool: &DbPool,
    viewer: Option<Uuid>,
    user_id: Uuid,
) -> AppResult<UserFlagRow> {
    let row = sqlx::query_as::<_, UserFlagRow>(
        r#"
        SELECT u.id, u.email, u.username, u.first_name, u.last_name,
               EXISTS(SELECT 1 FROM follows fo
                      WHERE fo.user_id = $1 AND fo.author_id = u.id) AS is_subscribed
        FROM users u
        WHERE u.id = $2
        "#,
    )
    .bind(viewer)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    row.ok_or(AppError::NotFound)
}

async fn build_subscription(
    pool: &DbPool,
    author: UserFlagRow,
    recipes_limit: i64,
) -> AppResult<SubscriptionOut> {
    let recipes = sqlx::query_as::<_, RecipeShort>(
        r#"
        SELECT id, name, image, cooking_time
        FROM recipes
        WHERE author_id = $1
        ORDER BY pub_date DESC
        LIMIT $2
        "#,
    )
    .bind(author.id)
    .bind(recipes_limit)
    .fetch_all(pool)
    .await?;

    let recipes_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author.id)
        .fetch_one(pool)
        .await?;

    Ok(SubscriptionOut {
        id: author.id,
        email: author.email,
        username: author.username,
        first_name: author.first_name,
        last_name: author.last_name,
        is_subscribed: author.is_subscribed,
        recipes,
        recipes_count: recipes_count.0,
    })
}

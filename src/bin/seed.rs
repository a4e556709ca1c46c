use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_recipes_api::{config::AppConfig, db::create_pool, models::is_valid_hex_color};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let chef_id = ensure_user(&pool, "chef@example.com", "chef", "Carol", "Chef", "chef123").await?;
    let user_id = ensure_user(&pool, "user@example.com", "user", "Uri", "User", "user123").await?;
    seed_tags(&pool).await?;
    seed_ingredients(&pool).await?;

    println!("Seed completed. Chef ID: {chef_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    username: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, username, first_name, last_name, password_hash)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email}");
    Ok(user_id)
}

async fn seed_tags(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let tags = vec![
        ("Breakfast", "#E26C2D", "breakfast"),
        ("Lunch", "#49B64E", "lunch"),
        ("Dinner", "#8775D2", "dinner"),
        ("Dessert", "#F9A62B", "dessert"),
    ];

    for (name, color, slug) in tags {
        if !is_valid_hex_color(color) {
            anyhow::bail!("invalid tag color {color}");
        }
        sqlx::query(
            r#"
            INSERT INTO tags (id, name, color, slug)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(color)
        .bind(slug)
        .execute(pool)
        .await?;
    }

    println!("Seeded tags");
    Ok(())
}

async fn seed_ingredients(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let ingredients = vec![
        ("flour", "g"),
        ("sugar", "g"),
        ("butter", "g"),
        ("milk", "ml"),
        ("egg", "pcs"),
        ("apple", "pcs"),
        ("salt", "g"),
        ("olive oil", "ml"),
    ];

    for (name, unit) in ingredients {
        sqlx::query(
            r#"
            INSERT INTO ingredients (id, name, measurement_unit)
            VALUES ($1, $2, $3)
            ON CONFLICT (name, measurement_unit) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(unit)
        .execute(pool)
        .await?;
    }

    println!("Seeded ingredients");
    Ok(())
}

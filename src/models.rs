use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

/// Tag colors are stored as `#RRGGBB`.
pub fn is_valid_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::is_valid_hex_color;

    #[test]
    fn accepts_six_digit_hex_colors() {
        assert!(is_valid_hex_color("#E26C2D"));
        assert!(is_valid_hex_color("#00ff00"));
    }

    #[test]
    fn rejects_malformed_colors() {
        assert!(!is_valid_hex_color("E26C2D"));
        assert!(!is_valid_hex_color("#E26C2"));
        assert!(!is_valid_hex_color("#E26C2DF"));
        assert!(!is_valid_hex_color("#GGGGGG"));
        assert!(!is_valid_hex_color(""));
    }
}

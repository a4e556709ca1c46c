use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dto::users::UserOut, models::Tag};

#[derive(Debug, Deserialize, ToSchema)]
pub struct IngredientAmountIn {
    pub id: Uuid,
    pub amount: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub ingredients: Vec<IngredientAmountIn>,
    pub tags: Vec<Uuid>,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRecipeRequest {
    pub ingredients: Option<Vec<IngredientAmountIn>>,
    pub tags: Option<Vec<Uuid>>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngredientAmountOut {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeOut {
    pub id: Uuid,
    pub tags: Vec<Tag>,
    pub author: UserOut,
    pub ingredients: Vec<IngredientAmountOut>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Compact form used by favorite/cart responses and subscription previews.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct RecipeShort {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeList {
    pub items: Vec<RecipeOut>,
}

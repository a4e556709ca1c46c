use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        recipes::{
            CreateRecipeRequest, IngredientAmountIn, IngredientAmountOut, RecipeList, RecipeOut,
            RecipeShort, UpdateRecipeRequest,
        },
        users::{SubscriptionList, SubscriptionOut, UserList, UserOut},
    },
    models::{Ingredient, Tag},
    response::{ApiResponse, Meta},
    routes::{auth, health, ingredients, params, recipes, tags, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        users::list_users,
        users::me,
        users::get_user,
        users::subscriptions,
        users::subscribe,
        users::unsubscribe,
        tags::list_tags,
        tags::get_tag,
        ingredients::list_ingredients,
        ingredients::get_ingredient,
        recipes::list_recipes,
        recipes::get_recipe,
        recipes::create_recipe,
        recipes::update_recipe,
        recipes::delete_recipe,
        recipes::add_favorite,
        recipes::remove_favorite,
        recipes::add_to_cart,
        recipes::remove_from_cart,
        recipes::download_shopping_cart
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UserOut,
            UserList,
            SubscriptionOut,
            SubscriptionList,
            Tag,
            Ingredient,
            IngredientAmountIn,
            IngredientAmountOut,
            CreateRecipeRequest,
            UpdateRecipeRequest,
            RecipeOut,
            RecipeShort,
            RecipeList,
            params::Pagination,
            params::RecipeListQuery,
            params::IngredientQuery,
            params::SubscriptionsQuery,
            Meta,
            ApiResponse<UserOut>,
            ApiResponse<RecipeOut>,
            ApiResponse<RecipeList>,
            ApiResponse<RecipeShort>,
            ApiResponse<SubscriptionList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Users", description = "User and subscription endpoints"),
        (name = "Tags", description = "Tag catalog"),
        (name = "Ingredients", description = "Ingredient catalog"),
        (name = "Recipes", description = "Recipe endpoints"),
        (name = "Favorites", description = "Favorite toggles"),
        (name = "Cart", description = "Shopping cart endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

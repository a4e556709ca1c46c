use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecipeListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub author: Option<Uuid>,
    /// Comma-separated tag slugs; a recipe matches if it carries any of them.
    pub tags: Option<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

impl RecipeListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn tag_slugs(&self) -> Option<Vec<String>> {
        let slugs: Vec<String> = self
            .tags
            .as_deref()?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if slugs.is_empty() { None } else { Some(slugs) }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IngredientQuery {
    /// Name prefix filter.
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscriptionsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub recipes_limit: Option<i64>,
}

impl SubscriptionsQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Pagination, RecipeListQuery};

    #[test]
    fn normalize_clamps_page_and_size() {
        let pagination = Pagination {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(pagination.normalize(), (1, 100, 0));
    }

    #[test]
    fn normalize_defaults() {
        let pagination = Pagination {
            page: None,
            per_page: None,
        };
        assert_eq!(pagination.normalize(), (1, 20, 0));
    }

    #[test]
    fn tag_slugs_splits_and_drops_empty_entries() {
        let query = RecipeListQuery {
            page: None,
            per_page: None,
            author: None,
            tags: Some("breakfast, dinner,,".to_string()),
            is_favorited: None,
            is_in_shopping_cart: None,
        };
        assert_eq!(
            query.tag_slugs(),
            Some(vec!["breakfast".to_string(), "dinner".to_string()])
        );
    }

    #[test]
    fn tag_slugs_empty_is_none() {
        let query = RecipeListQuery {
            page: None,
            per_page: None,
            author: None,
            tags: Some(" , ".to_string()),
            is_favorited: None,
            is_in_shopping_cart: None,
        };
        assert_eq!(query.tag_slugs(), None);
    }
}

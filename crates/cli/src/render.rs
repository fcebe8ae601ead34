//! Text rendering of view state with askama templates.

use askama::Template;

use shopkeep_client::views::{CatalogView, ProfileView};

/// One row of the category list.
pub struct CategoryRow {
    pub id: String,
    pub name: String,
}

/// One row of the product table.
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub price: String,
    pub stock: String,
    pub category: String,
}

#[derive(Template)]
#[template(path = "catalog.txt")]
pub struct CatalogTemplate {
    pub filter: String,
    pub categories: Vec<CategoryRow>,
    pub products: Vec<ProductRow>,
    pub notice: Option<String>,
}

impl CatalogTemplate {
    pub fn from_view(view: &CatalogView) -> Self {
        Self {
            filter: view.filter().to_string(),
            categories: view
                .categories()
                .iter()
                .map(|c| CategoryRow {
                    id: c.id.to_string(),
                    name: c.name.clone(),
                })
                .collect(),
            products: view
                .products()
                .iter()
                .map(|p| ProductRow {
                    id: p.id.to_string(),
                    name: p.name.clone(),
                    price: p.price.to_string(),
                    stock: p.stock.map_or_else(|| "-".to_owned(), |s| s.to_string()),
                    category: view.category_name(p).unwrap_or("-").to_owned(),
                })
                .collect(),
            notice: view.notice().map(str::to_owned),
        }
    }
}

#[derive(Template)]
#[template(path = "profile.txt")]
pub struct ProfileTemplate {
    pub username: String,
    pub email: String,
    pub bio: String,
    pub member_since: String,
    pub notice: Option<String>,
}

impl ProfileTemplate {
    pub fn from_view(view: &ProfileView) -> Self {
        let profile = view.profile();
        Self {
            username: profile.map(|p| p.username.clone()).unwrap_or_default(),
            email: profile.map(|p| p.email.clone()).unwrap_or_default(),
            bio: view.bio_display().to_owned(),
            member_since: view.created_at_display().unwrap_or_else(|| "-".to_owned()),
            notice: view.notice().map(str::to_owned),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_renders_rows() {
        let template = CatalogTemplate {
            filter: "All".to_owned(),
            categories: vec![CategoryRow {
                id: "1".to_owned(),
                name: "Kitchen".to_owned(),
            }],
            products: vec![ProductRow {
                id: "7".to_owned(),
                name: "Mug".to_owned(),
                price: "$4.50".to_owned(),
                stock: "10".to_owned(),
                category: "Kitchen".to_owned(),
            }],
            notice: None,
        };
        let text = template.render().unwrap();
        assert!(text.contains("Kitchen"));
        assert!(text.contains("$4.50"));
        assert!(text.contains("Mug"));
    }

    #[test]
    fn test_catalog_renders_empty_state_and_notice() {
        let template = CatalogTemplate {
            filter: "3".to_owned(),
            categories: vec![],
            products: vec![],
            notice: Some("Request failed".to_owned()),
        };
        let text = template.render().unwrap();
        assert!(text.contains("No products"));
        assert!(text.contains("Request failed"));
    }

    #[test]
    fn test_profile_renders_fields() {
        let template = ProfileTemplate {
            username: "ada".to_owned(),
            email: "ada@example.com".to_owned(),
            bio: "Add Something Here".to_owned(),
            member_since: "2024-03-05".to_owned(),
            notice: None,
        };
        let text = template.render().unwrap();
        assert!(text.contains("ada@example.com"));
        assert!(text.contains("2024-03-05"));
    }
}

//! Wire types for the storefront backend.
//!
//! Response types only implement `Deserialize`; request payloads are
//! separate `Serialize` types holding exactly the fields the backend accepts.

use core::fmt;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use shopkeep_core::{CategoryId, Email, Price, ProductId, Stock, Username};

// =============================================================================
// Auth
// =============================================================================

/// Body returned by `/auth/login` and `/auth/register`.
#[derive(Deserialize)]
pub(crate) struct AccessTokenResponse {
    pub access_token: String,
}

impl From<AccessTokenResponse> for SecretString {
    fn from(response: AccessTokenResponse) -> Self {
        Self::from(response.access_token)
    }
}

/// `POST /auth/login` body. Exactly one of `email`/`username` is set.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
    pub password: &'a str,
}

/// `POST /auth/register` body.
#[derive(Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// The category embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryRef {
    pub name: String,
}

/// A product as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub stock: Option<Stock>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
}

impl Product {
    /// Name of the product's category, if the backend embedded it.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }
}

/// `POST /categories` body.
#[derive(Debug, Serialize)]
pub(crate) struct CategoryInput<'a> {
    pub name: &'a str,
}

/// A validated product, ready to send to `POST /products` or
/// `PATCH /products/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: Stock,
    pub category_id: CategoryId,
}

/// Which products to list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    /// Every product (the "All" entry).
    #[default]
    All,
    /// Only products in one category.
    Category(CategoryId),
}

impl CategoryFilter {
    /// Sentinel value meaning "no filter".
    pub const ALL: &'static str = "All";

    /// Interpret user input: empty, `All` (any case) or `none` mean unfiltered.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case(Self::ALL) || s.eq_ignore_ascii_case("none") {
            Self::All
        } else {
            Self::Category(CategoryId::from(s))
        }
    }

    /// The `categoryId` query value, if any.
    #[must_use]
    pub const fn category_id(&self) -> Option<&CategoryId> {
        match self {
            Self::All => None,
            Self::Category(id) => Some(id),
        }
    }
}

impl From<Option<CategoryId>> for CategoryFilter {
    fn from(id: Option<CategoryId>) -> Self {
        id.map_or(Self::All, Self::Category)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(Self::ALL),
            Self::Category(id) => write!(f, "{id}"),
        }
    }
}

// =============================================================================
// Profile
// =============================================================================

/// The signed-in user's profile.
///
/// Deliberately not `Serialize`: the only way to write a profile back is
/// [`ProfileUpdate`], which has no `createdAt`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, alias = "name")]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// `PATCH /user` body: the user-editable profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub username: Username,
    pub email: Email,
    pub bio: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_full_shape() {
        let product: Product = serde_json::from_value(json!({
            "id": 1,
            "name": "Cable",
            "description": "USB-C",
            "price": 9.5,
            "stock": 12,
            "categoryId": 3,
            "category": { "name": "Electronics" }
        }))
        .unwrap();
        assert_eq!(product.price, Price::from_cents(950));
        assert_eq!(product.stock, Some(Stock::new(12)));
        assert_eq!(product.category_id, Some(CategoryId::from(3)));
        assert_eq!(product.category_name(), Some("Electronics"));
    }

    #[test]
    fn test_product_minimal_shape() {
        let product: Product =
            serde_json::from_value(json!({ "id": "p1", "name": "Mug", "price": 4 })).unwrap();
        assert!(product.description.is_none());
        assert!(product.stock.is_none());
        assert!(product.category_name().is_none());
    }

    #[test]
    fn test_product_input_wire_format() {
        let input = ProductInput {
            name: "Mug".to_owned(),
            description: String::new(),
            price: Price::parse("4.25").unwrap(),
            stock: Stock::new(3),
            category_id: CategoryId::from(2),
        };
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({
                "name": "Mug",
                "description": "",
                "price": 4.25,
                "stock": 3,
                "categoryId": 2
            })
        );
    }

    #[test]
    fn test_category_filter_parse() {
        assert_eq!(CategoryFilter::parse("All"), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse("all"), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse(""), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse("none"), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::parse("4"),
            CategoryFilter::Category(CategoryId::from(4))
        );
    }

    #[test]
    fn test_profile_accepts_name_alias() {
        let profile: UserProfile = serde_json::from_value(json!({
            "name": "ada",
            "email": "ada@example.com",
            "createdAt": "2024-03-05T10:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(profile.username, "ada");
        assert!(profile.bio.is_none());
        assert!(profile.created_at.is_some());
    }

    #[test]
    fn test_profile_update_has_no_created_at() {
        let update = ProfileUpdate {
            username: Username::parse("ada").unwrap(),
            email: Email::parse("ada@example.com").unwrap(),
            bio: "hi".to_owned(),
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(
            value,
            json!({ "username": "ada", "email": "ada@example.com", "bio": "hi" })
        );
        assert!(value.get("createdAt").is_none());
    }

    #[test]
    fn test_login_request_omits_unused_identifier() {
        let body = LoginRequest {
            email: Some("a@b.com"),
            username: None,
            password: "secret1",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "email": "a@b.com", "password": "secret1" })
        );
    }
}

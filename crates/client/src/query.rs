//! Query cache with mutation-driven invalidation.
//!
//! Reads go through [`QueryClient`], which keeps the last answer for each
//! [`QueryKey`] in a `moka` cache. Writes go through [`QueryClient::mutate`]:
//! once the backend confirms a [`Mutation`], every cached query in the scopes
//! it touches is dropped so the next read re-fetches.

use std::future::Future;
use std::sync::Arc;

use moka::future::Cache;
use tracing::debug;

use crate::api::{ApiClient, ApiError, Category, CategoryFilter, Product, UserProfile};
use crate::config::ClientConfig;

/// Cache key for backend reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum QueryKey {
    Categories,
    Products(CategoryFilter),
    Profile,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum QueryValue {
    Categories(Arc<Vec<Category>>),
    Products(Arc<Vec<Product>>),
    Profile(Box<UserProfile>),
}

/// A family of cache keys that a mutation can invalidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope {
    Categories,
    /// Every product list, whatever its filter.
    Products,
    Profile,
}

impl QueryScope {
    /// Whether `key` belongs to this scope.
    #[must_use]
    pub const fn matches(self, key: &QueryKey) -> bool {
        matches!(
            (self, key),
            (Self::Categories, QueryKey::Categories)
                | (Self::Products, QueryKey::Products(_))
                | (Self::Profile, QueryKey::Profile)
        )
    }
}

/// A write against the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CreateCategory,
    DeleteCategory,
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    UpdateProfile,
}

impl Mutation {
    /// Scopes made stale by this mutation.
    ///
    /// Deleting a category deletes its products on the backend, so it
    /// invalidates product lists too.
    #[must_use]
    pub const fn invalidates(self) -> &'static [QueryScope] {
        match self {
            Self::CreateCategory => &[QueryScope::Categories],
            Self::DeleteCategory => &[QueryScope::Categories, QueryScope::Products],
            Self::CreateProduct | Self::UpdateProduct | Self::DeleteProduct => {
                &[QueryScope::Products]
            }
            Self::UpdateProfile => &[QueryScope::Profile],
        }
    }
}

/// Cached read access to the backend.
#[derive(Clone)]
pub struct QueryClient {
    api: ApiClient,
    cache: Cache<QueryKey, QueryValue>,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("api", &self.api)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl QueryClient {
    /// Create a query client over `api`, caching for `config.cache_ttl`.
    #[must_use]
    pub fn new(config: &ClientConfig, api: ApiClient) -> Self {
        let cache = Cache::builder()
            .max_capacity(256)
            .time_to_live(config.cache_ttl)
            .build();
        Self { api, cache }
    }

    /// The underlying API client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, ApiError> {
        if let Some(QueryValue::Categories(categories)) =
            self.cache.get(&QueryKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories = Arc::new(self.api.list_categories().await?);
        self.cache
            .insert(
                QueryKey::Categories,
                QueryValue::Categories(Arc::clone(&categories)),
            )
            .await;
        Ok(categories)
    }

    /// Products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub async fn products(&self, filter: &CategoryFilter) -> Result<Arc<Vec<Product>>, ApiError> {
        let key = QueryKey::Products(filter.clone());
        if let Some(QueryValue::Products(products)) = self.cache.get(&key).await {
            debug!(%filter, "Cache hit for products");
            return Ok(products);
        }

        let products = Arc::new(self.api.list_products(filter).await?);
        self.cache
            .insert(key, QueryValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// The signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no session or the backend cannot be read.
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        if let Some(QueryValue::Profile(profile)) = self.cache.get(&QueryKey::Profile).await {
            debug!("Cache hit for profile");
            return Ok(*profile);
        }

        let profile = self.api.get_profile().await?;
        self.cache
            .insert(QueryKey::Profile, QueryValue::Profile(Box::new(profile.clone())))
            .await;
        Ok(profile)
    }

    /// Run a write and, if it succeeds, invalidate what it made stale.
    ///
    /// A failed write leaves the cache untouched.
    ///
    /// # Errors
    ///
    /// Returns the write's own error.
    pub async fn mutate<T, F>(&self, mutation: Mutation, write: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let value = write.await?;
        self.invalidate(mutation.invalidates()).await;
        Ok(value)
    }

    /// Drop every cached query in `scopes`.
    pub async fn invalidate(&self, scopes: &[QueryScope]) {
        let stale: Vec<QueryKey> = self
            .cache
            .iter()
            .map(|(key, _)| key)
            .filter(|key| scopes.iter().any(|scope| scope.matches(key)))
            .map(|key| (*key).clone())
            .collect();

        debug!(?scopes, count = stale.len(), "Invalidating cached queries");
        for key in &stale {
            self.cache.invalidate(key).await;
        }
    }

    /// Drop every cached query (on login and logout).
    pub fn clear(&self) {
        debug!("Clearing query cache");
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use url::Url;

    use super::*;
    use crate::session::{MemoryTokenStore, Session};

    use shopkeep_core::{CategoryId, Price};

    fn client() -> QueryClient {
        let config = ClientConfig::new(
            Url::parse("http://127.0.0.1:9").unwrap(),
            PathBuf::from("unused"),
        );
        let session = Session::open(Arc::new(MemoryTokenStore::new())).unwrap();
        QueryClient::new(&config, ApiClient::new(&config, session).unwrap())
    }

    fn product(id: i64) -> Product {
        Product {
            id: id.into(),
            name: format!("p{id}"),
            description: None,
            price: Price::from_cents(100),
            stock: None,
            category_id: None,
            category: None,
        }
    }

    async fn seed(queries: &QueryClient) {
        queries
            .cache
            .insert(QueryKey::Categories, QueryValue::Categories(Arc::new(vec![])))
            .await;
        queries
            .cache
            .insert(
                QueryKey::Products(CategoryFilter::All),
                QueryValue::Products(Arc::new(vec![product(1)])),
            )
            .await;
        queries
            .cache
            .insert(
                QueryKey::Products(CategoryFilter::Category(CategoryId::from(7))),
                QueryValue::Products(Arc::new(vec![])),
            )
            .await;
    }

    #[test]
    fn test_invalidation_table() {
        assert_eq!(
            Mutation::DeleteCategory.invalidates(),
            &[QueryScope::Categories, QueryScope::Products]
        );
        assert_eq!(Mutation::CreateCategory.invalidates(), &[QueryScope::Categories]);
        assert_eq!(Mutation::UpdateProduct.invalidates(), &[QueryScope::Products]);
        assert_eq!(Mutation::UpdateProfile.invalidates(), &[QueryScope::Profile]);
    }

    #[test]
    fn test_products_scope_ignores_filter() {
        assert!(QueryScope::Products.matches(&QueryKey::Products(CategoryFilter::All)));
        assert!(QueryScope::Products.matches(&QueryKey::Products(CategoryFilter::Category(
            CategoryId::from(1)
        ))));
        assert!(!QueryScope::Products.matches(&QueryKey::Categories));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_backend() {
        let queries = client();
        seed(&queries).await;
        // The backend address is unreachable, so this must be served from cache.
        let products = queries.products(&CategoryFilter::All).await.unwrap();
        assert_eq!(products.len(), 1);
    }

    #[tokio::test]
    async fn test_successful_mutation_invalidates_every_product_list() {
        let queries = client();
        seed(&queries).await;

        queries
            .mutate(Mutation::DeleteCategory, async { Ok(()) })
            .await
            .unwrap();

        assert!(queries.cache.get(&QueryKey::Categories).await.is_none());
        assert!(
            queries
                .cache
                .get(&QueryKey::Products(CategoryFilter::All))
                .await
                .is_none()
        );
        assert!(
            queries
                .cache
                .get(&QueryKey::Products(CategoryFilter::Category(CategoryId::from(7))))
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_cache() {
        let queries = client();
        seed(&queries).await;

        let result: Result<(), ApiError> = queries
            .mutate(Mutation::CreateProduct, async {
                Err(ApiError::Backend {
                    status: 400,
                    message: None,
                })
            })
            .await;

        assert!(result.is_err());
        assert!(
            queries
                .cache
                .get(&QueryKey::Products(CategoryFilter::All))
                .await
                .is_some()
        );
    }
}

//! Catalog screen: categories, the product table and their forms.
//!
//! The catalog never patches its lists locally. After every successful write
//! the affected queries are invalidated and the lists re-fetched, so what is
//! displayed is always what the backend last returned.
//!
//! Product lists are fetched under a request generation: a response is only
//! applied if no newer product request was started in the meantime.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use shopkeep_core::{CategoryId, Price, ProductId, Stock};

use crate::api::{ApiError, Category, CategoryFilter, Product, ProductInput};
use crate::error::{Field, FieldErrors, ViewError};
use crate::query::{Mutation, QueryClient};
use crate::routing::Route;
use crate::state::AppContext;

use super::{Confirm, REQUEST_FAILED};

/// Warning shown before deleting a category.
pub const CATEGORY_DELETE_WARNING: &str =
    "Deleting this category will also delete all of its products. Continue?";

/// Warning shown before deleting a product.
pub const PRODUCT_DELETE_WARNING: &str = "Are you sure you want to delete this product?";

// =============================================================================
// Product form
// =============================================================================

/// Raw product form input, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    /// Category id, empty when none is selected.
    pub category: String,
}

impl ProductForm {
    /// Prefill the form from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.to_input(),
            stock: product.stock.map(|s| s.to_string()).unwrap_or_default(),
            category: product
                .category_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }

    /// Parse the form into a request payload.
    ///
    /// The category is looked up in `categories` so the payload carries the
    /// id exactly as the backend returned it; unknown input is sent as typed.
    ///
    /// # Errors
    ///
    /// Returns every field that failed to parse.
    pub fn validate(&self, categories: &[Category]) -> Result<ProductInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.insert(Field::Name, "Name is required");
        }
        let price = errors.check(Field::Price, Price::parse(&self.price));
        let stock = errors.check(Field::Stock, Stock::parse(&self.stock));
        let category = self.category.trim();
        if category.is_empty() {
            errors.insert(Field::Category, "Select a category");
        }

        match (price, stock) {
            (Some(price), Some(stock)) if errors.is_empty() => Ok(ProductInput {
                name: name.to_owned(),
                description: self.description.trim().to_owned(),
                price,
                stock,
                category_id: categories
                    .iter()
                    .find(|c| c.id.reads_as(category))
                    .map_or_else(|| CategoryId::from(category), |c| c.id.clone()),
            }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Product requests
// =============================================================================

/// A product list fetch started by [`CatalogView::begin_products`].
#[derive(Debug, Clone)]
pub struct ProductsRequest {
    generation: u64,
    filter: CategoryFilter,
}

impl ProductsRequest {
    /// The filter this request was started for.
    #[must_use]
    pub const fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    /// Fetch the products. Does not touch the view, so several requests can
    /// be in flight at once.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub async fn run(&self, queries: &QueryClient) -> Result<Arc<Vec<Product>>, ApiError> {
        queries.products(&self.filter).await
    }
}

// =============================================================================
// CatalogView
// =============================================================================

/// The catalog screen.
#[derive(Debug)]
pub struct CatalogView {
    ctx: AppContext,
    categories: Arc<Vec<Category>>,
    products: Arc<Vec<Product>>,
    filter: CategoryFilter,
    notice: Option<String>,
    field_errors: FieldErrors,
    generation: u64,
}

impl CatalogView {
    /// Enter the catalog and load both lists.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Redirected` without a session or when the session
    /// is rejected. Other load failures are left in [`CatalogView::notice`].
    pub async fn open(ctx: AppContext) -> Result<Self, ViewError> {
        Self::open_filtered(ctx, CategoryFilter::All).await
    }

    /// Enter the catalog with an initial category filter.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Redirected` without a session or when the session
    /// is rejected. Other load failures are left in [`CatalogView::notice`].
    pub async fn open_filtered(ctx: AppContext, filter: CategoryFilter) -> Result<Self, ViewError> {
        ctx.enter(Route::Catalog)?;
        let mut view = Self {
            ctx,
            categories: Arc::default(),
            products: Arc::default(),
            filter,
            notice: None,
            field_errors: FieldErrors::new(),
            generation: 0,
        };
        // A failed first load still opens the screen, with the message as notice.
        match view.refresh().await {
            Err(ViewError::Redirected(route)) => Err(ViewError::Redirected(route)),
            _ => Ok(view),
        }
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub const fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    /// The last user-facing message, if any.
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Messages from the last product form validation.
    #[must_use]
    pub const fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    /// The category a product belongs to, by embedded name or by id.
    #[must_use]
    pub fn category_name<'a>(&'a self, product: &'a Product) -> Option<&'a str> {
        product.category_name().or_else(|| {
            let id = product.category_id.as_ref()?;
            self.categories
                .iter()
                .find(|c| &c.id == id)
                .map(|c| c.name.as_str())
        })
    }

    /// The listed category whose id is written as `input`.
    #[must_use]
    pub fn find_category(&self, input: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id.reads_as(input))
    }

    /// The listed product whose id is written as `input`.
    #[must_use]
    pub fn find_product(&self, input: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id.reads_as(input))
    }

    /// A form prefilled from the listed product with `id`.
    #[must_use]
    pub fn product_form_for(&self, id: &ProductId) -> Option<ProductForm> {
        self.products
            .iter()
            .find(|p| &p.id == id)
            .map(ProductForm::from_product)
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Start a product fetch for the current filter. Any request started
    /// earlier becomes stale.
    pub fn begin_products(&mut self) -> ProductsRequest {
        self.generation += 1;
        ProductsRequest {
            generation: self.generation,
            filter: self.filter.clone(),
        }
    }

    /// Apply the outcome of a product fetch.
    ///
    /// Returns `Ok(false)` when the request was superseded and its outcome
    /// was dropped.
    ///
    /// # Errors
    ///
    /// Returns the settled error when the current request failed. The
    /// displayed list is left unchanged.
    pub fn apply_products(
        &mut self,
        request: &ProductsRequest,
        result: Result<Arc<Vec<Product>>, ApiError>,
    ) -> Result<bool, ViewError> {
        if request.generation != self.generation {
            debug!(
                stale = request.generation,
                current = self.generation,
                "Dropping stale product response"
            );
            return Ok(false);
        }

        match result {
            Ok(products) => {
                self.products = products;
                Ok(true)
            }
            Err(e) => Err(self.fail(&e, REQUEST_FAILED)),
        }
    }

    /// Re-read categories and products (served from cache when still fresh).
    ///
    /// # Errors
    ///
    /// Returns the settled error of the first failed read.
    #[instrument(skip(self), fields(filter = %self.filter))]
    pub async fn refresh(&mut self) -> Result<(), ViewError> {
        match self.ctx.queries().categories().await {
            Ok(categories) => self.categories = categories,
            Err(e) => return Err(self.fail(&e, REQUEST_FAILED)),
        }
        self.filter = self.resolve_filter(self.filter.clone());

        let request = self.begin_products();
        let result = request.run(self.ctx.queries()).await;
        self.apply_products(&request, result).map(drop)
    }

    /// Show only products in one category (or all of them).
    ///
    /// # Errors
    ///
    /// Returns the settled error if the products cannot be read.
    pub async fn select_category(&mut self, filter: CategoryFilter) -> Result<(), ViewError> {
        self.filter = self.resolve_filter(filter);
        let request = self.begin_products();
        let result = request.run(self.ctx.queries()).await;
        self.apply_products(&request, result).map(drop)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Add a category.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Invalid` for a blank name (no request is sent),
    /// `ViewError::Redirected` without a session, or `ViewError::Failed`.
    #[instrument(skip(self))]
    pub async fn create_category(&mut self, name: &str) -> Result<(), ViewError> {
        let name = name.trim();
        if name.is_empty() {
            let mut errors = FieldErrors::new();
            errors.insert(Field::Name, "Category name is required");
            self.field_errors = errors.clone();
            return Err(ViewError::Invalid(errors));
        }
        self.field_errors = FieldErrors::new();

        let api = self.ctx.api().clone();
        self.write(Mutation::CreateCategory, api.create_category(name))
            .await?;
        info!(name, "Category created");
        self.refresh().await
    }

    /// Delete a category, and with it all of its products, after the user
    /// confirms [`CATEGORY_DELETE_WARNING`].
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Cancelled` if the user declines (nothing changes),
    /// `ViewError::Redirected` without a session, or `ViewError::Failed`.
    #[instrument(skip(self, confirm), fields(id = %id))]
    pub async fn delete_category<C>(&mut self, id: &CategoryId, confirm: &C) -> Result<(), ViewError>
    where
        C: Confirm + ?Sized,
    {
        if !confirm.confirm(CATEGORY_DELETE_WARNING) {
            debug!("Category delete declined");
            return Err(ViewError::Cancelled);
        }

        let api = self.ctx.api().clone();
        self.write(Mutation::DeleteCategory, api.delete_category(id))
            .await?;
        info!("Category deleted");

        if self
            .filter
            .category_id()
            .is_some_and(|current| current.reads_as(&id.to_string()))
        {
            self.filter = CategoryFilter::All;
        }
        self.refresh().await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Add a product from form input.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Invalid` when a field does not parse (no request
    /// is sent), `ViewError::Redirected` without a session, or
    /// `ViewError::Failed`.
    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn create_product(&mut self, form: &ProductForm) -> Result<(), ViewError> {
        let input = self.validate(form)?;
        let api = self.ctx.api().clone();
        self.write(Mutation::CreateProduct, api.create_product(&input))
            .await?;
        info!("Product created");
        self.refresh().await
    }

    /// Replace a product's fields from form input.
    ///
    /// # Errors
    ///
    /// Same as [`CatalogView::create_product`].
    #[instrument(skip(self, form), fields(id = %id))]
    pub async fn update_product(&mut self, id: &ProductId, form: &ProductForm) -> Result<(), ViewError> {
        let input = self.validate(form)?;
        let api = self.ctx.api().clone();
        self.write(Mutation::UpdateProduct, api.update_product(id, &input))
            .await?;
        info!("Product updated");
        self.refresh().await
    }

    /// Delete a product after the user confirms [`PRODUCT_DELETE_WARNING`].
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Cancelled` if the user declines,
    /// `ViewError::Redirected` without a session, or `ViewError::Failed`.
    #[instrument(skip(self, confirm), fields(id = %id))]
    pub async fn delete_product<C>(&mut self, id: &ProductId, confirm: &C) -> Result<(), ViewError>
    where
        C: Confirm + ?Sized,
    {
        if !confirm.confirm(PRODUCT_DELETE_WARNING) {
            debug!("Product delete declined");
            return Err(ViewError::Cancelled);
        }

        let api = self.ctx.api().clone();
        self.write(Mutation::DeleteProduct, api.delete_product(id))
            .await?;
        info!("Product deleted");
        self.refresh().await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Swap a typed category id for the listed one it names.
    fn resolve_filter(&self, filter: CategoryFilter) -> CategoryFilter {
        match filter {
            CategoryFilter::Category(id) => {
                let typed = id.to_string();
                self.find_category(&typed)
                    .map_or(CategoryFilter::Category(id), |c| {
                        CategoryFilter::Category(c.id.clone())
                    })
            }
            CategoryFilter::All => CategoryFilter::All,
        }
    }

    fn validate(&mut self, form: &ProductForm) -> Result<ProductInput, ViewError> {
        match form.validate(&self.categories) {
            Ok(input) => {
                self.field_errors = FieldErrors::new();
                Ok(input)
            }
            Err(errors) => {
                self.field_errors = errors.clone();
                Err(ViewError::Invalid(errors))
            }
        }
    }

    /// Run a write through the query layer, settling any failure.
    async fn write<T, F>(&mut self, mutation: Mutation, write: F) -> Result<T, ViewError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        self.notice = None;
        let queries = self.ctx.queries().clone();
        queries
            .mutate(mutation, write)
            .await
            .map_err(|e| self.fail(&e, REQUEST_FAILED))
    }

    fn fail(&mut self, err: &ApiError, fallback: &str) -> ViewError {
        let outcome = self.ctx.settle(err, fallback);
        if let ViewError::Failed(message) = &outcome {
            self.notice = Some(message.clone());
        }
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            name: " Mug ".to_owned(),
            description: "Ceramic".to_owned(),
            price: "4.50".to_owned(),
            stock: "10".to_owned(),
            category: "2".to_owned(),
        }
    }

    #[test]
    fn test_valid_form() {
        let input = form().validate(&[]).unwrap();
        assert_eq!(input.name, "Mug");
        assert_eq!(input.price, Price::from_cents(450));
        assert_eq!(input.stock, Stock::new(10));
        assert_eq!(input.category_id, CategoryId::from(2));
    }

    #[test]
    fn test_non_numeric_price_and_stock_rejected() {
        let mut form = form();
        form.price = "abc".to_owned();
        form.stock = "ten".to_owned();
        let errors = form.validate(&[]).unwrap_err();
        assert_eq!(errors.get(Field::Price), Some("Price must be a number"));
        assert_eq!(errors.get(Field::Stock), Some("Stock must be a whole number"));
    }

    #[test]
    fn test_category_and_name_required() {
        let form = ProductForm {
            price: "1".to_owned(),
            stock: "1".to_owned(),
            ..ProductForm::default()
        };
        let errors = form.validate(&[]).unwrap_err();
        assert_eq!(errors.get(Field::Category), Some("Select a category"));
        assert_eq!(errors.get(Field::Name), Some("Name is required"));
    }

    #[test]
    fn test_category_resolves_to_listed_wire_id() {
        let categories: Vec<Category> =
            serde_json::from_str(r#"[{"id":"2","name":"Garden"},{"id":"7","name":"Tools"}]"#)
                .unwrap();
        let input = form().validate(&categories).unwrap();
        assert_eq!(input.category_id, categories[0].id);
        assert_eq!(
            serde_json::to_value(&input).unwrap()["categoryId"],
            serde_json::json!("2")
        );
    }

    #[test]
    fn test_prefill_from_product() {
        let product = Product {
            id: ProductId::from(5),
            name: "Cable".to_owned(),
            description: None,
            price: Price::from_cents(950),
            stock: Some(Stock::new(3)),
            category_id: Some(CategoryId::from(1)),
            category: None,
        };
        let form = ProductForm::from_product(&product);
        assert_eq!(form.price, "9.50");
        assert_eq!(form.stock, "3");
        assert_eq!(form.category, "1");
        assert_eq!(form.validate(&[]).unwrap().price, product.price);
    }
}

//! Catalog commands: listing, categories and products.

use askama::Template;

use shopkeep_client::AppContext;
use shopkeep_client::api::CategoryFilter;
use shopkeep_client::views::{CatalogView, ProductForm};
use super::{CliError, StdinConfirm, emit};
use crate::render::CatalogTemplate;

/// Product fields given on the command line; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct ProductEdits {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub stock: Option<String>,
    pub category: Option<String>,
}

impl ProductEdits {
    fn apply(self, form: &mut ProductForm) {
        let Self {
            name,
            description,
            price,
            stock,
            category,
        } = self;
        for (slot, value) in [
            (&mut form.name, name),
            (&mut form.description, description),
            (&mut form.price, price),
            (&mut form.stock, stock),
            (&mut form.category, category),
        ] {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

/// Flags an edit must supply because the product has no current value for them.
fn unfilled_flags(form: &ProductForm) -> Vec<&'static str> {
    [("--stock", &form.stock), ("--category", &form.category)]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(flag, _)| flag)
        .collect()
}

fn render(view: &CatalogView) -> Result<(), CliError> {
    emit(&CatalogTemplate::from_view(view).render()?)
}

/// Show categories and products, optionally filtered.
pub async fn show(ctx: &AppContext, category: &str) -> Result<(), CliError> {
    let view = CatalogView::open_filtered(ctx.clone(), CategoryFilter::parse(category)).await?;
    render(&view)
}

/// Add a category.
pub async fn add_category(ctx: &AppContext, name: &str) -> Result<(), CliError> {
    let mut view = CatalogView::open(ctx.clone()).await?;
    view.create_category(name).await?;
    render(&view)
}

/// Delete a category (and its products) after confirmation.
pub async fn delete_category(ctx: &AppContext, id: &str, yes: bool) -> Result<(), CliError> {
    let mut view = CatalogView::open(ctx.clone()).await?;
    let id = view
        .find_category(id)
        .map(|c| c.id.clone())
        .ok_or_else(|| CliError::NotFound(format!("category {id}")))?;
    view.delete_category(&id, &StdinConfirm::new(yes)).await?;
    render(&view)
}

/// Add a product.
pub async fn add_product(ctx: &AppContext, edits: ProductEdits) -> Result<(), CliError> {
    let mut view = CatalogView::open(ctx.clone()).await?;
    let mut form = ProductForm::default();
    edits.apply(&mut form);
    view.create_product(&form).await?;
    render(&view)
}

/// Edit a listed product.
pub async fn edit_product(ctx: &AppContext, id: &str, edits: ProductEdits) -> Result<(), CliError> {
    let mut view = CatalogView::open(ctx.clone()).await?;
    let product = view
        .find_product(id)
        .ok_or_else(|| CliError::NotFound(format!("product {id}")))?;
    let id = product.id.clone();
    let mut form = ProductForm::from_product(product);
    edits.apply(&mut form);
    let unfilled = unfilled_flags(&form);
    if !unfilled.is_empty() {
        return Err(CliError::MissingFlags {
            item: format!("product {id}"),
            flags: unfilled.join(", "),
        });
    }
    view.update_product(&id, &form).await?;
    render(&view)
}

/// Delete a product after confirmation.
pub async fn delete_product(ctx: &AppContext, id: &str, yes: bool) -> Result<(), CliError> {
    let mut view = CatalogView::open(ctx.clone()).await?;
    let id = view
        .find_product(id)
        .map(|p| p.id.clone())
        .ok_or_else(|| CliError::NotFound(format!("product {id}")))?;
    view.delete_product(&id, &StdinConfirm::new(yes)).await?;
    render(&view)
}

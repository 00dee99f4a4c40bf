//! Catalogue commands.

use std::fmt::Write;

use mambini_core::{Price, ProductId};
use mambini_storefront::AppState;
use mambini_storefront::api::Product;
use mambini_storefront::error::Result;

fn join_or_dash(values: &[String]) -> String {
    if values.is_empty() {
        "-".to_string()
    } else {
        values.join(", ")
    }
}

/// One line per product.
#[must_use]
pub fn render_list(products: &[Product], state: &AppState) -> String {
    if products.is_empty() {
        return "No products found".to_string();
    }

    let currency = state.config().currency;
    products
        .iter()
        .map(|p| {
            let stock = if p.is_in_stock() {
                format!("{} in stock", p.stock)
            } else {
                "out of stock".to_string()
            };
            format!(
                "{:<26} {:<28} {:>9}  {}",
                p.id.as_str(),
                p.name,
                Price::new(p.price, currency).to_string(),
                stock
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Product detail including selectable options.
#[must_use]
pub fn render_detail(product: &Product, state: &AppState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", product.name, product.id);
    let _ = writeln!(
        out,
        "Price:    {}",
        Price::new(product.price, state.config().currency)
    );
    let _ = writeln!(out, "Stock:    {}", product.stock);
    if let Some(category) = &product.category {
        let _ = writeln!(out, "Category: {category}");
    }
    if let Some(gender) = product.gender {
        let _ = writeln!(out, "Gender:   {}", gender.as_str());
    }
    let _ = writeln!(out, "Sizes:    {}", join_or_dash(product.selectable_sizes()));
    let _ = writeln!(out, "Colors:   {}", join_or_dash(product.selectable_colors()));
    if let Some(image) = product.primary_image() {
        let _ = writeln!(out, "Image:    {image}");
    }
    if let Some(description) = &product.description {
        let _ = write!(out, "\n{description}");
    }
    out.trim_end().to_string()
}

pub async fn list(state: &AppState, query: Option<&str>) -> Result<String> {
    let products = state.api().list_products(query).await?;
    Ok(render_list(&products, state))
}

pub async fn show(state: &AppState, id: &ProductId) -> Result<String> {
    let product = state.api().get_product(id).await?;
    Ok(render_detail(&product, state))
}

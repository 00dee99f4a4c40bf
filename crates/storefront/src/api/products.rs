//! Product catalogue endpoints.

use std::sync::Arc;

use mambini_core::ProductId;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::conversions::{convert_product, convert_products};
use super::types::Product;
use super::wire::ProductDto;
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id.clone());

        // Check cache
        if let Some(CacheValue::Product(product)) = self.cache().get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.item_url("/products/", id.as_str(), None)?;
        let response: ProductDto = self.get(url).await?;
        let product = convert_product(response)?;

        self.cache()
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List the catalogue, optionally filtered by a search query.
    ///
    /// The query is matched locally against name, category and description
    /// (case-insensitive), so the full list stays cacheable.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: Option<&str>) -> Result<Vec<Product>, ApiError> {
        let products = self.all_products().await?;

        let query = query.map(str::trim).filter(|q| !q.is_empty());
        Ok(match query {
            None => products.as_ref().clone(),
            Some(q) => {
                let needle = q.to_lowercase();
                products
                    .iter()
                    .filter(|p| matches_query(p, &needle))
                    .cloned()
                    .collect()
            }
        })
    }

    async fn all_products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.cache().get(&CacheKey::Products).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let response: Vec<ProductDto> = self.get(self.url("/products/")?).await?;
        let products = Arc::new(convert_products(response)?);

        self.cache()
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }
}

fn matches_query(product: &Product, needle: &str) -> bool {
    product.name.to_lowercase().contains(needle)
        || product
            .category
            .as_deref()
            .is_some_and(|c| c.to_lowercase().contains(needle))
        || product
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::ApiConfig;

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&ApiConfig::new(&server.uri()).unwrap()).unwrap()
    }

    fn catalogue() -> serde_json::Value {
        serde_json::json!([
            {"id": "p1", "name": "Linen Jacket", "price": 49.99, "stock": 3,
             "category": "jackets", "sizes": ["M"], "images": ["a.jpg"]},
            {"id": "p2", "name": "Wool Scarf", "price": 19.5, "stock": 0,
             "category": "accessories", "description": "Warm merino"}
        ])
    }

    #[tokio::test]
    async fn test_list_products_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(catalogue()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.list_products(None).await.unwrap().len(), 2);
        assert_eq!(client.list_products(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_products_filters_by_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(catalogue()))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let found = client.list_products(Some("MERINO")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id.as_str(), "p2");

        let found = client.list_products(Some("jacket")).await.unwrap();
        assert_eq!(found[0].id.as_str(), "p1");

        assert_eq!(client.list_products(Some("  ")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_product_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "p1", "name": "Linen Jacket", "price": 49.99, "stock": 3
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let id = ProductId::new("p1");
        let first = client.get_product(&id).await.unwrap();
        let second = client.get_product(&id).await.unwrap();
        assert_eq!(first, second);

        client.invalidate_cache();
    }

    #[tokio::test]
    async fn test_get_product_rejects_malformed_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/p9"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "p9", "price": 10})),
            )
            .mount(&server)
            .await;

        let result = client_for(&server).get_product(&ProductId::new("p9")).await;
        assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
    }
}

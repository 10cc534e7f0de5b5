//! Product search against the Shopify Storefront GraphQL API.

use async_trait::async_trait;
use lambda_runtime::tracing;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{config::Config, error::ApiError};

const SEARCH_PRODUCTS_QUERY: &str = r#"
query searchProducts($query: String!) {
  products(first: 10, query: $query) {
    edges {
      node {
        id
        title
        description
        handle
        featuredImage {
          url
          altText
        }
        variants(first: 1) {
          edges {
            node {
              id
              price {
                amount
                currencyCode
              }
            }
          }
        }
      }
    }
  }
}
"#;

/// A product search backend. Results are the raw product nodes.
#[async_trait]
pub trait ProductSearch: Send + Sync {
    async fn search_products(&self, query: &str) -> Result<Vec<Value>, ApiError>;
}

pub struct StorefrontClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl StorefrontClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        StorefrontClient {
            http,
            endpoint: config.storefront_endpoint(),
            token: config.storefront_token.clone(),
        }
    }
}

#[async_trait]
impl ProductSearch for StorefrontClient {
    async fn search_products(&self, query: &str) -> Result<Vec<Value>, ApiError> {
        let request = json!({
            "query": SEARCH_PRODUCTS_QUERY,
            "variables": { "query": query },
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .header("X-Shopify-Storefront-Access-Token", &self.token)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();

        if !status.is_success() {
            return Err(ApiError::Upstream(format!(
                "Shopify API HTTP error: {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let doc: Value = resp.json().await?;
        products_from_response(&doc)
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<SearchData>,
    errors: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    products: Option<Connection>,
}

#[derive(Debug, Deserialize)]
struct Connection {
    #[serde(default)]
    edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: Value,
}

/// Pull the product nodes out of a GraphQL search response.
pub fn products_from_response(doc: &Value) -> Result<Vec<Value>, ApiError> {
    let resp = GraphQlResponse::deserialize(doc)
        .map_err(|e| ApiError::Upstream(format!("unexpected Shopify response: {e}")))?;

    if let Some(errors) = resp.errors.filter(|e| !e.is_empty()) {
        let errors = Value::Array(errors);
        tracing::error!("Shopify API error: {errors}");
        return Err(ApiError::Upstream(format!("Shopify API error: {errors}")));
    }

    Ok(resp
        .data
        .and_then(|d| d.products)
        .map(|c| c.edges.into_iter().map(|e| e.node).collect())
        .unwrap_or_default())
}

//! Product recommendations for a named plant.
//!
//! We run a handful of storefront searches, one per generated search term, in
//! sequence. A failing search is logged and skipped: the client gets whatever
//! the remaining terms turned up, possibly nothing.

use lambda_runtime::tracing;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{searchterms::generate_search_terms, storefront::ProductSearch};

/// Only this many search terms are actually queried.
pub const MAX_SEARCH_TERMS: usize = 5;

pub const MAX_RECOMMENDATIONS: usize = 6;

/// Descriptions longer than this are shortened, ellipsis included.
pub const DESCRIPTION_LIMIT: usize = 150;

const ELLIPSIS: &str = "...";

const PLACEHOLDER_IMAGE: &str = "https://images.unsplash.com/photo-1611048268330-53de574cae3b";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image: String,
    pub link: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductNode {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    handle: Option<String>,
    featured_image: Option<ImageNode>,
    variants: Option<VariantConnection>,
}

#[derive(Debug, Deserialize)]
struct ImageNode {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VariantConnection {
    #[serde(default)]
    edges: Vec<VariantEdge>,
}

#[derive(Debug, Deserialize)]
struct VariantEdge {
    node: Option<VariantNode>,
}

#[derive(Debug, Deserialize)]
struct VariantNode {
    price: Option<Money>,
}

#[derive(Debug, Deserialize)]
struct Money {
    amount: Option<String>,
}

impl ProductRecord {
    /// Format a raw storefront product node.
    pub fn from_node(node: &Value, plant_name: &str) -> Result<Self, serde_json::Error> {
        let node = ProductNode::deserialize(node)?;

        let amount = node
            .variants
            .and_then(|v| v.edges.into_iter().next())
            .and_then(|e| e.node)
            .and_then(|n| n.price)
            .and_then(|p| p.amount)
            .unwrap_or_else(|| "0".to_owned());

        let price = match amount.trim().parse::<f64>() {
            Ok(p) if p.is_finite() && p >= 0. => p,
            _ => {
                tracing::warn!("unusable price amount `{amount}`; reporting 0");
                0.
            }
        };

        let image = node
            .featured_image
            .and_then(|i| i.url)
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_owned());

        let description = match node.description {
            Some(d) => truncate_description(&d),
            None => format!("Premium quality fertilizer for your {plant_name}."),
        };

        let id = match node.handle.filter(|h| !h.is_empty()) {
            Some(handle) => handle,
            None => node
                .id
                .as_deref()
                .and_then(|gid| gid.rsplit('/').next())
                .unwrap_or_default()
                .to_owned(),
        };

        Ok(ProductRecord {
            link: format!("/shop/{id}"),
            id,
            name: node.title.unwrap_or_default(),
            description,
            price,
            image,
        })
    }
}

/// Shorten `text` to at most [`DESCRIPTION_LIMIT`] characters, breaking at
/// the last word boundary that leaves room for the ellipsis.
pub fn truncate_description(text: &str) -> String {
    if text.chars().count() <= DESCRIPTION_LIMIT {
        return text.to_owned();
    }

    let budget = DESCRIPTION_LIMIT - ELLIPSIS.len();

    // One extra character so that a space right at the limit counts as a
    // boundary.
    let window_end = text
        .char_indices()
        .nth(budget + 1)
        .map_or(text.len(), |(i, _)| i);
    let window = &text[..window_end];

    let cut = match window.rfind(' ') {
        Some(i) if i > 0 => i,
        _ => text.char_indices().nth(budget).map_or(text.len(), |(i, _)| i),
    };

    let mut short = text[..cut].trim_end().to_owned();
    short.push_str(ELLIPSIS);
    short
}

/// Search the storefront for products suited to `plant_name`.
pub async fn recommend(search: &dyn ProductSearch, plant_name: &str) -> Vec<ProductRecord> {
    let terms = generate_search_terms(plant_name);
    tracing::info!("generated search terms: {terms:?}");

    let mut seen: Vec<Value> = Vec::new();
    let mut records: Vec<ProductRecord> = Vec::new();

    for term in terms.iter().take(MAX_SEARCH_TERMS) {
        match search.search_products(term).await {
            Ok(products) => {
                for product in products {
                    if seen.contains(&product) {
                        continue;
                    }

                    match ProductRecord::from_node(&product, plant_name) {
                        Ok(r) => records.push(r),
                        Err(e) => tracing::warn!("skipping malformed product node: {e}"),
                    }

                    seen.push(product);
                }
            }

            Err(e) => tracing::error!("error searching for term '{term}': {e}"),
        }
    }

    records.truncate(MAX_RECOMMENDATIONS);

    tracing::info!(
        "returning {} product recommendations: {:?}",
        records.len(),
        records.iter().map(|r| r.name.as_str()).collect::<Vec<_>>()
    );

    records
}

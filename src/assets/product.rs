//! Product labels and the JSON list they arrive in.

use std::fmt;

/// A product to feature in the reel.
///
/// The label doubles as the image search query and the on-screen caption.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductItem(String);

impl ProductItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductItem {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

/// Errors from parsing the product list argument.
#[derive(Debug, thiserror::Error)]
pub enum ProductListError {
    #[error("product list must be a JSON array of strings: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Parse a JSON-encoded list of product labels, e.g. `["Red Sneakers","Blue Jacket"]`.
///
/// Labels are trimmed; blank labels are dropped with a warning. Duplicates are kept.
pub fn parse_products(json: &str) -> Result<Vec<ProductItem>, ProductListError> {
    let labels: Vec<String> = serde_json::from_str(json)?;

    let products = labels
        .into_iter()
        .enumerate()
        .filter_map(|(index, label)| {
            let trimmed = label.trim();
            if trimmed.is_empty() {
                log::warn!("Skipping product at position {}: empty label", index);
                None
            } else {
                Some(ProductItem::new(trimmed))
            }
        })
        .collect();

    Ok(products)
}

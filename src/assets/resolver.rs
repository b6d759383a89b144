//! AssetResolver - one local image per product, never failing the run.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::product::ProductItem;
use super::search::ImageSearchClient;
use super::transient::TransientAssets;

/// Longest slug kept in a transient file name.
const MAX_SLUG_LEN: usize = 40;

/// Where a resolved image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSource {
    /// First search result for the product label.
    Fetched,
    /// The configured fallback image.
    Fallback,
}

/// A product image downloaded into the run's transient directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAsset {
    pub product: ProductItem,
    pub local_path: PathBuf,
    pub source: AssetSource,
}

/// Outcome of resolving one product.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemResolution {
    Resolved(ResolvedAsset),
    /// Neither the searched image nor the fallback could be downloaded.
    Skipped { product: ProductItem, reason: String },
}

/// Resolves product labels into local image files.
pub struct AssetResolver {
    client: ImageSearchClient,
    orientation: String,
    fallback_url: String,
}

impl AssetResolver {
    pub fn new(client: ImageSearchClient, orientation: String, fallback_url: String) -> Self {
        Self {
            client,
            orientation,
            fallback_url,
        }
    }

    pub fn fallback_url(&self) -> &str {
        &self.fallback_url
    }

    /// Resolve the image for the product at `index` of the input list.
    ///
    /// Search failures and empty results degrade to the fallback image, as does
    /// a failed download of the searched image. Only when the fallback download
    /// fails too is the product skipped. The destination file is registered
    /// with `transient` before anything is written to it.
    pub async fn resolve(
        &self,
        index: usize,
        product: &ProductItem,
        transient: &mut TransientAssets,
    ) -> ItemResolution {
        let dest = transient_image_path(transient.dir(), index, product);
        transient.register(dest.clone());

        let (url, source) = match self
            .client
            .search_first(product.label(), &self.orientation)
            .await
        {
            Ok(Some(url)) => (url, AssetSource::Fetched),
            Ok(None) => {
                log::warn!("No results found for '{}'. Using fallback image.", product);
                (self.fallback_url.clone(), AssetSource::Fallback)
            }
            Err(e) => {
                log::warn!(
                    "Image search failed for '{}': {}. Using fallback image.",
                    product, e
                );
                (self.fallback_url.clone(), AssetSource::Fallback)
            }
        };

        match self.client.download(&url, &dest).await {
            Ok(local_path) => {
                log::info!("Resolved image for '{}' ({:?})", product, source);
                return ItemResolution::Resolved(ResolvedAsset {
                    product: product.clone(),
                    local_path,
                    source,
                });
            }
            Err(e) if source == AssetSource::Fetched => {
                log::warn!(
                    "Download failed for '{}' from {}: {}. Using fallback image.",
                    product,
                    url,
                    e
                );
            }
            Err(e) => {
                log::error!("Fallback image download failed for '{}': {}", product, e);
                return ItemResolution::Skipped {
                    product: product.clone(),
                    reason: e.to_string(),
                };
            }
        }

        match self.client.download(&self.fallback_url, &dest).await {
            Ok(local_path) => ItemResolution::Resolved(ResolvedAsset {
                product: product.clone(),
                local_path,
                source: AssetSource::Fallback,
            }),
            Err(e) => {
                log::error!("Fallback image download failed for '{}': {}", product, e);
                ItemResolution::Skipped {
                    product: product.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Transient path for a product image: `<dir>/<index>-<slug>-<hash>.jpg`.
///
/// The index prefix keeps duplicate labels apart; the label hash keeps
/// labels that slugify identically apart.
pub fn transient_image_path(dir: &Path, index: usize, product: &ProductItem) -> PathBuf {
    dir.join(format!(
        "{:03}-{}-{}.jpg",
        index,
        slugify(product.label()),
        label_hash(product.label())
    ))
}

fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug: String = slug.trim_end_matches('-').chars().take(MAX_SLUG_LEN).collect();
    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

/// First four bytes of the label's SHA-256, hex encoded.
fn label_hash(label: &str) -> String {
    let digest = Sha256::digest(label.as_bytes());
    hex::encode(&digest[..4])
}

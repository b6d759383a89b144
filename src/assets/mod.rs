//! Asset resolution for reel products.
//!
//! Each product label is turned into one local image: searched on the image
//! provider, downloaded into the run's transient directory, and replaced by a
//! fixed fallback image whenever the provider or the network lets us down.

mod product;
mod resolver;
mod search;
mod transient;

pub use product::{parse_products, ProductItem, ProductListError};
pub use resolver::{transient_image_path, AssetResolver, AssetSource, ItemResolution, ResolvedAsset};
pub use search::{AssetError, ImageSearchClient, DEFAULT_SEARCH_BASE_URL};
pub use transient::TransientAssets;

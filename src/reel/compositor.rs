//! ReelCompositor - products in, one encoded reel out.

use std::path::{Path, PathBuf};

use super::encoder::{EncodeJob, EncodeSettings, Encoder};
use super::error::ReelError;
use super::timeline::{SegmentTemplate, Timeline, VisualSegment};
use crate::assets::{AssetResolver, AssetSource, ItemResolution, ProductItem, TransientAssets};
use crate::config::RenderConfig;

/// A product left out of the reel, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedItem {
    pub product: ProductItem,
    pub reason: String,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ReelSummary {
    pub output_path: PathBuf,
    pub segment_count: usize,
    pub total_duration: f64,
    pub included: Vec<ProductItem>,
    /// Included products that use the fallback image.
    pub fallback_count: usize,
    pub skipped: Vec<SkippedItem>,
    pub has_audio: bool,
}

/// Builds the timeline for a product list and hands it to an encoder.
pub struct ReelCompositor<E: Encoder> {
    resolver: AssetResolver,
    encoder: E,
    config: RenderConfig,
}

impl<E: Encoder> ReelCompositor<E> {
    pub fn new(resolver: AssetResolver, encoder: E, config: RenderConfig) -> Self {
        Self {
            resolver,
            encoder,
            config,
        }
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Render `products` into a reel at `output_path`.
    ///
    /// Products are processed in order; one that cannot be resolved or loaded
    /// is logged and left out. Transient files are removed before returning,
    /// whether the run succeeded or not.
    pub async fn create_reel(
        &self,
        products: &[ProductItem],
        output_path: &Path,
    ) -> Result<ReelSummary, ReelError> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir(parent)?;
        }

        let mut transient = TransientAssets::new(&self.config.temp_dir).map_err(|e| {
            ReelError::CreateDir {
                path: self.config.temp_dir.clone(),
                source: e,
            }
        })?;

        let result = self.compose_and_encode(products, output_path, &mut transient).await;
        transient.cleanup();

        if let Err(e) = &result {
            log::error!("Reel creation failed: {}", e);
        }
        result
    }

    async fn compose_and_encode(
        &self,
        products: &[ProductItem],
        output_path: &Path,
        transient: &mut TransientAssets,
    ) -> Result<ReelSummary, ReelError> {
        let template = SegmentTemplate::from_config(&self.config);
        let outro_file = transient.write_file("outro.txt", &self.config.outro_text)?;
        let mut timeline = Timeline::new(template.outro_card(outro_file));

        let mut included = Vec::new();
        let mut skipped = Vec::new();
        let mut fallback_count = 0;

        for (index, product) in products.iter().enumerate() {
            match self.build_slide(&template, index, product, transient).await {
                Ok((segment, source)) => {
                    timeline.push_segment(segment);
                    included.push(product.clone());
                    if source == AssetSource::Fallback {
                        fallback_count += 1;
                    }
                }
                Err(reason) => {
                    log::warn!("Skipping '{}': {}", product, reason);
                    skipped.push(SkippedItem {
                        product: product.clone(),
                        reason,
                    });
                }
            }
        }

        if self.config.music_path.is_file() {
            timeline.attach_audio(&self.config.music_path, self.config.audio_fade_secs);
        } else {
            log::info!(
                "No music at {}, rendering silent reel",
                self.config.music_path.display()
            );
        }

        let segment_count = timeline.len();
        let total_duration = timeline.total_duration();
        let has_audio = timeline.audio().is_some();
        log::info!(
            "Timeline: {} segment(s), {:.1}s, {} skipped",
            segment_count,
            total_duration,
            skipped.len()
        );

        let job = EncodeJob::new(
            timeline,
            EncodeSettings::from_config(&self.config),
            output_path,
        );
        self.encoder.encode(&job)?;

        Ok(ReelSummary {
            output_path: output_path.to_path_buf(),
            segment_count,
            total_duration,
            included,
            fallback_count,
            skipped,
            has_audio,
        })
    }

    /// Resolve, load and lay out one product. `Err` carries the skip reason.
    async fn build_slide(
        &self,
        template: &SegmentTemplate,
        index: usize,
        product: &ProductItem,
        transient: &mut TransientAssets,
    ) -> Result<(VisualSegment, AssetSource), String> {
        let asset = match self.resolver.resolve(index, product, transient).await {
            ItemResolution::Resolved(asset) => asset,
            ItemResolution::Skipped { reason, .. } => return Err(reason),
        };

        let (_, height) = image_dimensions(&asset.local_path)
            .map_err(|e| format!("cannot load {}: {}", asset.local_path.display(), e))?;

        let caption_file = transient
            .write_file(&format!("{:03}-caption.txt", index), product.label())
            .map_err(|e| format!("cannot write caption: {}", e))?;

        let segment =
            template.product_slide(product.label(), asset.local_path, height, caption_file);
        Ok((segment, asset.source))
    }
}

/// Read image dimensions from the file contents, ignoring its extension.
fn image_dimensions(path: &Path) -> image::ImageResult<(u32, u32)> {
    image::ImageReader::open(path)?
        .with_guessed_format()?
        .into_dimensions()
}

fn create_dir(path: &Path) -> Result<(), ReelError> {
    std::fs::create_dir_all(path).map_err(|e| ReelError::CreateDir {
        path: path.to_path_buf(),
        source: e,
    })
}

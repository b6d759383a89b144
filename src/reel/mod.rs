//! Reel composition and encoding.
//!
//! A reel is a fixed template: a store card first, then one slide per product
//! (image, dimming overlay, caption), with an optional music bed trimmed to
//! the exact video length. The timeline is rendered by a single FFmpeg run.

mod compositor;
mod encoder;
mod error;
pub mod filters;
mod timeline;

pub use compositor::{ReelCompositor, ReelSummary, SkippedItem};
pub use encoder::{EncodeJob, EncodeSettings, Encoder, FfmpegEncoder};
pub use error::ReelError;
pub use filters::{FilterGraph, InputSpec};
pub use timeline::{
    AudioTrack, Canvas, Layer, SegmentTemplate, TextPosition, TextStyle, Timeline, VisualSegment,
};

//! Timeline model: fixed-template segments and the optional music bed.

use std::path::{Path, PathBuf};

use crate::config::RenderConfig;

/// Output frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Where a text layer sits on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextPosition {
    /// Centered both ways.
    Center,
    /// Horizontally centered, top edge at `y_ratio` of the canvas height.
    Bottom { y_ratio: f64 },
}

/// Font and outline settings for a text layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: String,
    pub font_file: Option<PathBuf>,
    pub font_size: u32,
    pub color: String,
    pub stroke_color: String,
    pub stroke_width: u32,
    pub line_spacing: u32,
}

/// One layer of a segment, drawn in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Image {
        path: PathBuf,
        /// Target height when the source is taller than the canvas.
        scale_to_height: Option<u32>,
        fade_in: f64,
        fade_out: f64,
    },
    ColorFill {
        color: String,
        opacity: f32,
    },
    Text {
        /// Caption text is read from a file so it never needs filter escaping.
        text_file: PathBuf,
        style: TextStyle,
        position: TextPosition,
        fade_in: f64,
    },
}

/// A self-contained timed unit of the reel.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualSegment {
    label: String,
    duration: f64,
    layers: Vec<Layer>,
}

impl VisualSegment {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// The image layer, if this segment has one.
    pub fn image(&self) -> Option<&Path> {
        self.layers.iter().find_map(|layer| match layer {
            Layer::Image { path, .. } => Some(path.as_path()),
            _ => None,
        })
    }
}

/// Builds the fixed segment shapes from render settings.
#[derive(Debug, Clone)]
pub struct SegmentTemplate {
    canvas: Canvas,
    segment_secs: f64,
    outro_secs: f64,
    image_fade_secs: f64,
    text_fade_secs: f64,
    overlay_opacity: f32,
    oversize_scale: f64,
    caption_y_ratio: f64,
    caption_style: TextStyle,
    outro_style: TextStyle,
}

impl SegmentTemplate {
    pub fn from_config(config: &RenderConfig) -> Self {
        let base_style = TextStyle {
            font: config.font.clone(),
            font_file: config.font_file.clone(),
            font_size: config.caption_font_size,
            color: "white".to_string(),
            stroke_color: config.accent_color.clone(),
            stroke_width: config.caption_stroke_width,
            line_spacing: 0,
        };

        Self {
            canvas: Canvas::new(config.width, config.height),
            segment_secs: config.segment_secs,
            outro_secs: config.outro_secs,
            image_fade_secs: config.image_fade_secs,
            text_fade_secs: config.text_fade_secs,
            overlay_opacity: config.overlay_opacity,
            oversize_scale: config.oversize_scale,
            caption_y_ratio: config.caption_y_ratio,
            outro_style: TextStyle {
                font_size: config.outro_font_size,
                stroke_width: config.outro_stroke_width,
                line_spacing: config.outro_line_spacing,
                ..base_style.clone()
            },
            caption_style: base_style,
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// The store card that always opens the reel: centered text, fade-in only.
    pub fn outro_card(&self, text_file: PathBuf) -> VisualSegment {
        VisualSegment {
            label: "outro".to_string(),
            duration: self.outro_secs,
            layers: vec![Layer::Text {
                text_file,
                style: self.outro_style.clone(),
                position: TextPosition::Center,
                fade_in: self.text_fade_secs,
            }],
        }
    }

    /// A product slide: image, dimming overlay, and bottom caption.
    pub fn product_slide(
        &self,
        label: &str,
        image_path: PathBuf,
        image_height: u32,
        caption_file: PathBuf,
    ) -> VisualSegment {
        VisualSegment {
            label: label.to_string(),
            duration: self.segment_secs,
            layers: vec![
                Layer::Image {
                    path: image_path,
                    scale_to_height: self.oversize_height(image_height),
                    fade_in: self.image_fade_secs,
                    fade_out: self.image_fade_secs,
                },
                Layer::ColorFill {
                    color: "black".to_string(),
                    opacity: self.overlay_opacity,
                },
                Layer::Text {
                    text_file: caption_file,
                    style: self.caption_style.clone(),
                    position: TextPosition::Bottom {
                        y_ratio: self.caption_y_ratio,
                    },
                    fade_in: self.text_fade_secs,
                },
            ],
        }
    }

    /// Images taller than the canvas are scaled to `oversize_scale` times its
    /// height so they always cover it; shorter images keep their size.
    fn oversize_height(&self, image_height: u32) -> Option<u32> {
        if image_height > self.canvas.height {
            let scaled = self.canvas.height as f64 * self.oversize_scale;
            Some(scaled.round() as u32)
        } else {
            None
        }
    }
}

/// The music bed, always trimmed to the timeline length.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    path: PathBuf,
    trim_to: f64,
    fade: f64,
}

impl AudioTrack {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn duration(&self) -> f64 {
        self.trim_to
    }

    /// Fades are shortened when the track is too short to fit both.
    pub fn fade_in(&self) -> f64 {
        self.fade.min(self.trim_to / 2.0)
    }

    pub fn fade_out(&self) -> f64 {
        self.fade.min(self.trim_to / 2.0)
    }

    /// Start of the fade-out, relative to the start of the track.
    pub fn fade_out_start(&self) -> f64 {
        (self.trim_to - self.fade_out()).max(0.0)
    }
}

/// Ordered segments plus an optional audio track.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    segments: Vec<VisualSegment>,
    audio: Option<AudioTrack>,
}

impl Timeline {
    /// Start a timeline with its opening card.
    pub fn new(opening: VisualSegment) -> Self {
        Self {
            segments: vec![opening],
            audio: None,
        }
    }

    pub fn push_segment(&mut self, segment: VisualSegment) {
        self.segments.push(segment);
        let total = self.total_duration();
        if let Some(audio) = self.audio.as_mut() {
            audio.trim_to = total;
        }
    }

    /// Attach the music bed, trimmed to the total duration.
    pub fn attach_audio(&mut self, path: impl Into<PathBuf>, fade_secs: f64) {
        self.audio = Some(AudioTrack {
            path: path.into(),
            trim_to: self.total_duration(),
            fade: fade_secs,
        });
    }

    pub fn segments(&self) -> &[VisualSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn audio(&self) -> Option<&AudioTrack> {
        self.audio.as_ref()
    }

    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(VisualSegment::duration).sum()
    }
}

//! FFmpeg filter graph construction for a reel timeline.
//!
//! Every segment is drawn onto its own canvas-sized color base, layer by
//! layer, then normalized (size, sample aspect, frame rate, pixel format) so
//! the concat filter can join segments whose sources differ in size.
//!
//! Input order:
//! - One looped still-image input per segment that has an image layer, in
//!   timeline order
//! - Last input: background music (if attached)

use std::path::{Path, PathBuf};

use super::timeline::{Canvas, Layer, TextPosition, TextStyle, Timeline, VisualSegment};

/// Label of the final video stream.
pub const VIDEO_OUT: &str = "[vout]";

/// Label of the final audio stream.
pub const AUDIO_OUT: &str = "[aout]";

/// An ffmpeg input, in the order it is passed on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSpec {
    /// A still image looped for `duration` seconds.
    LoopedImage { path: PathBuf, duration: f64 },
    /// An audio file.
    Audio { path: PathBuf },
}

impl InputSpec {
    /// Input arguments for this source at the given frame rate.
    pub fn to_ffmpeg_args(&self, fps: u32) -> Vec<String> {
        match self {
            InputSpec::LoopedImage { path, duration } => vec![
                "-loop".to_string(),
                "1".to_string(),
                "-framerate".to_string(),
                fps.to_string(),
                "-t".to_string(),
                format_secs(*duration),
                "-i".to_string(),
                path.to_string_lossy().to_string(),
            ],
            InputSpec::Audio { path } => {
                vec!["-i".to_string(), path.to_string_lossy().to_string()]
            }
        }
    }
}

/// The complete graph plus the inputs it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    pub inputs: Vec<InputSpec>,
    pub filter_complex: String,
    pub has_audio: bool,
}

/// Build the filter graph for the whole timeline.
pub fn build_filter_graph(timeline: &Timeline, canvas: Canvas, fps: u32) -> FilterGraph {
    let mut inputs = Vec::new();
    let mut chains = Vec::new();
    let mut outputs = String::new();

    for (index, segment) in timeline.segments().iter().enumerate() {
        let image_input = segment.image().map(|path| {
            inputs.push(InputSpec::LoopedImage {
                path: path.to_path_buf(),
                duration: segment.duration(),
            });
            inputs.len() - 1
        });

        chains.extend(build_segment_chains(index, segment, image_input, canvas, fps));
        outputs.push_str(&format!("[v{}]", index));
    }

    chains.push(format!(
        "{}concat=n={}:v=1:a=0{}",
        outputs,
        timeline.len(),
        VIDEO_OUT
    ));

    let has_audio = match timeline.audio() {
        Some(audio) => {
            inputs.push(InputSpec::Audio {
                path: audio.path().to_path_buf(),
            });
            chains.push(format!(
                "[{}:a]{}{}",
                inputs.len() - 1,
                build_audio_chain(
                    audio.duration(),
                    audio.fade_in(),
                    audio.fade_out_start(),
                    audio.fade_out(),
                ),
                AUDIO_OUT
            ));
            true
        }
        None => false,
    };

    FilterGraph {
        inputs,
        filter_complex: chains.join(";"),
        has_audio,
    }
}

/// Build the chains that draw one segment into `[v{index}]`.
///
/// Layer order: color base → image → color fill → text → normalize
fn build_segment_chains(
    index: usize,
    segment: &VisualSegment,
    image_input: Option<usize>,
    canvas: Canvas,
    fps: u32,
) -> Vec<String> {
    let duration = segment.duration();
    let mut chains = vec![format!(
        "color=c=black:s={}x{}:r={}:d={}[s{}l0]",
        canvas.width,
        canvas.height,
        fps,
        format_secs(duration),
        index
    )];
    let mut current = 0;

    for layer in segment.layers() {
        let input = format!("[s{}l{}]", index, current);
        let output = format!("[s{}l{}]", index, current + 1);

        match layer {
            Layer::Image {
                scale_to_height,
                fade_in,
                fade_out,
                ..
            } => {
                // Segments without an image input never carry an image layer
                let Some(input_index) = image_input else {
                    continue;
                };
                chains.push(format!(
                    "[{}:v]{}[s{}img]",
                    input_index,
                    build_image_filter(*scale_to_height, *fade_in, *fade_out, duration),
                    index
                ));
                chains.push(format!(
                    "{}[s{}img]overlay=x=(W-w)/2:y=(H-h)/2:shortest=1:format=auto{}",
                    input, index, output
                ));
            }
            Layer::ColorFill { color, opacity } => {
                chains.push(format!(
                    "{}{}{}",
                    input,
                    build_color_fill_filter(color, *opacity),
                    output
                ));
            }
            Layer::Text {
                text_file,
                style,
                position,
                fade_in,
            } => {
                chains.push(format!(
                    "{}{}{}",
                    input,
                    build_text_filter(text_file, style, *position, *fade_in),
                    output
                ));
            }
        }
        current += 1;
    }

    chains.push(format!(
        "[s{}l{}]{}[v{}]",
        index,
        current,
        build_normalize_filter(canvas, fps),
        index
    ));
    chains
}

/// Scale (when oversized), then fade in and out through the alpha channel.
pub fn build_image_filter(
    scale_to_height: Option<u32>,
    fade_in: f64,
    fade_out: f64,
    duration: f64,
) -> String {
    let mut filters = Vec::new();

    if let Some(height) = scale_to_height {
        filters.push(format!("scale=-2:{}", height));
    }

    filters.push("format=rgba".to_string());

    if fade_in > 0.0 {
        filters.push(format!(
            "fade=t=in:st=0:d={}:alpha=1",
            format_secs(fade_in)
        ));
    }
    if fade_out > 0.0 {
        filters.push(format!(
            "fade=t=out:st={}:d={}:alpha=1",
            format_secs((duration - fade_out).max(0.0)),
            format_secs(fade_out)
        ));
    }

    filters.join(",")
}

/// Full-canvas translucent box.
pub fn build_color_fill_filter(color: &str, opacity: f32) -> String {
    format!(
        "drawbox=x=0:y=0:w=iw:h=ih:color={}@{:.2}:t=fill",
        ffmpeg_color(color),
        opacity.clamp(0.0, 1.0)
    )
}

/// Outlined text with an alpha fade-in.
pub fn build_text_filter(
    text_file: &Path,
    style: &TextStyle,
    position: TextPosition,
    fade_in: f64,
) -> String {
    let font = match &style.font_file {
        Some(file) => format!("fontfile={}", quote_filter_value(&file.to_string_lossy())),
        None => format!("font={}", quote_filter_value(&style.font)),
    };

    let (x, y) = match position {
        TextPosition::Center => ("(w-text_w)/2".to_string(), "(h-text_h)/2".to_string()),
        TextPosition::Bottom { y_ratio } => {
            ("(w-text_w)/2".to_string(), format!("h*{:.2}", y_ratio))
        }
    };

    let mut filter = format!(
        "drawtext=textfile={}:expansion=none:{}:fontsize={}:fontcolor={}:borderw={}:bordercolor={}:line_spacing={}:x={}:y={}",
        quote_filter_value(&text_file.to_string_lossy()),
        font,
        style.font_size,
        ffmpeg_color(&style.color),
        style.stroke_width,
        ffmpeg_color(&style.stroke_color),
        style.line_spacing,
        x,
        y
    );

    if fade_in > 0.0 {
        filter.push_str(&format!(
            ":alpha='min(t/{},1)'",
            format_secs(fade_in)
        ));
    }

    filter
}

/// Pad/scale to the canvas and settle frame parameters for concat.
pub fn build_normalize_filter(canvas: Canvas, fps: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps},format=yuv420p",
        w = canvas.width,
        h = canvas.height,
        fps = fps
    )
}

/// Pad or trim to exactly `duration`, then fade in and out.
pub fn build_audio_chain(
    duration: f64,
    fade_in: f64,
    fade_out_start: f64,
    fade_out: f64,
) -> String {
    let mut filters = vec![
        "apad".to_string(),
        format!("atrim=0:{}", format_secs(duration)),
        "asetpts=PTS-STARTPTS".to_string(),
    ];

    if fade_in > 0.0 {
        filters.push(format!("afade=t=in:st=0:d={}", format_secs(fade_in)));
    }
    if fade_out > 0.0 {
        filters.push(format!(
            "afade=t=out:st={}:d={}",
            format_secs(fade_out_start),
            format_secs(fade_out)
        ));
    }

    filters.join(",")
}

/// `#RRGGBB` → `0xRRGGBB`; named colors pass through.
pub fn ffmpeg_color(color: &str) -> String {
    match color.strip_prefix('#') {
        Some(hex) => format!("0x{}", hex),
        None => color.to_string(),
    }
}

/// Quote a value for use inside a filter option of a `-filter_complex` graph.
///
/// FFmpeg unescapes the value twice: once when parsing the graph, then again
/// when splitting the filter's `key=value` options. Backslashes become forward
/// slashes, `'` and `:` are escaped for the option parser, and the result is
/// quoted for the graph parser.
pub fn quote_filter_value(value: &str) -> String {
    let option_level = value
        .replace('\\', "/")
        .replace('\'', "\\'")
        .replace(':', "\\:");
    format!("'{}'", option_level.replace('\'', "'\\''"))
}

/// Seconds with millisecond precision.
pub fn format_secs(secs: f64) -> String {
    format!("{:.3}", secs)
}

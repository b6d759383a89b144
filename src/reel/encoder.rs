//! Encoding a timeline to a video file with FFmpeg.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use super::error::ReelError;
use super::filters::{build_filter_graph, format_secs, FilterGraph, AUDIO_OUT, VIDEO_OUT};
use super::timeline::{Canvas, Timeline};
use crate::config::RenderConfig;

/// Number of trailing stderr lines kept in an encode error.
const STDERR_TAIL_LINES: usize = 20;

/// Codec and threading settings for the final encode.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSettings {
    pub canvas: Canvas,
    pub fps: u32,
    pub video_codec: String,
    pub audio_codec: String,
    pub threads: u32,
}

impl EncodeSettings {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            canvas: Canvas::new(config.width, config.height),
            fps: config.fps,
            video_codec: config.video_codec.clone(),
            audio_codec: config.audio_codec.clone(),
            threads: config.threads,
        }
    }
}

/// Everything needed to render one timeline to one file.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeJob {
    pub graph: FilterGraph,
    pub settings: EncodeSettings,
    pub total_duration: f64,
    pub segment_count: usize,
    pub output_path: PathBuf,
}

impl EncodeJob {
    /// Consume the timeline into an encode job.
    pub fn new(timeline: Timeline, settings: EncodeSettings, output_path: &Path) -> Self {
        let graph = build_filter_graph(&timeline, settings.canvas, settings.fps);
        Self {
            graph,
            settings,
            total_duration: timeline.total_duration(),
            segment_count: timeline.len(),
            output_path: output_path.to_path_buf(),
        }
    }

    pub fn has_audio(&self) -> bool {
        self.graph.has_audio
    }

    /// Build FFmpeg arguments (excluding the binary itself).
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
        ];

        for input in &self.graph.inputs {
            args.extend(input.to_ffmpeg_args(self.settings.fps));
        }

        args.extend([
            "-filter_complex".to_string(),
            self.graph.filter_complex.clone(),
            "-map".to_string(),
            VIDEO_OUT.to_string(),
        ]);

        if self.graph.has_audio {
            args.extend(["-map".to_string(), AUDIO_OUT.to_string()]);
        }

        args.extend([
            "-r".to_string(),
            self.settings.fps.to_string(),
            "-c:v".to_string(),
            self.settings.video_codec.clone(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
        ]);

        if self.graph.has_audio {
            args.extend([
                "-c:a".to_string(),
                self.settings.audio_codec.clone(),
                "-b:a".to_string(),
                "128k".to_string(),
            ]);
        } else {
            args.push("-an".to_string());
        }

        args.extend([
            "-threads".to_string(),
            self.settings.threads.to_string(),
            "-t".to_string(),
            format_secs(self.total_duration),
            "-movflags".to_string(),
            "+faststart".to_string(),
            self.output_path.to_string_lossy().to_string(),
        ]);

        args
    }
}

/// Renders an encode job to its output file.
pub trait Encoder {
    fn encode(&self, job: &EncodeJob) -> Result<(), ReelError>;
}

/// Encoder backed by the `ffmpeg` command-line tool.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    binary: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Encoder for FfmpegEncoder {
    /// Spawn FFmpeg and block until it exits.
    ///
    /// Stderr is drained on a separate thread so a chatty encoder can never
    /// fill the pipe and stall.
    fn encode(&self, job: &EncodeJob) -> Result<(), ReelError> {
        let args = job.to_ffmpeg_args();
        log::debug!("filter_complex: {}", job.graph.filter_complex);
        log::info!(
            "Encoding {} segment(s), {:.1}s, to {}",
            job.segment_count,
            job.total_duration,
            job.output_path.display()
        );

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ReelError::FfmpegNotFound {
                        binary: self.binary.clone(),
                    }
                } else {
                    ReelError::SpawnFailed(e)
                }
            })?;

        let stderr_thread = child.stderr.take().map(|stderr| {
            thread::spawn(move || {
                let reader = BufReader::new(stderr);
                let mut lines = Vec::new();
                for line in reader.lines() {
                    match line {
                        Ok(l) => {
                            log::debug!("[ffmpeg] {}", l);
                            lines.push(l);
                        }
                        Err(_) => break,
                    }
                }
                lines
            })
        });

        let status = child.wait()?;
        let stderr_lines = stderr_thread
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        if status.success() {
            log::info!("Encoded reel to {}", job.output_path.display());
            Ok(())
        } else {
            let tail_start = stderr_lines.len().saturating_sub(STDERR_TAIL_LINES);
            Err(ReelError::EncodeFailed {
                exit_code: status.code(),
                stderr: stderr_lines[tail_start..].join("\n"),
            })
        }
    }
}

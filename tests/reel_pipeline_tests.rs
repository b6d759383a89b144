//! End-to-end tests for reel composition.
//!
//! The image provider and image host are mocked with wiremock and the encoder
//! is replaced by one that records the job, so these tests cover everything
//! up to the ffmpeg invocation:
//! - Timeline shape and duration
//! - Fallback and skip behavior per item
//! - Music trimming
//! - Transient file cleanup on success and failure

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{ImageBuffer, ImageFormat, Rgb};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reelsmith::assets::{AssetResolver, ImageSearchClient, ProductItem};
use reelsmith::config::RenderConfig;
use reelsmith::reel::{EncodeJob, Encoder, InputSpec, ReelCompositor, ReelError};

// === Test helpers ===

/// Encoder that records every job and the transient files alive at encode time.
#[derive(Default)]
struct RecordingEncoder {
    jobs: Mutex<Vec<EncodeJob>>,
    files_at_encode: Mutex<Vec<PathBuf>>,
    temp_dir: PathBuf,
    fail: bool,
}

impl RecordingEncoder {
    fn new(temp_dir: &Path) -> Self {
        Self {
            temp_dir: temp_dir.to_path_buf(),
            ..Self::default()
        }
    }

    fn failing(temp_dir: &Path) -> Self {
        Self {
            fail: true,
            ..Self::new(temp_dir)
        }
    }

    fn last_job(&self) -> EncodeJob {
        self.jobs.lock().unwrap().last().cloned().expect("no encode job recorded")
    }
}

impl Encoder for RecordingEncoder {
    fn encode(&self, job: &EncodeJob) -> Result<(), ReelError> {
        self.jobs.lock().unwrap().push(job.clone());
        let files: Vec<PathBuf> = std::fs::read_dir(&self.temp_dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        *self.files_at_encode.lock().unwrap() = files;

        if self.fail {
            return Err(ReelError::EncodeFailed {
                exit_code: Some(1),
                stderr: "Conversion failed!".to_string(),
            });
        }
        std::fs::write(&job.output_path, b"fake mp4").unwrap();
        Ok(())
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_pixel(width, height, Rgb([200, 40, 40]));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

async fn mount_search(server: &MockServer, query: &str, image_path: Option<&str>) {
    let body = match image_path {
        Some(p) => serde_json::json!({
            "results": [{"urls": {"regular": format!("{}{}", server.uri(), p)}}]
        }),
        None => serde_json::json!({"results": []}),
    };
    Mock::given(method("GET"))
        .and(path("/search/photos"))
        .and(query_param("query", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, image_path: &str, bytes: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(image_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes))
        .mount(server)
        .await;
}

struct Fixture {
    _root: TempDir,
    temp_dir: PathBuf,
    output: PathBuf,
    config: RenderConfig,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let temp_dir = root.path().join("temp");
        let output = root.path().join("output").join("reel.mp4");
        let config = RenderConfig {
            temp_dir: temp_dir.clone(),
            output_path: output.clone(),
            music_path: root.path().join("assets").join("videoplayback.mp3"),
            ..RenderConfig::default()
        };
        Self {
            _root: root,
            temp_dir,
            output,
            config,
        }
    }

    fn with_music(mut self) -> Self {
        let music = self.config.music_path.clone();
        std::fs::create_dir_all(music.parent().unwrap()).unwrap();
        std::fs::write(&music, b"ID3 fake audio").unwrap();
        self.config.music_path = music;
        self
    }

    fn compositor(
        &self,
        server: &MockServer,
        encoder: RecordingEncoder,
    ) -> ReelCompositor<RecordingEncoder> {
        let client =
            ImageSearchClient::with_base_url("test-key".to_string(), server.uri()).unwrap();
        let resolver = AssetResolver::new(
            client,
            "portrait".to_string(),
            format!("{}/fallback.jpg", server.uri()),
        );
        ReelCompositor::new(resolver, encoder, self.config.clone())
    }

    fn temp_is_empty(&self) -> bool {
        std::fs::read_dir(&self.temp_dir).unwrap().count() == 0
    }
}

fn products(labels: &[&str]) -> Vec<ProductItem> {
    labels.iter().map(|l| ProductItem::new(*l)).collect()
}

fn image_inputs(job: &EncodeJob) -> Vec<PathBuf> {
    job.graph
        .inputs
        .iter()
        .filter_map(|input| match input {
            InputSpec::LoopedImage { path, .. } => Some(path.clone()),
            InputSpec::Audio { .. } => None,
        })
        .collect()
}

// === Timeline shape ===

#[tokio::test]
async fn test_two_products_make_three_segments_of_nine_seconds() {
    let server = MockServer::start().await;
    mount_search(&server, "Red Sneakers", Some("/img/red.png")).await;
    mount_search(&server, "Blue Jacket", Some("/img/blue.png")).await;
    mount_image(&server, "/img/red.png", png_bytes(64, 96)).await;
    mount_image(&server, "/img/blue.png", png_bytes(96, 64)).await;

    let fixture = Fixture::new();
    let compositor = fixture.compositor(&server, RecordingEncoder::new(&fixture.temp_dir));

    let summary = compositor
        .create_reel(&products(&["Red Sneakers", "Blue Jacket"]), &fixture.output)
        .await
        .unwrap();

    assert_eq!(summary.segment_count, 3);
    assert_eq!(summary.total_duration, 9.0);
    assert_eq!(summary.included, products(&["Red Sneakers", "Blue Jacket"]));
    assert!(summary.skipped.is_empty());
    assert_eq!(summary.fallback_count, 0);

    let job = compositor.encoder().last_job();
    assert_eq!(job.segment_count, 3);
    assert_eq!(job.total_duration, 9.0);
    assert_eq!(job.output_path, fixture.output);
    assert!(job.graph.filter_complex.contains("concat=n=3:v=1:a=0[vout]"));
}

#[tokio::test]
async fn test_segments_keep_input_order() {
    let server = MockServer::start().await;
    mount_search(&server, "Red Sneakers", Some("/img/red.png")).await;
    mount_search(&server, "Blue Jacket", Some("/img/blue.png")).await;
    mount_image(&server, "/img/red.png", png_bytes(10, 10)).await;
    mount_image(&server, "/img/blue.png", png_bytes(10, 10)).await;

    let fixture = Fixture::new();
    let compositor = fixture.compositor(&server, RecordingEncoder::new(&fixture.temp_dir));
    compositor
        .create_reel(&products(&["Red Sneakers", "Blue Jacket"]), &fixture.output)
        .await
        .unwrap();

    let inputs = image_inputs(&compositor.encoder().last_job());
    assert_eq!(inputs.len(), 2);
    let first = inputs[0].file_name().unwrap().to_string_lossy().to_string();
    let second = inputs[1].file_name().unwrap().to_string_lossy().to_string();
    assert!(first.starts_with("000-red-sneakers-"), "got {}", first);
    assert!(second.starts_with("001-blue-jacket-"), "got {}", second);
}

#[tokio::test]
async fn test_empty_product_list_renders_outro_only() {
    let server = MockServer::start().await;
    let fixture = Fixture::new();
    let compositor = fixture.compositor(&server, RecordingEncoder::new(&fixture.temp_dir));

    let summary = compositor.create_reel(&[], &fixture.output).await.unwrap();

    assert_eq!(summary.segment_count, 1);
    assert_eq!(summary.total_duration, 3.0);
    assert!(image_inputs(&compositor.encoder().last_job()).is_empty());
}

#[tokio::test]
async fn test_tall_image_is_scaled_to_oversize_height() {
    let server = MockServer::start().await;
    mount_search(&server, "Poster", Some("/img/tall.png")).await;
    mount_image(&server, "/img/tall.png", png_bytes(8, 2000)).await;

    let fixture = Fixture::new();
    let compositor = fixture.compositor(&server, RecordingEncoder::new(&fixture.temp_dir));
    compositor
        .create_reel(&products(&["Poster"]), &fixture.output)
        .await
        .unwrap();

    let job = compositor.encoder().last_job();
    assert!(job.graph.filter_complex.contains("scale=-2:2304"));
}

#[tokio::test]
async fn test_short_image_is_not_scaled() {
    let server = MockServer::start().await;
    mount_search(&server, "Mug", Some("/img/mug.png")).await;
    mount_image(&server, "/img/mug.png", png_bytes(8, 8)).await;

    let fixture = Fixture::new();
    let compositor = fixture.compositor(&server, RecordingEncoder::new(&fixture.temp_dir));
    compositor
        .create_reel(&products(&["Mug"]), &fixture.output)
        .await
        .unwrap();

    let job = compositor.encoder().last_job();
    assert!(!job.graph.filter_complex.contains("scale=-2:"));
}

// === Degradation per item ===

#[tokio::test]
async fn test_empty_results_use_fallback_and_keep_item() {
    let server = MockServer::start().await;
    mount_search(&server, "X", None).await;
    mount_image(&server, "/fallback.jpg", png_bytes(10, 10)).await;

    let fixture = Fixture::new();
    let compositor = fixture.compositor(&server, RecordingEncoder::new(&fixture.temp_dir));

    let summary = compositor
        .create_reel(&products(&["X"]), &fixture.output)
        .await
        .unwrap();

    assert_eq!(summary.segment_count, 2);
    assert_eq!(summary.total_duration, 6.0);
    assert_eq!(summary.fallback_count, 1);
    assert_eq!(summary.included, products(&["X"]));
}

#[tokio::test]
async fn test_provider_and_fallback_failure_skips_item() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/photos"))
        .and(query_param("query", "Ghost"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_search(&server, "Lamp", Some("/img/lamp.png")).await;
    mount_image(&server, "/img/lamp.png", png_bytes(10, 10)).await;
    Mock::given(method("GET"))
        .and(path("/fallback.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fixture = Fixture::new();
    let compositor = fixture.compositor(&server, RecordingEncoder::new(&fixture.temp_dir));

    let summary = compositor
        .create_reel(&products(&["Ghost", "Lamp"]), &fixture.output)
        .await
        .unwrap();

    assert_eq!(summary.segment_count, 2);
    assert_eq!(summary.total_duration, 6.0);
    assert_eq!(summary.included, products(&["Lamp"]));
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].product, ProductItem::new("Ghost"));
}

#[tokio::test]
async fn test_unreadable_image_skips_item() {
    let server = MockServer::start().await;
    mount_search(&server, "Broken", Some("/img/broken.png")).await;
    Mock::given(method("GET"))
        .and(path("/img/broken.png"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not an image</html>"))
        .mount(&server)
        .await;

    let fixture = Fixture::new();
    let compositor = fixture.compositor(&server, RecordingEncoder::new(&fixture.temp_dir));

    let summary = compositor
        .create_reel(&products(&["Broken"]), &fixture.output)
        .await
        .unwrap();

    assert_eq!(summary.segment_count, 1);
    assert_eq!(summary.skipped.len(), 1);
    assert!(summary.skipped[0].reason.contains("cannot load"));
}

#[tokio::test]
async fn test_duplicate_labels_get_separate_files() {
    let server = MockServer::start().await;
    mount_search(&server, "Tea", Some("/img/tea.png")).await;
    mount_image(&server, "/img/tea.png", png_bytes(10, 10)).await;

    let fixture = Fixture::new();
    let compositor = fixture.compositor(&server, RecordingEncoder::new(&fixture.temp_dir));

    let summary = compositor
        .create_reel(&products(&["Tea", "Tea"]), &fixture.output)
        .await
        .unwrap();

    assert_eq!(summary.segment_count, 3);
    let inputs = image_inputs(&compositor.encoder().last_job());
    assert_eq!(inputs.len(), 2);
    assert_ne!(inputs[0], inputs[1]);
}

// === Music ===

#[tokio::test]
async fn test_music_is_trimmed_to_video_duration() {
    let server = MockServer::start().await;
    mount_search(&server, "Red Sneakers", Some("/img/red.png")).await;
    mount_search(&server, "Blue Jacket", Some("/img/blue.png")).await;
    mount_image(&server, "/img/red.png", png_bytes(10, 10)).await;
    mount_image(&server, "/img/blue.png", png_bytes(10, 10)).await;

    let fixture = Fixture::new().with_music();
    let compositor = fixture.compositor(&server, RecordingEncoder::new(&fixture.temp_dir));

    let summary = compositor
        .create_reel(&products(&["Red Sneakers", "Blue Jacket"]), &fixture.output)
        .await
        .unwrap();

    assert!(summary.has_audio);
    let job = compositor.encoder().last_job();
    assert!(job.has_audio());
    let audio_chain = "atrim=0:9.000,asetpts=PTS-STARTPTS,\
        afade=t=in:st=0:d=1.000,afade=t=out:st=8.000:d=1.000[aout]";
    assert!(job.graph.filter_complex.contains(audio_chain));
    assert!(matches!(
        job.graph.inputs.last(),
        Some(InputSpec::Audio { path }) if *path == fixture.config.music_path
    ));
}

#[tokio::test]
async fn test_missing_music_renders_silent() {
    let server = MockServer::start().await;
    let fixture = Fixture::new();
    let compositor = fixture.compositor(&server, RecordingEncoder::new(&fixture.temp_dir));

    let summary = compositor.create_reel(&[], &fixture.output).await.unwrap();

    assert!(!summary.has_audio);
    let args = compositor.encoder().last_job().to_ffmpeg_args();
    assert!(args.contains(&"-an".to_string()));
}

// === Cleanup and output ===

#[tokio::test]
async fn test_transient_files_removed_after_success() {
    let server = MockServer::start().await;
    mount_search(&server, "Red Sneakers", Some("/img/red.png")).await;
    mount_image(&server, "/img/red.png", png_bytes(10, 10)).await;

    let fixture = Fixture::new();
    let compositor = fixture.compositor(&server, RecordingEncoder::new(&fixture.temp_dir));

    compositor
        .create_reel(&products(&["Red Sneakers"]), &fixture.output)
        .await
        .unwrap();

    // Image, caption and outro text existed while encoding
    let files_at_encode = compositor.encoder().files_at_encode.lock().unwrap().len();
    assert_eq!(files_at_encode, 3);
    assert!(fixture.temp_is_empty());
    assert!(fixture.output.exists());
}

#[tokio::test]
async fn test_transient_files_removed_after_encode_failure() {
    let server = MockServer::start().await;
    mount_search(&server, "Red Sneakers", Some("/img/red.png")).await;
    mount_image(&server, "/img/red.png", png_bytes(10, 10)).await;

    let fixture = Fixture::new();
    let compositor = fixture.compositor(&server, RecordingEncoder::failing(&fixture.temp_dir));

    let err = compositor
        .create_reel(&products(&["Red Sneakers"]), &fixture.output)
        .await
        .unwrap_err();

    assert!(matches!(err, ReelError::EncodeFailed { .. }));
    assert!(!compositor.encoder().files_at_encode.lock().unwrap().is_empty());
    assert!(fixture.temp_is_empty());
}

#[tokio::test]
async fn test_skipped_item_leaves_no_files() {
    let server = MockServer::start().await;
    mount_search(&server, "Broken", Some("/img/broken.png")).await;
    Mock::given(method("GET"))
        .and(path("/img/broken.png"))
        .respond_with(ResponseTemplate::new(200).set_body_string("garbage"))
        .mount(&server)
        .await;

    let fixture = Fixture::new();
    let compositor = fixture.compositor(&server, RecordingEncoder::new(&fixture.temp_dir));

    compositor
        .create_reel(&products(&["Broken"]), &fixture.output)
        .await
        .unwrap();

    assert!(fixture.temp_is_empty());
}

#[tokio::test]
async fn test_output_directory_is_created() {
    let server = MockServer::start().await;
    let fixture = Fixture::new();
    let nested = fixture.output.parent().unwrap().join("a").join("b").join("reel.mp4");
    let compositor = fixture.compositor(&server, RecordingEncoder::new(&fixture.temp_dir));

    compositor.create_reel(&[], &nested).await.unwrap();

    assert!(nested.parent().unwrap().is_dir());
    assert_eq!(compositor.encoder().last_job().output_path, nested);
}

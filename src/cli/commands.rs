//! Subcommand handlers for render, publish and config actions.

use std::path::{Path, PathBuf};

use super::args::ConfigAction;
use crate::assets::{parse_products, AssetError, AssetResolver, ImageSearchClient, ProductListError};
use crate::config::{Config, ConfigError, ACCESS_TOKEN_ENV, IMAGE_SEARCH_KEY_ENV, USER_ID_ENV};
use crate::publish::{
    GraphClient, GraphMediaApi, PublishError, PublishOutcome, Publisher, RetryPolicy, TokioDelay,
};
use crate::reel::{FfmpegEncoder, ReelCompositor, ReelError, ReelSummary};

/// Exit code for a publish run that ran out of attempts under `--strict`.
pub const EXIT_EXHAUSTED: i32 = 2;

/// Run-fatal errors surfaced by the CLI.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0} is not set (config file or environment)")]
    MissingSetting(&'static str),

    #[error(transparent)]
    Products(#[from] ProductListError),

    #[error(transparent)]
    Assets(#[from] AssetError),

    #[error(transparent)]
    Reel(#[from] ReelError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("config file already exists: {}", .0.display())]
    ConfigExists(PathBuf),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Render a reel for the given JSON product list.
pub async fn render(
    config: &Config,
    products_json: &str,
    output: Option<PathBuf>,
) -> Result<ReelSummary, CliError> {
    let products = parse_products(products_json)?;
    let output = output.unwrap_or_else(|| config.render.output_path.clone());

    let access_key = config
        .image_search
        .access_key
        .clone()
        .ok_or(CliError::MissingSetting(IMAGE_SEARCH_KEY_ENV))?;
    let client =
        ImageSearchClient::with_base_url(access_key, config.image_search.base_url.clone())?;
    let resolver = AssetResolver::new(
        client,
        config.image_search.orientation.clone(),
        config.image_search.fallback_image_url.clone(),
    );
    let compositor = ReelCompositor::new(
        resolver,
        FfmpegEncoder::new(&config.render.ffmpeg_path),
        config.render.clone(),
    );

    log::info!(
        "Rendering {} product(s) to {}",
        products.len(),
        output.display()
    );
    let summary = compositor.create_reel(&products, &output).await?;

    println!(
        "Reel saved to {} ({} segments, {:.1}s{})",
        summary.output_path.display(),
        summary.segment_count,
        summary.total_duration,
        if summary.has_audio { ", with music" } else { "" }
    );
    if summary.fallback_count > 0 {
        println!(
            "  {} product(s) used the fallback image",
            summary.fallback_count
        );
    }
    for skipped in &summary.skipped {
        println!("  skipped '{}': {}", skipped.product, skipped.reason);
    }

    Ok(summary)
}

/// Publish a reel from a public URL and report how it ended.
pub async fn publish(
    config: &Config,
    video_url: &str,
    caption: Option<String>,
) -> Result<PublishOutcome, CliError> {
    let settings = &config.publish;
    let user_id = settings
        .user_id
        .clone()
        .ok_or(CliError::MissingSetting(USER_ID_ENV))?;
    let access_token = settings
        .access_token
        .clone()
        .ok_or(CliError::MissingSetting(ACCESS_TOKEN_ENV))?;
    let caption = caption.unwrap_or_else(|| settings.caption.clone());

    let client = GraphClient::with_base_url(
        user_id,
        access_token,
        settings.graph_base_url.clone(),
        settings.api_version.clone(),
    )?;
    let publisher = Publisher::new(
        GraphMediaApi::new(client, settings.share_to_feed),
        TokioDelay,
        RetryPolicy::from_config(settings),
    );

    log::info!("Creating media container for {}", video_url);
    let outcome = publisher.publish_reel(video_url, &caption).await?;

    match &outcome {
        PublishOutcome::Published { media_id, attempts } => {
            println!("Published media {} (attempt {})", media_id, attempts);
            match publisher.api().client().permalink(media_id).await {
                Ok(Some(link)) => println!("Reel permalink: {}", link),
                Ok(None) => {}
                Err(e) => log::warn!("Could not fetch permalink: {}", e),
            }
        }
        PublishOutcome::Exhausted {
            creation_id,
            attempts,
        } => {
            println!(
                "Not published after {} attempt(s). Container {} can be published later.",
                attempts, creation_id
            );
        }
    }

    Ok(outcome)
}

/// Process exit code for a finished publish run.
pub fn publish_exit_code(outcome: &PublishOutcome, strict: bool) -> i32 {
    match outcome {
        PublishOutcome::Published { .. } => 0,
        PublishOutcome::Exhausted { .. } if strict => EXIT_EXHAUSTED,
        PublishOutcome::Exhausted { .. } => 0,
    }
}

/// Handle config subcommand actions.
pub fn handle_config_action(
    action: ConfigAction,
    config: &Config,
    config_path: &Path,
) -> Result<(), CliError> {
    match action {
        ConfigAction::Show => {
            if config_path.exists() {
                println!("# Config file: {} (exists)", config_path.display());
            } else {
                println!(
                    "# Config file: {} (not found, using defaults)",
                    config_path.display()
                );
            }
            println!();
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Init => {
            init_config(config_path)?;
            println!("Created config file: {}", config_path.display());
        }
    }
    Ok(())
}

/// Write a default config file, refusing to overwrite an existing one.
pub fn init_config(config_path: &Path) -> Result<(), CliError> {
    if config_path.exists() {
        return Err(CliError::ConfigExists(config_path.to_path_buf()));
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut content = String::from("# reelsmith configuration\n\n");
    content.push_str(&Config::default().to_toml()?);
    std::fs::write(config_path, content)?;
    Ok(())
}

use std::path::PathBuf;

/// Run-fatal errors of reel creation.
///
/// Per-item failures never surface here; they are logged and the item is
/// skipped.
#[derive(Debug, thiserror::Error)]
pub enum ReelError {
    #[error("ffmpeg not found at '{}'. Install it (e.g. `brew install ffmpeg`) or set render.ffmpeg_path", binary.display())]
    FfmpegNotFound { binary: PathBuf },

    #[error("failed to start ffmpeg: {0}")]
    SpawnFailed(std::io::Error),

    #[error("ffmpeg exited with code {}: {stderr}", exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    EncodeFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("cannot create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_failed_display() {
        let err = ReelError::EncodeFailed {
            exit_code: Some(1),
            stderr: "Invalid argument".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "ffmpeg exited with code 1: Invalid argument"
        );
    }

    #[test]
    fn test_encode_failed_without_code() {
        let err = ReelError::EncodeFailed {
            exit_code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("code none"));
    }

    #[test]
    fn test_not_found_mentions_binary() {
        let err = ReelError::FfmpegNotFound {
            binary: PathBuf::from("/opt/ffmpeg"),
        };
        assert!(err.to_string().contains("/opt/ffmpeg"));
    }
}

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::video::{DetectorError, VideoError};

/// 一次分析请求的失败原因。文本侧不会产生错误。
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Video not found: {0}")]
    NotFound(String),
    #[error("Invalid video: {0}")]
    InvalidVideo(String),
    #[error("Detector failure: {0}")]
    DetectorFailure(#[source] DetectorError),
    #[error("Analysis cancelled")]
    Cancelled,
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CheckError {
    /// 给宿主端用的稳定错误类型名
    pub fn error_type(&self) -> &'static str {
        match self {
            CheckError::NotFound(_) => "NotFound",
            CheckError::InvalidVideo(_) => "InvalidVideo",
            CheckError::DetectorFailure(_) => "DetectorFailure",
            CheckError::Cancelled => "Cancelled",
            CheckError::Config(_) => "Config",
        }
    }
}

impl From<VideoError> for CheckError {
    fn from(e: VideoError) -> Self {
        match e {
            VideoError::NotFound(path) => CheckError::NotFound(path),
            VideoError::InvalidVideo(msg) => CheckError::InvalidVideo(msg),
            VideoError::Detector(inner) => CheckError::DetectorFailure(inner),
            VideoError::Cancelled => CheckError::Cancelled,
            VideoError::InvalidConfig(msg) => CheckError::Config(msg),
            VideoError::Image(inner) => CheckError::InvalidVideo(inner.to_string()),
        }
    }
}

impl From<ConfigError> for CheckError {
    fn from(e: ConfigError) -> Self {
        CheckError::Config(e.to_string())
    }
}

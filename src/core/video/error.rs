use thiserror::Error;

/// 外部检测器失败，原样向上传播，不做本地重试
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Detector backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Video not found: {0}")]
    NotFound(String),
    #[error("Invalid video: {0}")]
    InvalidVideo(String),
    #[error(transparent)]
    Detector(#[from] DetectorError),
    #[error("Analysis cancelled")]
    Cancelled,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

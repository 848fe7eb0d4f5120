use serde::Serialize;

use crate::core::claims::Claims;
use crate::core::scoring::{ScoreBand, ScoreResult};
use crate::core::video::{RepresentativeFrame, VideoError, VideoStats};

/// JPEG 编码后的代表帧
#[derive(Debug, Clone, Serialize)]
pub struct FrameImage {
    pub frame_index: u64,
    pub timestamp_ms: u64,
    pub width: u32,
    pub height: u32,
    pub jpeg_data: Vec<u8>,
}

impl FrameImage {
    pub fn encode(frame: &RepresentativeFrame, quality: u8) -> Result<Self, VideoError> {
        Ok(Self {
            frame_index: frame.frame_index,
            timestamp_ms: frame.timestamp_ms,
            width: frame.frame.width,
            height: frame.frame.height,
            jpeg_data: frame.frame.to_jpeg(quality)?,
        })
    }
}

/// 一次分析的完整结果
///
/// `video_stats` 只序列化代表帧的元数据，图像数据通过 `frames` 单独提供。
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub claims: Claims,
    pub video_stats: VideoStats,
    pub score: ScoreResult,
    pub band: ScoreBand,
    #[serde(skip)]
    pub frames: Vec<FrameImage>,
}

impl AnalysisReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

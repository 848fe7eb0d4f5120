//! 分析配置 - 采样率、检测类别映射、置信度阈值等
//!
//! 所有字段都有默认值，宿主端可以用 JSON5 只覆盖需要改动的部分：
//!
//! ```json5
//! {
//!     // 每秒采样 2 帧
//!     sampling: { target_rate: 2.0 },
//!     detector: { weapon_classes: [43, 76] },
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::video::detector::ObjectClass;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] json5::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    pub sampling: SamplingConfig,
    pub detector: DetectorConfig,
    pub aggregation: AggregationConfig,
    pub output: OutputConfig,
    pub source: SourceConfig,
}

impl CheckerConfig {
    pub fn from_json5(text: &str) -> Result<Self, ConfigError> {
        let config: CheckerConfig = json5::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json5(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sampling.validate()?;
        self.detector.validate()?;
        if !(1..=100).contains(&self.output.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality must be in 1..=100, got {}",
                self.output.jpeg_quality
            )));
        }
        if !(self.source.image_sequence_fps.is_finite() && self.source.image_sequence_fps > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "image_sequence_fps must be positive, got {}",
                self.source.image_sequence_fps
            )));
        }
        Ok(())
    }
}

/// 采样配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// 每秒采样帧数
    pub target_rate: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { target_rate: 1.0 }
    }
}

impl SamplingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_rate.is_finite() && self.target_rate > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::Invalid(format!(
                "target_rate must be positive, got {}",
                self.target_rate
            )))
        }
    }
}

/// 检测类别映射与置信度阈值
///
/// 默认值对应 COCO 类别：person = 0，car = 2，motorcycle = 3，bus = 5，
/// truck = 7，knife = 76。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub confidence_threshold: f32,
    pub person_classes: Vec<u32>,
    pub vehicle_classes: Vec<u32>,
    pub weapon_classes: Vec<u32>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            person_classes: vec![0],
            vehicle_classes: vec![2, 3, 5, 7],
            weapon_classes: vec![76],
        }
    }
}

impl DetectorConfig {
    /// 类别 id 可能同时出现在多个列表中，按 person → vehicle → weapon 的顺序取第一个
    pub fn classify(&self, class_id: u32) -> Option<ObjectClass> {
        if self.person_classes.contains(&class_id) {
            Some(ObjectClass::Person)
        } else if self.vehicle_classes.contains(&class_id) {
            Some(ObjectClass::Vehicle)
        } else if self.weapon_classes.contains(&class_id) {
            Some(ObjectClass::Weapon)
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if (0.0..=1.0).contains(&self.confidence_threshold) {
            Ok(())
        } else {
            Err(ConfigError::Invalid(format!(
                "confidence_threshold must be in [0, 1], got {}",
                self.confidence_threshold
            )))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// 是否在 rayon 线程池上并行调用检测器
    pub parallel_detection: bool,
    /// 每批送检的帧数，0 表示使用 CPU 核数
    pub batch_size: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            parallel_detection: true,
            batch_size: 0,
        }
    }
}

impl AggregationConfig {
    pub fn effective_batch_size(&self) -> usize {
        if self.batch_size == 0 {
            num_cpus::get().max(1)
        } else {
            self.batch_size
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub jpeg_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { jpeg_quality: 70 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// 以图片目录形式提供的视频的原生帧率
    pub image_sequence_fps: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            image_sequence_fps: 30.0,
        }
    }
}

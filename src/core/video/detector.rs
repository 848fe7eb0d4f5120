use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::DetectorError;
use super::frame::Frame;
use crate::core::config::DetectorConfig;

/// 聚合阶段关心的目标类别，车辆子类（car/truck/bus/motorcycle）不作区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    Person,
    Vehicle,
    Weapon,
}

/// 归一化坐标（0.0 - 1.0）的检测框
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// 检测模型的原始输出：模型自己的类别 id + 置信度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub class_id: u32,
    pub confidence: f32,
    pub bbox: Option<BoundingBox>,
}

impl RawDetection {
    pub fn new(class_id: u32, confidence: f32) -> Self {
        Self {
            class_id,
            confidence,
            bbox: None,
        }
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }
}

/// 映射到 [`ObjectClass`] 之后的检测结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub class: ObjectClass,
    pub confidence: f32,
    pub bbox: Option<BoundingBox>,
}

/// 外部目标检测模型
///
/// Implementations may be expensive but must not keep per-request state that
/// the aggregator could observe: the same instance is shared across frames
/// and, with parallel detection enabled, across threads.
pub trait ObjectDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<Vec<RawDetection>, DetectorError>;
}

/// 检测器适配层 - 负责类别 id 到标签的映射
///
/// 进程启动时构造一次，之后注入聚合器复用，不随请求重新加载模型。
pub struct DetectorAdapter {
    detector: Arc<dyn ObjectDetector>,
    config: DetectorConfig,
}

impl DetectorAdapter {
    pub fn new(detector: Arc<dyn ObjectDetector>, config: DetectorConfig) -> Self {
        Self { detector, config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// 运行检测并映射类别；未配置的类别 id 直接丢弃。
    /// 置信度过滤留给聚合器。
    pub fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, DetectorError> {
        let raw = self.detector.detect(frame)?;
        Ok(raw
            .into_iter()
            .filter_map(|d| {
                self.config.classify(d.class_id).map(|class| Detection {
                    class,
                    confidence: d.confidence,
                    bbox: d.bbox,
                })
            })
            .collect())
    }
}

type DetectionScript = Box<dyn Fn(u64) -> Result<Vec<RawDetection>, DetectorError> + Send + Sync>;

/// 按帧号返回预设结果的检测器，用于测试与宿主端演示
pub struct MockObjectDetector {
    script: Option<DetectionScript>,
}

impl MockObjectDetector {
    pub fn new() -> Self {
        Self { script: None }
    }

    pub fn with_pattern<F>(pattern: F) -> Self
    where
        F: Fn(u64) -> Vec<RawDetection> + Send + Sync + 'static,
    {
        Self {
            script: Some(Box::new(move |frame_number| Ok(pattern(frame_number)))),
        }
    }

    /// 在 `failing_frame` 上返回后端错误，其余帧无检测结果
    pub fn failing_at(failing_frame: u64) -> Self {
        Self {
            script: Some(Box::new(move |frame_number| {
                if frame_number == failing_frame {
                    Err(DetectorError::Backend(format!(
                        "inference failed on frame {}",
                        frame_number
                    )))
                } else {
                    Ok(Vec::new())
                }
            })),
        }
    }
}

impl Default for MockObjectDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectDetector for MockObjectDetector {
    fn detect(&self, frame: &Frame) -> Result<Vec<RawDetection>, DetectorError> {
        match &self.script {
            Some(script) => script(frame.frame_number),
            None => Ok(Vec::new()),
        }
    }
}

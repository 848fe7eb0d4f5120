//! 检测结果聚合器
//!
//! 对每个采样帧：
//! 1. 过滤低于置信度阈值的检测
//! 2. 统计本帧人数 / 车辆数，更新全局最大值
//! 3. 任意一帧出现武器即置位
//! 4. 保存标注后的帧，最后挑出首 / 中 / 尾三帧作为代表帧

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use super::cancel::CancelToken;
use super::detector::{Detection, DetectorAdapter, ObjectClass};
use super::error::{DetectorError, VideoError};
use super::frame::Frame;
use super::sampler::{FrameSampler, SampledFrame};
use super::source::{FrameSourceOpener, SourceGuard};
use crate::core::config::AggregationConfig;

type DetectedFrame = (SampledFrame, Vec<Detection>);

/// 代表帧数量上限
pub const MAX_REPRESENTATIVE_FRAMES: usize = 3;

/// 代表帧，仅用于展示，不参与打分。序列化时不包含像素数据。
#[derive(Debug, Clone, Serialize)]
pub struct RepresentativeFrame {
    pub frame_index: u64,
    pub timestamp_ms: u64,
    #[serde(skip)]
    pub frame: Frame,
}

/// 视频侧统计结果
#[derive(Debug, Clone, Serialize)]
pub struct VideoStats {
    /// 单帧最大人数
    pub people: u32,
    /// 单帧最大车辆数
    pub cars: u32,
    pub weapon_present: bool,
    pub sampled_frames: usize,
    pub representative_frames: Vec<RepresentativeFrame>,
}

impl VideoStats {
    pub fn new(people: u32, cars: u32, weapon_present: bool) -> Self {
        Self {
            people,
            cars,
            weapon_present,
            sampled_frames: 0,
            representative_frames: Vec::new(),
        }
    }
}

/// 单帧计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameTally {
    pub people: u32,
    pub cars: u32,
    pub weapon: bool,
}

impl FrameTally {
    pub fn from_detections(detections: &[Detection], threshold: f32) -> Self {
        detections
            .iter()
            .filter(|d| d.confidence >= threshold)
            .fold(Self::default(), |mut tally, d| {
                match d.class {
                    ObjectClass::Person => tally.people += 1,
                    ObjectClass::Vehicle => tally.cars += 1,
                    ObjectClass::Weapon => tally.weapon = true,
                }
                tally
            })
    }
}

/// 取首 / 中 / 尾；不超过三项时原样保留
pub fn select_representative<T>(items: Vec<T>) -> Vec<T> {
    let n = items.len();
    if n <= MAX_REPRESENTATIVE_FRAMES {
        return items;
    }
    let keep = [0, n / 2, n - 1];
    items
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, item)| item)
        .collect()
}

/// 聚合中间状态；请求失败或取消时整体丢弃
struct StatsAccumulator {
    threshold: f32,
    max_people: u32,
    max_cars: u32,
    weapon_present: bool,
    saved_frames: Vec<RepresentativeFrame>,
}

impl StatsAccumulator {
    fn new(threshold: f32) -> Self {
        Self {
            threshold,
            max_people: 0,
            max_cars: 0,
            weapon_present: false,
            saved_frames: Vec::new(),
        }
    }

    fn fold(&mut self, sampled: SampledFrame, detections: &[Detection]) {
        let tally = FrameTally::from_detections(detections, self.threshold);
        debug!(
            "Frame {}: people={} cars={} weapon={}",
            sampled.index, tally.people, tally.cars, tally.weapon
        );

        self.max_people = self.max_people.max(tally.people);
        self.max_cars = self.max_cars.max(tally.cars);
        self.weapon_present |= tally.weapon;

        self.saved_frames.push(annotate(sampled, detections, self.threshold));
    }

    fn finish(self) -> VideoStats {
        let sampled_frames = self.saved_frames.len();
        VideoStats {
            people: self.max_people,
            cars: self.max_cars,
            weapon_present: self.weapon_present,
            sampled_frames,
            representative_frames: select_representative(self.saved_frames),
        }
    }
}

fn annotate(
    sampled: SampledFrame,
    detections: &[Detection],
    threshold: f32,
) -> RepresentativeFrame {
    let qualifying: Vec<Detection> = detections
        .iter()
        .filter(|d| d.confidence >= threshold)
        .copied()
        .collect();
    RepresentativeFrame {
        frame_index: sampled.index,
        timestamp_ms: sampled.frame.timestamp_ms(),
        frame: sampled.frame.annotated(&qualifying),
    }
}

/// 采样 → 检测 → 聚合
///
/// 持有长生命周期的检测器适配层，每个请求只新建帧源与中间状态。
pub struct FrameAggregator {
    adapter: Arc<DetectorAdapter>,
    sampler: FrameSampler,
    config: AggregationConfig,
}

impl FrameAggregator {
    pub fn new(
        adapter: Arc<DetectorAdapter>,
        sampler: FrameSampler,
        config: AggregationConfig,
    ) -> Self {
        Self {
            adapter,
            sampler,
            config,
        }
    }

    pub fn aggregate(
        &self,
        opener: &dyn FrameSourceOpener,
        path: &Path,
        cancel: &CancelToken,
    ) -> Result<VideoStats, VideoError> {
        cancel.check()?;
        let threshold = self.adapter.config().confidence_threshold;
        let batch_size = self.config.effective_batch_size();

        let mut frames = self.sampler.sample_path(opener, path)?;
        let mut acc = StatsAccumulator::new(threshold);

        loop {
            cancel.check()?;

            let batch = frames
                .by_ref()
                .take(batch_size)
                .collect::<Result<Vec<_>, _>>()?;
            if batch.is_empty() {
                break;
            }

            for (sampled, detections) in self.detect_batch(batch)? {
                acc.fold(sampled, &detections);
            }
        }
        let frames_read = frames.frames_read();
        drop(frames);

        if acc.saved_frames.is_empty() {
            cancel.check()?;
            if let Some(fallback) = self.fallback_frame(opener, path)? {
                acc.saved_frames.push(fallback);
            }
            // 回退帧只用于展示，不计入 sampled_frames
            let mut stats = acc.finish();
            stats.sampled_frames = 0;
            return Ok(stats);
        }

        let stats = acc.finish();
        info!(
            "✅ Aggregated {} sampled frames ({} read): people={} cars={} weapon={}",
            stats.sampled_frames, frames_read, stats.people, stats.cars, stats.weapon_present
        );
        Ok(stats)
    }

    /// 在 rayon 线程池上并行检测一批帧；结果按帧序号重新排序
    fn detect_batch(
        &self,
        batch: Vec<SampledFrame>,
    ) -> Result<Vec<DetectedFrame>, DetectorError> {
        let adapter = &self.adapter;
        let detect = |sampled: SampledFrame| -> Result<DetectedFrame, DetectorError> {
            let detections = adapter.detect(&sampled.frame)?;
            Ok((sampled, detections))
        };

        let mut results = if self.config.parallel_detection {
            batch
                .into_par_iter()
                .map(detect)
                .collect::<Result<Vec<_>, DetectorError>>()?
        } else {
            batch
                .into_iter()
                .map(detect)
                .collect::<Result<Vec<_>, DetectorError>>()?
        };

        results.sort_by_key(|(sampled, _)| sampled.index);
        Ok(results)
    }

    /// 没有任何采样帧时，重新打开视频读取第一帧作为唯一的代表帧。
    ///
    /// 这一帧会跑一次检测用于标注，但检测结果不计入人数、车辆数与武器标记。
    fn fallback_frame(
        &self,
        opener: &dyn FrameSourceOpener,
        path: &Path,
    ) -> Result<Option<RepresentativeFrame>, VideoError> {
        warn!("⚠️ No frames sampled, re-reading first frame for display only");

        let mut guard = SourceGuard::open(opener, path)?;
        let Some(frame) = guard.next_frame()? else {
            return Ok(None);
        };
        guard.release();

        let detections = self.adapter.detect(&frame)?;
        Ok(Some(annotate(
            SampledFrame { index: 0, frame },
            &detections,
            self.adapter.config().confidence_threshold,
        )))
    }
}

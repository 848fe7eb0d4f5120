use log::{debug, info};
use std::path::Path;

use super::error::VideoError;
use super::frame::Frame;
use super::source::{FrameSourceOpener, SourceGuard};

/// 采样得到的一帧，`index` 是其在原视频中的 0 基帧序号
#[derive(Debug, Clone)]
pub struct SampledFrame {
    pub index: u64,
    pub frame: Frame,
}

/// 固定间隔抽帧器
pub struct FrameSampler {
    target_rate: f64,
}

impl FrameSampler {
    pub fn new(target_rate: f64) -> Self {
        Self { target_rate }
    }

    /// `max(1, floor(native_fps / target_rate))`
    pub fn interval(&self, native_fps: f64) -> Result<u64, VideoError> {
        if !(native_fps.is_finite() && native_fps > 0.0) {
            return Err(VideoError::InvalidVideo(format!(
                "unable to determine frame rate (fps = {})",
                native_fps
            )));
        }
        if !(self.target_rate.is_finite() && self.target_rate > 0.0) {
            return Err(VideoError::InvalidConfig(format!(
                "target_rate must be positive, got {}",
                self.target_rate
            )));
        }
        Ok(((native_fps / self.target_rate).floor() as u64).max(1))
    }

    /// 接管帧源；返回的迭代器被 drop 时帧源随之关闭，包括调用方提前停止迭代的情况
    pub fn sample(&self, guard: SourceGuard) -> Result<SampledFrames, VideoError> {
        let fps = guard.fps();
        let interval = self.interval(fps)?;
        info!(
            "📹 Sampling at {} fps from {} fps source (every {} frames)",
            self.target_rate, fps, interval
        );
        Ok(SampledFrames {
            guard,
            interval,
            next_index: 0,
            finished: false,
        })
    }

    pub fn sample_path(
        &self,
        opener: &dyn FrameSourceOpener,
        path: &Path,
    ) -> Result<SampledFrames, VideoError> {
        self.sample(SourceGuard::open(opener, path)?)
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// 有限、单次的采样帧序列
pub struct SampledFrames {
    guard: SourceGuard,
    interval: u64,
    next_index: u64,
    finished: bool,
}

impl SampledFrames {
    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// 已读取的原始帧数（含未被采样的帧）
    pub fn frames_read(&self) -> u64 {
        self.next_index
    }

    fn finish(&mut self) {
        self.finished = true;
        self.guard.release();
    }
}

impl Iterator for SampledFrames {
    type Item = Result<SampledFrame, VideoError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let frame = match self.guard.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    debug!("Source exhausted after {} frames", self.next_index);
                    self.finish();
                    return None;
                }
                Err(e) => {
                    self.finish();
                    return Some(Err(e));
                }
            };

            let index = self.next_index;
            self.next_index += 1;

            if index % self.interval == 0 {
                return Some(Ok(SampledFrame { index, frame }));
            }
        }
    }
}

//! 帧源 - 视频解码的外部边界
//!
//! 帧源是一次性的：读完即止，重新读取需要重新打开。
//! [`SourceGuard`] 负责在所有退出路径上关闭帧源。

use log::{debug, info, warn};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::error::VideoError;
use super::frame::{Frame, RawFrame};

pub trait FrameSource: Send {
    /// 原生帧率
    fn fps(&self) -> f64;

    fn next_frame(&mut self) -> Result<Option<Frame>, VideoError>;

    fn close(&mut self) -> Result<(), VideoError> {
        Ok(())
    }
}

pub trait FrameSourceOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, VideoError>;
}

/// 持有一个已打开的帧源，drop 时关闭
///
/// 关闭失败只记录日志，不覆盖调用方正在传播的错误。
pub struct SourceGuard {
    source: Option<Box<dyn FrameSource>>,
}

impl SourceGuard {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    pub fn open(opener: &dyn FrameSourceOpener, path: &Path) -> Result<Self, VideoError> {
        Ok(Self::new(opener.open(path)?))
    }

    pub fn fps(&self) -> f64 {
        self.source.as_ref().map(|s| s.fps()).unwrap_or(0.0)
    }

    pub fn next_frame(&mut self) -> Result<Option<Frame>, VideoError> {
        match self.source.as_mut() {
            Some(source) => source.next_frame(),
            None => Ok(None),
        }
    }

    /// 提前释放；之后 `next_frame` 只会返回 `None`
    pub fn release(&mut self) {
        if let Some(mut source) = self.source.take() {
            if let Err(e) = source.close() {
                warn!("⚠️ Failed to close frame source: {}", e);
            } else {
                debug!("Frame source closed");
            }
        }
    }
}

impl Drop for SourceGuard {
    fn drop(&mut self) {
        self.release();
    }
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// 图片目录形式的视频：每个文件是一帧，按文件名排序
pub struct ImageSequenceOpener {
    fps: f64,
}

impl ImageSequenceOpener {
    pub fn new(fps: f64) -> Self {
        Self { fps }
    }
}

impl FrameSourceOpener for ImageSequenceOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, VideoError> {
        if !path.exists() {
            return Err(VideoError::NotFound(path.display().to_string()));
        }
        if !path.is_dir() {
            return Err(VideoError::InvalidVideo(format!(
                "{} is not a frame directory",
                path.display()
            )));
        }

        let entries = std::fs::read_dir(path).map_err(|e| {
            VideoError::InvalidVideo(format!("cannot open {}: {}", path.display(), e))
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_image_extension(p))
            .collect();
        files.sort();

        info!(
            "🎬 Opened image sequence {} ({} frames @ {} fps)",
            path.display(),
            files.len(),
            self.fps
        );

        Ok(Box::new(ImageSequenceSource {
            files: files.into(),
            fps: self.fps,
            next_number: 0,
        }))
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

pub struct ImageSequenceSource {
    files: VecDeque<PathBuf>,
    fps: f64,
    next_number: u64,
}

impl FrameSource for ImageSequenceSource {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, VideoError> {
        let Some(path) = self.files.pop_front() else {
            return Ok(None);
        };

        let img = image::open(&path)
            .map_err(|e| VideoError::InvalidVideo(format!("{}: {}", path.display(), e)))?
            .to_rgba8();

        let frame_number = self.next_number;
        self.next_number += 1;
        let timestamp_ms = if self.fps > 0.0 {
            (frame_number as f64 * 1000.0 / self.fps) as u64
        } else {
            0
        };

        Ok(Some(Frame::new(
            img.width(),
            img.height(),
            img.into_raw(),
            timestamp_ms,
            frame_number,
        )))
    }

    fn close(&mut self) -> Result<(), VideoError> {
        self.files.clear();
        Ok(())
    }
}

/// 原生层已解码好的 YUV 帧序列
///
/// 每次 `open` 返回一份独立的帧源，便于聚合器回退时重新读取第一帧。
#[derive(Clone)]
pub struct MemoryOpener {
    fps: f64,
    frames: Arc<Vec<RawFrame>>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl MemoryOpener {
    pub fn new(fps: f64, frames: Vec<RawFrame>) -> Self {
        Self {
            fps,
            frames: Arc::new(frames),
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl FrameSourceOpener for MemoryOpener {
    fn open(&self, _path: &Path) -> Result<Box<dyn FrameSource>, VideoError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryFrameSource {
            fps: self.fps,
            frames: Arc::clone(&self.frames),
            position: 0,
            closed: Arc::clone(&self.closed),
        }))
    }
}

pub struct MemoryFrameSource {
    fps: f64,
    frames: Arc<Vec<RawFrame>>,
    position: usize,
    closed: Arc<AtomicUsize>,
}

impl FrameSource for MemoryFrameSource {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, VideoError> {
        let frame = self.frames.get(self.position).map(RawFrame::to_rgba);
        if frame.is_some() {
            self.position += 1;
        }
        Ok(frame)
    }

    fn close(&mut self) -> Result<(), VideoError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

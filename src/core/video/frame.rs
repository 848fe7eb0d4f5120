use image::{ImageOutputFormat, RgbImage};
use std::io::Cursor;
use std::time::Duration;

use super::detector::{Detection, ObjectClass};
use super::error::VideoError;

/// 帧数据结构
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // RGBA 格式
    pub timestamp: Duration,
    pub frame_number: u64,
}

impl Frame {
    pub fn new(
        width: u32,
        height: u32,
        data: Vec<u8>,
        timestamp_ms: u64,
        frame_number: u64,
    ) -> Self {
        Self {
            width,
            height,
            data,
            timestamp: Duration::from_millis(timestamp_ms),
            frame_number,
        }
    }

    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp.as_millis() as u64
    }

    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.pixel_count() * 3);
        for chunk in self.data.chunks_exact(4) {
            rgb.push(chunk[0]); // R
            rgb.push(chunk[1]); // G
            rgb.push(chunk[2]); // B
        }
        rgb
    }

    /// 复制一帧并描出带框检测结果的轮廓
    pub fn annotated(&self, detections: &[Detection]) -> Frame {
        let mut out = self.clone();
        for detection in detections {
            if let Some(bbox) = detection.bbox {
                out.draw_box(
                    bbox.x,
                    bbox.y,
                    bbox.width,
                    bbox.height,
                    box_color(detection.class),
                );
            }
        }
        out
    }

    /// 编码为 JPEG，用于代表帧输出
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>, VideoError> {
        let img = RgbImage::from_raw(self.width, self.height, self.to_rgb()).ok_or_else(|| {
            VideoError::InvalidVideo(format!(
                "frame {} buffer does not match {}x{}",
                self.frame_number, self.width, self.height
            ))
        })?;

        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageOutputFormat::Jpeg(quality))?;
        Ok(buffer.into_inner())
    }

    fn draw_box(&mut self, x: f32, y: f32, w: f32, h: f32, color: [u8; 3]) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let max_x = self.width - 1;
        let max_y = self.height - 1;
        let to_px = |v: f32, max: u32| ((v.clamp(0.0, 1.0) * max as f32).round() as u32).min(max);

        let x0 = to_px(x, max_x);
        let y0 = to_px(y, max_y);
        let x1 = to_px(x + w, max_x);
        let y1 = to_px(y + h, max_y);

        for t in 0..BOX_THICKNESS {
            for px in x0..=x1 {
                self.put_pixel(px, (y0 + t).min(max_y), color);
                self.put_pixel(px, y1.saturating_sub(t), color);
            }
            for py in y0..=y1 {
                self.put_pixel((x0 + t).min(max_x), py, color);
                self.put_pixel(x1.saturating_sub(t), py, color);
            }
        }
    }

    fn put_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        let idx = ((y * self.width + x) * 4) as usize;
        if let Some(px) = self.data.get_mut(idx..idx + 4) {
            px[0] = color[0];
            px[1] = color[1];
            px[2] = color[2];
            px[3] = 255;
        }
    }
}

const BOX_THICKNESS: u32 = 2;

fn box_color(class: ObjectClass) -> [u8; 3] {
    match class {
        ObjectClass::Person => [0, 200, 0],
        ObjectClass::Vehicle => [0, 90, 255],
        ObjectClass::Weapon => [230, 0, 0],
    }
}

/// 从原生解码层传递的原始帧数据（YUV420 平面）
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub y_plane: Vec<u8>,
    pub u_plane: Vec<u8>,
    pub v_plane: Vec<u8>,
    pub timestamp_ms: u64,
    pub frame_number: u64,
}

impl RawFrame {
    pub fn to_rgba(&self) -> Frame {
        let mut rgba_data = vec![0u8; (self.width * self.height * 4) as usize];

        for y in 0..self.height {
            for x in 0..self.width {
                let y_idx = (y * self.width + x) as usize;
                let uv_idx = ((y / 2) * (self.width / 2) + x / 2) as usize;

                let y_val = self.y_plane.get(y_idx).copied().unwrap_or(0) as f32;
                let u_val = self.u_plane.get(uv_idx).copied().unwrap_or(128) as f32 - 128.0;
                let v_val = self.v_plane.get(uv_idx).copied().unwrap_or(128) as f32 - 128.0;

                let r = (y_val + 1.402 * v_val).clamp(0.0, 255.0) as u8;
                let g = (y_val - 0.344136 * u_val - 0.714136 * v_val).clamp(0.0, 255.0) as u8;
                let b = (y_val + 1.772 * u_val).clamp(0.0, 255.0) as u8;

                let rgba_idx = y_idx * 4;
                rgba_data[rgba_idx] = r;
                rgba_data[rgba_idx + 1] = g;
                rgba_data[rgba_idx + 2] = b;
                rgba_data[rgba_idx + 3] = 255;
            }
        }

        Frame::new(
            self.width,
            self.height,
            rgba_data,
            self.timestamp_ms,
            self.frame_number,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::video::detector::BoundingBox;

    #[test]
    fn test_frame_creation() {
        let data = vec![255u8; 100 * 100 * 4]; // 100x100 white image
        let frame = Frame::new(100, 100, data, 1000, 30);

        assert_eq!(frame.width, 100);
        assert_eq!(frame.height, 100);
        assert_eq!(frame.pixel_count(), 10000);
        assert_eq!(frame.timestamp_ms(), 1000);
        assert_eq!(frame.frame_number, 30);
    }

    #[test]
    fn test_yuv_to_rgba() {
        let width = 64;
        let height = 64;
        let raw_frame = RawFrame {
            width,
            height,
            y_plane: vec![128u8; (width * height) as usize],
            u_plane: vec![128u8; (width * height / 4) as usize],
            v_plane: vec![128u8; (width * height / 4) as usize],
            timestamp_ms: 0,
            frame_number: 0,
        };

        let frame = raw_frame.to_rgba();
        assert_eq!(frame.width, width);
        assert_eq!(frame.height, height);
        assert_eq!(frame.data.len(), (width * height * 4) as usize);
        // 中性色度 => 灰色
        assert_eq!(&frame.data[0..4], &[128, 128, 128, 255]);
    }

    #[test]
    fn test_annotated_draws_outline_only() {
        let frame = Frame::new(20, 20, vec![0u8; 20 * 20 * 4], 0, 0);
        let detection = Detection {
            class: ObjectClass::Weapon,
            confidence: 0.9,
            bbox: Some(BoundingBox {
                x: 0.0,
                y: 0.0,
                width: 0.5,
                height: 0.5,
            }),
        };

        let annotated = frame.annotated(&[detection]);
        // 左上角在框上
        assert_eq!(&annotated.data[0..4], &[230, 0, 0, 255]);
        // 框内部保持原样
        let inner = ((5 * 20 + 5) * 4) as usize;
        assert_eq!(&annotated.data[inner..inner + 4], &[0, 0, 0, 0]);
        // 原帧不变
        assert!(frame.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_annotated_without_bbox_is_identical() {
        let frame = Frame::new(4, 4, vec![7u8; 4 * 4 * 4], 0, 0);
        let detection = Detection {
            class: ObjectClass::Person,
            confidence: 0.8,
            bbox: None,
        };
        assert_eq!(frame.annotated(&[detection]).data, frame.data);
    }

    #[test]
    fn test_to_jpeg() {
        let frame = Frame::new(16, 16, vec![200u8; 16 * 16 * 4], 0, 0);
        let jpeg = frame.to_jpeg(70).expect("encode");
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_to_jpeg_rejects_short_buffer() {
        let frame = Frame::new(16, 16, vec![0u8; 10], 0, 0);
        assert!(matches!(frame.to_jpeg(70), Err(VideoError::InvalidVideo(_))));
    }
}

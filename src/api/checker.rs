//! 一致性检查器 - 对外入口

use log::{error, info};
use std::path::Path;
use std::sync::Arc;

use super::error::CheckError;
use super::models::{AnalysisReport, FrameImage};
use crate::core::claims::{self, Claims};
use crate::core::config::CheckerConfig;
use crate::core::scoring::{self, ScoreResult};
use crate::core::video::{
    CancelToken, DetectorAdapter, FrameAggregator, FrameSampler, FrameSourceOpener,
    ImageSequenceOpener, ObjectDetector, VideoStats,
};

/// 视频 ↔ 文本一致性检查器
///
/// 检测器在创建时注入并在整个进程生命周期内复用；每次 `analyze` 都是一个
/// 独立请求，不共享可变状态。
///
/// ```ignore
/// let checker = EvidenceChecker::create(CheckerConfig::default(), Arc::new(detector))?;
/// let report = checker.analyze("/data/clip_frames", "Two people and one car, no weapons.")?;
/// println!("{}", report.score.score);
/// ```
pub struct EvidenceChecker {
    config: CheckerConfig,
    aggregator: FrameAggregator,
    image_sequences: ImageSequenceOpener,
}

impl EvidenceChecker {
    pub fn create(
        config: CheckerConfig,
        detector: Arc<dyn ObjectDetector>,
    ) -> Result<Self, CheckError> {
        crate::init_logging();
        config.validate()?;

        let adapter = DetectorAdapter::new(detector, config.detector.clone());
        let aggregator = FrameAggregator::new(
            Arc::new(adapter),
            FrameSampler::new(config.sampling.target_rate),
            config.aggregation.clone(),
        );
        let image_sequences = ImageSequenceOpener::new(config.source.image_sequence_fps);

        info!(
            "🔍 EvidenceChecker: created (target_rate={}, threshold={})",
            config.sampling.target_rate, config.detector.confidence_threshold
        );
        Ok(Self {
            config,
            aggregator,
            image_sequences,
        })
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// 分析以图片目录形式给出的视频
    pub fn analyze(&self, video_path: &str, text: &str) -> Result<AnalysisReport, CheckError> {
        self.analyze_with(
            &self.image_sequences,
            Path::new(video_path),
            text,
            &CancelToken::new(),
        )
    }

    /// 使用自定义帧源分析；`cancel` 被触发时请求以 `Cancelled` 结束，不返回部分结果
    pub fn analyze_with(
        &self,
        opener: &dyn FrameSourceOpener,
        video_path: &Path,
        text: &str,
        cancel: &CancelToken,
    ) -> Result<AnalysisReport, CheckError> {
        info!("📹 Analyzing video: {}", video_path.display());

        let video_stats = self
            .aggregator
            .aggregate(opener, video_path, cancel)
            .map_err(|e| {
                error!("❌ Video analysis failed: {}", e);
                CheckError::from(e)
            })?;

        let claims = claims::extract_claims(text);
        let score = scoring::score_consistency(&claims, &video_stats);

        cancel.check()?;
        let frames = video_stats
            .representative_frames
            .iter()
            .map(|f| FrameImage::encode(f, self.config.output.jpeg_quality))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "✅ Analysis complete: score={} ({} claims, {} frames)",
            score.score,
            score.details.len(),
            frames.len()
        );

        Ok(AnalysisReport {
            claims,
            band: score.band(),
            video_stats,
            score,
            frames,
        })
    }
}

impl Drop for EvidenceChecker {
    fn drop(&mut self) {
        info!("🗑️ EvidenceChecker: released");
    }
}

/// 只做文本抽取
pub fn extract_claims(text: &str) -> Claims {
    claims::extract_claims(text)
}

/// 只做打分
pub fn score_consistency(claims: &Claims, video_stats: &VideoStats) -> ScoreResult {
    scoring::score_consistency(claims, video_stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scoring::{ScoreBand, Verdict};
    use crate::core::video::aggregator::tests::EmptyOnFirstOpen;
    use crate::core::video::{
        BoundingBox, MemoryOpener, MockObjectDetector, RawDetection, RawFrame,
    };

    fn raw_frames(count: u64) -> Vec<RawFrame> {
        (0..count)
            .map(|n| RawFrame {
                width: 8,
                height: 8,
                y_plane: vec![90u8; 64],
                u_plane: vec![128u8; 16],
                v_plane: vec![128u8; 16],
                timestamp_ms: n * 100,
                frame_number: n,
            })
            .collect()
    }

    /// 每帧 3 人 2 车，无武器
    fn parking_lot_detector() -> MockObjectDetector {
        MockObjectDetector::with_pattern(|_| {
            vec![
                RawDetection::new(0, 0.9).with_bbox(BoundingBox {
                    x: 0.1,
                    y: 0.1,
                    width: 0.2,
                    height: 0.5,
                }),
                RawDetection::new(0, 0.8),
                RawDetection::new(0, 0.7),
                RawDetection::new(2, 0.9),
                RawDetection::new(7, 0.6),
                RawDetection::new(76, 0.3),
            ]
        })
    }

    fn checker(detector: MockObjectDetector) -> EvidenceChecker {
        EvidenceChecker::create(CheckerConfig::default(), Arc::new(detector)).expect("create")
    }

    #[test]
    fn test_consistent_report() {
        let checker = checker(parking_lot_detector());
        let opener = MemoryOpener::new(10.0, raw_frames(50));

        let report = checker
            .analyze_with(
                &opener,
                Path::new("parking_lot"),
                "There were three people and two cars in the parking lot. No weapons were present.",
                &CancelToken::new(),
            )
            .expect("analyze");

        assert_eq!(report.score.score, 100);
        assert_eq!(report.band, ScoreBand::High);
        assert_eq!(report.score.details.len(), 3);
        assert!(report
            .score
            .details
            .iter()
            .all(|d| d.result == Verdict::Supported));
        assert_eq!(report.video_stats.sampled_frames, 5);
        assert_eq!(report.frames.len(), 3);
        assert_eq!(
            report.frames.iter().map(|f| f.frame_index).collect::<Vec<_>>(),
            vec![0, 20, 40]
        );
        assert!(report.frames.iter().all(|f| f.jpeg_data.starts_with(&[0xFF, 0xD8])));
        assert_eq!(opener.close_count(), 1);
    }

    #[test]
    fn test_report_json_excludes_pixels() {
        let checker = checker(parking_lot_detector());
        let opener = MemoryOpener::new(1.0, raw_frames(2));

        let report = checker
            .analyze_with(&opener, Path::new("clip"), "five people", &CancelToken::new())
            .expect("analyze");
        let json: serde_json::Value =
            serde_json::from_str(&report.to_json().expect("json")).expect("parse");

        assert_eq!(json["claims"]["people"], 5);
        assert!(json["claims"]["cars"].is_null());
        assert_eq!(json["score"]["score"], 70);
        assert_eq!(json["band"], "medium");
        assert_eq!(json["video_stats"]["people"], 3);
        assert_eq!(json["video_stats"]["representative_frames"][1]["frame_index"], 1);
        assert!(json["video_stats"]["representative_frames"][0].get("frame").is_none());
        assert!(json.get("frames").is_none());
    }

    #[test]
    fn test_text_without_claims_scores_neutral() {
        let checker = checker(parking_lot_detector());
        let opener = MemoryOpener::new(1.0, raw_frames(3));

        let report = checker
            .analyze_with(&opener, Path::new("clip"), "", &CancelToken::new())
            .expect("analyze");
        assert!(report.claims.is_empty());
        assert_eq!(report.score.score, 100);
        assert!(report.score.details.is_empty());
    }

    #[test]
    fn test_missing_video_is_not_found() {
        let checker = checker(MockObjectDetector::new());
        let err = checker
            .analyze("/no/such/video/frames", "two people")
            .expect_err("missing");
        assert_eq!(err.error_type(), "NotFound");
    }

    #[test]
    fn test_zero_fps_is_invalid_video() {
        let checker = checker(MockObjectDetector::new());
        let opener = MemoryOpener::new(0.0, raw_frames(3));
        let err = checker
            .analyze_with(&opener, Path::new("clip"), "two people", &CancelToken::new())
            .expect_err("invalid");
        assert!(matches!(err, CheckError::InvalidVideo(_)));
        assert_eq!(opener.close_count(), 1);
    }

    #[test]
    fn test_detector_failure_aborts_request() {
        let checker = checker(MockObjectDetector::failing_at(0));
        let opener = MemoryOpener::new(1.0, raw_frames(3));
        let err = checker
            .analyze_with(&opener, Path::new("clip"), "two people", &CancelToken::new())
            .expect_err("failure");
        assert!(matches!(err, CheckError::DetectorFailure(_)));
        assert_eq!(opener.close_count(), 1);
    }

    #[test]
    fn test_cancelled_request() {
        let checker = checker(MockObjectDetector::new());
        let opener = MemoryOpener::new(1.0, raw_frames(3));
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = checker
            .analyze_with(&opener, Path::new("clip"), "two people", &cancel)
            .expect_err("cancelled");
        assert!(matches!(err, CheckError::Cancelled));
    }

    #[test]
    fn test_cancelled_after_aggregation_skips_encoding() {
        let cancel = CancelToken::new();
        let cancel_from_detector = cancel.clone();
        // 只有回退帧会走到检测器
        let checker = checker(MockObjectDetector::with_pattern(move |_| {
            cancel_from_detector.cancel();
            Vec::new()
        }));
        let opener = EmptyOnFirstOpen::new(MemoryOpener::new(30.0, raw_frames(2)));

        let err = checker
            .analyze_with(&opener, Path::new("clip"), "two people", &cancel)
            .expect_err("cancelled");
        assert!(matches!(err, CheckError::Cancelled));
        assert_eq!(opener.inner.close_count(), 1);
    }

    #[test]
    fn test_image_directory_end_to_end() {
        let dir = tempfile::tempdir().expect("tempdir");
        for n in 0..6 {
            let img = image::RgbImage::from_pixel(8, 6, image::Rgb([40, 40, 40]));
            img.save(dir.path().join(format!("{:04}.png", n))).expect("save");
        }

        let config = CheckerConfig::from_json5("{ source: { image_sequence_fps: 2 } }")
            .expect("config");
        let detector = MockObjectDetector::with_pattern(|n| {
            if n == 4 {
                vec![RawDetection::new(76, 0.95)]
            } else {
                vec![RawDetection::new(3, 0.9)]
            }
        });
        let checker = EvidenceChecker::create(config, Arc::new(detector)).expect("create");

        let report = checker
            .analyze(
                dir.path().to_str().expect("utf8 path"),
                "One vehicle, no knife.",
            )
            .expect("analyze");

        assert_eq!(report.claims.cars, Some(1));
        assert_eq!(report.claims.weapon_present, Some(false));
        assert!(report.video_stats.weapon_present);
        assert_eq!(report.score.score, 60);
        assert_eq!(report.video_stats.sampled_frames, 3);
        assert_eq!(report.frames[0].width, 8);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = CheckerConfig::default();
        config.sampling.target_rate = -1.0;
        let result = EvidenceChecker::create(config, Arc::new(MockObjectDetector::new()));
        assert!(matches!(result, Err(CheckError::Config(_))));
    }

    #[test]
    fn test_stage_functions() {
        let claims = extract_claims("4 individuals, 1 automobile, a handgun");
        assert_eq!(claims.people, Some(4));
        assert_eq!(claims.cars, Some(1));
        assert_eq!(claims.weapon_present, Some(true));

        let result = score_consistency(&claims, &VideoStats::new(3, 3, true));
        assert_eq!(result.score, 60);
    }
}

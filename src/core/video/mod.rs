pub mod aggregator;
pub mod cancel;
pub mod detector;
pub mod error;
pub mod frame;
pub mod sampler;
pub mod source;

pub use aggregator::{FrameAggregator, FrameTally, RepresentativeFrame, VideoStats};
pub use cancel::CancelToken;
pub use detector::{
    BoundingBox, Detection, DetectorAdapter, MockObjectDetector, ObjectClass, ObjectDetector,
    RawDetection,
};
pub use error::{DetectorError, VideoError};
pub use frame::{Frame, RawFrame};
pub use sampler::{FrameSampler, SampledFrame, SampledFrames};
pub use source::{FrameSource, FrameSourceOpener, ImageSequenceOpener, MemoryOpener, SourceGuard};

pub mod report;

pub use report::{AnalysisReport, FrameImage};

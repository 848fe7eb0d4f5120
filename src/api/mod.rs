pub mod checker;
pub mod error;
pub mod models;

pub use checker::{extract_claims, score_consistency, EvidenceChecker};
pub use error::CheckError;
pub use models::{AnalysisReport, FrameImage};

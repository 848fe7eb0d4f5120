pub mod claims;
pub mod config;
pub mod scoring;
pub mod video;

pub use claims::{extract_claims, Claims};
pub use config::{CheckerConfig, ConfigError};
pub use scoring::{score_consistency, ClaimDetail, ClaimType, ClaimValue, ScoreBand, ScoreResult, Verdict};

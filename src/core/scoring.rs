//! 一致性打分 - 比较文本声明与视频统计
//!
//! 基准 100 分，逐项扣分：
//! - 数量声明：差 0 支持；差 1 部分支持，扣 10；差 ≥ 2 不支持，扣 30
//! - 武器声明：一致支持；不一致不支持，扣 40
//!
//! 最终结果截断到 [0, 100]。

use serde::{Deserialize, Serialize};

use crate::core::claims::Claims;
use crate::core::video::VideoStats;

const BASE_SCORE: i32 = 100;
const PARTIAL_PENALTY: i32 = 10;
const MISMATCH_PENALTY: i32 = 30;
const WEAPON_PENALTY: i32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimType {
    People,
    Cars,
    Weapon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Supported,
    Partial,
    Unsupported,
}

/// 声明值或视频值：数量或布尔
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Count(u64),
    Flag(bool),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimDetail {
    pub claim_type: ClaimType,
    pub claim_value: ClaimValue,
    pub video_value: ClaimValue,
    pub result: Verdict,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u8,
    pub details: Vec<ClaimDetail>,
}

impl ScoreResult {
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score)
    }
}

/// 分数档位：≥ 80 高，≥ 50 中，其余低
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => ScoreBand::High,
            50..=79 => ScoreBand::Medium,
            _ => ScoreBand::Low,
        }
    }
}

/// 计算一致性分数。纯函数，没有失败路径；未设置的声明不产生明细。
pub fn score_consistency(claims: &Claims, stats: &VideoStats) -> ScoreResult {
    let mut score = BASE_SCORE;
    let mut details = Vec::with_capacity(3);

    if let Some(claimed) = claims.people {
        let (detail, penalty) = score_count(ClaimType::People, "people", claimed, stats.people);
        score -= penalty;
        details.push(detail);
    }

    if let Some(claimed) = claims.cars {
        let (detail, penalty) = score_count(ClaimType::Cars, "cars", claimed, stats.cars);
        score -= penalty;
        details.push(detail);
    }

    if let Some(claimed) = claims.weapon_present {
        let (detail, penalty) = score_weapon(claimed, stats.weapon_present);
        score -= penalty;
        details.push(detail);
    }

    ScoreResult {
        score: score.clamp(0, 100) as u8,
        details,
    }
}

fn score_count(
    claim_type: ClaimType,
    noun: &str,
    claimed: u64,
    detected: u32,
) -> (ClaimDetail, i32) {
    let detected = u64::from(detected);
    let diff = claimed.abs_diff(detected);

    let (result, penalty, note) = match diff {
        0 => (
            Verdict::Supported,
            0,
            format!("Exact match: {} {} detected (difference: 0)", claimed, noun),
        ),
        1 => (
            Verdict::Partial,
            PARTIAL_PENALTY,
            format!(
                "Close match: claimed {}, detected {} (difference: {})",
                claimed, detected, diff
            ),
        ),
        _ => (
            Verdict::Unsupported,
            MISMATCH_PENALTY,
            format!(
                "Mismatch: claimed {}, detected {} (difference: {})",
                claimed, detected, diff
            ),
        ),
    };

    (
        ClaimDetail {
            claim_type,
            claim_value: ClaimValue::Count(claimed),
            video_value: ClaimValue::Count(detected),
            result,
            note,
        },
        penalty,
    )
}

fn score_weapon(claimed: bool, detected: bool) -> (ClaimDetail, i32) {
    let (result, penalty, note) = match (claimed, detected) {
        (true, true) => (
            Verdict::Supported,
            0,
            "Weapon presence matches: claimed present, detected present",
        ),
        (false, false) => (
            Verdict::Supported,
            0,
            "Weapon absence matches: claimed absent, detected absent",
        ),
        (true, false) => (
            Verdict::Unsupported,
            WEAPON_PENALTY,
            "Mismatch: claimed weapon present, but no weapon detected in video",
        ),
        (false, true) => (
            Verdict::Unsupported,
            WEAPON_PENALTY,
            "Mismatch: claimed no weapon, but weapon detected in video",
        ),
    };

    (
        ClaimDetail {
            claim_type: ClaimType::Weapon,
            claim_value: ClaimValue::Flag(claimed),
            video_value: ClaimValue::Flag(detected),
            result,
            note: note.to_string(),
        },
        penalty,
    )
}

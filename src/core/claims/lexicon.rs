//! 声明抽取用的固定词表
//!
//! 数量词、名词同义词集合、武器关键词与否定词全部在这里集中定义，
//! 抽取逻辑只做查表，不含任何隐式规则。

/// 数量词表 `zero`..`twenty`
const QUANTITY_WORDS: [(&str, u64); 21] = [
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
    ("twenty", 20),
];

pub const PEOPLE_NOUNS: &[&str] = &["person", "people", "persons", "men", "women", "individuals"];

pub const CAR_NOUNS: &[&str] = &[
    "car",
    "cars",
    "vehicle",
    "vehicles",
    "truck",
    "trucks",
    "automobile",
    "automobiles",
];

/// 人数声明的候选模式，按优先级排列
pub const PEOPLE_PATTERNS: &[&[&str]] = &[PEOPLE_NOUNS, &["person"], &["people"]];

/// 车辆声明的候选模式，按优先级排列
pub const CAR_PATTERNS: &[&[&str]] = &[CAR_NOUNS, &["car"], &["cars"]];

pub const WEAPON_KEYWORDS: &[&str] = &[
    "gun", "guns", "weapon", "weapons", "firearm", "firearms", "knife", "knives", "pistol",
    "pistols", "rifle", "rifles", "handgun", "handguns",
];

/// 出现在武器关键词之前的否定词：`no gun`
pub const NEGATION_PREFIXES: &[&str] = &["no", "without", "not", "none"];

/// 出现在武器关键词之后的否定词：`weapon absent`
pub const NEGATION_SUFFIXES: &[&str] = &["not", "absent", "missing"];

/// Word-shaped quantity lookup. Digits are handled by [`resolve_quantity`].
pub fn quantity_word(word: &str) -> Option<u64> {
    QUANTITY_WORDS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, n)| *n)
}

/// 数量词形态判断：词表中的单词，或一串 ASCII 十进制数字
pub fn is_quantity_token(token: &str) -> bool {
    quantity_word(token).is_some() || is_digit_run(token)
}

/// 把数量词解析为整数。数字串总能解析，超出 `u64` 的按 `u64::MAX` 计
pub fn resolve_quantity(token: &str) -> Option<u64> {
    if let Some(n) = quantity_word(token) {
        return Some(n);
    }
    if !is_digit_run(token) {
        return None;
    }
    Some(token.parse::<u64>().unwrap_or(u64::MAX))
}

fn is_digit_run(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_weapon_keyword(token: &str) -> bool {
    WEAPON_KEYWORDS.contains(&token)
}

//! 声明抽取器 - 从事件描述文本中抽取人数、车辆数与武器声明
//!
//! 固定词法规则，不做自然语言理解：
//! 1. 切分单词 token（小写）
//! 2. 数量声明 - `<数量词> <名词>`，按模式优先级取第一处命中
//! 3. 武器声明 - 否定优先于肯定

pub mod lexicon;
pub mod tokenizer;

use log::debug;
use serde::{Deserialize, Serialize};

use lexicon::{
    is_quantity_token, is_weapon_keyword, resolve_quantity, CAR_PATTERNS, NEGATION_PREFIXES,
    NEGATION_SUFFIXES, PEOPLE_PATTERNS,
};
use tokenizer::TokenStream;

/// 从文本中抽取出的声明，`None` 表示文本未提及
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Claims {
    pub people: Option<u64>,
    pub cars: Option<u64>,
    pub weapon_present: Option<bool>,
}

impl Claims {
    pub fn is_empty(&self) -> bool {
        self.people.is_none() && self.cars.is_none() && self.weapon_present.is_none()
    }
}

/// Extracts claims from free text. Never fails: text without recognizable
/// phrases yields an empty [`Claims`].
pub fn extract_claims(text: &str) -> Claims {
    if text.trim().is_empty() {
        return Claims::default();
    }

    let lowered = text.to_lowercase();
    let stream = TokenStream::new(&lowered);

    let claims = Claims {
        people: extract_count(&stream, PEOPLE_PATTERNS),
        cars: extract_count(&stream, CAR_PATTERNS),
        weapon_present: extract_weapon(&stream),
    };

    debug!(
        "📝 Extracted claims from {} tokens: {:?}",
        stream.len(),
        claims
    );
    claims
}

/// 按优先级逐个模式扫描，每个模式只看第一处命中；
/// 数量无法解析时落到下一个模式
fn extract_count(stream: &TokenStream<'_>, patterns: &[&[&str]]) -> Option<u64> {
    for nouns in patterns {
        let first = stream
            .phrases()
            .find(|(quantity, noun)| is_quantity_token(quantity.text) && nouns.contains(&noun.text));

        if let Some((quantity, _)) = first {
            match resolve_quantity(quantity.text) {
                Some(n) => return Some(n),
                None => continue,
            }
        }
    }
    None
}

fn extract_weapon(stream: &TokenStream<'_>) -> Option<bool> {
    let has_positive = stream.tokens().iter().any(|t| is_weapon_keyword(t.text));

    let has_negative = stream.phrases().any(|(first, second)| {
        (NEGATION_PREFIXES.contains(&first.text) && is_weapon_keyword(second.text))
            || (is_weapon_keyword(first.text) && NEGATION_SUFFIXES.contains(&second.text))
    });

    if has_negative {
        Some(false)
    } else if has_positive {
        Some(true)
    } else {
        None
    }
}

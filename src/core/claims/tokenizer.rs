use once_cell::sync::Lazy;
use regex::Regex;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("static word pattern"));

/// 小写化后的单词 token，带原文中的字节区间
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// 已切分的文本
///
/// 两个相邻 token 之间只有空白字符时视为“紧邻”，
/// 对应 `<quantity> <noun>` 这类短语的匹配条件。
#[derive(Debug)]
pub struct TokenStream<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
}

impl<'a> TokenStream<'a> {
    /// `source` 需已转为小写
    pub fn new(source: &'a str) -> Self {
        let tokens = WORD
            .find_iter(source)
            .map(|m| Token {
                text: m.as_str(),
                start: m.start(),
                end: m.end(),
            })
            .collect();
        Self { source, tokens }
    }

    pub fn tokens(&self) -> &[Token<'a>] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// token `i` 与 `i + 1` 之间是否只隔着空白
    pub fn joined_by_whitespace(&self, i: usize) -> bool {
        match (self.tokens.get(i), self.tokens.get(i + 1)) {
            (Some(a), Some(b)) => {
                let gap = &self.source[a.end..b.start];
                !gap.is_empty() && gap.chars().all(char::is_whitespace)
            }
            _ => false,
        }
    }

    /// Adjacent token pairs separated only by whitespace, in text order.
    pub fn phrases(&self) -> impl Iterator<Item = (&Token<'a>, &Token<'a>)> + '_ {
        (0..self.tokens.len().saturating_sub(1))
            .filter(move |&i| self.joined_by_whitespace(i))
            .map(move |i| (&self.tokens[i], &self.tokens[i + 1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(stream: &'a TokenStream<'a>) -> Vec<&'a str> {
        stream.tokens().iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_split_on_punctuation() {
        let stream = TokenStream::new("three people, two cars. no weapons!");
        assert_eq!(
            texts(&stream),
            vec!["three", "people", "two", "cars", "no", "weapons"]
        );
    }

    #[test]
    fn test_phrases_require_whitespace_gap() {
        let stream = TokenStream::new("3-people two\tcars four,men");
        let pairs: Vec<_> = stream.phrases().map(|(a, b)| (a.text, b.text)).collect();
        assert_eq!(
            pairs,
            vec![("people", "two"), ("two", "cars"), ("cars", "four")]
        );
    }

    #[test]
    fn test_spans_point_into_source() {
        let source = "no  guns";
        let stream = TokenStream::new(source);
        let guns = &stream.tokens()[1];
        assert_eq!(&source[guns.start..guns.end], "guns");
        assert!(stream.joined_by_whitespace(0));
        assert!(!stream.joined_by_whitespace(1));
    }

    #[test]
    fn test_empty_input() {
        let stream = TokenStream::new("   ");
        assert!(stream.is_empty());
        assert_eq!(stream.phrases().count(), 0);
    }
}

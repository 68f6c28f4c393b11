//! 规范化各阶段的纯函数实现

use std::sync::LazyLock;

use regex::Regex;
use unidecode::unidecode;

use crate::error::NormalizationFailure;
use crate::services::normalizer::stopwords::StopwordSet;

/// 固定剔除的装饰符号
const DECORATIVE_CHARS: &[char] = &['ᆢ', '【', '】', '〖', '〗', '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

static PUNCT_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"[^\w\s]+"));
static SPACE_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\s+"));

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_punct(c: char) -> bool {
    !is_word(c) && !c.is_whitespace()
}

fn compiled(
    pattern: &'static LazyLock<Result<Regex, regex::Error>>,
    stage: &'static str,
) -> Result<&'static Regex, NormalizationFailure> {
    pattern
        .as_ref()
        .map_err(|e| NormalizationFailure::new(stage, e.to_string()))
}

/// 阶段 1：剔除装饰符号和控制字符（保留空白）
pub fn strip_symbols(text: &str) -> String {
    text.chars()
        .filter(|c| !DECORATIVE_CHARS.contains(c))
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect()
}

/// 阶段 2：转写为 ASCII 近似形式并转小写
pub fn transliterate(text: &str) -> String {
    unidecode(text).to_lowercase()
}

/// 阶段 3：夹在两个单词字符之间的标点替换为空格，避免把两个词粘在一起
pub fn smooth_inner_punct(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if !is_punct(chars[i]) {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && is_punct(chars[i]) {
            i += 1;
        }
        let inner = start > 0 && is_word(chars[start - 1]) && i < chars.len() && is_word(chars[i]);
        if inner {
            out.push(' ');
        } else {
            out.extend(&chars[start..i]);
        }
    }
    out
}

/// 阶段 4：去掉剩余标点，合并连续空白并去除首尾空白
pub fn strip_punct(text: &str) -> Result<String, NormalizationFailure> {
    let punct = compiled(&PUNCT_PATTERN, "punct_strip")?;
    let space = compiled(&SPACE_PATTERN, "punct_strip")?;

    let text = punct.replace_all(text, " ");
    let text = space.replace_all(&text, " ");
    Ok(text.trim().to_string())
}

/// 阶段 5：合并连续的单字符词，对抗"s l o t"式的字母间隔混淆
pub fn merge_fragments(text: &str) -> String {
    let mut result: Vec<String> = Vec::new();
    let mut buffer = String::new();

    for token in text.split_whitespace() {
        if token.chars().count() == 1 {
            buffer.push_str(token);
        } else {
            if !buffer.is_empty() {
                result.push(std::mem::take(&mut buffer));
            }
            result.push(token.to_string());
        }
    }
    if !buffer.is_empty() {
        result.push(buffer);
    }
    result.join(" ")
}

/// 阶段 7：去掉停用词
pub fn remove_stopwords(text: &str, stopwords: &StopwordSet) -> String {
    text.split_whitespace()
        .filter(|token| !stopwords.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_symbols() {
        assert_eq!(strip_symbols("【slot】 gacor\u{200B}ᆢ"), "slot gacor");
        assert_eq!(strip_symbols("a\tb\u{0007}c"), "a\tbc");
    }

    #[test]
    fn test_transliterate_folds_accents() {
        assert_eq!(transliterate("Café RÉSUMÉ"), "cafe resume");
    }

    #[test]
    fn test_inner_punct_becomes_space() {
        assert_eq!(smooth_inner_punct("slot-gacor"), "slot gacor");
        assert_eq!(smooth_inner_punct("a.b.c"), "a b c");
        assert_eq!(smooth_inner_punct("ini@adalah#test."), "ini adalah test.");
        assert_eq!(smooth_inner_punct("halo, dunia!"), "halo, dunia!");
    }

    #[test]
    fn test_strip_punct() {
        assert_eq!(strip_punct("  halo,   dunia! ").unwrap(), "halo dunia");
        assert_eq!(strip_punct("!!!").unwrap(), "");
        assert_eq!(strip_punct("snake_case").unwrap(), "snake_case");
    }

    #[test]
    fn test_merge_fragments() {
        assert_eq!(merge_fragments("a b c"), "abc");
        assert_eq!(merge_fragments("main s l o t gacor"), "main slot gacor");
        assert_eq!(merge_fragments("d a f t a r"), "daftar");
        assert_eq!(merge_fragments("ok x"), "ok x");
        assert_eq!(merge_fragments(""), "");
    }

    #[test]
    fn test_remove_stopwords() {
        let stopwords = StopwordSet::builtin();
        assert_eq!(remove_stopwords("ini Yang slot dan gacor", &stopwords), "slot gacor");
        assert_eq!(remove_stopwords("yang dan", &stopwords), "");
    }
}

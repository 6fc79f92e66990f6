//! 学習時と推論時で共有するトークナイズ処理。
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::stop_words::is_stop_word;

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("compile word pattern"));

fn normalize_text(input: &str) -> String {
    input.nfc().collect::<String>().to_lowercase()
}

/// 2文字以上の単語を小文字化して取り出し、ストップワードを除外する。
///
/// `fit` と `transform` は必ずこの関数を通すため、同じ入力からは常に同じ列が得られる。
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = normalize_text(text);
    WORD_RE
        .find_iter(&normalized)
        .map(|m| m.as_str())
        .filter(|token| !is_stop_word(token))
        .map(ToString::to_string)
        .collect()
}

//! Instruction templates and source-language detection.
//!
//! Each [`PolishMode`] maps to a fixed system instruction. `improve` and
//! `translate` additionally depend on whether the input is mostly Chinese.

mod templates;

pub use templates::{
    IMPROVE_PROMPT, POLISH_EN_PROMPT, REPHRASE_PROMPT, TRANSLATE_EN_TO_ZH_PROMPT,
    TRANSLATE_ZH_TO_EN_PROMPT,
};

use crate::types::mode::PolishMode;

/// Share of CJK characters above which text counts as Chinese.
const CJK_RATIO_THRESHOLD: f64 = 0.3;

/// Detected source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedLang {
    /// English (and anything not detected as Chinese).
    En,
    /// Chinese.
    Zh,
}

/// Classifies text as Chinese when more than 30% of its characters are
/// CJK unified ideographs.
pub fn detect_language(text: &str) -> DetectedLang {
    if text.trim().is_empty() {
        return DetectedLang::En;
    }

    let total = text.chars().count();
    let cjk = text
        .chars()
        .filter(|c| ('\u{4e00}'..='\u{9fff}').contains(c))
        .count();

    if cjk as f64 / total as f64 > CJK_RATIO_THRESHOLD {
        DetectedLang::Zh
    } else {
        DetectedLang::En
    }
}

/// Selects the system instruction for a mode and source language.
pub fn prompt_for(mode: PolishMode, lang: DetectedLang) -> &'static str {
    match (mode, lang) {
        (PolishMode::Improve, DetectedLang::En) => POLISH_EN_PROMPT,
        (PolishMode::Improve, DetectedLang::Zh) => IMPROVE_PROMPT,
        (PolishMode::Rephrase, _) => REPHRASE_PROMPT,
        (PolishMode::Translate, DetectedLang::Zh) => TRANSLATE_ZH_TO_EN_PROMPT,
        (PolishMode::Translate, DetectedLang::En) => TRANSLATE_EN_TO_ZH_PROMPT,
    }
}

/// Selects the system instruction for `text`, detecting its language.
pub fn system_prompt(mode: PolishMode, text: &str) -> &'static str {
    prompt_for(mode, detect_language(text))
}

/// Builds the user message, appending the free-form instruction if any.
pub fn user_content(text: &str, instruction: Option<&str>) -> String {
    match instruction.map(str::trim).filter(|i| !i.is_empty()) {
        Some(instruction) => format!(
            "{}\n\n[Additional instruction from user: {}]",
            text, instruction
        ),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("The cat sit on the mat.", DetectedLang::En ; "plain english")]
    #[test_case("今天天气很好，我们去公园散步吧。", DetectedLang::Zh ; "plain chinese")]
    #[test_case("   ", DetectedLang::En ; "whitespace only")]
    #[test_case("", DetectedLang::En ; "empty")]
    #[test_case("Rust 很好", DetectedLang::En ; "two of seven chars stays below threshold")]
    #[test_case("Rust 很好用", DetectedLang::Zh ; "three of eight chars crosses threshold")]
    #[test_case("Use the API 接口 for this request please", DetectedLang::En ; "english with a chinese term")]
    fn test_detect_language(text: &str, expected: DetectedLang) {
        assert_eq!(detect_language(text), expected);
    }

    #[test]
    fn test_prompt_selection() {
        assert_eq!(prompt_for(PolishMode::Improve, DetectedLang::En), POLISH_EN_PROMPT);
        assert_eq!(prompt_for(PolishMode::Improve, DetectedLang::Zh), IMPROVE_PROMPT);
        assert_eq!(prompt_for(PolishMode::Rephrase, DetectedLang::Zh), REPHRASE_PROMPT);
        assert_eq!(
            prompt_for(PolishMode::Translate, DetectedLang::Zh),
            TRANSLATE_ZH_TO_EN_PROMPT
        );
        assert_eq!(
            prompt_for(PolishMode::Translate, DetectedLang::En),
            TRANSLATE_EN_TO_ZH_PROMPT
        );
    }

    #[test]
    fn test_envelope_modes_ask_for_explanation_line() {
        for prompt in [POLISH_EN_PROMPT, IMPROVE_PROMPT, REPHRASE_PROMPT] {
            assert!(prompt.contains("Second line: empty"));
        }
    }

    #[test]
    fn test_user_content_without_instruction() {
        assert_eq!(user_content("Hello world", None), "Hello world");
        assert_eq!(user_content("Hello world", Some("  ")), "Hello world");
    }

    #[test]
    fn test_user_content_with_instruction() {
        assert_eq!(
            user_content("Hello world", Some("make it formal")),
            "Hello world\n\n[Additional instruction from user: make it formal]"
        );
    }
}

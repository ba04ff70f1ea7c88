//! Prompts for the vision-model engine.
//!
//! Callers can override either prompt via
//! [`crate::config::ExtractionConfig::detection_prompt`] and
//! [`crate::config::ExtractionConfig::extraction_prompt`]; the constants here
//! are used only when no override is provided.

use crate::catalog;

/// System prompt for the language-scoring pass.
///
/// The answer must be a single JSON object so it can be parsed into
/// [`crate::engine::Recognition`] candidates.
pub const DETECTION_SYSTEM_PROMPT: &str = r#"You are a language identification system for scanned documents and photographs of text.

Look at the image and identify:
1. The writing system (script) of the visible text, e.g. Latin, Cyrillic, Greek, Arabic, Hebrew, Devanagari, Han, Hiragana/Katakana, Hangul, Thai.
2. The languages the text could be written in, each with a confidence from 0 to 100.

Rules:
- Use ISO 639-1 language codes (e.g. "en", "fr", "zh"). Use "zh-cn" or "zh-tw" when the Chinese variant is clear.
- List at most 8 languages, most likely first.
- Confidences are independent estimates; they need not sum to 100.
- If the image contains no readable text, return an empty "languages" list and script "Unknown".

Respond with ONLY this JSON object, no commentary and no code fences:
{"script": "<script>", "languages": [{"code": "<code>", "confidence": <0-100>}]}"#;

/// System prompt for the text-extraction pass. `{language}` is replaced with
/// the display name of the chosen language.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are an OCR engine. Transcribe all text visible in the image exactly as written.

The text is written in {language}.

Rules:
- Preserve the reading order and line breaks as a human would read the page.
- Keep the original spelling, accents and punctuation of {language}; do not translate.
- Do not describe images, do not add commentary, do not wrap the output in code fences.
- If there is no readable text, return an empty response."#;

/// Render the extraction prompt for `code`.
pub fn extraction_prompt(template: &str, code: &str) -> String {
    let language = format!("{} ({})", catalog::name_of(code), code);
    template.replace("{language}", &language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_prompt_names_the_language() {
        let p = extraction_prompt(EXTRACTION_SYSTEM_PROMPT, "de");
        assert!(p.contains("German (de)"));
        assert!(!p.contains("{language}"));
    }

    #[test]
    fn unknown_code_still_renders() {
        let p = extraction_prompt("Text in {language}.", "xx");
        assert_eq!(p, "Text in XX (xx).");
    }

    #[test]
    fn detection_prompt_requests_json() {
        assert!(DETECTION_SYSTEM_PROMPT.contains("\"languages\""));
    }
}

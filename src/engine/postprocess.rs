//! Post-processing: deterministic cleanup of vision-model output.
//!
//! Even well-prompted models wrap answers in code fences, emit CRLF line
//! endings or sprinkle zero-width characters through transcribed text. These
//! rules fix such quirks without touching content. Two entry points:
//!
//! - [`clean_text`] for extracted text
//! - [`extract_json`] for the structured language-scoring answer

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all text cleanup rules, in order:
/// 1. Strip outer code fences
/// 2. Normalise line endings (CRLF → LF)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to 2
/// 5. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 6. Trim leading/trailing blank lines
pub fn clean_text(input: &str) -> String {
    let s = strip_fences(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    s.trim_matches('\n').to_string()
}

/// Pull a JSON object out of a model answer that may be fenced or wrapped in
/// prose.
pub fn extract_json(input: &str) -> Option<&str> {
    let start = input.find('{')?;
    let end = input.rfind('}')?;
    (end > start).then(|| &input[start..=end])
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*\n(.*)\n```\s*$").expect("valid fence regex"));

fn strip_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

static RE_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{4,}").expect("valid blank-line regex"));

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

fn remove_invisible_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences() {
        assert_eq!(clean_text("```text\nBonjour\n```"), "Bonjour");
        assert_eq!(clean_text("```\nHallo Welt\n```\n"), "Hallo Welt");
    }

    #[test]
    fn normalises_whitespace() {
        assert_eq!(clean_text("a  \r\nb\r\n\r\n\r\n\r\n\r\nc\n"), "a\nb\n\n\nc");
    }

    #[test]
    fn removes_invisible_characters() {
        assert_eq!(clean_text("\u{FEFF}Zero\u{200B}width"), "Zerowidth");
    }

    #[test]
    fn keeps_plain_text() {
        assert_eq!(clean_text("Привет, мир"), "Привет, мир");
    }

    #[test]
    fn extracts_json_from_prose() {
        let answer = "Sure!\n```json\n{\"script\": \"Latin\", \"languages\": []}\n```";
        assert_eq!(
            extract_json(answer),
            Some("{\"script\": \"Latin\", \"languages\": []}")
        );
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }
}

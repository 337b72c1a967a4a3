use regex::Regex;
use std::sync::OnceLock;

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("de", "German"),
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("hi", "Hindi"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("nl", "Dutch"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("sv", "Swedish"),
    ("tr", "Turkish"),
    ("zh", "Chinese"),
];

/// English name for a language code, or the code itself when unknown
pub fn language_name(code: &str) -> String {
    let base = code.split(['-', '_']).next().unwrap_or(code).to_lowercase();
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == base)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Build the numbered prompt for one batch
pub fn build_batch_prompt(texts: &[String], source_language: &str, target_language: &str) -> String {
    let numbered = texts
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{}. {}", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Translate the following {} text to {}.\n\
         Maintain the same numbering format and keep translations natural and contextual.\n\n\
         {}",
        language_name(source_language),
        language_name(target_language),
        numbered
    )
}

fn ordinal_line() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d+)\s*[.)]\s*(.*?)\s*$").ok())
        .as_ref()
}

/// Match a numbered reply back to `expected` input positions.
///
/// Slot `i` holds the text after ordinal `i + 1`, or `None` when that ordinal
/// is missing, blank or unreadable. Lines without an ordinal, ordinals out of
/// range and repeated ordinals are ignored.
pub fn parse_numbered_response(response: &str, expected: usize) -> Vec<Option<String>> {
    let mut slots: Vec<Option<String>> = vec![None; expected];

    for line in response.lines() {
        let Some(caps) = ordinal_line().and_then(|re| re.captures(line)) else {
            continue;
        };
        let Ok(ordinal) = caps[1].parse::<usize>() else {
            continue;
        };
        if ordinal == 0 || ordinal > expected {
            continue;
        }

        let text = caps[2].trim();
        let slot = &mut slots[ordinal - 1];
        if slot.is_none() && !text.is_empty() {
            *slot = Some(text.to_string());
        }
    }

    slots
}

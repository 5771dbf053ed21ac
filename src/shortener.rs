//! Whole-word abbreviation of free text

use regex::Regex;

/// Default abbreviations, applied in this order.
pub const DEFAULT_EXPRESSIONS: &[(&str, &str)] = &[
    ("the", "t"),
    ("and", "&"),
    ("that", "h"),
    ("with", "w"),
];

/// Replaces configured words with single-character tokens.
#[derive(Debug, Clone)]
pub struct TextShortener {
    rules: Vec<(Regex, String)>,
}

impl TextShortener {
    /// Compile one case-insensitive, word-bounded pattern per expression.
    pub fn new<'a, I>(expressions: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let rules = expressions
            .into_iter()
            .map(|(word, short)| compile_rule(word, short))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    pub fn shorten(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut out = text.to_string();
        for (re, short) in &self.rules {
            // NoExpand: "&" and friends are literal replacements, not group refs
            out = re
                .replace_all(&out, regex::NoExpand(short.as_str()))
                .into_owned();
        }
        out
    }
}

impl Default for TextShortener {
    fn default() -> Self {
        let rules = DEFAULT_EXPRESSIONS
            .iter()
            .filter_map(|(word, short)| compile_rule(word, short).ok())
            .collect();
        Self { rules }
    }
}

fn compile_rule(word: &str, short: &str) -> Result<(Regex, String), regex::Error> {
    let pattern = format!(r"(?i)\b{}\b", regex::escape(word));
    Ok((Regex::new(&pattern)?, short.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_configured_words_case_insensitively() {
        let shortener = TextShortener::default();
        assert_eq!(
            shortener.shorten("The cat AND the dog, with That hat"),
            "t cat & t dog, w h hat"
        );
    }

    #[test]
    fn test_leaves_partial_words_alone() {
        let shortener = TextShortener::default();
        assert_eq!(shortener.shorten("Then theme andante without"), "Then theme andante without");
    }

    #[test]
    fn test_empty_input_unchanged() {
        let shortener = TextShortener::default();
        assert_eq!(shortener.shorten(""), "");
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let shortener = TextShortener::default();
        let once = shortener.shorten("the news and weather that comes with the paper");
        assert_eq!(shortener.shorten(&once), once);
    }

    #[test]
    fn test_custom_expressions() {
        let shortener = TextShortener::new([("you", "u"), ("are", "r")]).unwrap();
        assert_eq!(shortener.shorten("You are here"), "u r here");
    }
}

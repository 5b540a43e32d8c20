//! Final reply text with cleanup helpers

use regex::Regex;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::OnceLock;

struct CleanPatterns {
    triple_quote_start: Regex,
    triple_quote_end: Regex,
    fence_start: Regex,
    fence_end: Regex,
    line_quote_start: Regex,
    line_quote_end: Regex,
}

fn patterns() -> &'static CleanPatterns {
    static PATTERNS: OnceLock<CleanPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| CleanPatterns {
        triple_quote_start: Regex::new(r#"^""""#).expect("valid pattern"),
        triple_quote_end: Regex::new(r#""""$"#).expect("valid pattern"),
        fence_start: Regex::new(r"^```[a-z]*").expect("valid pattern"),
        fence_end: Regex::new(r"```$").expect("valid pattern"),
        line_quote_start: Regex::new(r#"(?m)^""#).expect("valid pattern"),
        line_quote_end: Regex::new(r#"(?m)"$"#).expect("valid pattern"),
    })
}

/// Text returned by a completion call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompletionResponse {
    text: String,
}

impl CompletionResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Raw reply text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Reply with the wrapping models like to add removed.
    ///
    /// Strips surrounding `"""`, a leading code fence with its language tag,
    /// a trailing fence, and quote characters at the start or end of lines.
    pub fn text_cleaned(&self) -> String {
        let p = patterns();
        let text = self.text.trim();
        let text = p.triple_quote_start.replace(text, "");
        let text = p.triple_quote_end.replace(&text, "");
        let text = p.fence_start.replace(&text, "");
        let text = p.fence_end.replace(&text, "");
        let text = p.line_quote_start.replace_all(&text, "");
        let text = p.line_quote_end.replace_all(&text, "");
        text.trim().to_string()
    }

    /// Deserialize the cleaned reply as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.text_cleaned())
    }
}

impl fmt::Display for CompletionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<String> for CompletionResponse {
    fn from(text: String) -> Self {
        Self { text }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use test_case::test_case;

    #[test_case("  hello  ", "hello" ; "trims whitespace")]
    #[test_case("\"\"\"wrapped\"\"\"", "wrapped" ; "triple quotes")]
    #[test_case("```json\n{\"a\": 1}\n```", "{\"a\": 1}" ; "json fence")]
    #[test_case("```\nplain\n```", "plain" ; "bare fence")]
    #[test_case("\"quoted\"", "quoted" ; "single quotes")]
    #[test_case("\"line one\"\n\"line two\"", "line one\nline two" ; "quotes per line")]
    #[test_case("no change", "no change" ; "plain text")]
    fn test_text_cleaned(raw: &str, expected: &str) {
        assert_eq!(CompletionResponse::new(raw).text_cleaned(), expected);
    }

    #[test]
    fn test_raw_text_is_preserved() {
        let response = CompletionResponse::new("```x```");
        assert_eq!(response.text(), "```x```");
        assert_eq!(response.to_string(), "```x```");
    }

    #[test]
    fn test_json_extraction() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Answer {
            value: i32,
        }

        let response = CompletionResponse::new("```json\n{\"value\": 42}\n```");
        assert_eq!(response.json::<Answer>().unwrap(), Answer { value: 42 });
        assert!(CompletionResponse::new("nope").json::<Answer>().is_err());
    }
}

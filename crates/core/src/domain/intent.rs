use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker the classifier emits when the message names no product.
pub const KEYWORD_SENTINEL: &str = "none";

const DELIMITER: char = '|';
const WRAPPING_CHARS: &[char] = &['"', '\'', '`', '*', '.', '?', '!'];

/// Search term extracted from a user message.
///
/// Always trimmed, lowercase, non-empty and distinct from [`KEYWORD_SENTINEL`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Keyword(String);

impl Keyword {
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = raw.trim().trim_matches(WRAPPING_CHARS).trim().to_lowercase();
        if normalized.is_empty() || normalized == KEYWORD_SENTINEL {
            return None;
        }
        Some(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("`{0}` is not a usable search keyword")]
pub struct InvalidKeyword(pub String);

impl TryFrom<String> for Keyword {
    type Error = InvalidKeyword;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(&raw).ok_or(InvalidKeyword(raw))
    }
}

impl From<Keyword> for String {
    fn from(keyword: Keyword) -> Self {
        keyword.0
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentDecision {
    NeedsLookup(Keyword),
    NoLookup,
}

/// Trims markdown decoration from a reply line. Bare code-fence lines, with or
/// without a language tag, come back empty.
fn strip_decoration(line: &str) -> &str {
    let line = line.trim();
    let stripped = line.trim_matches(|c| c == '`' || c == '*').trim();
    if line.starts_with("```") && !stripped.contains(DELIMITER) {
        return "";
    }
    stripped
}

impl IntentDecision {
    /// Maps raw classifier output (`YES|keyword` / `NO|none`) to a decision.
    ///
    /// Never fails: anything that does not match the protocol is `NoLookup`.
    pub fn parse(raw: &str) -> Self {
        let Some(line) = raw.lines().map(strip_decoration).find(|line| !line.is_empty()) else {
            return Self::NoLookup;
        };

        let Some((decision, keyword)) = line.split_once(DELIMITER) else {
            return Self::NoLookup;
        };

        // Labels such as `Jawaban:` may precede the decision token.
        let decision = decision
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .trim_matches(WRAPPING_CHARS)
            .to_ascii_lowercase();
        if !matches!(decision.as_str(), "yes" | "ya") {
            return Self::NoLookup;
        }

        match Keyword::new(keyword) {
            Some(keyword) => Self::NeedsLookup(keyword),
            None => Self::NoLookup,
        }
    }

    pub fn keyword(&self) -> Option<&Keyword> {
        match self {
            Self::NeedsLookup(keyword) => Some(keyword),
            Self::NoLookup => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{IntentDecision, InvalidKeyword, Keyword};

    fn keyword(raw: &str) -> Keyword {
        Keyword::new(raw).expect("keyword should be valid")
    }

    #[test]
    fn yes_with_keyword_needs_lookup() {
        assert_eq!(
            IntentDecision::parse("YES|ayam goreng"),
            IntentDecision::NeedsLookup(keyword("ayam goreng"))
        );
    }

    #[test]
    fn decision_token_is_case_insensitive() {
        assert_eq!(
            IntentDecision::parse("  yes | Ayam Goreng \n"),
            IntentDecision::NeedsLookup(keyword("ayam goreng"))
        );
        assert_eq!(
            IntentDecision::parse("Ya|Es Teh"),
            IntentDecision::NeedsLookup(keyword("es teh"))
        );
    }

    #[test]
    fn no_decision_is_no_lookup() {
        assert_eq!(IntentDecision::parse("NO|none"), IntentDecision::NoLookup);
        assert_eq!(IntentDecision::parse("no|rendang"), IntentDecision::NoLookup);
    }

    #[test]
    fn sentinel_keyword_is_no_lookup_even_when_yes() {
        assert_eq!(IntentDecision::parse("YES|none"), IntentDecision::NoLookup);
        assert_eq!(IntentDecision::parse("YES|NONE"), IntentDecision::NoLookup);
        assert_eq!(IntentDecision::parse("YES|   "), IntentDecision::NoLookup);
    }

    #[test]
    fn missing_delimiter_fails_soft() {
        assert_eq!(IntentDecision::parse("Tentu, ini butuh database"), IntentDecision::NoLookup);
        assert_eq!(IntentDecision::parse(""), IntentDecision::NoLookup);
        assert_eq!(IntentDecision::parse("\n\n"), IntentDecision::NoLookup);
    }

    #[test]
    fn decorated_output_is_tolerated() {
        assert_eq!(
            IntentDecision::parse("\n`YES|\"Nasi Uduk\"`\nalasan: menyebut makanan"),
            IntentDecision::NeedsLookup(keyword("nasi uduk"))
        );
        assert_eq!(
            IntentDecision::parse("Jawaban: YES|ayam goreng"),
            IntentDecision::NeedsLookup(keyword("ayam goreng"))
        );
        assert_eq!(
            IntentDecision::parse("**Jawaban:** NO|none"),
            IntentDecision::NoLookup
        );
        assert_eq!(
            IntentDecision::parse("```\nYES|ayam goreng\n```"),
            IntentDecision::NeedsLookup(keyword("ayam goreng"))
        );
        assert_eq!(
            IntentDecision::parse("```text\nYES|es teh\n```"),
            IntentDecision::NeedsLookup(keyword("es teh"))
        );
        assert_eq!(
            IntentDecision::parse("```YES|bakso```"),
            IntentDecision::NeedsLookup(keyword("bakso"))
        );
    }

    #[test]
    fn keyword_rejects_sentinel_and_blank() {
        assert!(Keyword::new("none").is_none());
        assert!(Keyword::new(" \"None\" ").is_none());
        assert!(Keyword::new("").is_none());
        assert_eq!(keyword(" Bakso? ").as_str(), "bakso");
    }

    #[test]
    fn deserializing_a_keyword_applies_the_same_rules() {
        assert_eq!(
            serde_json::from_str::<Keyword>("\"  Es Teh \"").expect("valid keyword"),
            keyword("es teh")
        );
        assert!(serde_json::from_str::<Keyword>("\"NONE\"").is_err());
        assert!(serde_json::from_str::<Keyword>("\"\"").is_err());
        assert!(serde_json::from_str::<IntentDecision>(r#"{"NeedsLookup":"  "}"#).is_err());
        assert_eq!(Keyword::try_from("  ".to_string()), Err(InvalidKeyword("  ".to_string())));
    }

    #[test]
    fn keyword_serializes_as_plain_string() {
        let encoded = serde_json::to_string(&keyword("Bakso")).expect("encode");
        assert_eq!(encoded, "\"bakso\"");
    }
}

//! Phase-intent detection on interviewer replies.
//!
//! The role-context prompt asks the model to end a language question with
//! [`LANGUAGE_SELECT_DIRECTIVE`]. Directives are stripped before the reply is
//! stored. When a reply carries no directive, an optional keyword match is
//! used instead.

pub const LANGUAGE_SELECT_DIRECTIVE: &str = "[[phase:language_select]]";

/// Phrases that signal a language question when no directive is present
pub const FALLBACK_KEYWORDS: [&str; 3] = ["programming language", "python, java, or c++", "which language"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseIntent {
    LanguageSelect,
}

#[derive(Debug, Clone)]
pub struct IntentDetector {
    keyword_fallback: bool,
}

impl IntentDetector {
    pub fn new(keyword_fallback: bool) -> Self {
        Self { keyword_fallback }
    }

    /// Split a raw reply into display text and the intent it signals.
    ///
    /// Callers decide whether the intent applies (non-technical sessions
    /// never enter language selection).
    pub fn inspect(&self, reply: &str) -> (String, Option<PhaseIntent>) {
        let (text, found) = strip_directive(reply);

        if found {
            return (text, Some(PhaseIntent::LanguageSelect));
        }

        if self.keyword_fallback {
            let lower = text.to_lowercase();
            if FALLBACK_KEYWORDS.iter().any(|k| lower.contains(k)) {
                return (text, Some(PhaseIntent::LanguageSelect));
            }
        }

        (text, None)
    }
}

/// Remove every occurrence of the directive, ASCII case-insensitively
fn strip_directive(reply: &str) -> (String, bool) {
    // ASCII lowercasing keeps byte offsets aligned with `reply`
    let lower = reply.to_ascii_lowercase();
    let mut out = String::with_capacity(reply.len());
    let mut cursor = 0;
    let mut found = false;

    while let Some(pos) = lower[cursor..].find(LANGUAGE_SELECT_DIRECTIVE) {
        let start = cursor + pos;
        out.push_str(&reply[cursor..start]);
        cursor = start + LANGUAGE_SELECT_DIRECTIVE.len();
        found = true;
    }
    out.push_str(&reply[cursor..]);

    if found {
        (out.trim().to_string(), true)
    } else {
        (reply.to_string(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_is_stripped() {
        let detector = IntentDetector::new(false);
        let (text, intent) =
            detector.inspect("Great! Which would you prefer: Python, Java or C++?\n[[phase:language_select]]");

        assert_eq!(text, "Great! Which would you prefer: Python, Java or C++?");
        assert_eq!(intent, Some(PhaseIntent::LanguageSelect));
    }

    #[test]
    fn test_directive_case_and_position() {
        let detector = IntentDetector::new(false);
        let (text, intent) = detector.inspect("[[PHASE:Language_Select]] Pick one: Python or Java? [[phase:language_select]]");

        assert_eq!(text, "Pick one: Python or Java?");
        assert_eq!(intent, Some(PhaseIntent::LanguageSelect));
    }

    #[test]
    fn test_keyword_fallback() {
        let with = IntentDetector::new(true);
        let without = IntentDetector::new(false);
        let reply = "Which programming language would you like to use?";

        assert_eq!(with.inspect(reply), (reply.to_string(), Some(PhaseIntent::LanguageSelect)));
        assert_eq!(without.inspect(reply).1, None);
    }

    #[test]
    fn test_plain_reply_has_no_intent() {
        let detector = IntentDetector::new(true);
        let reply = "Tell me about a time you resolved a conflict on your team.";
        assert_eq!(detector.inspect(reply), (reply.to_string(), None));
    }
}

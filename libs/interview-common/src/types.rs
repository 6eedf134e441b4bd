use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages a candidate can pick for the coding round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
    Cpp,
}

/// Parses a candidate-typed language token.
///
/// Only exact tokens are recognized ("python", "py", "java", "c++", "cpp"),
/// so a sentence that merely mentions a language is not a selection.
impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "c++" | "cpp" => Ok(Language::Cpp),
            _ => anyhow::bail!("Unsupported language: {}", s.trim()),
        }
    }
}

impl Language {
    /// Only Python submissions are executed with their own semantics.
    /// Java and C++ sources go through the same harness and fail at load time.
    pub fn is_gradable(&self) -> bool {
        matches!(self, Language::Python)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Python => write!(f, "Python"),
            Language::Java => write!(f, "Java"),
            Language::Cpp => write!(f, "C++"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// One role-tagged transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: u32,
    pub input: Vec<i64>,
    pub expected: i64,
}

/// What the entry point produced for a single case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Actual {
    /// An integer return value
    Value(i64),
    /// A non-integer return value, rendered as text
    Other(String),
    /// The fault raised while invoking the entry point
    Error(String),
}

impl fmt::Display for Actual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actual::Value(v) => write!(f, "{}", v),
            Actual::Other(text) | Actual::Error(text) => write!(f, "{}", text),
        }
    }
}

/// One grading outcome row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseOutcome {
    pub test_id: u32,
    pub input: Vec<i64>,
    pub expected: i64,
    pub actual: Actual,
    pub passed: bool,
}

/// Result of grading one submission.
///
/// Either `failure` is set and `details` is empty (the source could not be
/// loaded or lacks the entry point), or `failure` is unset and `details`
/// holds exactly `total` rows in suite order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingResult {
    pub failure: Option<String>,
    pub passed: usize,
    pub total: usize,
    pub details: Vec<CaseOutcome>,
}

impl GradingResult {
    pub fn failed(total: usize, reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            passed: 0,
            total,
            details: Vec::new(),
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failure.is_none() && self.passed == self.total
    }

    pub fn failing(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.details.iter().filter(|d| !d.passed)
    }
}

/// The single supported exercise: sum the integers of an array
pub mod sum_array {
    use super::{Language, TestCase};

    pub const ENTRY_POINT: &str = "sum_array";

    pub const MISSING_ENTRY_POINT: &str = "Function sum_array missing";

    /// The fixed oracle, in evaluation order
    pub fn suite() -> Vec<TestCase> {
        let cases: [(&[i64], i64); 5] = [
            (&[], 0),
            (&[1, 2, 3], 6),
            (&[-5, 5], 0),
            (&[10], 10),
            (&[0, 0, 0], 0),
        ];

        cases
            .iter()
            .enumerate()
            .map(|(idx, (input, expected))| TestCase {
                id: (idx + 1) as u32,
                input: input.to_vec(),
                expected: *expected,
            })
            .collect()
    }

    pub fn reference_solution(language: Language) -> &'static str {
        match language {
            Language::Python => "def sum_array(arr):\n    total = 0\n    for x in arr:\n        total += x\n    return total",
            Language::Java => "public static int sumArray(int[] arr) {\n    int total = 0;\n    for (int x : arr) {\n        total += x;\n    }\n    return total;\n}",
            Language::Cpp => "int sum_array(const std::vector<int>& arr) {\n    int total = 0;\n    for (int x : arr) {\n        total += x;\n    }\n    return total;\n}",
        }
    }
}

/// Hint Escalation - Pure Review Policy
///
/// **Responsibility:**
/// Turn a grading result and the attempt number into the message shown to
/// the candidate and a verdict on whether the coding round continues.
///
/// **Ladder:**
/// - All tests pass → success message, round ends
/// - Attempt 1 fails → generic hint about edge cases
/// - Attempt 2 fails → hint describing the loop-and-accumulator approach
/// - Attempt 3+ fails → reference solution in the chosen language, round ends
///
/// A load failure or missing entry point counts as a failing attempt.

use interview_common::types::{sum_array, GradingResult, Language};

/// Attempt on which the reference solution is revealed
pub const REVEAL_ATTEMPT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Stay in the coding round
    Retry,
    /// Every test passed
    Solved,
    /// The reference solution was shown
    Revealed,
}

impl Verdict {
    pub fn ends_round(&self) -> bool {
        !matches!(self, Verdict::Retry)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Retry => "retry",
            Verdict::Solved => "solved",
            Verdict::Revealed => "revealed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub message: String,
    pub verdict: Verdict,
}

/// Review the `attempt`-th graded submission (1-based)
pub fn review(result: &GradingResult, attempt: u32, language: Language) -> Review {
    if result.all_passed() {
        return Review {
            message: format!(
                "✅ Excellent! All tests passed ({}/{}). Great job on the implementation!",
                result.passed, result.total
            ),
            verdict: Verdict::Solved,
        };
    }

    let mut message = summarize_failure(result);

    let verdict = match attempt {
        0 | 1 => {
            message.push_str(&format!(
                "\n\nAttempt {}. Hint: check your edge cases. What should happen for an empty array, \
                 negative numbers, or a single element?",
                attempt.max(1)
            ));
            Verdict::Retry
        }
        2 => {
            message.push_str(
                "\n\nAttempt 2. Hint: start an accumulator at 0, loop over every element adding it \
                 to the accumulator, and return the accumulator after the loop.",
            );
            Verdict::Retry
        }
        n => {
            message.push_str(&format!(
                "\n\nAttempt {}. Here is a reference solution in {}:\n\n```{}\n{}\n```\n\nLet's move on.",
                n,
                language,
                fence_tag(language),
                sum_array::reference_solution(language)
            ));
            Verdict::Revealed
        }
    };

    Review { message, verdict }
}

fn summarize_failure(result: &GradingResult) -> String {
    if let Some(reason) = &result.failure {
        return format!("Your code could not be run: {}", reason);
    }

    let mut summary = format!("Some tests failed ({}/{} passed):", result.passed, result.total);
    for row in result.failing() {
        summary.push_str(&format!(
            "\nInput {:?} → expected {}, got {}",
            row.input, row.expected, row.actual
        ));
    }
    summary
}

fn fence_tag(language: Language) -> &'static str {
    match language {
        Language::Python => "python",
        Language::Java => "java",
        Language::Cpp => "cpp",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_common::types::{Actual, CaseOutcome};

    /// Grading result for a submission that always returns 0
    fn return_zero() -> GradingResult {
        let details: Vec<CaseOutcome> = sum_array::suite()
            .into_iter()
            .map(|case| CaseOutcome {
                passed: case.expected == 0,
                test_id: case.id,
                input: case.input,
                expected: case.expected,
                actual: Actual::Value(0),
            })
            .collect();

        GradingResult {
            failure: None,
            passed: details.iter().filter(|d| d.passed).count(),
            total: 5,
            details,
        }
    }

    #[test]
    fn test_escalation_ladder() {
        let result = return_zero();

        let first = review(&result, 1, Language::Python);
        assert_eq!(first.verdict, Verdict::Retry);
        assert!(first.message.starts_with("Some tests failed (3/5 passed):"));
        assert!(first.message.contains("Input [1, 2, 3] → expected 6, got 0"));
        assert!(first.message.contains("Input [10] → expected 10, got 0"));
        assert!(first.message.contains("edge cases"));

        let second = review(&result, 2, Language::Python);
        assert_eq!(second.verdict, Verdict::Retry);
        assert!(second.message.contains("accumulator"));

        let third = review(&result, 3, Language::Python);
        assert_eq!(third.verdict, Verdict::Revealed);
        assert!(third.message.contains(sum_array::reference_solution(Language::Python)));
        assert!(third.verdict.ends_round());
    }

    #[test]
    fn test_reference_in_chosen_language() {
        let third = review(&return_zero(), 3, Language::Java);
        assert!(third.message.contains("reference solution in Java"));
        assert!(third.message.contains("```java"));
        assert!(third.message.contains(sum_array::reference_solution(Language::Java)));
    }

    #[test]
    fn test_load_failure_counts_as_attempt() {
        let result = GradingResult::failed(5, sum_array::MISSING_ENTRY_POINT);
        let review = review(&result, 1, Language::Python);

        assert_eq!(review.verdict, Verdict::Retry);
        assert!(review.message.starts_with("Your code could not be run: Function sum_array missing"));
    }

    #[test]
    fn test_success_ends_round_on_any_attempt() {
        let mut result = return_zero();
        result.passed = 5;
        for row in &mut result.details {
            row.passed = true;
        }

        for attempt in 1..=4 {
            let review = review(&result, attempt, Language::Cpp);
            assert_eq!(review.verdict, Verdict::Solved);
            assert!(review.message.contains("All tests passed (5/5)"));
        }
    }
}

/// Test Evaluator - Pure Grading Logic
///
/// **Core Responsibility:**
/// Turn raw harness output into a `GradingResult` against the fixed oracle.
///
/// **Critical Properties:**
/// - Knows nothing about Docker or child processes
/// - Knows nothing about the interview controller
/// - Pure function: (test cases, raw execution) → GradingResult
///
/// **Comparison Rules:**
/// - Integer results: exact match, no tolerance
/// - Non-integer results (floats, bools, None, strings): never pass
/// - Faults raised by the entry point: never pass, fault text kept as actual
///
/// **Protocol Rules:**
/// - Output past the capture limit → "Output limit exceeded", nothing else is read
/// - A repeated case index, a case before `loaded`, a second `loaded`, or
///   any event after a terminal one → corrupted output, graded as a failure
///
/// **Abort Rules:**
/// - Timeout or crash before the entry point was found → failure reason
/// - Timeout or crash after → the in-flight case carries the fault,
///   cases after it are marked as not run; row count stays equal to total

use crate::engine::RawExecution;
use crate::harness::{parse_events, HarnessEvent};
use interview_common::types::{sum_array, Actual, CaseOutcome, GradingResult, TestCase};

pub const NOT_RUN: &str = "Not run: execution aborted";
pub const OUTPUT_LIMIT_EXCEEDED: &str = "Output limit exceeded";
pub const CORRUPTED_OUTPUT: &str = "Corrupted harness output";

/// Evaluate a single case outcome against its expected value
pub fn evaluate_case(case: &TestCase, actual: Actual) -> CaseOutcome {
    let passed = matches!(actual, Actual::Value(v) if v == case.expected);

    CaseOutcome {
        test_id: case.id,
        input: case.input.clone(),
        expected: case.expected,
        actual,
        passed,
    }
}

/// Describe why the harness stopped early
fn abort_reason(raw: &RawExecution) -> String {
    if raw.timed_out {
        return format!("Execution timed out after {} ms", raw.timeout_ms);
    }

    let last_line = raw
        .stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty());

    match (raw.exit_code, last_line) {
        (_, Some(line)) => line.to_string(),
        (Some(code), None) => format!("Execution aborted with exit code {}", code),
        (None, None) => "Execution aborted without output".to_string(),
    }
}

fn corrupted(total: usize, detail: &str) -> GradingResult {
    tracing::warn!(detail = detail, "Rejecting harness output");
    GradingResult::failed(total, CORRUPTED_OUTPUT)
}

/// Aggregate harness output into the final grading result
pub fn evaluate(cases: &[TestCase], raw: &RawExecution) -> GradingResult {
    let total = cases.len();

    if raw.output_limit_exceeded {
        return GradingResult::failed(total, OUTPUT_LIMIT_EXCEEDED);
    }

    let mut loaded = false;
    let mut terminal: Option<String> = None;
    let mut actuals: Vec<Option<Actual>> = vec![None; total];

    for event in parse_events(&raw.stdout) {
        if terminal.is_some() {
            return corrupted(total, "event after terminal event");
        }

        match event {
            HarnessEvent::LoadError { message } if !loaded => terminal = Some(message),
            HarnessEvent::MissingEntryPoint if !loaded => {
                terminal = Some(sum_array::MISSING_ENTRY_POINT.to_string())
            }
            HarnessEvent::Loaded if !loaded => loaded = true,
            HarnessEvent::Case { index, actual } if loaded => match actuals.get_mut(index) {
                Some(slot) if slot.is_none() => *slot = Some(actual),
                Some(_) => return corrupted(total, "repeated case index"),
                None => return corrupted(total, "case index out of range"),
            },
            _ => return corrupted(total, "event out of order"),
        }
    }

    if let Some(reason) = terminal {
        return GradingResult::failed(total, reason);
    }

    if !loaded {
        return GradingResult::failed(total, abort_reason(raw));
    }

    // First missing row is the one that was in flight when the harness stopped
    let mut aborted = false;
    let details: Vec<CaseOutcome> = cases
        .iter()
        .zip(actuals)
        .map(|(case, actual)| {
            let actual = match actual {
                Some(actual) => actual,
                None if !aborted => {
                    aborted = true;
                    Actual::Error(abort_reason(raw))
                }
                None => Actual::Error(NOT_RUN.to_string()),
            };
            evaluate_case(case, actual)
        })
        .collect();

    let passed = details.iter().filter(|d| d.passed).count();

    tracing::debug!(
        passed = passed,
        total = total,
        aborted = aborted,
        execution_ms = raw.execution_time_ms,
        "Evaluation complete"
    );

    GradingResult {
        failure: None,
        passed,
        total,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to build harness stdout from case actuals
    fn harness_stdout(actuals: &[&str]) -> String {
        let mut out = String::from("{\"event\": \"loaded\"}\n");
        for (idx, actual) in actuals.iter().enumerate() {
            out.push_str(&format!(
                "{{\"event\": \"case\", \"index\": {}, \"actual\": {}}}\n",
                idx, actual
            ));
        }
        out
    }

    fn value(v: i64) -> String {
        format!("{{\"kind\": \"value\", \"value\": {}}}", v)
    }

    fn make_raw(stdout: &str) -> RawExecution {
        RawExecution {
            stdout: stdout.to_string(),
            exit_code: Some(0),
            timeout_ms: 5000,
            ..Default::default()
        }
    }

    #[test]
    fn test_reference_solution_passes_everything() {
        let cases = sum_array::suite();
        let sums: Vec<String> = cases.iter().map(|c| value(c.input.iter().sum())).collect();
        let refs: Vec<&str> = sums.iter().map(String::as_str).collect();

        let result = evaluate(&cases, &make_raw(&harness_stdout(&refs)));

        assert_eq!(result.failure, None);
        assert_eq!(result.passed, 5);
        assert_eq!(result.total, 5);
        assert_eq!(result.details.len(), 5);
        assert!(result.all_passed());
    }

    #[test]
    fn test_constant_zero_passes_zero_sum_cases() {
        let cases = sum_array::suite();
        let zero = value(0);
        let result = evaluate(&cases, &make_raw(&harness_stdout(&[zero.as_str(); 5])));

        assert_eq!(result.passed, 3);
        let failing: Vec<u32> = result.failing().map(|d| d.test_id).collect();
        assert_eq!(failing, vec![2, 4]);
        assert_eq!(result.details[1].actual, Actual::Value(0));
    }

    #[test]
    fn test_load_error_has_no_details() {
        let raw = make_raw("{\"event\": \"load_error\", \"message\": \"invalid syntax (<submission>, line 1)\"}\n");
        let result = evaluate(&sum_array::suite(), &raw);

        assert_eq!(result.failure.as_deref(), Some("invalid syntax (<submission>, line 1)"));
        assert_eq!(result.passed, 0);
        assert_eq!(result.total, 5);
        assert!(result.details.is_empty());
    }

    #[test]
    fn test_missing_entry_point() {
        let raw = make_raw("{\"event\": \"missing_entry_point\"}\n");
        let result = evaluate(&sum_array::suite(), &raw);

        assert_eq!(result.failure.as_deref(), Some(sum_array::MISSING_ENTRY_POINT));
        assert!(result.details.is_empty());
    }

    #[test]
    fn test_per_case_fault_is_localized() {
        let cases = sum_array::suite();
        let err = "{\"kind\": \"error\", \"value\": \"list index out of range\"}";
        let (a, b, c, d) = (value(0), value(6), value(10), value(0));
        let result = evaluate(
            &cases,
            &make_raw(&harness_stdout(&[a.as_str(), b.as_str(), err, c.as_str(), d.as_str()])),
        );

        assert_eq!(result.passed, 4);
        assert_eq!(result.details.len(), 5);
        assert!(!result.details[2].passed);
        assert_eq!(result.details[2].actual, Actual::Error("list index out of range".to_string()));
    }

    #[test]
    fn test_non_integer_never_passes() {
        let case = TestCase { id: 1, input: vec![1, 2, 3], expected: 6 };

        assert!(!evaluate_case(&case, Actual::Other("6.0".to_string())).passed);
        assert!(!evaluate_case(&case, Actual::Other("'6'".to_string())).passed);
        assert!(evaluate_case(&case, Actual::Value(6)).passed);
        assert!(!evaluate_case(&case, Actual::Value(7)).passed);
    }

    #[test]
    fn test_timeout_before_load() {
        let raw = RawExecution {
            timed_out: true,
            timeout_ms: 5000,
            ..Default::default()
        };
        let result = evaluate(&sum_array::suite(), &raw);

        assert_eq!(result.failure.as_deref(), Some("Execution timed out after 5000 ms"));
        assert!(result.details.is_empty());
    }

    #[test]
    fn test_timeout_mid_suite_keeps_row_count() {
        let cases = sum_array::suite();
        let (a, b) = (value(0), value(6));
        let raw = RawExecution {
            stdout: harness_stdout(&[a.as_str(), b.as_str()]),
            timed_out: true,
            timeout_ms: 1000,
            ..Default::default()
        };

        let result = evaluate(&cases, &raw);

        assert_eq!(result.failure, None);
        assert_eq!(result.details.len(), 5);
        assert_eq!(result.passed, 2);
        assert_eq!(result.details[2].actual, Actual::Error("Execution timed out after 1000 ms".to_string()));
        assert_eq!(result.details[3].actual, Actual::Error(NOT_RUN.to_string()));
        assert_eq!(result.details[4].actual, Actual::Error(NOT_RUN.to_string()));
    }

    #[test]
    fn test_crash_without_output_uses_stderr() {
        let raw = RawExecution {
            stderr: "Traceback (most recent call last):\nMemoryError\n".to_string(),
            exit_code: Some(1),
            ..Default::default()
        };
        let result = evaluate(&sum_array::suite(), &raw);
        assert_eq!(result.failure.as_deref(), Some("MemoryError"));

        let raw = RawExecution {
            exit_code: Some(137),
            ..Default::default()
        };
        let result = evaluate(&sum_array::suite(), &raw);
        assert_eq!(result.failure.as_deref(), Some("Execution aborted with exit code 137"));
    }

    #[test]
    fn test_output_limit_fails_whole_submission() {
        let zero = value(0);
        let raw = RawExecution {
            stdout: harness_stdout(&[zero.as_str(); 5]),
            output_limit_exceeded: true,
            ..Default::default()
        };
        let result = evaluate(&sum_array::suite(), &raw);

        assert_eq!(result.failure.as_deref(), Some(OUTPUT_LIMIT_EXCEEDED));
        assert_eq!(result.passed, 0);
        assert!(result.details.is_empty());
    }

    #[test]
    fn test_repeated_case_index_is_corrupted() {
        let cases = sum_array::suite();
        let sums: Vec<String> = cases.iter().map(|c| value(c.input.iter().sum())).collect();
        let refs: Vec<&str> = sums.iter().map(String::as_str).collect();
        let mut stdout = harness_stdout(&[value(99).as_str(); 5]);
        stdout.push_str(&harness_stdout(&refs).replacen("{\"event\": \"loaded\"}\n", "", 1));

        let result = evaluate(&cases, &make_raw(&stdout));

        assert_eq!(result.failure.as_deref(), Some(CORRUPTED_OUTPUT));
        assert_eq!(result.passed, 0);
    }

    #[test]
    fn test_events_after_missing_entry_point_are_corrupted() {
        // Forged rows written ahead of the harness's own verdict
        let zero = value(0);
        let mut stdout = harness_stdout(&[zero.as_str(); 5]);
        stdout.push_str("{\"event\": \"missing_entry_point\"}\n");
        assert_eq!(
            evaluate(&sum_array::suite(), &make_raw(&stdout)).failure.as_deref(),
            Some(CORRUPTED_OUTPUT)
        );

        let mut stdout = String::from("{\"event\": \"missing_entry_point\"}\n");
        stdout.push_str(&harness_stdout(&[zero.as_str(); 5]));
        assert_eq!(
            evaluate(&sum_array::suite(), &make_raw(&stdout)).failure.as_deref(),
            Some(CORRUPTED_OUTPUT)
        );
    }

    #[test]
    fn test_case_before_loaded_is_corrupted() {
        let raw = make_raw("{\"event\": \"case\", \"index\": 0, \"actual\": {\"kind\": \"value\", \"value\": 0}}\n");
        let result = evaluate(&sum_array::suite(), &raw);
        assert_eq!(result.failure.as_deref(), Some(CORRUPTED_OUTPUT));
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let cases = sum_array::suite();
        let zero = value(0);
        let raw = make_raw(&harness_stdout(&[zero.as_str(); 5]));

        assert_eq!(evaluate(&cases, &raw), evaluate(&cases, &raw));
    }
}

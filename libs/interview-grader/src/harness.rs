/// Sandbox Harness - Wire Protocol Between Engine and Evaluator
///
/// The runner script is embedded into the binary and executed by whichever
/// engine backend is configured. It receives the submission and the test
/// inputs through two base64-encoded environment variables and answers with
/// one JSON object per line on stdout.
///
/// Events, in the order they can appear:
/// - `load_error` (terminal): the source raised while loading
/// - `missing_entry_point` (terminal): loading succeeded but `sum_array` is absent
/// - `loaded`: the entry point exists, case events follow
/// - `case`: one per input, in input order

use base64::{engine::general_purpose, Engine as _};
use interview_common::types::{Actual, TestCase};
use serde::Deserialize;

/// The Python runner executed inside the sandbox
pub const RUNNER: &str = include_str!("../harness/runner.py");

pub const SOURCE_ENV: &str = "SOURCE_CODE";
pub const INPUT_ENV: &str = "TEST_INPUT";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HarnessEvent {
    LoadError { message: String },
    MissingEntryPoint,
    Loaded,
    Case { index: usize, actual: Actual },
}

/// Environment variables handed to the runner
pub fn encode_env(source_code: &str, cases: &[TestCase]) -> Vec<(String, String)> {
    let inputs: Vec<&Vec<i64>> = cases.iter().map(|c| &c.input).collect();
    // Vec<Vec<i64>> always serializes
    let inputs_json = serde_json::to_string(&inputs).unwrap_or_else(|_| "[]".to_string());

    vec![
        (SOURCE_ENV.to_string(), general_purpose::STANDARD.encode(source_code)),
        (INPUT_ENV.to_string(), general_purpose::STANDARD.encode(inputs_json)),
    ]
}

/// Parse harness stdout into events.
///
/// Lines that are not protocol events are skipped; the runner redirects
/// candidate prints to stderr, so these only appear if the interpreter
/// itself writes to stdout.
pub fn parse_events(stdout: &str) -> Vec<HarnessEvent> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<HarnessEvent>(line) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::debug!(error = %e, line_preview = %line.chars().take(80).collect::<String>(), "Skipping non-protocol line");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_common::types::sum_array;

    #[test]
    fn test_encode_env_roundtrips_through_base64() {
        let env = encode_env("def sum_array(a): return 0", &sum_array::suite());
        assert_eq!(env[0].0, SOURCE_ENV);
        assert_eq!(env[1].0, INPUT_ENV);

        let inputs = general_purpose::STANDARD.decode(&env[1].1).unwrap();
        assert_eq!(String::from_utf8(inputs).unwrap(), "[[],[1,2,3],[-5,5],[10],[0,0,0]]");
    }

    #[test]
    fn test_parse_all_event_kinds() {
        let stdout = concat!(
            "{\"event\": \"loaded\"}\n",
            "{\"event\": \"case\", \"index\": 0, \"actual\": {\"kind\": \"value\", \"value\": 6}}\n",
            "{\"event\": \"case\", \"index\": 1, \"actual\": {\"kind\": \"other\", \"value\": \"6.0\"}}\n",
            "{\"event\": \"case\", \"index\": 2, \"actual\": {\"kind\": \"error\", \"value\": \"boom\"}}\n",
        );

        let events = parse_events(stdout);
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], HarnessEvent::Loaded);
        assert_eq!(events[1], HarnessEvent::Case { index: 0, actual: Actual::Value(6) });
        assert_eq!(events[2], HarnessEvent::Case { index: 1, actual: Actual::Other("6.0".to_string()) });
        assert_eq!(events[3], HarnessEvent::Case { index: 2, actual: Actual::Error("boom".to_string()) });
    }

    #[test]
    fn test_parse_skips_noise() {
        let stdout = "hello from python\n\n{\"event\": \"missing_entry_point\"}\n";
        assert_eq!(parse_events(stdout), vec![HarnessEvent::MissingEntryPoint]);
    }

    #[test]
    fn test_runner_mentions_entry_point() {
        assert!(RUNNER.contains(sum_array::ENTRY_POINT));
    }
}

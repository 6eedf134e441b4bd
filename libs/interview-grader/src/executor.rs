/// Grader - High-Level Orchestration
///
/// **Responsibility:**
/// Coordinate an execution engine and the evaluator to grade one submission.
///
/// **Architecture:**
/// 1. Reject oversized sources without executing them
/// 2. Run the harness through the configured engine (engine.rs / process.rs)
/// 3. Score the raw output with the evaluator (evaluator.rs)
///
/// This module is the glue layer - it knows nothing about:
/// - How code executes (engine's job)
/// - How rows are judged (evaluator's job)

use crate::engine::{DockerEngine, ExecutionEngine, MAX_SOURCE_CODE_BYTES};
use crate::evaluator;
use crate::process::ProcessEngine;
use anyhow::Result;
use interview_common::config::{GraderBackend, GraderConfig};
use interview_common::types::{sum_array, GradingResult, TestCase};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct Grader {
    engine: Arc<dyn ExecutionEngine>,
    suite: Arc<Vec<TestCase>>,
}

impl Grader {
    /// Grader for the sum-array exercise over an arbitrary engine
    pub fn new(engine: Arc<dyn ExecutionEngine>) -> Self {
        Self {
            engine,
            suite: Arc::new(sum_array::suite()),
        }
    }

    /// Build the engine selected in configuration
    pub fn from_config(config: &GraderConfig) -> Result<Self> {
        let engine: Arc<dyn ExecutionEngine> = match config.backend {
            GraderBackend::Docker => Arc::new(DockerEngine::new(config)?),
            GraderBackend::Process => Arc::new(ProcessEngine::new(config)),
        };

        info!(backend = engine.name(), timeout_ms = config.timeout_ms, "Grader ready");
        Ok(Self::new(engine))
    }

    pub fn backend(&self) -> &'static str {
        self.engine.name()
    }

    pub fn suite(&self) -> &[TestCase] {
        &self.suite
    }

    /// Grade a submission.
    ///
    /// Candidate faults (syntax errors, missing entry point, exceptions,
    /// timeouts) are reported inside the `GradingResult`. `Err` means the
    /// sandbox itself could not be used.
    #[instrument(skip(self, source_code), fields(backend = self.engine.name(), source_size = source_code.len()))]
    pub async fn evaluate(&self, source_code: &str) -> Result<GradingResult> {
        let total = self.suite.len();

        if source_code.len() > MAX_SOURCE_CODE_BYTES {
            warn!("Submission rejected: source too large");
            return Ok(GradingResult::failed(
                total,
                format!("Source code exceeds maximum size of {} bytes", MAX_SOURCE_CODE_BYTES),
            ));
        }

        let start = Instant::now();
        let raw = self.engine.run(source_code, &self.suite).await?;

        if raw.timed_out {
            warn!(execution_ms = raw.execution_time_ms, "Execution timed out; remaining cases cannot pass");
        }

        let result = evaluator::evaluate(&self.suite, &raw);

        info!(
            passed = result.passed,
            total = result.total,
            failure = result.failure.as_deref().unwrap_or(""),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Submission graded"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RawExecution;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Engine that replays fixed harness output and counts invocations
    struct ReplayEngine {
        stdout: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ExecutionEngine for ReplayEngine {
        fn name(&self) -> &'static str {
            "replay"
        }

        async fn run(&self, _source_code: &str, _cases: &[TestCase]) -> Result<RawExecution> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RawExecution {
                stdout: self.stdout.clone(),
                exit_code: Some(0),
                ..Default::default()
            })
        }
    }

    struct BrokenEngine;

    #[async_trait]
    impl ExecutionEngine for BrokenEngine {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn run(&self, _source_code: &str, _cases: &[TestCase]) -> Result<RawExecution> {
            anyhow::bail!("Failed to connect to Docker daemon")
        }
    }

    #[tokio::test]
    async fn test_oversized_source_skips_engine() {
        let engine = Arc::new(ReplayEngine {
            stdout: String::new(),
            calls: AtomicUsize::new(0),
        });
        let grader = Grader::new(engine.clone());

        let result = grader.evaluate(&"#".repeat(MAX_SOURCE_CODE_BYTES + 1)).await.unwrap();

        assert!(result.failure.unwrap().contains("maximum size"));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_grades_through_engine() {
        let engine = Arc::new(ReplayEngine {
            stdout: "{\"event\": \"missing_entry_point\"}\n".to_string(),
            calls: AtomicUsize::new(0),
        });
        let grader = Grader::new(engine.clone());

        let first = grader.evaluate("").await.unwrap();
        let second = grader.evaluate("").await.unwrap();

        assert_eq!(first.failure.as_deref(), Some(sum_array::MISSING_ENTRY_POINT));
        assert_eq!(first, second);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
        assert_eq!(grader.suite().len(), 5);
    }

    #[tokio::test]
    async fn test_infrastructure_error_propagates() {
        let grader = Grader::new(Arc::new(BrokenEngine));
        let err = grader.evaluate("def sum_array(a): return 0").await.unwrap_err();
        assert!(err.to_string().contains("Docker"));
    }
}

//! Local interpreter backend.
//!
//! Runs the harness in a child process with an empty environment, isolated
//! interpreter flags and a hard wall-clock timeout. The harness applies
//! address-space and CPU rlimits to itself before loading the submission.
//! There is no filesystem or network isolation here; use DockerEngine
//! wherever that matters.

use crate::engine::{ExecutionEngine, RawExecution, MAX_OUTPUT_BYTES, MAX_SOURCE_CODE_BYTES};
use crate::harness;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use interview_common::config::GraderConfig;
use interview_common::types::TestCase;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::warn;

/// Grace period for draining pipes after the child has exited or been killed
const DRAIN_GRACE_MS: u64 = 500;

pub struct ProcessEngine {
    python_bin: String,
    timeout_ms: u64,
    memory_limit_mb: u32,
}

impl ProcessEngine {
    pub fn new(config: &GraderConfig) -> Self {
        Self {
            python_bin: config.python_bin.clone(),
            timeout_ms: config.timeout_ms,
            memory_limit_mb: config.memory_limit_mb,
        }
    }

    /// CPU rlimit sits above the wall-clock timeout so the timeout fires first
    fn cpu_limit_secs(&self) -> u64 {
        self.timeout_ms / 1000 + 1
    }
}

/// Output captured from one pipe
#[derive(Debug, Default)]
struct Captured {
    text: String,
    truncated: bool,
}

/// Read a pipe into memory up to `MAX_OUTPUT_BYTES`. Past the cap the rest
/// is discarded and `overflow` is signalled so the child can be killed.
fn drain<R>(reader: R, overflow: Arc<Notify>) -> JoinHandle<Captured>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        let mut limited = reader.take(MAX_OUTPUT_BYTES as u64 + 1);
        let _ = limited.read_to_end(&mut buf).await;

        let truncated = buf.len() > MAX_OUTPUT_BYTES;
        if truncated {
            buf.truncate(MAX_OUTPUT_BYTES);
            overflow.notify_one();
            let mut rest = limited.into_inner();
            let _ = tokio::io::copy(&mut rest, &mut tokio::io::sink()).await;
        }

        Captured {
            text: String::from_utf8_lossy(&buf).into_owned(),
            truncated,
        }
    })
}

async fn collect(handle: JoinHandle<Captured>) -> Captured {
    match tokio::time::timeout(Duration::from_millis(DRAIN_GRACE_MS), handle).await {
        Ok(Ok(captured)) => captured,
        Ok(Err(e)) => {
            warn!(error = %e, "Pipe reader task failed");
            Captured::default()
        }
        Err(_) => {
            // A grandchild may still hold the pipe open
            warn!("Timed out draining harness output");
            Captured::default()
        }
    }
}

async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to kill harness process");
    }
}

#[async_trait]
impl ExecutionEngine for ProcessEngine {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn run(&self, source_code: &str, cases: &[TestCase]) -> Result<RawExecution> {
        if source_code.len() > MAX_SOURCE_CODE_BYTES {
            bail!("Source code exceeds maximum size of {} bytes", MAX_SOURCE_CODE_BYTES);
        }

        let mut cmd = Command::new(&self.python_bin);
        cmd.arg("-I")
            .arg("-S")
            .arg("-c")
            .arg(harness::RUNNER)
            .env_clear()
            .envs(harness::encode_env(source_code, cases))
            .env("MEMORY_LIMIT_MB", self.memory_limit_mb.to_string())
            .env("CPU_LIMIT_SECS", self.cpu_limit_secs().to_string())
            .current_dir(std::env::temp_dir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start_time = Instant::now();

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn interpreter '{}'", self.python_bin))?;

        let overflow = Arc::new(Notify::new());
        let stdout = drain(child.stdout.take().context("Harness stdout not captured")?, overflow.clone());
        let stderr = drain(child.stderr.take().context("Harness stderr not captured")?, overflow.clone());

        let (exit_code, timed_out) = tokio::select! {
            status = child.wait() => {
                let status = status.context("Failed to wait for harness process")?;
                (status.code().map(i64::from), false)
            }
            _ = overflow.notified() => {
                warn!(limit_bytes = MAX_OUTPUT_BYTES, "Harness output limit exceeded, killing process");
                kill(&mut child).await;
                (None, false)
            }
            _ = tokio::time::sleep(Duration::from_millis(self.timeout_ms)) => {
                warn!(timeout_ms = self.timeout_ms, "Harness timed out, killing process");
                kill(&mut child).await;
                (None, true)
            }
        };

        let stdout = collect(stdout).await;
        let stderr = collect(stderr).await;

        Ok(RawExecution {
            output_limit_exceeded: stdout.truncated || stderr.truncated,
            stdout: stdout.text,
            stderr: stderr.text,
            exit_code,
            execution_time_ms: start_time.elapsed().as_millis() as u64,
            timed_out,
            timeout_ms: self.timeout_ms,
        })
    }
}

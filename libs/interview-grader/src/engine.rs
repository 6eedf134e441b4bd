/// Execution Engine - Abstraction for Sandboxed Code Execution
///
/// **Core Responsibility:**
/// Run the harness against a submission and capture its raw output.
///
/// **Critical Architectural Boundary:**
/// - Engine knows HOW to execute (Docker container, local interpreter)
/// - Engine does NOT know the oracle's expected values
/// - Engine does NOT decide pass/fail
/// - Engine returns raw output for the Evaluator to judge
///
/// Production uses DockerEngine; ProcessEngine (process.rs) is the
/// lightweight backend for development machines without a Docker daemon.

use crate::harness;
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, KillContainerOptions, LogOutput, LogsOptions,
    RemoveContainerOptions, StartContainerOptions, WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::Docker;
use futures_util::stream::StreamExt;
use interview_common::config::GraderConfig;
use interview_common::types::TestCase;
use std::time::{Duration, Instant};
use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

/// Safety limit to keep pathological submissions out of the sandbox
pub const MAX_SOURCE_CODE_BYTES: usize = 64 * 1024;

/// Per-stream cap on captured harness output; exceeding it stops the run
pub const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Raw output of one harness run, produced by an engine, consumed by the Evaluator
#[derive(Debug, Clone, Default)]
pub struct RawExecution {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i64>,
    pub execution_time_ms: u64,
    pub timed_out: bool,
    pub timeout_ms: u64,
    /// A stream hit `MAX_OUTPUT_BYTES` and the run was killed
    pub output_limit_exceeded: bool,
}

/// Append `chunk` to `buf` without growing past `MAX_OUTPUT_BYTES`.
/// Returns false once the chunk did not fit.
pub(crate) fn append_capped(buf: &mut String, chunk: &[u8]) -> bool {
    let room = MAX_OUTPUT_BYTES.saturating_sub(buf.len());
    if chunk.len() > room {
        buf.push_str(&String::from_utf8_lossy(&chunk[..room]));
        return false;
    }
    buf.push_str(&String::from_utf8_lossy(chunk));
    true
}

/// A sandboxed backend able to run the harness.
///
/// `Err` is reserved for infrastructure faults (daemon unreachable,
/// interpreter missing). Anything the submission does wrong is reported
/// through the returned `RawExecution`.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, source_code: &str, cases: &[TestCase]) -> Result<RawExecution>;
}

/// Container cleanup guard - guarantees container removal on drop
/// This ensures containers are cleaned up even if execution panics or is cancelled
struct ContainerGuard<'a> {
    docker: &'a Docker,
    container_id: String,
}

impl<'a> ContainerGuard<'a> {
    fn new(docker: &'a Docker, container_id: String) -> Self {
        Self { docker, container_id }
    }
}

impl<'a> Drop for ContainerGuard<'a> {
    fn drop(&mut self) {
        // Cannot be async in Drop
        let container_id = self.container_id.clone();
        let docker = self.docker.clone();

        tokio::spawn(async move {
            let remove_options = RemoveContainerOptions {
                force: true,
                ..Default::default()
            };

            if let Err(e) = docker.remove_container(&container_id, Some(remove_options)).await {
                warn!(container_id = %container_id, error = %e, "Failed to cleanup container");
            }
        });
    }
}

/// Docker-based execution engine
///
/// **Docker Execution Rules:**
/// 1. Pulls the interpreter image if not present
/// 2. Creates one throw-away container per submission with:
///    - Network disabled
///    - Memory, CPU and pids limits
///    - Read-only root filesystem, all capabilities dropped
/// 3. Injects source code and test inputs as base64 env vars
/// 4. Captures stdout/stderr streams
/// 5. Kills the container when the hard timeout elapses
/// 6. Removes the container via a drop guard
pub struct DockerEngine {
    docker: Docker,
    config: GraderConfig,
}

impl DockerEngine {
    pub fn new(config: &GraderConfig) -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .context("Failed to connect to Docker daemon")?;

        Ok(DockerEngine {
            docker,
            config: config.clone(),
        })
    }

    fn memory_limit(&self) -> i64 {
        (self.config.memory_limit_mb as i64) * 1024 * 1024
    }

    fn cpu_limit(&self) -> i64 {
        (self.config.cpu_limit * 1_000_000_000.0) as i64
    }

    /// Ensure Docker image is available (pull if needed)
    async fn ensure_image(&self, image: &str) -> Result<()> {
        if self.docker.inspect_image(image).await.is_ok() {
            debug!(image = %image, "Image cache hit");
            return Ok(());
        }

        warn!(image = %image, "Image cache miss, pulling now");

        let options = Some(CreateImageOptions {
            from_image: image,
            ..Default::default()
        });

        let mut stream = self.docker.create_image(options, None, None);

        while let Some(result) = stream.next().await {
            result.context("Failed to pull Docker image")?;
        }

        info!(image = %image, "Image pulled successfully");
        Ok(())
    }

    async fn kill(&self, container_id: &str) {
        if let Err(e) = self
            .docker
            .kill_container(container_id, None::<KillContainerOptions<String>>)
            .await
        {
            warn!(container_id = %container_id, error = %e, "Failed to kill container");
        }
    }
}

#[async_trait]
impl ExecutionEngine for DockerEngine {
    fn name(&self) -> &'static str {
        "docker"
    }

    /// Run the harness in a fresh container with a hard timeout
    async fn run(&self, source_code: &str, cases: &[TestCase]) -> Result<RawExecution> {
        if source_code.len() > MAX_SOURCE_CODE_BYTES {
            bail!("Source code exceeds maximum size of {} bytes", MAX_SOURCE_CODE_BYTES);
        }

        let image = self.config.image.clone();
        let container_name = format!("interview-grader-{}", uuid::Uuid::new_v4());

        self.ensure_image(&image)
            .await
            .with_context(|| format!("Failed to ensure Docker image '{}' is available", image))?;

        let env: Vec<String> = harness::encode_env(source_code, cases)
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();

        let config = Config {
            image: Some(image.clone()),
            cmd: Some(vec![
                "python3".to_string(),
                "-I".to_string(),
                "-S".to_string(),
                "-c".to_string(),
                harness::RUNNER.to_string(),
            ]),
            entrypoint: Some(vec![]),
            env: Some(env),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            network_disabled: Some(true),
            user: Some("65534:65534".to_string()),
            host_config: Some(bollard::models::HostConfig {
                memory: Some(self.memory_limit()),
                memory_swap: Some(self.memory_limit()),
                nano_cpus: Some(self.cpu_limit()),
                pids_limit: Some(self.config.pids_limit),
                readonly_rootfs: Some(true),
                cap_drop: Some(vec!["ALL".to_string()]),
                security_opt: Some(vec!["no-new-privileges".to_string()]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let create_options = CreateContainerOptions {
            name: container_name.as_str(),
            platform: None,
        };

        let container = self
            .docker
            .create_container(Some(create_options), config)
            .await
            .context("Failed to create Docker container")?;

        let container_id = container.id.clone();
        let _guard = ContainerGuard::new(&self.docker, container_id.clone());

        let start_time = Instant::now();

        self.docker
            .start_container(&container_id, None::<StartContainerOptions<String>>)
            .await
            .context("Failed to start Docker container")?;

        let timeout_ms = self.config.timeout_ms;

        // Partial output must survive a timeout, so it is collected outside the future
        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut output_limit_exceeded = false;

        let execution_future = async {
            let logs_options = Some(LogsOptions::<String> {
                stdout: true,
                stderr: true,
                follow: true,
                ..Default::default()
            });

            let mut logs_stream = self.docker.logs(&container_id, logs_options);

            while let Some(output) = logs_stream.next().await {
                match output {
                    Ok(LogOutput::StdOut { message }) => {
                        if !append_capped(&mut stdout, &message) {
                            output_limit_exceeded = true;
                            break;
                        }
                    }
                    Ok(LogOutput::StdErr { message }) => {
                        if !append_capped(&mut stderr, &message) {
                            output_limit_exceeded = true;
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Error reading container logs");
                        break;
                    }
                    _ => {}
                }
            }

            if output_limit_exceeded {
                return None;
            }

            let wait_options = WaitContainerOptions {
                condition: "not-running",
            };

            let mut wait_stream = self.docker.wait_container(&container_id, Some(wait_options));
            match wait_stream.next().await {
                Some(Ok(response)) => Some(response.status_code),
                // bollard reports non-zero exits as an error carrying the code
                Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => Some(code),
                Some(Err(e)) => {
                    warn!(error = %e, "Failed to get container exit code");
                    None
                }
                None => None,
            }
        };

        let timeout_result =
            tokio::time::timeout(Duration::from_millis(timeout_ms), execution_future).await;

        let (exit_code, timed_out) = match timeout_result {
            Ok(_) if output_limit_exceeded => {
                warn!(limit_bytes = MAX_OUTPUT_BYTES, "Output limit exceeded, killing container");
                self.kill(&container_id).await;
                (None, false)
            }
            Ok(code) => {
                if let Some(137) = code {
                    stderr.push_str("\n[Container killed: likely exceeded memory limit]");
                }
                (code, false)
            }
            Err(_) => {
                warn!(timeout_ms = timeout_ms, "Execution timed out, killing container");
                self.kill(&container_id).await;
                (None, true)
            }
        };

        Ok(RawExecution {
            stdout,
            stderr,
            exit_code,
            execution_time_ms: start_time.elapsed().as_millis() as u64,
            timed_out,
            timeout_ms,
            output_limit_exceeded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_capped_stops_at_limit() {
        let mut buf = String::new();
        assert!(append_capped(&mut buf, &vec![b'x'; MAX_OUTPUT_BYTES - 1]));
        assert!(append_capped(&mut buf, b"y"));
        assert_eq!(buf.len(), MAX_OUTPUT_BYTES);

        assert!(!append_capped(&mut buf, b"z"));
        assert_eq!(buf.len(), MAX_OUTPUT_BYTES);
    }

    #[test]
    fn test_append_capped_keeps_partial_chunk() {
        let mut buf = "a".repeat(MAX_OUTPUT_BYTES - 2);
        assert!(!append_capped(&mut buf, b"bcd"));
        assert!(buf.ends_with("abc"));
        assert_eq!(buf.len(), MAX_OUTPUT_BYTES);
    }
}

/// Docker-backed Language Runtime Adapter
///
/// **Sandbox Rules:**
/// 1. One container per submission - compile once, run every case in it
/// 2. Security constraints on the container:
///    - Network disabled
///    - Memory and CPU ceilings from the language profile / judge limits
///    - Only /judge is written to, only by the judge itself
/// 3. Source and harness are injected; the harness reads the case's
///    positional arguments as JSON on stdin, calls the user's entry point,
///    and prints the returned value and its measured runtime as one marked
///    JSON line
/// 4. Per-case wall clock is enforced inside the container via timeout(1);
///    the judge-side sandbox backstop covers a wedged container
/// 5. The container is removed on drop, even if grading panics
use crate::adapter::{CompiledProgram, InvokeResult, LanguageAdapter, PrepareError, RunOutcome};
use crate::profile::LanguageProfile;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use bollard::container::{
    Config, CreateContainerOptions, KillContainerOptions, LogOutput, RemoveContainerOptions,
    StartContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecOptions, StartExecResults};
use bollard::image::CreateImageOptions;
use bollard::Docker;
use futures_util::stream::StreamExt;
use gauntlet_common::config::JudgeLimits;
use gauntlet_common::types::Language;
use serde::Deserialize;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Ceiling on one case's serialized argument payload.
const MAX_ARGS_BYTES: usize = 10 * 1024 * 1024;

/// Marker the harness prefixes its result line with, so user prints on
/// stdout never get mistaken for the returned value.
const RESULT_MARKER: &str = "__gauntlet_result__ ";

/// Envelope the harness prints on the marked result line. `elapsed_ms` is
/// measured around the entry-point call alone, so interpreter startup and
/// source loading never count against the submission's runtime.
#[derive(Debug, PartialEq, Deserialize)]
struct HarnessResult {
    value: Value,
    elapsed_ms: u64,
}

/// Container cleanup guard - guarantees removal on drop, even on panic.
struct ContainerGuard {
    docker: Docker,
    container_id: String,
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        // Best-effort cleanup - cannot be async in Drop.
        let docker = self.docker.clone();
        let container_id = self.container_id.clone();

        tokio::spawn(async move {
            let remove_options = RemoveContainerOptions {
                force: true,
                ..Default::default()
            };

            if let Err(e) = docker.remove_container(&container_id, Some(remove_options)).await {
                warn!(container_id = %container_id, error = %e, "failed to remove container");
            }
        });
    }
}

/// One language's Docker runtime.
pub struct DockerAdapter {
    docker: Docker,
    language: Language,
    profile: LanguageProfile,
    limits: JudgeLimits,
}

impl DockerAdapter {
    pub fn new(language: Language, profile: LanguageProfile, limits: JudgeLimits) -> Result<Self> {
        let docker =
            Docker::connect_with_local_defaults().context("failed to connect to Docker daemon")?;
        Ok(Self {
            docker,
            language,
            profile,
            limits,
        })
    }

    fn memory_limit_bytes(&self) -> i64 {
        let mb = self.profile.memory_limit_mb.unwrap_or(self.limits.memory_limit_mb);
        (mb as i64) * 1024 * 1024
    }

    fn nano_cpus(&self) -> i64 {
        let cpus = self.profile.cpu_limit.unwrap_or(self.limits.cpu_limit);
        (cpus as f64 * 1_000_000_000.0) as i64
    }

    /// Verify the image exists locally, pulling it if missing.
    async fn ensure_image(&self) -> Result<()> {
        let image = &self.profile.image;
        if self.docker.inspect_image(image).await.is_ok() {
            debug!(image = %image, "image cache hit");
            return Ok(());
        }

        warn!(image = %image, "image cache miss, pulling");
        let options = Some(CreateImageOptions {
            from_image: image.as_str(),
            ..Default::default()
        });

        let mut stream = self.docker.create_image(options, None, None);
        while let Some(result) = stream.next().await {
            result.context("failed to pull Docker image")?;
        }

        info!(image = %image, "image pulled");
        Ok(())
    }

    /// Run one command in the container, capturing output and exit code.
    async fn exec_capture(
        docker: &Docker,
        container_id: &str,
        command: &str,
    ) -> Result<(String, String, Option<i64>)> {
        let exec_config = CreateExecOptions {
            cmd: Some(vec!["sh".to_string(), "-c".to_string(), command.to_string()]),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let exec = docker
            .create_exec(container_id, exec_config)
            .await
            .context("failed to create exec")?;

        let start_config = StartExecOptions {
            detach: false,
            ..Default::default()
        };
        let output = docker.start_exec(&exec.id, Some(start_config)).await?;

        let mut stdout = String::new();
        let mut stderr = String::new();

        if let StartExecResults::Attached { mut output, .. } = output {
            while let Some(msg) = output.next().await {
                match msg {
                    Ok(LogOutput::StdOut { message }) => {
                        stdout.push_str(&String::from_utf8_lossy(&message));
                    }
                    Ok(LogOutput::StdErr { message }) => {
                        stderr.push_str(&String::from_utf8_lossy(&message));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        stderr.push_str(&format!("\n[exec stream error: {}]", e));
                        break;
                    }
                }
            }
        } else {
            bail!("failed to attach to exec");
        }

        let inspect = docker.inspect_exec(&exec.id).await?;
        Ok((stdout, stderr, inspect.exit_code))
    }

    /// Write a file into the container via base64 to dodge quoting issues.
    async fn write_file(&self, container_id: &str, path: &str, content: &str) -> Result<()> {
        let encoded = general_purpose::STANDARD.encode(content);
        let command = format!("echo '{}' | base64 -d > {}", encoded, path);
        let (_, stderr, exit_code) = Self::exec_capture(&self.docker, container_id, &command).await?;
        if exit_code != Some(0) {
            bail!("failed to write {} into container: {}", path, stderr.trim());
        }
        Ok(())
    }
}

#[async_trait]
impl LanguageAdapter for DockerAdapter {
    fn language(&self) -> Language {
        self.language
    }

    #[tracing::instrument(skip(self, source), fields(language = %self.language))]
    async fn prepare(
        &self,
        source: &str,
        entry_point: &str,
    ) -> Result<Box<dyn CompiledProgram>, PrepareError> {
        if !is_valid_entry_point(entry_point) {
            return Err(PrepareError::Infra(anyhow::anyhow!(
                "invalid entry point name: {entry_point}"
            )));
        }

        self.ensure_image().await.with_context(|| {
            format!("failed to ensure image '{}' is available", self.profile.image)
        })?;

        let container_name = format!("gauntlet-{}", uuid::Uuid::new_v4());
        let config = Config {
            image: Some(self.profile.image.clone()),
            // Keep the container alive across case executions.
            cmd: Some(vec!["sh".to_string(), "-c".to_string(), "sleep 600".to_string()]),
            entrypoint: Some(vec![]),
            network_disabled: Some(true),
            working_dir: Some("/judge".to_string()),
            host_config: Some(bollard::models::HostConfig {
                memory: Some(self.memory_limit_bytes()),
                nano_cpus: Some(self.nano_cpus()),
                readonly_rootfs: Some(false),
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
            .context("failed to create sandbox container")?;
        let container_id = container.id.clone();

        // Cleanup guard is armed before anything can fail past this point.
        let guard = ContainerGuard {
            docker: self.docker.clone(),
            container_id: container_id.clone(),
        };

        self.docker
            .start_container(&container_id, None::<StartContainerOptions<String>>)
            .await
            .context("failed to start sandbox container")?;

        let (_, mkdir_err, mkdir_code) =
            Self::exec_capture(&self.docker, &container_id, "mkdir -p /judge").await?;
        if mkdir_code != Some(0) {
            return Err(PrepareError::Infra(anyhow::anyhow!(
                "failed to prepare /judge: {}",
                mkdir_err.trim()
            )));
        }

        let source_path = format!("/judge/{}", self.profile.source_file);
        let harness_path = format!("/judge/{}", self.profile.harness_file);
        self.write_file(&container_id, &source_path, source).await?;
        let harness = harness_source(self.language, entry_point)?;
        self.write_file(&container_id, &harness_path, &harness).await?;

        // Syntax/compile check runs once per submission; its diagnostic is
        // the compile_error verdict's message.
        if let Some(compile_cmd) = &self.profile.compile_cmd {
            let (stdout, stderr, exit_code) =
                Self::exec_capture(&self.docker, &container_id, compile_cmd).await?;
            if exit_code != Some(0) {
                let diagnostic = if stderr.trim().is_empty() { stdout } else { stderr };
                debug!(language = %self.language, "compile check failed");
                return Err(PrepareError::Compile(diagnostic.trim().to_string()));
            }
        }

        Ok(Box::new(DockerProgram {
            docker: self.docker.clone(),
            container_id,
            run_cmd: self.profile.run_cmd.clone(),
            time_limit_ms: self.limits.time_limit_ms,
            _guard: guard,
        }))
    }
}

/// A submission compiled into a running container, ready for invocations.
struct DockerProgram {
    docker: Docker,
    container_id: String,
    run_cmd: String,
    time_limit_ms: u64,
    _guard: ContainerGuard,
}

impl DockerProgram {
    /// Best-effort peak-RSS read from the container's cgroup, in KB.
    async fn peak_memory_kb(&self) -> u64 {
        let command = "cat /sys/fs/cgroup/memory.peak 2>/dev/null \
                       || cat /sys/fs/cgroup/memory/memory.max_usage_in_bytes 2>/dev/null";
        match DockerAdapter::exec_capture(&self.docker, &self.container_id, command).await {
            Ok((stdout, _, Some(0))) => stdout
                .trim()
                .parse::<u64>()
                .map(|bytes| bytes / 1024)
                .unwrap_or(0),
            _ => 0,
        }
    }
}

#[async_trait]
impl CompiledProgram for DockerProgram {
    async fn invoke(&self, args: &[Value]) -> Result<InvokeResult> {
        let payload = serde_json::to_string(args).context("failed to serialize case input")?;
        if payload.len() > MAX_ARGS_BYTES {
            bail!("test input exceeds maximum size of {} bytes", MAX_ARGS_BYTES);
        }

        let encoded = general_purpose::STANDARD.encode(&payload);
        // timeout(1) enforces the wall clock inside the container: TERM at
        // the limit, KILL one second later if the program ignores it.
        let command = format!(
            "echo '{}' | base64 -d | timeout -k 1 {:.3} {}",
            encoded,
            self.time_limit_ms as f64 / 1000.0,
            self.run_cmd,
        );

        let start = Instant::now();
        let (stdout, stderr, exit_code) =
            DockerAdapter::exec_capture(&self.docker, &self.container_id, &command).await?;
        // Fallback when the harness never got to report its own timing.
        let exec_elapsed_ms = start.elapsed().as_millis() as u64;
        let peak_memory_kb = self.peak_memory_kb().await;

        let (outcome, wall_time_ms) = match exit_code {
            Some(0) => match extract_result(&stdout) {
                // The harness times the entry-point call itself, excluding
                // interpreter startup and source loading.
                Some(result) => (RunOutcome::Returned(result.value), result.elapsed_ms),
                None => (
                    RunOutcome::Fault("program produced no result".to_string()),
                    exec_elapsed_ms,
                ),
            },
            // timeout(1) reports 124 on TERM, 137 after the KILL fallback;
            // 137 is also the OOM-kill signature, 139 a segfault.
            Some(124) | Some(143) => (RunOutcome::TimedOut, self.time_limit_ms),
            Some(137) => (RunOutcome::OutOfMemory, exec_elapsed_ms),
            Some(139) => (
                RunOutcome::Fault("segmentation fault".to_string()),
                exec_elapsed_ms,
            ),
            Some(code) => {
                let message = stderr.trim();
                let fault = if message.is_empty() {
                    RunOutcome::Fault(format!("exited with code {}", code))
                } else {
                    RunOutcome::Fault(message.to_string())
                };
                (fault, exec_elapsed_ms)
            }
            None => (
                RunOutcome::Fault("no exit code captured".to_string()),
                exec_elapsed_ms,
            ),
        };

        Ok(InvokeResult {
            outcome,
            wall_time_ms,
            peak_memory_kb,
        })
    }

    /// Kill the container outright. Only the sandbox backstop calls this,
    /// after the in-container timeout failed to report back.
    async fn interrupt(&self) {
        warn!(container_id = %self.container_id, "killing wedged sandbox container");
        if let Err(e) = self
            .docker
            .kill_container(&self.container_id, None::<KillContainerOptions<String>>)
            .await
        {
            warn!(container_id = %self.container_id, error = %e, "failed to kill container");
        }
    }
}

fn is_valid_entry_point(name: &str) -> bool {
    !name.is_empty()
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Last marked line on stdout is the harness envelope; anything else on
/// stdout is the user's own printing and is ignored.
fn extract_result(stdout: &str) -> Option<HarnessResult> {
    stdout
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(RESULT_MARKER))
        .and_then(|json| serde_json::from_str(json).ok())
}

/// Per-language harness: reads the JSON argument array on stdin, calls the
/// entry point with positional arguments, prints the marked result line
/// with the call's own elapsed time.
fn harness_source(language: Language, entry_point: &str) -> Result<String> {
    let template = match language {
        Language::JavaScript => JS_HARNESS,
        Language::Python => PY_HARNESS,
        other => bail!("no harness template for language: {other}"),
    };
    Ok(template.replace("__ENTRY__", entry_point))
}

const JS_HARNESS: &str = r#"'use strict';
const fs = require('fs');
const src = fs.readFileSync('/judge/solution.js', 'utf8');
const entry = new Function(src + '\n;return typeof __ENTRY__ === "undefined" ? undefined : __ENTRY__;')();
if (typeof entry !== 'function') {
  console.error('entry point __ENTRY__ is not a function');
  process.exit(3);
}
const args = JSON.parse(fs.readFileSync(0, 'utf8'));
const started = process.hrtime.bigint();
const result = entry(...args);
const elapsedMs = Math.ceil(Number(process.hrtime.bigint() - started) / 1e6);
console.log('__gauntlet_result__ ' + JSON.stringify({
  value: result === undefined ? null : result,
  elapsed_ms: elapsedMs,
}));
"#;

const PY_HARNESS: &str = r#"import json
import sys
import time

sys.path.insert(0, "/judge")
import solution

entry = getattr(solution, "__ENTRY__", None)
if entry is None:
    print("entry point __ENTRY__ not found", file=sys.stderr)
    sys.exit(3)

args = json.load(sys.stdin)
started = time.perf_counter()
result = entry(*args)
elapsed_ms = int((time.perf_counter() - started) * 1000 + 0.5)
print("__gauntlet_result__ " + json.dumps({"value": result, "elapsed_ms": elapsed_ms}))
"#;

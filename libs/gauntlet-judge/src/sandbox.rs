/// Execution Sandbox - Hard Ceilings Around One Invocation
///
/// The adapter's own environment enforces the primary limits (in-container
/// timeout, cgroup memory cap, no network). This module adds the judge-side
/// backstop: if the adapter itself wedges and never reports back, a
/// wall-clock timeout fires here, the program is forcibly interrupted, and
/// the case is scored `time_limit_exceeded`. Nothing is ever left running.
use crate::adapter::{CompiledProgram, InvokeResult, RunOutcome};
use gauntlet_common::config::JudgeLimits;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// Grace added on top of the per-case limit before the backstop fires, so
/// the in-sandbox timeout gets the first chance to kill the program and
/// report a clean exit code.
const BACKSTOP_GRACE_MS: u64 = 500;

#[derive(Debug, Clone, Copy)]
pub struct SandboxPolicy {
    pub time_limit_ms: u64,
    pub memory_limit_mb: u32,
}

impl SandboxPolicy {
    pub fn from_limits(limits: &JudgeLimits) -> Self {
        Self {
            time_limit_ms: limits.time_limit_ms,
            memory_limit_mb: limits.memory_limit_mb,
        }
    }

    fn backstop(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms + BACKSTOP_GRACE_MS)
    }
}

/// Run exactly one invocation under the policy's wall-clock backstop.
///
/// The invocation is never cancelled from outside this function - caller
/// disconnects do not reach here. On backstop expiry the program is
/// interrupted before we report, so a hung submission cannot outlive its
/// grading run.
pub async fn run_case(
    program: &dyn CompiledProgram,
    args: &[Value],
    policy: &SandboxPolicy,
) -> anyhow::Result<InvokeResult> {
    match tokio::time::timeout(policy.backstop(), program.invoke(args)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                time_limit_ms = policy.time_limit_ms,
                "sandbox backstop fired, interrupting invocation"
            );
            program.interrupt().await;
            // Charge the configured limit, not limit + grace, so a timed-out
            // case never inflates the summed runtime past the ceiling.
            Ok(InvokeResult {
                outcome: RunOutcome::TimedOut,
                wall_time_ms: policy.time_limit_ms,
                peak_memory_kb: 0,
            })
        }
    }
}

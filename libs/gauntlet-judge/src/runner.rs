/// Test Case Runner - Sequential Case Orchestration
///
/// Iterates a challenge's test cases in their defined order, feeding each
/// through the sandbox and converting every per-case failure into a verdict
/// kind at this boundary - a fault in case N never aborts the pipeline.
/// Hidden cases are graded exactly like visible ones; visibility only
/// controls how much the diagnostic reveals.
use crate::adapter::{CompiledProgram, RunOutcome};
use crate::comparator::Comparator;
use crate::sandbox::{self, SandboxPolicy};
use gauntlet_common::types::{TestCase, Verdict};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingMode {
    /// Stop at the first failing case and report its index. The default,
    /// and the only mode that feeds user-facing verdicts.
    FailFast,
    /// Run every case regardless of failures. Used for statistics and
    /// diagnostics, not verdicts.
    RunAll,
}

/// How a single case failed. Maps one-to-one onto the failure verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    WrongAnswer,
    RuntimeError,
    TimeLimitExceeded,
    MemoryLimitExceeded,
}

impl FailureKind {
    pub fn verdict(self) -> Verdict {
        match self {
            FailureKind::WrongAnswer => Verdict::WrongAnswer,
            FailureKind::RuntimeError => Verdict::RuntimeError,
            FailureKind::TimeLimitExceeded => Verdict::TimeLimitExceeded,
            FailureKind::MemoryLimitExceeded => Verdict::MemoryLimitExceeded,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseOutcome {
    Passed,
    Failed {
        kind: FailureKind,
        diagnostic: String,
    },
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, CaseOutcome::Passed)
    }
}

/// Outcome of one executed case, in challenge order.
#[derive(Debug, Clone)]
pub struct CaseReport {
    pub index: usize,
    pub hidden: bool,
    pub outcome: CaseOutcome,
    pub wall_time_ms: u64,
    pub peak_memory_kb: u64,
}

/// Run the challenge's cases against a prepared program.
///
/// Under fail-fast the returned vector ends at the first failing case;
/// under run-all it covers every case. Errors here are infrastructure
/// faults only - user-code failures are folded into `CaseOutcome`s.
pub async fn run_cases(
    program: &dyn CompiledProgram,
    cases: &[TestCase],
    comparator: &Comparator,
    policy: &SandboxPolicy,
    mode: GradingMode,
) -> anyhow::Result<Vec<CaseReport>> {
    let mut reports = Vec::with_capacity(cases.len());

    for (index, case) in cases.iter().enumerate() {
        let args = case.args();
        let result = sandbox::run_case(program, &args, policy).await?;

        let outcome = match result.outcome {
            RunOutcome::Returned(actual) => {
                if comparator.matches(&actual, &case.expected) {
                    CaseOutcome::Passed
                } else {
                    CaseOutcome::Failed {
                        kind: FailureKind::WrongAnswer,
                        diagnostic: wrong_answer_diagnostic(index, case, &actual),
                    }
                }
            }
            RunOutcome::Fault(message) => CaseOutcome::Failed {
                kind: FailureKind::RuntimeError,
                diagnostic: fault_diagnostic(index, case, &message),
            },
            RunOutcome::TimedOut => CaseOutcome::Failed {
                kind: FailureKind::TimeLimitExceeded,
                diagnostic: format!("time limit exceeded on test case {}", index + 1),
            },
            RunOutcome::OutOfMemory => CaseOutcome::Failed {
                kind: FailureKind::MemoryLimitExceeded,
                diagnostic: format!("memory limit exceeded on test case {}", index + 1),
            },
        };

        debug!(
            case = index,
            hidden = case.hidden,
            passed = outcome.passed(),
            wall_time_ms = result.wall_time_ms,
            "case graded"
        );

        let failed = !outcome.passed();
        reports.push(CaseReport {
            index,
            hidden: case.hidden,
            outcome,
            wall_time_ms: result.wall_time_ms,
            peak_memory_kb: result.peak_memory_kb,
        });

        if failed && mode == GradingMode::FailFast {
            break;
        }
    }

    Ok(reports)
}

/// Hidden cases report only position and kind - input, expected, and actual
/// values stay withheld so graded-but-secret cases leak nothing.
fn wrong_answer_diagnostic(index: usize, case: &TestCase, actual: &serde_json::Value) -> String {
    if case.hidden {
        format!("test case {} failed on a hidden input", index + 1)
    } else {
        format!(
            "test case {} failed: expected {}, got {}",
            index + 1,
            case.expected,
            actual
        )
    }
}

fn fault_diagnostic(index: usize, case: &TestCase, message: &str) -> String {
    if case.hidden {
        format!("runtime error on test case {} (hidden input)", index + 1)
    } else {
        format!("runtime error on test case {}: {}", index + 1, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{two_sum, two_sum_cases, NativeProgram, ScriptedProgram};
    use gauntlet_common::config::FloatTolerance;
    use serde_json::{json, Value};

    fn comparator() -> Comparator {
        Comparator::new(FloatTolerance::default(), false)
    }

    fn policy() -> SandboxPolicy {
        SandboxPolicy {
            time_limit_ms: 1_000,
            memory_limit_mb: 256,
        }
    }

    #[tokio::test]
    async fn test_all_cases_pass() {
        let program = NativeProgram::new(two_sum);
        let cases = two_sum_cases();
        let reports = run_cases(&program, &cases, &comparator(), &policy(), GradingMode::FailFast)
            .await
            .unwrap();
        assert_eq!(reports.len(), cases.len());
        assert!(reports.iter().all(|r| r.outcome.passed()));
    }

    #[tokio::test]
    async fn test_fail_fast_stops_at_first_failure() {
        // Always returns [9, 9]: wrong for every case.
        let program = NativeProgram::new(|_| Ok(json!([9, 9])));
        let cases = two_sum_cases();
        let reports = run_cases(&program, &cases, &comparator(), &policy(), GradingMode::FailFast)
            .await
            .unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].index, 0);
        assert!(matches!(
            reports[0].outcome,
            CaseOutcome::Failed {
                kind: FailureKind::WrongAnswer,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_run_all_covers_every_case() {
        let program = NativeProgram::new(|_| Ok(json!([9, 9])));
        let cases = two_sum_cases();
        let reports = run_cases(&program, &cases, &comparator(), &policy(), GradingMode::RunAll)
            .await
            .unwrap();
        assert_eq!(reports.len(), cases.len());
        assert!(reports.iter().all(|r| !r.outcome.passed()));
    }

    #[tokio::test]
    async fn test_visible_diagnostic_carries_values() {
        let program = NativeProgram::new(|_| Ok(json!([1, 0])));
        let cases = two_sum_cases();
        let reports = run_cases(&program, &cases, &comparator(), &policy(), GradingMode::FailFast)
            .await
            .unwrap();
        match &reports[0].outcome {
            CaseOutcome::Failed { diagnostic, .. } => {
                assert!(diagnostic.contains("expected [0,1]"));
                assert!(diagnostic.contains("got [1,0]"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_hidden_diagnostic_redacts_values() {
        // Fails only on the hidden third case ([3,3], 6).
        let program = NativeProgram::new(|args| {
            if args[0] == json!([3, 3]) {
                Err("boom".to_string())
            } else {
                two_sum(args)
            }
        });
        let cases = two_sum_cases();
        assert!(cases[2].hidden);
        let reports = run_cases(&program, &cases, &comparator(), &policy(), GradingMode::FailFast)
            .await
            .unwrap();
        assert_eq!(reports.len(), 3);
        match &reports[2].outcome {
            CaseOutcome::Failed { kind, diagnostic } => {
                assert_eq!(*kind, FailureKind::RuntimeError);
                assert_eq!(diagnostic, "runtime error on test case 3 (hidden input)");
                assert!(!diagnostic.contains("boom"));
                assert!(!diagnostic.contains("[3,3]"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_memory_kill_is_memory_limit_exceeded() {
        // OOM-killed on the hidden third case ([3,3], 6); earlier cases pass.
        let program = ScriptedProgram::new(|args: &[Value]| {
            if args[0] == json!([3, 3]) {
                RunOutcome::OutOfMemory
            } else {
                match two_sum(args) {
                    Ok(value) => RunOutcome::Returned(value),
                    Err(message) => RunOutcome::Fault(message),
                }
            }
        });
        let cases = two_sum_cases();
        assert!(cases[2].hidden);
        let reports = run_cases(&program, &cases, &comparator(), &policy(), GradingMode::FailFast)
            .await
            .unwrap();
        assert_eq!(reports.len(), 3);
        assert!(reports[0].outcome.passed());
        match &reports[2].outcome {
            CaseOutcome::Failed { kind, diagnostic } => {
                assert_eq!(*kind, FailureKind::MemoryLimitExceeded);
                assert_eq!(diagnostic, "memory limit exceeded on test case 3");
                assert!(!diagnostic.contains("[3,3]"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_runtime_error_scoped_to_its_case() {
        // Faults on case 2 only; case 1 passes first.
        let program = NativeProgram::new(|args| {
            if args[0] == json!([3, 2, 4]) {
                Err("divide by zero".to_string())
            } else {
                two_sum(args)
            }
        });
        let cases = two_sum_cases();
        let reports = run_cases(&program, &cases, &comparator(), &policy(), GradingMode::RunAll)
            .await
            .unwrap();
        assert!(reports[0].outcome.passed());
        assert!(!reports[1].outcome.passed());
        assert!(reports[2].outcome.passed());
    }

    #[tokio::test]
    async fn test_first_failure_consistent_across_modes() {
        let program_factory = || {
            NativeProgram::new(|args| {
                if args[0] == json!([3, 2, 4]) {
                    Ok(json!([0, 0]))
                } else {
                    two_sum(args)
                }
            })
        };
        let cases = two_sum_cases();

        let fail_fast = run_cases(
            &program_factory(),
            &cases,
            &comparator(),
            &policy(),
            GradingMode::FailFast,
        )
        .await
        .unwrap();
        let run_all = run_cases(
            &program_factory(),
            &cases,
            &comparator(),
            &policy(),
            GradingMode::RunAll,
        )
        .await
        .unwrap();

        let first_fail_fast = fail_fast.iter().find(|r| !r.outcome.passed()).unwrap().index;
        let first_run_all = run_all.iter().find(|r| !r.outcome.passed()).unwrap().index;
        assert_eq!(first_fail_fast, first_run_all);
    }
}

/// Verdict Aggregator - Per-Case Outcomes → One Submission
///
/// **Rules:**
/// - `accepted` only if every case passed
/// - otherwise the verdict is the kind of the lowest-index failing case;
///   later cases were never executed under fail-fast
/// - runtime is summed and memory peaked across all *executed* cases, and
///   both are reported even on failure for partial diagnostics
///
/// The aggregator returns a verdict, not a mutation plan: challenge-level
/// acceptance counters are the caller's responsibility.
use crate::engine::SubmissionRequest;
use crate::runner::{CaseOutcome, CaseReport};
use chrono::Utc;
use gauntlet_common::types::{Submission, Verdict};
use uuid::Uuid;

/// Fold executed case reports into one Submission record.
pub fn aggregate(
    request: &SubmissionRequest,
    total_test_cases: usize,
    reports: &[CaseReport],
) -> Submission {
    let passed = reports.iter().filter(|r| r.outcome.passed()).count();
    let runtime_ms = reports.iter().map(|r| r.wall_time_ms).sum();
    let memory_kb = reports.iter().map(|r| r.peak_memory_kb).max().unwrap_or(0);

    let first_failure = reports
        .iter()
        .filter(|r| !r.outcome.passed())
        .min_by_key(|r| r.index);

    let (verdict, first_failed_case, error_message) = match first_failure {
        None => (Verdict::Accepted, None, String::new()),
        Some(report) => match &report.outcome {
            CaseOutcome::Failed { kind, diagnostic } => {
                (kind.verdict(), Some(report.index), diagnostic.clone())
            }
            CaseOutcome::Passed => unreachable!("filtered to failures"),
        },
    };

    build(
        request,
        verdict,
        passed,
        total_test_cases,
        runtime_ms,
        memory_kb,
        first_failed_case,
        error_message,
    )
}

/// Submission for a program that never compiled: zero cases ran, so no case
/// is reported as individually failed.
pub fn compile_failure(
    request: &SubmissionRequest,
    total_test_cases: usize,
    diagnostic: String,
) -> Submission {
    build(
        request,
        Verdict::CompileError,
        0,
        total_test_cases,
        0,
        0,
        None,
        diagnostic,
    )
}

#[allow(clippy::too_many_arguments)]
fn build(
    request: &SubmissionRequest,
    verdict: Verdict,
    test_cases_passed: usize,
    total_test_cases: usize,
    runtime_ms: u64,
    memory_kb: u64,
    first_failed_case: Option<usize>,
    error_message: String,
) -> Submission {
    Submission {
        id: Uuid::new_v4(),
        user: request.user.clone(),
        challenge_id: request.challenge_id.clone(),
        code: request.source_code.clone(),
        language: request.language,
        verdict,
        test_cases_passed,
        total_test_cases,
        runtime_ms,
        memory_kb,
        first_failed_case,
        error_message,
        submitted_at: Utc::now(),
    }
}

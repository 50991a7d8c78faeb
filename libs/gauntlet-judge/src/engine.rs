/// Judge Engine - High-Level Orchestration
///
/// **Responsibility:**
/// Validate a submission request, resolve its challenge and adapter, and
/// drive compile → run → compare → aggregate to one Submission.
///
/// This module is the glue layer - it knows nothing about:
/// - How code executes (adapter's job)
/// - How outputs are judged (comparator's job)
/// - How outcomes fold into a verdict (aggregator's job)
use crate::adapter::{LanguageAdapter, PrepareError};
use crate::catalog::ChallengeCatalog;
use crate::comparator::Comparator;
use crate::error::JudgeError;
use crate::runner::{self, CaseReport, GradingMode};
use crate::sandbox::SandboxPolicy;
use crate::verdict;
use anyhow::anyhow;
use gauntlet_common::config::{FloatTolerance, JudgeLimits};
use gauntlet_common::types::{Challenge, Language, Submission};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// One grading request from the surrounding application.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    /// Opaque submitter identity, used only for bookkeeping.
    pub user: String,
    pub challenge_id: String,
    pub source_code: String,
    pub language: Language,
}

/// A graded submission plus the per-case reports that produced it.
/// The case vector is complete under run-all and ends at the first failure
/// under fail-fast.
#[derive(Debug)]
pub struct GradeReport {
    pub submission: Submission,
    pub cases: Vec<CaseReport>,
}

pub struct JudgeEngine {
    catalog: Arc<dyn ChallengeCatalog>,
    adapters: HashMap<Language, Arc<dyn LanguageAdapter>>,
    limits: JudgeLimits,
    tolerance: FloatTolerance,
}

impl JudgeEngine {
    pub fn new(catalog: Arc<dyn ChallengeCatalog>, limits: JudgeLimits) -> Self {
        Self {
            catalog,
            adapters: HashMap::new(),
            limits,
            tolerance: FloatTolerance::default(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: FloatTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Register the runtime adapter for one language. A language without an
    /// adapter is unsupported and its submissions are rejected up front.
    pub fn register_adapter(&mut self, adapter: Arc<dyn LanguageAdapter>) {
        self.adapters.insert(adapter.language(), adapter);
    }

    pub fn supported_languages(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self.adapters.keys().copied().collect();
        languages.sort();
        languages
    }

    /// Grade a submission under fail-fast semantics - the user-facing path.
    pub async fn grade(&self, request: SubmissionRequest) -> Result<Submission, JudgeError> {
        self.grade_with_mode(request, GradingMode::FailFast)
            .await
            .map(|report| report.submission)
    }

    /// Grade with an explicit mode. Run-all keeps executing past failures
    /// and returns the full per-case vector for diagnostics.
    #[instrument(
        skip(self, request),
        fields(
            challenge_id = %request.challenge_id,
            language = %request.language,
            user = %request.user,
        )
    )]
    pub async fn grade_with_mode(
        &self,
        request: SubmissionRequest,
        mode: GradingMode,
    ) -> Result<GradeReport, JudgeError> {
        // Pre-flight validation: fail early, before any sandbox work.
        if request.source_code.trim().is_empty() {
            return Err(JudgeError::EmptySubmission);
        }
        if request.source_code.len() > self.limits.max_source_bytes {
            return Err(JudgeError::SourceTooLarge {
                actual: request.source_code.len(),
                limit: self.limits.max_source_bytes,
            });
        }
        let adapter = self
            .adapters
            .get(&request.language)
            .cloned()
            .ok_or(JudgeError::UnsupportedLanguage(request.language))?;

        let challenge = self
            .catalog
            .challenge(&request.challenge_id)
            .await
            .map_err(JudgeError::Sandbox)?
            .ok_or_else(|| JudgeError::ChallengeNotFound(request.challenge_id.clone()))?;
        challenge
            .validate()
            .map_err(|e| JudgeError::InvalidChallenge(e.to_string()))?;

        // The pipeline runs on a detached task: if the caller drops its
        // future mid-grade, the outstanding sandbox invocation still runs
        // to completion or internal timeout instead of being cancelled.
        let limits = self.limits.clone();
        let tolerance = self.tolerance;
        let handle = tokio::spawn(grade_pipeline(
            adapter, challenge, request, limits, tolerance, mode,
        ));
        let report = handle
            .await
            .map_err(|e| JudgeError::Sandbox(anyhow!("grading task failed: {e}")))??;

        info!(
            verdict = %report.submission.verdict,
            passed = report.submission.test_cases_passed,
            total = report.submission.total_test_cases,
            runtime_ms = report.submission.runtime_ms,
            "submission graded"
        );
        Ok(report)
    }

    /// Oracle check: grade the challenge's canonical solution against its
    /// own test suite. Must come back accepted with a full pass count for a
    /// well-formed challenge.
    pub async fn verify_challenge(&self, challenge_id: &str) -> Result<Submission, JudgeError> {
        let challenge = self
            .catalog
            .challenge(challenge_id)
            .await
            .map_err(JudgeError::Sandbox)?
            .ok_or_else(|| JudgeError::ChallengeNotFound(challenge_id.to_string()))?;
        let solution = challenge.solution.as_ref().ok_or_else(|| {
            JudgeError::InvalidChallenge(format!(
                "challenge '{}' has no canonical solution",
                challenge.id
            ))
        })?;
        self.grade(SubmissionRequest {
            user: "oracle".to_string(),
            challenge_id: challenge.id.clone(),
            source_code: solution.code.clone(),
            language: solution.language,
        })
        .await
    }
}

async fn grade_pipeline(
    adapter: Arc<dyn LanguageAdapter>,
    challenge: Challenge,
    request: SubmissionRequest,
    limits: JudgeLimits,
    tolerance: FloatTolerance,
    mode: GradingMode,
) -> Result<GradeReport, JudgeError> {
    let total = challenge.test_cases.len();

    // Compile once per submission; the compiled form is reused across all
    // cases. A parse/compile fault before any case ran is its own verdict.
    let program = match adapter.prepare(&request.source_code, &challenge.entry_point).await {
        Ok(program) => program,
        Err(PrepareError::Compile(message)) => {
            return Ok(GradeReport {
                submission: verdict::compile_failure(&request, total, message),
                cases: Vec::new(),
            });
        }
        Err(PrepareError::Infra(e)) => return Err(JudgeError::Sandbox(e)),
    };

    let comparator = Comparator::new(tolerance, challenge.order_independent);
    let policy = SandboxPolicy::from_limits(&limits);
    let cases = runner::run_cases(
        program.as_ref(),
        &challenge.test_cases,
        &comparator,
        &policy,
        mode,
    )
    .await
    .map_err(JudgeError::Sandbox)?;

    let submission = verdict::aggregate(&request, total, &cases);
    Ok(GradeReport { submission, cases })
}

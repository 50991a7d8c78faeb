use gauntlet_common::types::Language;
use thiserror::Error;

/// Caller-facing failures raised before or around grading.
///
/// These are distinct from verdicts: a verdict is the graded outcome of a
/// submission that ran, while a `JudgeError` means grading could not happen
/// (bad request) or the judge's own infrastructure failed. Execution faults
/// inside a test case never surface here - they become verdict kinds.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("challenge not found: {0}")]
    ChallengeNotFound(String),

    /// The declared language has no registered adapter. Submissions in
    /// unsupported languages are rejected up front, never auto-accepted.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(Language),

    #[error("submission code is empty")]
    EmptySubmission,

    #[error("source code is {actual} bytes, limit is {limit}")]
    SourceTooLarge { actual: usize, limit: usize },

    #[error("invalid challenge data: {0}")]
    InvalidChallenge(String),

    /// Judge-side infrastructure fault (catalog backend, Docker daemon,
    /// image pull). Never disguised as a user verdict.
    #[error("sandbox infrastructure failure: {0}")]
    Sandbox(#[source] anyhow::Error),
}

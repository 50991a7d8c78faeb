use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Languages a submission may declare.
///
/// Declaring a language does not mean the judge can run it - support is
/// decided by the adapter registry, and undeclarable tags fail to parse
/// before any grading work starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    Python,
    Java,
    Cpp,
    Go,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::Go => "go",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "javascript" | "js" => Ok(Language::JavaScript),
            "python" | "py" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "cpp" | "c++" => Ok(Language::Cpp),
            "go" => Ok(Language::Go),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown language tag: {0}")]
pub struct UnknownLanguage(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Arrays,
    Strings,
    LinkedLists,
    Trees,
    Graphs,
    DynamicProgramming,
    Sorting,
    Searching,
    Recursion,
    Other,
}

/// One (input, expected output, visibility) triple.
///
/// Hidden cases are withheld from the submitter but graded identically to
/// visible ones. Inputs and outputs are structured JSON values so the
/// comparator never needs language-specific logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub input: Value,
    pub expected: Value,
    #[serde(default)]
    pub hidden: bool,
}

impl TestCase {
    /// Positional arguments for the user's entry point.
    ///
    /// A JSON array input is spread into one argument per element; any other
    /// shape is passed as the sole argument, never destructured.
    pub fn args(&self) -> Vec<Value> {
        match &self.input {
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        }
    }
}

/// A worked example shown in the challenge statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    pub input: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Reference implementation for a challenge.
///
/// Never exposed to submitters and never written to any channel the runner
/// output flows through; the judge only uses it for oracle verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalSolution {
    pub language: Language,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_complexity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_complexity: Option<String>,
}

/// Mutable acceptance counters, updated by the catalog owner after each
/// graded submission. The judge itself never touches these.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChallengeStats {
    pub total_submissions: u64,
    pub total_accepted: u64,
    pub acceptance_rate: f64,
}

impl ChallengeStats {
    pub fn record_submission(&mut self, accepted: bool) {
        self.total_submissions += 1;
        if accepted {
            self.total_accepted += 1;
        }
        self.acceptance_rate =
            (self.total_accepted as f64 / self.total_submissions as f64) * 100.0;
    }
}

/// Immutable problem definition.
///
/// Test cases are ordered and must not change once the challenge is
/// published; edits invalidate historical verdicts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub statement: String,
    pub difficulty: Difficulty,
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub examples: Vec<Example>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub companies: Vec<String>,
    pub test_cases: Vec<TestCase>,
    /// Name of the user function the harness calls.
    pub entry_point: String,
    /// When set, sequence outputs are compared as multisets instead of
    /// position by position.
    #[serde(default)]
    pub order_independent: bool,
    #[serde(default)]
    pub starter_code: HashMap<Language, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<CanonicalSolution>,
    #[serde(default)]
    pub stats: ChallengeStats,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ChallengeDataError {
    #[error("challenge '{0}' has no test cases")]
    EmptyTestSuite(String),
    #[error("challenge '{0}' has no visible test case")]
    NoVisibleCase(String),
}

impl Challenge {
    /// Check the publication invariants: a non-empty test suite with at
    /// least one visible case for user-facing examples.
    pub fn validate(&self) -> Result<(), ChallengeDataError> {
        if self.test_cases.is_empty() {
            return Err(ChallengeDataError::EmptyTestSuite(self.id.clone()));
        }
        if self.test_cases.iter().all(|tc| tc.hidden) {
            return Err(ChallengeDataError::NoVisibleCase(self.id.clone()));
        }
        Ok(())
    }
}

/// Final classification of a graded submission.
///
/// Exactly one applies, chosen by the first failing case in input order, or
/// `Accepted` when every case passed. Variant order is severity order for
/// reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    WrongAnswer,
    RuntimeError,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    CompileError,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Accepted => "accepted",
            Verdict::WrongAnswer => "wrong_answer",
            Verdict::RuntimeError => "runtime_error",
            Verdict::TimeLimitExceeded => "time_limit_exceeded",
            Verdict::MemoryLimitExceeded => "memory_limit_exceeded",
            Verdict::CompileError => "compile_error",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One grading attempt, created atomically once the full verdict is known.
///
/// A resubmission creates a new record; existing records are never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub user: String,
    pub challenge_id: String,
    pub code: String,
    pub language: Language,
    pub verdict: Verdict,
    pub test_cases_passed: usize,
    pub total_test_cases: usize,
    /// Wall-clock runtime summed across all executed cases, in milliseconds.
    pub runtime_ms: u64,
    /// Peak memory across all executed cases, in kilobytes.
    pub memory_kb: u64,
    /// Index of the first failing case under fail-fast order, if any.
    /// `None` for accepted submissions and for compile errors (no case ran).
    pub first_failed_case: Option<usize>,
    /// Diagnostic for the first failure; empty on full pass. Expected and
    /// actual values are withheld when the failing case is hidden.
    pub error_message: String,
    pub submitted_at: DateTime<Utc>,
}

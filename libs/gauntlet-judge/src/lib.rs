//! Gauntlet Judge - Sandboxed Code-Execution and Grading Engine
//!
//! **Pipeline:**
//! submission (code, language, challenge id)
//!   → catalog lookup (fail early on unknown challenge / language)
//!   → language adapter compiles the submission once
//!   → test case runner feeds each case through the execution sandbox
//!   → result comparator judges each output
//!   → verdict aggregator folds outcomes into one immutable Submission
//!
//! **Trust boundary:**
//! Untrusted code only ever runs behind a `LanguageAdapter` inside the
//! Docker sandbox - never in the judge process. The rest of the pipeline is
//! deterministic bookkeeping over structured values.

pub mod adapter;
pub mod catalog;
pub mod comparator;
pub mod docker;
pub mod engine;
pub mod error;
pub mod profile;
pub mod runner;
pub mod sandbox;
pub mod verdict;

#[cfg(test)]
pub(crate) mod testutil;

pub use adapter::{CompiledProgram, InvokeResult, LanguageAdapter, PrepareError, RunOutcome};
pub use catalog::{ChallengeCatalog, InMemoryCatalog};
pub use comparator::Comparator;
pub use docker::DockerAdapter;
pub use engine::{GradeReport, JudgeEngine, SubmissionRequest};
pub use error::JudgeError;
pub use profile::{LanguageProfile, ProfileManager};
pub use runner::{CaseOutcome, CaseReport, FailureKind, GradingMode};
pub use sandbox::SandboxPolicy;

/// Language Runtime Adapter - Abstraction for Code Execution
///
/// **Critical Architectural Boundary:**
/// - Adapters know HOW one language compiles and runs
/// - Adapters do NOT know scoring rules or challenge data
/// - Adapters return raw structured outputs for the comparator to judge
///
/// A submission is compiled exactly once per grading run; the resulting
/// `CompiledProgram` is reused for every test case so timing stays fair and
/// a compile failure is never amplified into per-case failures. Adding a
/// language means registering one more adapter - callers never change.
use async_trait::async_trait;
use gauntlet_common::types::Language;
use serde_json::Value;
use thiserror::Error;

/// What one sandboxed invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The entry point returned a value, serialized language-agnostically.
    Returned(Value),
    /// The program faulted while processing this case.
    Fault(String),
    /// The invocation hit the wall-clock ceiling and was killed.
    TimedOut,
    /// The invocation was killed for exceeding the memory ceiling.
    OutOfMemory,
}

/// Raw result of invoking the compiled program against one input.
#[derive(Debug, Clone)]
pub struct InvokeResult {
    pub outcome: RunOutcome,
    pub wall_time_ms: u64,
    pub peak_memory_kb: u64,
}

impl InvokeResult {
    pub fn returned(value: Value, wall_time_ms: u64, peak_memory_kb: u64) -> Self {
        Self {
            outcome: RunOutcome::Returned(value),
            wall_time_ms,
            peak_memory_kb,
        }
    }
}

/// Failure to turn source text into a runnable program.
#[derive(Debug, Error)]
pub enum PrepareError {
    /// The submission is invalid before any test ran - maps to the
    /// `compile_error` verdict, diagnostic included.
    #[error("compile error: {0}")]
    Compile(String),

    /// Judge-side fault (daemon unreachable, image missing). Surfaced to
    /// the caller as an infrastructure error, never as a verdict.
    #[error(transparent)]
    Infra(#[from] anyhow::Error),
}

/// One supported language runtime.
#[async_trait]
pub trait LanguageAdapter: Send + Sync {
    fn language(&self) -> Language;

    /// Compile/load the submission once. `entry_point` is the name of the
    /// user function the harness will call with positional arguments.
    async fn prepare(
        &self,
        source: &str,
        entry_point: &str,
    ) -> Result<Box<dyn CompiledProgram>, PrepareError>;
}

/// A submission compiled and ready to run test cases.
///
/// Implementations own whatever isolated environment backs them (a
/// container, a subprocess) and must tear it down on drop.
#[async_trait]
pub trait CompiledProgram: Send + Sync {
    /// Run one test case. Infrastructure faults come back as `Err`;
    /// anything the user's code did wrong is a `RunOutcome`.
    async fn invoke(&self, args: &[Value]) -> anyhow::Result<InvokeResult>;

    /// Forcibly stop whatever is currently running. Called by the sandbox
    /// when its wall-clock backstop fires; must be safe to call at any time.
    async fn interrupt(&self);
}

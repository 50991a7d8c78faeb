//! In-process adapter stand-ins and fixtures for the unit tests.
//!
//! The pipeline is exercised without Docker: a `NativeProgram` runs a plain
//! Rust closure behind the `CompiledProgram` trait, so runner, comparator,
//! aggregator, and engine tests stay deterministic and fast.

use crate::adapter::{CompiledProgram, InvokeResult, LanguageAdapter, PrepareError, RunOutcome};
use async_trait::async_trait;
use gauntlet_common::types::{
    CanonicalSolution, Category, Challenge, ChallengeStats, Difficulty, Language, TestCase,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

pub(crate) type ProgramFactory =
    Arc<dyn Fn(&str, &str) -> Result<Box<dyn CompiledProgram>, PrepareError> + Send + Sync>;

/// Adapter whose `prepare` is scripted by a factory closure.
pub(crate) struct StubAdapter {
    language: Language,
    factory: ProgramFactory,
}

impl StubAdapter {
    pub fn new(language: Language, factory: ProgramFactory) -> Self {
        Self { language, factory }
    }

    /// Adapter that ignores the source text and runs `f` for every case.
    pub fn native(
        language: Language,
        f: impl Fn(&[Value]) -> Result<Value, String> + Send + Sync + Copy + 'static,
    ) -> Self {
        Self::new(
            language,
            Arc::new(move |_: &str, _: &str| {
                Ok(Box::new(NativeProgram::new(f)) as Box<dyn CompiledProgram>)
            }),
        )
    }

    /// Adapter that rejects every submission at compile time.
    pub fn compile_error(language: Language, message: &str) -> Self {
        let message = message.to_string();
        Self::new(
            language,
            Arc::new(move |_: &str, _: &str| Err(PrepareError::Compile(message.clone()))),
        )
    }
}

#[async_trait]
impl LanguageAdapter for StubAdapter {
    fn language(&self) -> Language {
        self.language
    }

    async fn prepare(
        &self,
        source: &str,
        entry_point: &str,
    ) -> Result<Box<dyn CompiledProgram>, PrepareError> {
        (self.factory)(source, entry_point)
    }
}

/// A compiled program backed by a plain closure.
pub(crate) struct NativeProgram<F> {
    f: F,
}

impl<F> NativeProgram<F>
where
    F: Fn(&[Value]) -> Result<Value, String> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> CompiledProgram for NativeProgram<F>
where
    F: Fn(&[Value]) -> Result<Value, String> + Send + Sync,
{
    async fn invoke(&self, args: &[Value]) -> anyhow::Result<InvokeResult> {
        let outcome = match (self.f)(args) {
            Ok(value) => RunOutcome::Returned(value),
            Err(message) => RunOutcome::Fault(message),
        };
        Ok(InvokeResult {
            outcome,
            wall_time_ms: 1,
            peak_memory_kb: 640,
        })
    }

    async fn interrupt(&self) {}
}

/// A program whose per-case outcome is scripted directly, for exercising
/// verdict paths a closure return value cannot reach (timeouts, OOM kills).
pub(crate) struct ScriptedProgram<F> {
    f: F,
}

impl<F> ScriptedProgram<F>
where
    F: Fn(&[Value]) -> RunOutcome + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> CompiledProgram for ScriptedProgram<F>
where
    F: Fn(&[Value]) -> RunOutcome + Send + Sync,
{
    async fn invoke(&self, args: &[Value]) -> anyhow::Result<InvokeResult> {
        Ok(InvokeResult {
            outcome: (self.f)(args),
            wall_time_ms: 1,
            peak_memory_kb: 640,
        })
    }

    async fn interrupt(&self) {}
}

/// A program that never finishes on its own - for backstop tests.
#[derive(Default)]
pub(crate) struct HangingProgram {
    pub interrupted: AtomicBool,
}

#[async_trait]
impl CompiledProgram for HangingProgram {
    async fn invoke(&self, _args: &[Value]) -> anyhow::Result<InvokeResult> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(InvokeResult {
            outcome: RunOutcome::Fault("woke up unexpectedly".to_string()),
            wall_time_ms: 0,
            peak_memory_kb: 0,
        })
    }

    async fn interrupt(&self) {
        self.interrupted
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

/// Reference Two Sum: first pair of indices summing to the target.
pub(crate) fn two_sum(args: &[Value]) -> Result<Value, String> {
    let nums = args[0]
        .as_array()
        .ok_or_else(|| "expected an array of numbers".to_string())?;
    let target = args[1]
        .as_i64()
        .ok_or_else(|| "expected an integer target".to_string())?;
    for i in 0..nums.len() {
        for j in (i + 1)..nums.len() {
            if nums[i].as_i64().unwrap_or(0) + nums[j].as_i64().unwrap_or(0) == target {
                return Ok(json!([i, j]));
            }
        }
    }
    Err("no solution found".to_string())
}

pub(crate) fn two_sum_cases() -> Vec<TestCase> {
    vec![
        TestCase {
            input: json!([[2, 7, 11, 15], 9]),
            expected: json!([0, 1]),
            hidden: false,
        },
        TestCase {
            input: json!([[3, 2, 4], 6]),
            expected: json!([1, 2]),
            hidden: false,
        },
        TestCase {
            input: json!([[3, 3], 6]),
            expected: json!([0, 1]),
            hidden: true,
        },
    ]
}

pub(crate) fn two_sum_challenge() -> Challenge {
    Challenge {
        id: "two-sum".to_string(),
        title: "Two Sum".to_string(),
        statement: "Given an array of integers nums and an integer target, return indices of \
                    the two numbers such that they add up to target."
            .to_string(),
        difficulty: Difficulty::Easy,
        category: Category::Arrays,
        tags: vec!["hash-table".to_string(), "array".to_string()],
        constraints: vec!["2 <= nums.length <= 10^4".to_string()],
        examples: vec![],
        hints: vec![],
        companies: vec![],
        test_cases: two_sum_cases(),
        entry_point: "twoSum".to_string(),
        order_independent: false,
        starter_code: HashMap::new(),
        solution: Some(CanonicalSolution {
            language: Language::JavaScript,
            code: "function twoSum(nums, target) { /* reference */ }".to_string(),
            explanation: None,
            time_complexity: Some("O(n)".to_string()),
            space_complexity: Some("O(n)".to_string()),
        }),
        stats: ChallengeStats::default(),
    }
}

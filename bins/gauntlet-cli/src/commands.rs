// CLI commands: local grading and challenge verification.
use anyhow::{bail, Context, Result};
use gauntlet_common::config::JudgeLimits;
use gauntlet_common::types::{Language, Submission};
use gauntlet_judge::{
    CaseOutcome, DockerAdapter, GradingMode, InMemoryCatalog, JudgeEngine, ProfileManager,
    SubmissionRequest,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Build an engine with one Docker adapter per profiled language.
fn build_engine(
    config_path: &Path,
    catalog: InMemoryCatalog,
    limits: JudgeLimits,
) -> Result<JudgeEngine> {
    let profiles = ProfileManager::load(config_path)?;
    let mut engine = JudgeEngine::new(Arc::new(catalog), limits.clone());

    for language in profiles.supported() {
        let profile = profiles.get(&language)?.clone();
        let adapter = DockerAdapter::new(language, profile, limits.clone())?;
        engine.register_adapter(Arc::new(adapter));
    }

    Ok(engine)
}

fn resolve_id(catalog: &InMemoryCatalog, id: Option<&str>) -> Result<String> {
    if let Some(id) = id {
        return Ok(id.to_string());
    }
    let ids = catalog.ids();
    match ids.as_slice() {
        [only] => Ok(only.to_string()),
        _ => bail!(
            "challenge file holds {} challenges, pick one with --id",
            ids.len()
        ),
    }
}

fn print_submission(submission: &Submission) {
    println!("verdict:  {}", submission.verdict);
    println!(
        "passed:   {} / {}",
        submission.test_cases_passed, submission.total_test_cases
    );
    println!("runtime:  {}ms", submission.runtime_ms);
    println!("memory:   {}kb", submission.memory_kb);
    if let Some(index) = submission.first_failed_case {
        println!("failed:   test case {}", index + 1);
    }
    if !submission.error_message.is_empty() {
        println!("message:  {}", submission.error_message);
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn grade(
    config_path: &Path,
    challenge_path: &Path,
    id: Option<&str>,
    source_path: &Path,
    language: &str,
    user: &str,
    run_all: bool,
    time_limit_ms: Option<u64>,
    memory_limit_mb: Option<u32>,
) -> Result<()> {
    let language: Language = language
        .parse()
        .with_context(|| format!("'{}' is not a recognized language tag", language))?;
    let source_code = fs::read_to_string(source_path)
        .with_context(|| format!("failed to read submission {}", source_path.display()))?;

    let mut limits = JudgeLimits::default();
    if let Some(ms) = time_limit_ms {
        limits.time_limit_ms = ms;
    }
    if let Some(mb) = memory_limit_mb {
        limits.memory_limit_mb = mb;
    }

    let catalog = InMemoryCatalog::from_file(challenge_path)?;
    let challenge_id = resolve_id(&catalog, id)?;
    let engine = build_engine(config_path, catalog, limits)?;

    let request = SubmissionRequest {
        user: user.to_string(),
        challenge_id,
        source_code,
        language,
    };

    let mode = if run_all {
        GradingMode::RunAll
    } else {
        GradingMode::FailFast
    };
    let report = engine.grade_with_mode(request, mode).await?;

    print_submission(&report.submission);

    if run_all {
        println!();
        for case in &report.cases {
            let mark = if case.outcome.passed() { "pass" } else { "FAIL" };
            let note = match &case.outcome {
                CaseOutcome::Passed => String::new(),
                CaseOutcome::Failed { diagnostic, .. } => format!("  ({})", diagnostic),
            };
            println!(
                "  case {:>3}: {}  {}ms{}",
                case.index + 1,
                mark,
                case.wall_time_ms,
                note
            );
        }
    }

    Ok(())
}

pub async fn verify(config_path: &Path, challenge_path: &Path, id: Option<&str>) -> Result<()> {
    let catalog = InMemoryCatalog::from_file(challenge_path)?;
    let ids: Vec<String> = match id {
        Some(id) => vec![id.to_string()],
        None => catalog.ids().iter().map(|s| s.to_string()).collect(),
    };
    let engine = build_engine(config_path, catalog, JudgeLimits::default())?;

    let mut failures = 0;
    for challenge_id in &ids {
        let submission = engine.verify_challenge(challenge_id).await?;
        if submission.verdict.is_accepted() {
            println!("{}: ok ({}ms)", challenge_id, submission.runtime_ms);
        } else {
            failures += 1;
            println!("{}: ORACLE VIOLATION - {}", challenge_id, submission.verdict);
            if !submission.error_message.is_empty() {
                println!("  {}", submission.error_message);
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} challenges failed oracle verification", failures, ids.len());
    }
    Ok(())
}

pub fn languages(config_path: &Path) -> Result<()> {
    let profiles = ProfileManager::load(config_path)?;
    for language in profiles.supported() {
        let profile = profiles.get(&language)?;
        println!("{:<12} image: {}", language.to_string(), profile.image);
    }
    Ok(())
}

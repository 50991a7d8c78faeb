// Language profile management for the Docker adapter.
use anyhow::{bail, Context, Result};
use gauntlet_common::types::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// How one language's submissions are containerized: which image to run,
/// where the source and harness land, and how to syntax-check and invoke
/// them. Resource ceilings come from `JudgeLimits` unless overridden here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageProfile {
    pub name: String,
    pub image: String,
    pub source_file: String,
    pub harness_file: String,
    /// Syntax/compile check run once per submission; omit for languages
    /// with no ahead-of-time check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_cmd: Option<String>,
    pub run_cmd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_limit_mb: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProfilesJson {
    languages: Vec<LanguageProfile>,
}

/// Loads and indexes language profiles from `config/languages.json`.
///
/// The set of profiled languages *is* the supported set: a catalog language
/// with no profile gets no adapter and its submissions are rejected.
#[derive(Clone)]
pub struct ProfileManager {
    profiles: HashMap<String, LanguageProfile>,
}

impl ProfileManager {
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("language config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path).context("failed to read languages.json")?;
        let parsed: ProfilesJson =
            serde_json::from_str(&content).context("failed to parse languages.json")?;

        let mut profiles = HashMap::new();
        for profile in parsed.languages {
            profiles.insert(profile.name.clone(), profile);
        }

        Ok(Self { profiles })
    }

    /// Load with the default path (config/languages.json).
    pub fn load_default() -> Result<Self> {
        Self::load(Path::new("config/languages.json"))
    }

    pub fn get(&self, language: &Language) -> Result<&LanguageProfile> {
        self.profiles
            .get(language.as_str())
            .with_context(|| format!("no profile configured for language: {language}"))
    }

    /// Languages that have both a profile and a parseable catalog tag.
    pub fn supported(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self
            .profiles
            .keys()
            .filter_map(|name| name.parse().ok())
            .collect();
        languages.sort();
        languages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_from(profiles: Vec<LanguageProfile>) -> ProfileManager {
        let mut map = HashMap::new();
        for p in profiles {
            map.insert(p.name.clone(), p);
        }
        ProfileManager { profiles: map }
    }

    fn js_profile() -> LanguageProfile {
        LanguageProfile {
            name: "javascript".to_string(),
            image: "node:20-slim".to_string(),
            source_file: "solution.js".to_string(),
            harness_file: "harness.js".to_string(),
            compile_cmd: Some("node --check /judge/solution.js".to_string()),
            run_cmd: "node /judge/harness.js".to_string(),
            memory_limit_mb: None,
            cpu_limit: None,
        }
    }

    #[test]
    fn test_get_by_language() {
        let manager = manager_from(vec![js_profile()]);
        assert!(manager.get(&Language::JavaScript).is_ok());
        assert!(manager.get(&Language::Go).is_err());
    }

    #[test]
    fn test_supported_only_covers_profiled_languages() {
        let manager = manager_from(vec![js_profile()]);
        assert_eq!(manager.supported(), vec![Language::JavaScript]);
    }

    #[test]
    fn test_profile_json_roundtrip() {
        let json = r#"{
            "languages": [{
                "name": "python",
                "image": "python:3.12-slim",
                "source_file": "solution.py",
                "harness_file": "harness.py",
                "compile_cmd": "python3 -m py_compile /judge/solution.py",
                "run_cmd": "python3 /judge/harness.py"
            }]
        }"#;
        let parsed: ProfilesJson = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.languages.len(), 1);
        assert_eq!(parsed.languages[0].name, "python");
        assert!(parsed.languages[0].memory_limit_mb.is_none());
    }
}

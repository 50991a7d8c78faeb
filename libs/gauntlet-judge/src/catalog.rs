use anyhow::{Context, Result};
use async_trait::async_trait;
use gauntlet_common::types::Challenge;
use std::collections::HashMap;
use std::path::Path;

/// Read-only lookup into the challenge catalog.
///
/// The catalog is owned by the surrounding application; the judge only reads
/// from it and never mutates catalog data. Implementations may be backed by
/// a database, an HTTP service, or memory.
#[async_trait]
pub trait ChallengeCatalog: Send + Sync {
    async fn challenge(&self, id: &str) -> Result<Option<Challenge>>;
}

/// Catalog held entirely in memory. Backs tests and the CLI, where
/// challenges come from local JSON files.
pub struct InMemoryCatalog {
    by_id: HashMap<String, Challenge>,
}

impl InMemoryCatalog {
    /// Build a catalog, validating each challenge's publication invariants.
    pub fn new(challenges: Vec<Challenge>) -> Result<Self> {
        let mut by_id = HashMap::new();
        for challenge in challenges {
            challenge
                .validate()
                .with_context(|| format!("challenge '{}' failed validation", challenge.id))?;
            if by_id.insert(challenge.id.clone(), challenge).is_some() {
                anyhow::bail!("duplicate challenge id in catalog");
            }
        }
        Ok(Self { by_id })
    }

    /// Load from a JSON file holding either one challenge object or an
    /// array of them.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read challenge file {}", path.display()))?;
        let challenges: Vec<Challenge> = if content.trim_start().starts_with('[') {
            serde_json::from_str(&content).context("failed to parse challenge array")?
        } else {
            vec![serde_json::from_str(&content).context("failed to parse challenge")?]
        };
        Self::new(challenges)
    }

    /// Challenge ids in sorted order, for stable iteration and output.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.by_id.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

#[async_trait]
impl ChallengeCatalog for InMemoryCatalog {
    async fn challenge(&self, id: &str) -> Result<Option<Challenge>> {
        Ok(self.by_id.get(id).cloned())
    }
}

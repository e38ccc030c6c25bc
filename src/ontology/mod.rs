//! Canonical skill ontology types and the search oracle contract
//!
//! The nearest-neighbor index itself is an external collaborator (a vector
//! store in production); the engine only depends on the [`SearchOracle`]
//! trait. [`index::OntologyIndex`] is a local in-memory implementation.

pub mod index;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use index::OntologyIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillType {
    Skill,
    Task,
    JobProfile,
}

/// Canonical skill/task descriptor loaded from the static ontology.
/// Read-only to this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyEntry {
    /// Stable identifier. Entries lacking one are tolerated when returned by
    /// an oracle but are skipped by the matcher and comparator.
    pub skill_id: Option<String>,
    pub name: String,
    pub skill_type: SkillType,
    #[serde(default)]
    pub hot_tech: bool,
    #[serde(default)]
    pub in_demand: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soc_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commodity_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_preview: Option<String>,
}

/// One search result: entry metadata plus a similarity score in [0, 1],
/// higher meaning more similar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub entry: OntologyEntry,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchFilter {
    pub skill_type: Option<SkillType>,
}

impl SearchFilter {
    pub fn skills() -> Self {
        Self {
            skill_type: Some(SkillType::Skill),
        }
    }

    pub fn tasks() -> Self {
        Self {
            skill_type: Some(SkillType::Task),
        }
    }
}

/// Contract for the external nearest-neighbor search service.
#[async_trait]
pub trait SearchOracle: Send + Sync {
    /// Return up to `k` candidates for `query`, most similar first.
    async fn search(&self, query: &str, k: usize, filter: &SearchFilter) -> Result<Vec<SearchHit>>;
}

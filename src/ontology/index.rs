//! In-memory ontology index backed by a JSON file
//!
//! A local stand-in for the production vector store: entries are scored by
//! Jaro-Winkler similarity between the query and the canonical name, which
//! keeps the oracle contract (scores in [0, 1], most similar first) without
//! any model downloads.

use async_trait::async_trait;
use log::debug;
use std::path::Path;

use crate::error::{Result, SkillGapError};
use crate::ontology::{OntologyEntry, SearchFilter, SearchHit, SearchOracle, SkillType};

pub struct OntologyIndex {
    entries: Vec<OntologyEntry>,
}

impl OntologyIndex {
    pub fn new(entries: Vec<OntologyEntry>) -> Self {
        Self { entries }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<OntologyEntry> = serde_json::from_str(&content)?;
        if entries.is_empty() {
            return Err(SkillGapError::InvalidInput(format!(
                "Ontology file {} contains no entries",
                path.display()
            )));
        }
        debug!("Loaded {} ontology entries from {}", entries.len(), path.display());
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display names of all skill entries, for seeding keyword extraction.
    pub fn skill_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.skill_type == SkillType::Skill)
            .map(|e| e.name.clone())
            .collect()
    }
}

#[async_trait]
impl SearchOracle for OntologyIndex {
    async fn search(&self, query: &str, k: usize, filter: &SearchFilter) -> Result<Vec<SearchHit>> {
        let query_lc = query.to_lowercase();

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .filter(|e| filter.skill_type.map_or(true, |t| e.skill_type == t))
            .map(|e| SearchHit {
                entry: e.clone(),
                score: strsim::jaro_winkler(&query_lc, &e.name.to_lowercase()),
            })
            .collect();

        // Ties broken by name so results are reproducible.
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.entry.name.cmp(&b.entry.name))
        });
        hits.truncate(k);
        Ok(hits)
    }
}

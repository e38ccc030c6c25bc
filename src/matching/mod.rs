//! Ontology matcher: adaptive nearest-neighbor acceptance
//!
//! Converts extracted skill/task mentions into accepted ontology entries.
//! Search hits are filtered through a configurable cutoff strategy, then a
//! literal-text guard rejects candidates that are topically similar but never
//! actually mentioned in the source text.

use log::debug;
use serde::Serialize;

use crate::config::{MatchStrategyConfig, MatchStrategyKind};
use crate::error::Result;
use crate::extraction::{LevelEstimate, SkillMention};
use crate::ontology::{OntologyEntry, SearchFilter, SearchHit, SearchOracle};

pub const MAPPER_VERSION: &str = "matcher-v2";

/// Where a mention came from; selects the cutoff floor and quantile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Job,
    Resume,
    Task,
}

/// A mention accepted against one ontology entry.
#[derive(Debug, Clone)]
pub struct MappedSkill {
    /// Original mention text.
    pub token: String,
    pub entry: OntologyEntry,
    /// Oracle similarity score in [0, 1].
    pub score: f64,
    pub candidate_level: Option<LevelEstimate>,
    pub required_level: Option<LevelEstimate>,
    pub is_required: Option<bool>,
}

/// Per-mention filter diagnostics. `accepted + dropped + ambiguous` always
/// equals the total hit count.
#[derive(Debug, Clone, Serialize)]
pub struct MentionDiagnostics {
    pub token: String,
    pub total_hits: usize,
    pub accepted_count: usize,
    pub dropped_count: usize,
    pub ambiguous_count: usize,
    pub literal_text_rejected: usize,
    pub missing_id_skipped: usize,
    pub cutoff_used: Option<f64>,
    pub strategy: MatchStrategyKind,
    pub top_scores: Vec<f64>,
}

#[derive(Debug, Default)]
pub struct MappingOutcome {
    /// Accepted matches in mention order, deduplicated by skill id.
    pub mapped: Vec<MappedSkill>,
    pub diagnostics: Vec<MentionDiagnostics>,
}

impl MappingOutcome {
    pub fn total_accepted(&self) -> usize {
        self.diagnostics.iter().map(|d| d.accepted_count).sum()
    }

    pub fn total_dropped(&self) -> usize {
        self.diagnostics.iter().map(|d| d.dropped_count).sum()
    }

    pub fn total_ambiguous(&self) -> usize {
        self.diagnostics.iter().map(|d| d.ambiguous_count).sum()
    }

    pub fn average_cutoff(&self) -> Option<f64> {
        let cutoffs: Vec<f64> = self.diagnostics.iter().filter_map(|d| d.cutoff_used).collect();
        if cutoffs.is_empty() {
            None
        } else {
            Some(cutoffs.iter().sum::<f64>() / cutoffs.len() as f64)
        }
    }
}

struct FilterResult {
    accepted: Vec<SearchHit>,
    diagnostics: MentionDiagnostics,
}

pub struct OntologyMatcher<O: SearchOracle> {
    oracle: O,
    config: MatchStrategyConfig,
}

impl<O: SearchOracle> OntologyMatcher<O> {
    pub fn new(oracle: O, config: MatchStrategyConfig) -> Self {
        Self { oracle, config }
    }

    /// Map skill mentions against `skill_type = skill` ontology entries.
    ///
    /// A `None` source text disables the literal-text guard; callers running
    /// without literal text accept the looser behavior explicitly.
    pub async fn map_mentions(
        &self,
        mentions: &[SkillMention],
        source_type: SourceType,
        source_text: Option<&str>,
    ) -> Result<MappingOutcome> {
        self.map_internal(mentions, source_type, &SearchFilter::skills(), source_text)
            .await
    }

    /// Map responsibility texts against `skill_type = task` entries. Tasks
    /// feed narrative context only; the comparator never scores them.
    pub async fn map_tasks(
        &self,
        responsibilities: &[String],
        source_text: Option<&str>,
    ) -> Result<MappingOutcome> {
        let mentions: Vec<SkillMention> = responsibilities
            .iter()
            .map(|text| SkillMention::new(text.clone(), None, None))
            .collect();
        self.map_internal(&mentions, SourceType::Task, &SearchFilter::tasks(), source_text)
            .await
    }

    /// Effective strategy configuration, recorded into run diagnostics.
    pub fn strategy_params(&self) -> serde_json::Value {
        serde_json::json!({
            "strategy": self.config.strategy,
            "topk": self.config.topk,
            "jd_q": self.config.jd_q,
            "resume_q": self.config.resume_q,
            "task_q": self.config.task_q,
            "jd_floor": self.config.jd_floor,
            "resume_floor": self.config.resume_floor,
            "task_floor": self.config.task_floor,
            "min_score": self.config.min_score,
            "margin": self.config.margin,
            "static_threshold": self.config.static_threshold,
            "lexical_guard": self.config.lexical_guard,
        })
    }

    async fn map_internal(
        &self,
        mentions: &[SkillMention],
        source_type: SourceType,
        filter: &SearchFilter,
        source_text: Option<&str>,
    ) -> Result<MappingOutcome> {
        let mut outcome = MappingOutcome::default();
        let mut seen_ids: Vec<String> = Vec::new();
        let text_lc = source_text.map(str::to_lowercase);

        for mention in mentions {
            let token = mention.name.trim();
            if token.is_empty() {
                continue;
            }

            let hits = self.oracle.search(token, self.config.topk, filter).await?;
            if let Some(top) = hits.first() {
                debug!("Token '{}': {} raw hits, top score: {:.3}", token, hits.len(), top.score);
            }

            let mut result = self.filter_hits(hits, token, source_type);

            for hit in result.accepted.drain(..) {
                let Some(skill_id) = hit.entry.skill_id.clone() else {
                    result.diagnostics.missing_id_skipped += 1;
                    continue;
                };
                if seen_ids.contains(&skill_id) {
                    continue;
                }
                if !self.passes_literal_text_guard(token, &hit.entry.name, text_lc.as_deref()) {
                    debug!("  Rejected '{}' - not found in source text", hit.entry.name);
                    result.diagnostics.literal_text_rejected += 1;
                    continue;
                }
                seen_ids.push(skill_id);
                outcome.mapped.push(MappedSkill {
                    token: token.to_string(),
                    entry: hit.entry,
                    score: hit.score,
                    candidate_level: match source_type {
                        SourceType::Resume => mention.level.clone(),
                        _ => None,
                    },
                    required_level: match source_type {
                        SourceType::Job => mention.level.clone(),
                        _ => None,
                    },
                    is_required: mention.is_required,
                });
            }

            outcome.diagnostics.push(result.diagnostics);
        }

        let rejected: usize = outcome.diagnostics.iter().map(|d| d.literal_text_rejected).sum();
        if rejected > 0 {
            debug!(
                "Literal-text guard rejected {} phantom matches for {:?} mentions",
                rejected, source_type
            );
        }

        Ok(outcome)
    }

    fn filter_hits(&self, hits: Vec<SearchHit>, token: &str, source_type: SourceType) -> FilterResult {
        let total_hits = hits.len();
        if hits.is_empty() {
            return FilterResult {
                accepted: Vec::new(),
                diagnostics: MentionDiagnostics {
                    token: token.to_string(),
                    total_hits: 0,
                    accepted_count: 0,
                    dropped_count: 0,
                    ambiguous_count: 0,
                    literal_text_rejected: 0,
                    missing_id_skipped: 0,
                    cutoff_used: None,
                    strategy: self.config.strategy,
                    top_scores: Vec::new(),
                },
            };
        }

        let mut sorted = hits;
        sorted.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let scores: Vec<f64> = sorted.iter().map(|h| h.score).collect();

        let (accepted, dropped, ambiguous, cutoff) = match self.config.strategy {
            MatchStrategyKind::Static => {
                let cutoff = self.config.static_threshold;
                let (accepted, dropped): (Vec<_>, Vec<_>) =
                    sorted.into_iter().partition(|h| h.score >= cutoff);
                (accepted, dropped.len(), 0, cutoff)
            }
            MatchStrategyKind::Margin => {
                let cutoff = self.config.min_score;
                if sorted.len() < 2 {
                    let top_ok = sorted
                        .first()
                        .is_some_and(|h| h.score >= self.config.min_score);
                    if top_ok {
                        (sorted, 0, 0, cutoff)
                    } else {
                        let dropped = sorted.len();
                        (Vec::new(), dropped, 0, cutoff)
                    }
                } else {
                    let (s1, s2) = (sorted[0].score, sorted[1].score);
                    if (s1 - s2) >= self.config.margin && s1 >= self.config.min_score {
                        let dropped = sorted.len() - 1;
                        sorted.truncate(1);
                        (sorted, dropped, 0, cutoff)
                    } else {
                        // No clear winner: everything is ambiguous.
                        let ambiguous = sorted.len();
                        (Vec::new(), 0, ambiguous, cutoff)
                    }
                }
            }
            MatchStrategyKind::Quantile => {
                let floor = self.config.floor_for(source_type);
                let q = self.config.quantile_for(source_type);
                let quantile_cutoff = quantile(&scores, q);
                let cutoff = floor.max(quantile_cutoff);
                debug!(
                    "  Adaptive quantile: source={:?}, q={}, floor={}, n_scores={}, quantile_cutoff={:.4}, final_cutoff={:.4}",
                    source_type, q, floor, scores.len(), quantile_cutoff, cutoff
                );
                let (accepted, dropped): (Vec<_>, Vec<_>) =
                    sorted.into_iter().partition(|h| h.score >= cutoff);
                (accepted, dropped.len(), 0, cutoff)
            }
        };

        FilterResult {
            diagnostics: MentionDiagnostics {
                token: token.to_string(),
                total_hits,
                accepted_count: accepted.len(),
                dropped_count: dropped,
                ambiguous_count: ambiguous,
                literal_text_rejected: 0,
                missing_id_skipped: 0,
                cutoff_used: Some(cutoff),
                strategy: self.config.strategy,
                top_scores: scores.iter().copied().take(3).collect(),
            },
            accepted,
        }
    }

    /// Accept only candidates with literal textual evidence: either the
    /// original mention or the canonical name must appear in the source.
    /// Blocks phantom matches the nearest-neighbor search surfaces for
    /// topically related but unmentioned entries.
    fn passes_literal_text_guard(&self, token: &str, match_name: &str, text_lc: Option<&str>) -> bool {
        if !self.config.lexical_guard {
            return true;
        }
        let Some(text) = text_lc else {
            return true;
        };
        text.contains(&token.to_lowercase()) || text.contains(&match_name.to_lowercase())
    }
}

/// Quantile with linear interpolation over the given scores.
pub(crate) fn quantile(scores: &[f64], q: f64) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
    }
}

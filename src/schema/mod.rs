//! Canonical schema for gap-analysis data
//!
//! Defines the typed, versioned payload passed between the engine,
//! persistence, and callers, plus helpers for adapting legacy loosely-typed
//! payloads to the canonical schema and for computing summary metrics.
//! Shape detection happens once at this boundary ([`AnalysisPayload`]);
//! business logic above it only ever sees [`GapAnalysisResult`].

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::extraction::LevelEstimate;
use crate::matching::MappedSkill;
use crate::ontology::OntologyEntry;

pub const ANALYSIS_SCHEMA_VERSION: &str = "1.0.0";

/// Normalised representation of a skill level requirement or observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signals: Vec<Value>,
}

impl From<&LevelEstimate> for LevelSnapshot {
    fn from(level: &LevelEstimate) -> Self {
        Self {
            label: Some(level.label.as_str().to_string()),
            score: Some(level.score),
            years: level.years,
            confidence: Some(level.confidence),
            evidence: Vec::new(),
            signals: level.signals.iter().map(|s| Value::String(s.clone())).collect(),
        }
    }
}

/// Lightweight descriptor for an ontology skill with preserved metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot_tech: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_demand: Option<bool>,
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
    /// Original match object as returned by the oracle, preserved verbatim.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub raw: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Resume,
    Job,
    Task,
    #[default]
    Derived,
}

/// Base fields shared by all skill collections in the analysis payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillSnapshot {
    #[serde(default)]
    pub descriptor: SkillDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    #[serde(default)]
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
    #[serde(default, skip_serializing_if = "std::collections::BTreeMap::is_empty")]
    pub tags: std::collections::BTreeMap<String, bool>,
}

impl SkillSnapshot {
    pub fn tag(&self, name: &str) -> bool {
        self.tags.get(name).copied().unwrap_or(false)
    }

    pub fn is_hot(&self) -> bool {
        self.tag("hot_tech")
    }

    pub fn is_in_demand(&self) -> bool {
        self.tag("in_demand")
    }

    /// Display label: extracted name first, then canonical id, then token.
    pub fn display_label(&self) -> &str {
        self.descriptor
            .name
            .as_deref()
            .or(self.descriptor.skill_id.as_deref())
            .or(self.source_token.as_deref())
            .unwrap_or("?")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    MeetsOrExceeds,
    Underqualified,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStatus {
    #[default]
    Missing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeOnlyStatus {
    #[default]
    ResumeOnly,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchedSkill {
    #[serde(flatten)]
    pub snapshot: SkillSnapshot,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_level: Option<LevelSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_level: Option<LevelSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_delta: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissingSkill {
    #[serde(flatten)]
    pub snapshot: SkillSnapshot,
    #[serde(default)]
    pub status: MissingStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeSkill {
    #[serde(flatten)]
    pub snapshot: SkillSnapshot,
    #[serde(default)]
    pub status: ResumeOnlyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_level: Option<LevelSnapshot>,
}

/// Summary metrics. Always derived from the three skill lists via
/// [`compute_metrics`], never stored or mutated independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapMetrics {
    #[serde(default)]
    pub overall_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_percent: Option<f64>,
    #[serde(default)]
    pub matched_skill_count: usize,
    #[serde(default)]
    pub missing_skill_count: usize,
    #[serde(default)]
    pub underqualified_skill_count: usize,
    #[serde(default)]
    pub resume_skill_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_skill_count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_run_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extractor_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapper_version: Option<String>,
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Map<String, Value>,
}

fn default_schema_version() -> String {
    ANALYSIS_SCHEMA_VERSION.to_string()
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self {
            resume_id: None,
            job_id: None,
            processing_run_id: None,
            job_title: None,
            company: None,
            job_location: None,
            job_url: None,
            extractor_version: None,
            analyzer_version: None,
            mapper_version: None,
            schema_version: default_schema_version(),
            generated_at: Utc::now(),
            extras: Map::new(),
        }
    }
}

/// Canonical, versioned representation of a gap analysis.
///
/// Constructed once per analysis run and persisted as an immutable snapshot;
/// a new analysis produces a new result with a new identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapAnalysisResult {
    // `version` is deliberately required on deserialization: it is what tells
    // a canonical payload apart from a legacy one.
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<i64>,
    #[serde(default)]
    pub context: AnalysisContext,
    #[serde(default)]
    pub metrics: GapMetrics,
    #[serde(default)]
    pub matched_skills: Vec<MatchedSkill>,
    #[serde(default)]
    pub missing_skills: Vec<MissingSkill>,
    #[serde(default)]
    pub resume_skills: Vec<ResumeSkill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_markdown: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub diagnostics: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Map<String, Value>,
}

impl Default for GapAnalysisResult {
    fn default() -> Self {
        Self {
            version: ANALYSIS_SCHEMA_VERSION.to_string(),
            analysis_id: None,
            context: AnalysisContext::default(),
            metrics: GapMetrics::default(),
            matched_skills: Vec::new(),
            missing_skills: Vec::new(),
            resume_skills: Vec::new(),
            report_markdown: None,
            diagnostics: Map::new(),
            extras: Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Legacy payload adaptation
// ---------------------------------------------------------------------------

/// One loosely-typed skill row as produced by the comparator and as stored in
/// the flat legacy JSON columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub matched: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_level: Option<LevelSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_level: Option<LevelSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_delta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_hot_tech: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_in_demand: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
}

impl From<&MappedSkill> for LegacyEntry {
    fn from(mapped: &MappedSkill) -> Self {
        Self {
            token: Some(mapped.token.clone()),
            matched: serde_json::to_value(&mapped.entry).ok(),
            score: Some(mapped.score),
            candidate_level: mapped.candidate_level.as_ref().map(LevelSnapshot::from),
            required_level: mapped.required_level.as_ref().map(LevelSnapshot::from),
            is_required: mapped.is_required,
            ..Self::default()
        }
    }
}

impl LegacyEntry {
    pub fn skill_id(&self) -> Option<&str> {
        self.matched
            .as_ref()
            .and_then(|m| m.get("skill_id"))
            .and_then(Value::as_str)
    }

    pub fn skill_type(&self) -> Option<&str> {
        self.matched
            .as_ref()
            .and_then(|m| m.get("skill_type"))
            .and_then(Value::as_str)
    }

    pub fn is_skill(&self) -> bool {
        self.skill_type() == Some("skill")
    }

    fn match_bool(&self, key: &str) -> Option<bool> {
        self.matched
            .as_ref()
            .and_then(|m| m.get(key))
            .and_then(Value::as_bool)
    }

    pub fn hot_tech(&self) -> bool {
        self.match_bool("hot_tech").unwrap_or(false)
    }

    pub fn in_demand(&self) -> bool {
        self.match_bool("in_demand").unwrap_or(false)
    }
}

fn match_str(raw: &Map<String, Value>, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

fn descriptor_from_match(matched: Option<&Value>) -> SkillDescriptor {
    let raw = matched
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    SkillDescriptor {
        skill_id: match_str(&raw, "skill_id"),
        name: match_str(&raw, "name"),
        skill_type: match_str(&raw, "skill_type"),
        framework: match_str(&raw, "framework"),
        hot_tech: raw.get("hot_tech").and_then(Value::as_bool),
        in_demand: raw.get("in_demand").and_then(Value::as_bool),
        external_id: match_str(&raw, "external_id"),
        soc_code: match_str(&raw, "soc_code"),
        occupation: match_str(&raw, "occupation"),
        commodity_title: match_str(&raw, "commodity_title"),
        text_preview: match_str(&raw, "text_preview"),
        raw,
    }
}

impl From<&OntologyEntry> for SkillDescriptor {
    fn from(entry: &OntologyEntry) -> Self {
        descriptor_from_match(serde_json::to_value(entry).ok().as_ref())
    }
}

fn base_snapshot(entry: &LegacyEntry, origin: Origin, default_tags: &[(&str, bool)]) -> SkillSnapshot {
    let mut descriptor = descriptor_from_match(entry.matched.as_ref());
    let token = entry
        .token
        .clone()
        .or_else(|| entry.query.clone())
        .or_else(|| entry.name.clone());
    let source_text = if origin == Origin::Task {
        entry.text.clone()
    } else {
        entry.source_text.clone()
    };

    // Prefer the extracted mention over the ontology-normalized name for
    // display.
    if token.is_some() {
        descriptor.name = token.clone();
    }

    let mut tags = std::collections::BTreeMap::new();
    for (name, value) in default_tags {
        tags.insert((*name).to_string(), *value);
    }
    if descriptor.hot_tech == Some(true) {
        tags.entry("hot_tech".to_string()).or_insert(true);
    }
    if descriptor.in_demand == Some(true) {
        tags.entry("in_demand".to_string()).or_insert(true);
    }

    SkillSnapshot {
        descriptor,
        source_token: token,
        source_text,
        origin,
        job_score: entry.score,
        resume_score: entry.resume_score,
        is_required: entry.is_required,
        rank: entry.rank,
        tags,
    }
}

pub fn matched_skill_from_legacy(entry: &LegacyEntry) -> MatchedSkill {
    let snapshot = base_snapshot(entry, Origin::Job, &[]);
    let status = match entry.status.as_deref() {
        Some("meets_or_exceeds") => MatchStatus::MeetsOrExceeds,
        Some("underqualified") => MatchStatus::Underqualified,
        _ => {
            if entry.level_delta.unwrap_or(0.0) > 0.0 {
                MatchStatus::Underqualified
            } else {
                MatchStatus::MeetsOrExceeds
            }
        }
    };
    MatchedSkill {
        snapshot,
        status,
        candidate_level: entry.candidate_level.clone(),
        required_level: entry.required_level.clone(),
        level_delta: entry.level_delta,
    }
}

pub fn missing_skill_from_legacy(entry: &LegacyEntry) -> MissingSkill {
    let tags = [
        ("hot_tech", entry.is_hot_tech.unwrap_or(false)),
        ("in_demand", entry.is_in_demand.unwrap_or(false)),
    ];
    MissingSkill {
        snapshot: base_snapshot(entry, Origin::Job, &tags),
        status: MissingStatus::Missing,
    }
}

pub fn resume_skill_from_legacy(entry: &LegacyEntry) -> ResumeSkill {
    ResumeSkill {
        snapshot: base_snapshot(entry, Origin::Resume, &[]),
        status: ResumeOnlyStatus::ResumeOnly,
        candidate_level: entry.candidate_level.clone(),
    }
}

/// Recompute summary metrics from the three skill lists.
pub fn compute_metrics(
    overall_score: f64,
    matched: &[MatchedSkill],
    missing: &[MissingSkill],
    resume: &[ResumeSkill],
) -> GapMetrics {
    let underqualified = matched
        .iter()
        .filter(|skill| skill.status == MatchStatus::Underqualified)
        .count();
    GapMetrics {
        overall_score,
        overall_percent: Some((overall_score / 10.0 * 10_000.0).round() / 10_000.0),
        matched_skill_count: matched.len(),
        missing_skill_count: missing.len(),
        underqualified_skill_count: underqualified,
        resume_skill_count: resume.len(),
        job_skill_count: None,
    }
}

/// Assemble a versioned analysis from legacy-shaped rows.
#[allow(clippy::too_many_arguments)]
pub fn build_analysis_from_legacy(
    overall_score: f64,
    matched: &[LegacyEntry],
    missing: &[LegacyEntry],
    resume: &[LegacyEntry],
    context: AnalysisContext,
    analysis_id: Option<i64>,
    diagnostics: Map<String, Value>,
    extras: Map<String, Value>,
) -> GapAnalysisResult {
    let matched_skills: Vec<MatchedSkill> = matched.iter().map(matched_skill_from_legacy).collect();
    let missing_skills: Vec<MissingSkill> = missing.iter().map(missing_skill_from_legacy).collect();
    let resume_skills: Vec<ResumeSkill> = resume.iter().map(resume_skill_from_legacy).collect();

    let metrics = compute_metrics(overall_score, &matched_skills, &missing_skills, &resume_skills);

    GapAnalysisResult {
        version: ANALYSIS_SCHEMA_VERSION.to_string(),
        analysis_id,
        context,
        metrics,
        matched_skills,
        missing_skills,
        resume_skills,
        report_markdown: None,
        diagnostics,
        extras,
    }
}

/// Return a JSON-serialisable value with canonical field naming and null
/// fields omitted. Timestamps serialize as ISO-8601.
pub fn analysis_to_transport_payload(analysis: &GapAnalysisResult) -> Result<Value> {
    Ok(serde_json::to_value(analysis)?)
}

// ---------------------------------------------------------------------------
// Storage row
// ---------------------------------------------------------------------------

/// Column set persisted per analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredReport {
    pub score: Option<f64>,
    pub matched_skills_json: Option<Value>,
    pub missing_skills_json: Option<Value>,
    /// Underqualified subset of the matched skills.
    pub weak_skills_json: Option<Value>,
    pub resume_skills_json: Option<Value>,
    pub analysis_version: Option<String>,
    pub analysis_json: Option<Value>,
}

impl StoredReport {
    /// Build the storage row for a completed run: legacy-shaped columns for
    /// backwards compatibility plus the versioned canonical blob.
    pub fn from_run(
        score: f64,
        matched: &[LegacyEntry],
        missing: &[LegacyEntry],
        resume: &[LegacyEntry],
        analysis: &GapAnalysisResult,
    ) -> Result<Self> {
        let weak: Vec<&LegacyEntry> = matched
            .iter()
            .filter(|m| m.status.as_deref() == Some("underqualified"))
            .collect();
        Ok(Self {
            score: Some(score),
            matched_skills_json: Some(serde_json::to_value(matched)?),
            missing_skills_json: Some(serde_json::to_value(missing)?),
            weak_skills_json: Some(serde_json::to_value(&weak)?),
            resume_skills_json: Some(serde_json::to_value(resume)?),
            analysis_version: Some(analysis.version.clone()),
            analysis_json: Some(analysis_to_transport_payload(analysis)?),
        })
    }
}

fn parse_legacy_column(column: Option<&Value>) -> Vec<LegacyEntry> {
    let Some(Value::Array(items)) = column else {
        return Vec::new();
    };
    // Tolerant element-wise parse: one malformed row never loses the rest.
    items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}

/// Hydrate a [`GapAnalysisResult`] from stored columns.
///
/// Prefers the versioned `analysis_json` blob; any parse failure (schema
/// drift, corruption) degrades gracefully to rebuilding from the flat legacy
/// columns. Never fails.
pub fn load_analysis_from_storage(
    row: &StoredReport,
    context: AnalysisContext,
    analysis_id: Option<i64>,
) -> GapAnalysisResult {
    if let Some(blob) = &row.analysis_json {
        match serde_json::from_value::<GapAnalysisResult>(blob.clone()) {
            Ok(mut analysis) => {
                if analysis_id.is_some() {
                    analysis.analysis_id = analysis_id;
                }
                return analysis;
            }
            Err(e) => {
                warn!("Failed to parse stored analysis_json; rebuilding from legacy columns: {}", e);
            }
        }
    }

    let mut analysis = build_analysis_from_legacy(
        row.score.unwrap_or(0.0),
        &parse_legacy_column(row.matched_skills_json.as_ref()),
        &parse_legacy_column(row.missing_skills_json.as_ref()),
        &parse_legacy_column(row.resume_skills_json.as_ref()),
        context,
        analysis_id,
        Map::new(),
        Map::new(),
    );

    if let Some(version) = &row.analysis_version {
        analysis.version = version.clone();
    }

    analysis
}

// ---------------------------------------------------------------------------
// Payload union
// ---------------------------------------------------------------------------

/// Flat legacy payload shape (the pre-canonical persisted structure).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_match: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default)]
    pub matched_skills: Vec<LegacyEntry>,
    #[serde(default)]
    pub missing_skills: Vec<LegacyEntry>,
    #[serde(default)]
    pub resume_skills: Vec<LegacyEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<AnalysisContext>,
}

/// Tagged union over the two payload shapes the engine accepts. The single
/// place where shape detection happens.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AnalysisPayload {
    Canonical(GapAnalysisResult),
    Legacy(LegacyPayload),
}

impl AnalysisPayload {
    pub fn normalize(self) -> GapAnalysisResult {
        match self {
            AnalysisPayload::Canonical(analysis) => analysis,
            AnalysisPayload::Legacy(payload) => build_analysis_from_legacy(
                payload.overall_match.or(payload.score).unwrap_or(0.0),
                &payload.matched_skills,
                &payload.missing_skills,
                &payload.resume_skills,
                payload.context.unwrap_or_default(),
                None,
                Map::new(),
                Map::new(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_matched(id: &str, name: &str, status: Option<&str>, delta: Option<f64>) -> LegacyEntry {
        LegacyEntry {
            token: Some(name.to_string()),
            matched: Some(json!({
                "skill_id": id,
                "name": name,
                "skill_type": "skill",
                "hot_tech": false,
                "in_demand": false,
            })),
            score: Some(0.8),
            status: status.map(str::to_string),
            level_delta: delta,
            ..LegacyEntry::default()
        }
    }

    fn legacy_missing(id: &str, name: &str, hot: bool) -> LegacyEntry {
        LegacyEntry {
            token: Some(name.to_string()),
            matched: Some(json!({
                "skill_id": id,
                "name": name,
                "skill_type": "skill",
                "hot_tech": hot,
            })),
            score: Some(0.7),
            is_hot_tech: Some(hot),
            ..LegacyEntry::default()
        }
    }

    #[test]
    fn status_derived_from_delta_when_absent() {
        let positive = matched_skill_from_legacy(&legacy_matched("s1", "Rust", None, Some(1.0)));
        assert_eq!(positive.status, MatchStatus::Underqualified);

        let zero = matched_skill_from_legacy(&legacy_matched("s1", "Rust", None, Some(0.0)));
        assert_eq!(zero.status, MatchStatus::MeetsOrExceeds);

        let explicit =
            matched_skill_from_legacy(&legacy_matched("s1", "Rust", Some("underqualified"), None));
        assert_eq!(explicit.status, MatchStatus::Underqualified);
    }

    #[test]
    fn missing_skill_carries_priority_tags() {
        let skill = missing_skill_from_legacy(&legacy_missing("s2", "Kubernetes", true));
        assert!(skill.snapshot.is_hot());
        assert!(!skill.snapshot.is_in_demand());
        assert_eq!(skill.snapshot.display_label(), "Kubernetes");
    }

    #[test]
    fn metrics_are_derived_from_lists() {
        let matched = vec![
            matched_skill_from_legacy(&legacy_matched("s1", "Rust", Some("underqualified"), Some(1.5))),
            matched_skill_from_legacy(&legacy_matched("s2", "Python", Some("meets_or_exceeds"), Some(0.0))),
        ];
        let missing = vec![missing_skill_from_legacy(&legacy_missing("s3", "Go", false))];
        let metrics = compute_metrics(6.67, &matched, &missing, &[]);

        assert_eq!(metrics.matched_skill_count, 2);
        assert_eq!(metrics.missing_skill_count, 1);
        assert_eq!(metrics.underqualified_skill_count, 1);
        assert_eq!(metrics.overall_percent, Some(0.667));
    }

    #[test]
    fn transport_payload_round_trips_through_storage() {
        let analysis = build_analysis_from_legacy(
            6.0,
            &[legacy_matched("s1", "Rust", Some("meets_or_exceeds"), Some(0.0))],
            &[legacy_missing("s2", "Go", true)],
            &[legacy_matched("s1", "Rust", None, None)],
            AnalysisContext::default(),
            Some(42),
            Map::new(),
            Map::new(),
        );

        let payload = analysis_to_transport_payload(&analysis).unwrap();
        let row = StoredReport {
            analysis_json: Some(payload),
            analysis_version: Some(analysis.version.clone()),
            ..StoredReport::default()
        };
        let loaded = load_analysis_from_storage(&row, AnalysisContext::default(), None);

        assert_eq!(loaded.metrics, analysis.metrics);
        assert_eq!(loaded.matched_skills.len(), 1);
        assert_eq!(loaded.missing_skills.len(), 1);
        assert_eq!(loaded.resume_skills.len(), 1);
        assert_eq!(loaded.analysis_id, Some(42));
    }

    #[test]
    fn transport_payload_omits_null_fields() {
        let analysis = GapAnalysisResult::default();
        let payload = analysis_to_transport_payload(&analysis).unwrap();
        let object = payload.as_object().unwrap();
        assert!(!object.contains_key("analysis_id"));
        assert!(!object.contains_key("report_markdown"));
        assert!(object.contains_key("version"));
    }

    #[test]
    fn corrupt_blob_falls_back_to_legacy_columns() {
        let row = StoredReport {
            score: Some(5.0),
            matched_skills_json: Some(json!([
                {"token": "Rust", "match": {"skill_id": "s1", "name": "Rust", "skill_type": "skill"}, "score": 0.9},
            ])),
            missing_skills_json: Some(json!([
                {"token": "Go", "match": {"skill_id": "s2", "name": "Go", "skill_type": "skill"}, "score": 0.8},
            ])),
            resume_skills_json: None,
            weak_skills_json: None,
            analysis_version: Some("0.9.0".to_string()),
            // Not an object at all; must not panic or error.
            analysis_json: Some(json!("garbage")),
        };

        let loaded = load_analysis_from_storage(&row, AnalysisContext::default(), Some(7));
        assert_eq!(loaded.metrics.overall_score, 5.0);
        assert_eq!(loaded.matched_skills.len(), 1);
        assert_eq!(loaded.missing_skills.len(), 1);
        assert_eq!(loaded.version, "0.9.0");
        assert_eq!(loaded.analysis_id, Some(7));
    }

    #[test]
    fn malformed_rows_in_a_column_are_skipped() {
        let column = json!([
            {"token": "Rust", "score": 0.9},
            42,
        ]);
        let parsed = parse_legacy_column(Some(&column));
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn payload_union_detects_canonical_shape() {
        let canonical = serde_json::to_value(GapAnalysisResult::default()).unwrap();
        let payload: AnalysisPayload = serde_json::from_value(canonical).unwrap();
        assert!(matches!(payload, AnalysisPayload::Canonical(_)));

        let legacy = json!({
            "overall_match": 7.5,
            "matched_skills": [],
            "missing_skills": [],
            "resume_skills": [],
        });
        let payload: AnalysisPayload = serde_json::from_value(legacy).unwrap();
        let analysis = payload.normalize();
        assert_eq!(analysis.metrics.overall_score, 7.5);
        assert_eq!(analysis.version, ANALYSIS_SCHEMA_VERSION);
    }

    #[test]
    fn display_prefers_extracted_mention_over_canonical_name() {
        let entry = LegacyEntry {
            token: Some("React".to_string()),
            matched: Some(json!({"skill_id": "s9", "name": "React.js", "skill_type": "skill"})),
            ..LegacyEntry::default()
        };
        let skill = resume_skill_from_legacy(&entry);
        assert_eq!(skill.snapshot.display_label(), "React");
        assert_eq!(
            skill.snapshot.descriptor.raw.get("name").and_then(Value::as_str),
            Some("React.js")
        );
    }
}

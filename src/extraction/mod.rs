//! Skill extraction contract
//!
//! Turning raw resume or job text into named skills with proficiency estimates
//! is an external concern (an LLM service in production). The engine consumes
//! it through the [`Extractor`] trait and tolerates empty or partial results.

pub mod keyword;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use keyword::KeywordExtractor;

/// Proficiency level labels on the 0..4 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelLabel {
    None,
    Basic,
    Working,
    Proficient,
    Advanced,
}

impl LevelLabel {
    pub fn score(self) -> f64 {
        match self {
            LevelLabel::None => 0.0,
            LevelLabel::Basic => 1.0,
            LevelLabel::Working => 2.0,
            LevelLabel::Proficient => 3.0,
            LevelLabel::Advanced => 4.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LevelLabel::None => "none",
            LevelLabel::Basic => "basic",
            LevelLabel::Working => "working",
            LevelLabel::Proficient => "proficient",
            LevelLabel::Advanced => "advanced",
        }
    }
}

/// Proficiency estimate attached to an extracted skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelEstimate {
    pub label: LevelLabel,
    /// Numeric score in [0, 4]; normally consistent with `label`.
    pub score: f64,
    pub years: Option<f64>,
    /// Extractor confidence in [0, 1].
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signals: Vec<String>,
}

impl Default for LevelEstimate {
    /// Neutral default: unknown proficiency neither penalizes nor rewards.
    fn default() -> Self {
        Self {
            label: LevelLabel::Working,
            score: 2.0,
            years: None,
            confidence: 0.5,
            signals: Vec::new(),
        }
    }
}

impl LevelEstimate {
    pub fn from_years(years: f64) -> Self {
        let label = if years >= 7.0 {
            LevelLabel::Advanced
        } else if years >= 4.0 {
            LevelLabel::Proficient
        } else if years >= 2.0 {
            LevelLabel::Working
        } else {
            LevelLabel::Basic
        };
        Self {
            label,
            score: label.score(),
            years: Some(years),
            confidence: 0.8,
            signals: vec![format!("{}+ years", years)],
        }
    }

    /// Clamp the estimate to at most the "working" level, keeping confidence.
    pub fn capped_at_working(mut self) -> Self {
        if self.score > LevelLabel::Working.score() {
            self.score = LevelLabel::Working.score();
        }
        if matches!(self.label, LevelLabel::Proficient | LevelLabel::Advanced) {
            self.label = LevelLabel::Working;
        }
        self
    }
}

/// A single skill extracted from free text. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillMention {
    pub name: String,
    pub level: Option<LevelEstimate>,
    /// `Some(false)` only for explicit nice-to-have items; `None` when the
    /// source (e.g. a resume) carries no requirement semantics.
    pub is_required: Option<bool>,
}

impl SkillMention {
    pub fn new(name: impl Into<String>, level: Option<LevelEstimate>, is_required: Option<bool>) -> Self {
        Self {
            name: name.into(),
            level,
            is_required,
        }
    }
}

/// Raw extractor output for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedDocument {
    #[serde(default)]
    pub skills: Vec<ExtractedSkill>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedSkill {
    pub name: String,
    pub level: Option<LevelEstimate>,
    #[serde(default)]
    pub nice_to_have: bool,
}

/// Contract for the external text-extraction step.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, text: &str, is_job_description: bool) -> Result<ExtractedDocument>;

    /// Version tag recorded into the analysis context for cache invalidation.
    fn version(&self) -> &str;
}

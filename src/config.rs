//! Configuration management for the skill-gap engine
//!
//! All thresholds and weights live in an explicit config struct that is passed
//! into the matcher, comparator, and scorer constructors. Invalid values fail
//! fast in [`EngineConfig::validate`] rather than per-request.

use crate::error::{Result, SkillGapError};
use crate::matching::SourceType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub match_strategy: MatchStrategyConfig,
    pub score_weights: ScoreWeights,
    pub extraction: ExtractionConfig,
    pub output: OutputConfig,
}

/// Cutoff strategy used when filtering ontology search hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategyKind {
    Static,
    Margin,
    Quantile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchStrategyConfig {
    pub strategy: MatchStrategyKind,

    /// Number of candidates requested from the search oracle per mention.
    pub topk: usize,

    // Quantile settings per source type
    pub jd_q: f64,
    pub resume_q: f64,
    pub task_q: f64,

    // Floor thresholds (safety limits). Resumes use looser language than
    // structured postings, so they get a lower floor.
    pub jd_floor: f64,
    pub resume_floor: f64,
    pub task_floor: f64,

    // Margin / static strategy parameters
    pub min_score: f64,
    pub margin: f64,
    pub static_threshold: f64,

    /// Require literal textual evidence for accepted matches.
    pub lexical_guard: bool,
}

impl Default for MatchStrategyConfig {
    fn default() -> Self {
        Self {
            strategy: MatchStrategyKind::Quantile,
            topk: 10,
            jd_q: 0.85,
            resume_q: 0.85,
            task_q: 0.85,
            jd_floor: 0.40,
            resume_floor: 0.30,
            task_floor: 0.40,
            min_score: 0.50,
            margin: 0.15,
            static_threshold: 0.55,
            lexical_guard: true,
        }
    }
}

impl MatchStrategyConfig {
    pub fn quantile_for(&self, source_type: SourceType) -> f64 {
        match source_type {
            SourceType::Resume => self.resume_q,
            SourceType::Task => self.task_q,
            SourceType::Job => self.jd_q,
        }
    }

    pub fn floor_for(&self, source_type: SourceType) -> f64 {
        match source_type {
            SourceType::Resume => self.resume_floor,
            SourceType::Task => self.task_floor,
            SourceType::Job => self.jd_floor,
        }
    }
}

/// Gap scoring weights.
///
/// Only `level_grace` participates in the current score formula; the penalty
/// weights are kept for the documented weighted-scoring extension point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub miss: f64,
    pub hot: f64,
    pub ind: f64,
    pub level: f64,
    pub level_grace: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            miss: 0.20,
            hot: 0.70,
            ind: 0.40,
            level: 0.90,
            level_grace: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Detect "nice to have" sections in job descriptions and mark the skills
    /// named there as optional.
    pub parse_nice_to_have: bool,
    /// Clamp nice-to-have requirements without explicit years to at most
    /// the "working" level.
    pub cap_nice_to_have: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            parse_nice_to_have: true,
            cap_nice_to_have: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Console,
            detailed: false,
            color_output: true,
        }
    }
}

impl EngineConfig {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content).map_err(|e| {
                SkillGapError::Configuration(format!("Failed to parse config: {}", e))
            })?
        } else {
            let config = Self::default();
            config.save()?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            SkillGapError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("skillgap")
            .join("config.toml")
    }

    /// Reject out-of-range thresholds before any analysis runs.
    pub fn validate(&self) -> Result<()> {
        let ms = &self.match_strategy;

        if ms.topk == 0 {
            return Err(SkillGapError::Configuration(
                "match_strategy.topk must be at least 1".to_string(),
            ));
        }

        let unit_ranged = [
            ("jd_q", ms.jd_q),
            ("resume_q", ms.resume_q),
            ("task_q", ms.task_q),
            ("jd_floor", ms.jd_floor),
            ("resume_floor", ms.resume_floor),
            ("task_floor", ms.task_floor),
            ("min_score", ms.min_score),
            ("margin", ms.margin),
            ("static_threshold", ms.static_threshold),
        ];
        for (name, value) in unit_ranged {
            if !(0.0..=1.0).contains(&value) {
                return Err(SkillGapError::Configuration(format!(
                    "match_strategy.{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }

        let sw = &self.score_weights;
        let weights = [
            ("miss", sw.miss),
            ("hot", sw.hot),
            ("ind", sw.ind),
            ("level", sw.level),
            ("level_grace", sw.level_grace),
        ];
        for (name, value) in weights {
            if value < 0.0 {
                return Err(SkillGapError::Configuration(format!(
                    "score_weights.{} must be non-negative, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn negative_floor_is_rejected() {
        let mut config = EngineConfig::default();
        config.match_strategy.resume_floor = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn quantile_above_one_is_rejected() {
        let mut config = EngineConfig::default();
        config.match_strategy.jd_q = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_topk_is_rejected() {
        let mut config = EngineConfig::default();
        config.match_strategy.topk = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn floors_differ_per_source_type() {
        let ms = MatchStrategyConfig::default();
        assert!(ms.floor_for(SourceType::Resume) < ms.floor_for(SourceType::Job));
        assert_eq!(ms.quantile_for(SourceType::Task), 0.85);
    }
}

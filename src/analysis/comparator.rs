//! Skill-set comparison between a resume and a job description
//!
//! Works purely on canonical skill ids: two mentions refer to the same skill
//! exactly when their accepted ontology entries share a `skill_id`. Surface
//! spelling never participates in the intersection.

use log::debug;
use serde::Serialize;
use std::collections::HashMap;

use crate::config::ScoreWeights;
use crate::extraction::LevelEstimate;
use crate::matching::MappedSkill;
use crate::ontology::SkillType;
use crate::schema::LegacyEntry;

pub const STATUS_MEETS_OR_EXCEEDS: &str = "meets_or_exceeds";
pub const STATUS_UNDERQUALIFIED: &str = "underqualified";

#[derive(Debug, Clone, Default, Serialize)]
pub struct ComparisonDiagnostics {
    pub resume_items: usize,
    pub job_items: usize,
    pub resume_skill_count: usize,
    pub matched_count: usize,
    pub missing_count: usize,
    pub skipped_no_skill_id: usize,
}

/// Comparator output in the flat row shape consumed by the schema layer and
/// the legacy storage columns.
#[derive(Debug, Clone, Default)]
pub struct ComparisonOutput {
    pub matched: Vec<LegacyEntry>,
    pub missing: Vec<LegacyEntry>,
    pub resume_skills: Vec<LegacyEntry>,
    pub diagnostics: ComparisonDiagnostics,
}

pub struct GapComparator {
    weights: ScoreWeights,
}

impl GapComparator {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// Intersect mapped resume skills with mapped job skills.
    ///
    /// Job requirements matched by the resume land in `matched` with level
    /// information attached; unmatched requirements land in `missing`. Task
    /// and job-profile entries never participate. Output order follows the
    /// job mapping order, so equal inputs give equal outputs.
    pub fn compare(
        &self,
        resume_mapped: &[MappedSkill],
        job_mapped: &[MappedSkill],
    ) -> ComparisonOutput {
        let mut diagnostics = ComparisonDiagnostics {
            resume_items: resume_mapped.len(),
            job_items: job_mapped.len(),
            ..ComparisonDiagnostics::default()
        };

        // First accepted mapping wins per skill id.
        let mut resume_by_id: HashMap<&str, &MappedSkill> = HashMap::new();
        let mut resume_skills: Vec<LegacyEntry> = Vec::new();
        for mapped in resume_mapped {
            if mapped.entry.skill_type != SkillType::Skill {
                continue;
            }
            let Some(skill_id) = mapped.entry.skill_id.as_deref() else {
                diagnostics.skipped_no_skill_id += 1;
                continue;
            };
            if resume_by_id.contains_key(skill_id) {
                continue;
            }
            resume_by_id.insert(skill_id, mapped);

            let mut row = LegacyEntry::from(mapped);
            row.resume_score = Some(mapped.score);
            row.score = None;
            resume_skills.push(row);
        }

        let mut matched: Vec<LegacyEntry> = Vec::new();
        let mut missing: Vec<LegacyEntry> = Vec::new();
        let mut seen_job_ids: Vec<String> = Vec::new();

        for mapped in job_mapped {
            if mapped.entry.skill_type != SkillType::Skill {
                continue;
            }
            let Some(skill_id) = mapped.entry.skill_id.as_deref() else {
                diagnostics.skipped_no_skill_id += 1;
                continue;
            };
            if seen_job_ids.iter().any(|id| id == skill_id) {
                continue;
            }
            seen_job_ids.push(skill_id.to_string());

            let mut row = LegacyEntry::from(mapped);
            match resume_by_id.get(skill_id) {
                Some(resume_hit) => {
                    let candidate = resume_hit.candidate_level.clone().unwrap_or_default();
                    let required = mapped.required_level.clone().unwrap_or_default();
                    let delta = Self::level_delta(&candidate, &required);

                    row.resume_score = Some(resume_hit.score);
                    row.candidate_level = Some((&candidate).into());
                    row.required_level = Some((&required).into());
                    row.level_delta = Some(delta);
                    row.status = Some(if delta > self.weights.level_grace {
                        STATUS_UNDERQUALIFIED.to_string()
                    } else {
                        STATUS_MEETS_OR_EXCEEDS.to_string()
                    });
                    matched.push(row);
                }
                None => {
                    row.is_hot_tech = Some(mapped.entry.hot_tech);
                    row.is_in_demand = Some(mapped.entry.in_demand);
                    missing.push(row);
                }
            }
        }

        diagnostics.resume_skill_count = resume_skills.len();
        diagnostics.matched_count = matched.len();
        diagnostics.missing_count = missing.len();
        debug!(
            "Comparison: {} matched, {} missing, {} resume-only, {} skipped without id",
            diagnostics.matched_count,
            diagnostics.missing_count,
            diagnostics.resume_skill_count,
            diagnostics.skipped_no_skill_id
        );

        ComparisonOutput {
            matched,
            missing,
            resume_skills,
            diagnostics,
        }
    }

    /// Shortfall of the candidate level against the required level, floored
    /// at zero. Exceeding a requirement is never penalized.
    fn level_delta(candidate: &LevelEstimate, required: &LevelEstimate) -> f64 {
        (required.score - candidate.score).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{LevelEstimate, LevelLabel};
    use crate::matching::MappedSkill;
    use crate::ontology::OntologyEntry;

    fn entry(id: Option<&str>, name: &str, skill_type: SkillType) -> OntologyEntry {
        OntologyEntry {
            skill_id: id.map(str::to_string),
            name: name.to_string(),
            skill_type,
            hot_tech: false,
            in_demand: false,
            framework: None,
            external_id: None,
            soc_code: None,
            occupation: None,
            commodity_title: None,
            text_preview: None,
        }
    }

    fn level(label: LevelLabel) -> LevelEstimate {
        LevelEstimate {
            label,
            score: label.score(),
            years: None,
            confidence: 0.8,
            signals: Vec::new(),
        }
    }

    fn resume_skill(id: &str, name: &str, candidate: Option<LevelEstimate>) -> MappedSkill {
        MappedSkill {
            token: name.to_string(),
            entry: entry(Some(id), name, SkillType::Skill),
            score: 0.9,
            candidate_level: candidate,
            required_level: None,
            is_required: None,
        }
    }

    fn job_skill(id: &str, name: &str, required: Option<LevelEstimate>) -> MappedSkill {
        MappedSkill {
            token: name.to_string(),
            entry: entry(Some(id), name, SkillType::Skill),
            score: 0.85,
            candidate_level: None,
            required_level: required,
            is_required: Some(true),
        }
    }

    fn comparator() -> GapComparator {
        GapComparator::new(ScoreWeights::default())
    }

    #[test]
    fn shared_skill_id_produces_a_match() {
        let output = comparator().compare(
            &[resume_skill("s1", "Rust", None)],
            &[job_skill("s1", "Rust", None), job_skill("s2", "Go", None)],
        );

        assert_eq!(output.matched.len(), 1);
        assert_eq!(output.missing.len(), 1);
        assert_eq!(output.matched[0].skill_id(), Some("s1"));
        assert_eq!(output.missing[0].skill_id(), Some("s2"));
        assert_eq!(output.diagnostics.matched_count, 1);
        assert_eq!(output.diagnostics.missing_count, 1);
    }

    #[test]
    fn level_shortfall_marks_underqualified() {
        let candidate = LevelEstimate {
            label: LevelLabel::Basic,
            score: 1.5,
            years: None,
            confidence: 0.7,
            signals: Vec::new(),
        };
        let output = comparator().compare(
            &[resume_skill("s1", "Rust", Some(candidate))],
            &[job_skill("s1", "Rust", Some(level(LevelLabel::Proficient)))],
        );

        let row = &output.matched[0];
        assert_eq!(row.level_delta, Some(1.5));
        assert_eq!(row.status.as_deref(), Some(STATUS_UNDERQUALIFIED));
    }

    #[test]
    fn missing_levels_default_to_working_and_meet() {
        let output = comparator().compare(
            &[resume_skill("s1", "Rust", None)],
            &[job_skill("s1", "Rust", None)],
        );

        let row = &output.matched[0];
        assert_eq!(row.level_delta, Some(0.0));
        assert_eq!(row.status.as_deref(), Some(STATUS_MEETS_OR_EXCEEDS));
        assert_eq!(
            row.candidate_level.as_ref().unwrap().score,
            Some(LevelLabel::Working.score())
        );
    }

    #[test]
    fn shortfall_within_grace_still_meets() {
        let candidate = LevelEstimate {
            label: LevelLabel::Working,
            score: 2.75,
            years: None,
            confidence: 0.7,
            signals: Vec::new(),
        };
        let output = comparator().compare(
            &[resume_skill("s1", "Rust", Some(candidate))],
            &[job_skill("s1", "Rust", Some(level(LevelLabel::Proficient)))],
        );

        let row = &output.matched[0];
        assert_eq!(row.level_delta, Some(0.25));
        assert_eq!(row.status.as_deref(), Some(STATUS_MEETS_OR_EXCEEDS));
    }

    #[test]
    fn exceeding_a_requirement_is_not_penalized() {
        let output = comparator().compare(
            &[resume_skill("s1", "Rust", Some(level(LevelLabel::Advanced)))],
            &[job_skill("s1", "Rust", Some(level(LevelLabel::Working)))],
        );
        assert_eq!(output.matched[0].level_delta, Some(0.0));
    }

    #[test]
    fn non_skill_entries_are_excluded() {
        let task = MappedSkill {
            token: "Write unit tests".to_string(),
            entry: entry(Some("t1"), "Write unit tests", SkillType::Task),
            score: 0.8,
            candidate_level: None,
            required_level: None,
            is_required: None,
        };
        let output = comparator().compare(&[task.clone()], &[task]);

        assert!(output.matched.is_empty());
        assert!(output.missing.is_empty());
        assert!(output.resume_skills.is_empty());
    }

    #[test]
    fn entries_without_skill_id_are_skipped_silently() {
        let anonymous = MappedSkill {
            token: "Mystery".to_string(),
            entry: entry(None, "Mystery", SkillType::Skill),
            score: 0.8,
            candidate_level: None,
            required_level: None,
            is_required: Some(true),
        };
        let output = comparator().compare(&[anonymous.clone()], &[anonymous]);

        assert!(output.matched.is_empty());
        assert!(output.missing.is_empty());
        assert_eq!(output.diagnostics.skipped_no_skill_id, 2);
    }

    #[test]
    fn resume_skills_are_deduplicated_by_id() {
        let output = comparator().compare(
            &[
                resume_skill("s1", "React", None),
                resume_skill("s1", "React.js", None),
            ],
            &[],
        );

        assert_eq!(output.resume_skills.len(), 1);
        assert_eq!(output.resume_skills[0].token.as_deref(), Some("React"));
        assert_eq!(output.resume_skills[0].resume_score, Some(0.9));
    }

    #[test]
    fn unmatched_requirements_carry_priority_flags() {
        let mut hot = job_skill("s3", "Kubernetes", None);
        hot.entry.hot_tech = true;
        hot.entry.in_demand = true;
        let output = comparator().compare(&[], &[hot]);

        assert_eq!(output.missing[0].is_hot_tech, Some(true));
        assert_eq!(output.missing[0].is_in_demand, Some(true));
    }
}

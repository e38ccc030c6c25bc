//! Markdown gap report renderer
//!
//! Renders a fixed sequence of sections from a canonical analysis. Every
//! section is always emitted, with an explicit "- None" placeholder when
//! empty, so diffing two reports shows exactly which sections changed.

use serde_json::Value;

use crate::error::Result;
use crate::schema::{
    AnalysisPayload, GapAnalysisResult, LevelSnapshot, MatchStatus, MatchedSkill, MissingSkill,
    ResumeSkill, SkillSnapshot,
};

const NONE_PLACEHOLDER: &str = "- None";

pub struct ReportRenderer {
    /// Level shortfall above which a gap warning line is shown.
    level_grace: f64,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self { level_grace: 0.25 }
    }
}

impl ReportRenderer {
    pub fn new(level_grace: f64) -> Self {
        Self { level_grace }
    }

    /// Render the full markdown report.
    pub fn render(&self, analysis: &GapAnalysisResult) -> String {
        let mut out = String::new();

        out.push_str("# Skill Gap Analysis\n\n");
        out.push_str(&format!(
            "**Overall Match:** {:.2}/10\n",
            analysis.metrics.overall_score
        ));

        let (required_matched, nice_matched): (Vec<&MatchedSkill>, Vec<&MatchedSkill>) = analysis
            .matched_skills
            .iter()
            .partition(|s| is_required(&s.snapshot));
        let (required_missing, nice_missing): (Vec<&MissingSkill>, Vec<&MissingSkill>) = analysis
            .missing_skills
            .iter()
            .partition(|s| is_required(&s.snapshot));

        self.push_missing_section(&mut out, "Missing Skills (Required)", &required_missing);
        self.push_missing_section(
            &mut out,
            "Hot Tech Missing (Required)",
            &filtered(&required_missing, |s| s.snapshot.is_hot()),
        );
        self.push_missing_section(
            &mut out,
            "In-demand Missing (Required)",
            &filtered(&required_missing, |s| s.snapshot.is_in_demand()),
        );
        self.push_matched_section(
            &mut out,
            "Underqualified Skills (Required)",
            &status_subset(&required_matched, MatchStatus::Underqualified),
        );
        self.push_matched_section(
            &mut out,
            "Skills Meeting Requirements (Required)",
            &status_subset(&required_matched, MatchStatus::MeetsOrExceeds),
        );
        self.push_missing_section(&mut out, "Nice to Have - Missing Skills", &nice_missing);
        self.push_matched_section(
            &mut out,
            "Nice to Have - Underqualified Skills",
            &status_subset(&nice_matched, MatchStatus::Underqualified),
        );
        self.push_matched_section(
            &mut out,
            "Nice to Have - Skills Meeting Requirements",
            &status_subset(&nice_matched, MatchStatus::MeetsOrExceeds),
        );
        self.push_resume_section(
            &mut out,
            "Resume Skills (All Detected Skills)",
            &analysis.resume_skills,
        );

        out
    }

    /// Render from an untyped payload in either accepted shape.
    pub fn render_value(&self, payload: &Value) -> Result<String> {
        let payload: AnalysisPayload = serde_json::from_value(payload.clone())?;
        Ok(self.render(&payload.normalize()))
    }

    fn push_missing_section(&self, out: &mut String, title: &str, skills: &[&MissingSkill]) {
        push_title(out, title);
        if skills.is_empty() {
            out.push_str(NONE_PLACEHOLDER);
            out.push('\n');
            return;
        }
        for skill in skills {
            out.push_str(&item_line(&skill.snapshot));
            out.push('\n');
        }
    }

    fn push_matched_section(&self, out: &mut String, title: &str, skills: &[&MatchedSkill]) {
        push_title(out, title);
        if skills.is_empty() {
            out.push_str(NONE_PLACEHOLDER);
            out.push('\n');
            return;
        }
        for skill in skills {
            out.push_str(&item_line(&skill.snapshot));
            out.push('\n');
            if let Some(level) = &skill.candidate_level {
                out.push_str(&level_line("Candidate Level", level));
            }
            if let Some(level) = &skill.required_level {
                out.push_str(&level_line("Required Level", level));
            }
            let delta = skill.level_delta.unwrap_or(0.0);
            if delta > self.level_grace {
                out.push_str(&format!(
                    "  \u{26a0}\u{fe0f}  Level Gap: {:.1} points below required\n",
                    delta
                ));
            }
        }
    }

    fn push_resume_section(&self, out: &mut String, title: &str, skills: &[ResumeSkill]) {
        push_title(out, title);
        if skills.is_empty() {
            out.push_str(NONE_PLACEHOLDER);
            out.push('\n');
            return;
        }
        // Older stored payloads may repeat entries.
        let mut seen: Vec<String> = Vec::new();
        for skill in skills {
            let key = skill.snapshot.display_label().to_lowercase();
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            out.push_str(&item_line(&skill.snapshot));
            out.push('\n');
            if let Some(level) = &skill.candidate_level {
                out.push_str(&level_line("Candidate Level", level));
            }
        }
    }
}

fn is_required(snapshot: &SkillSnapshot) -> bool {
    snapshot.is_required != Some(false)
}

fn filtered<'a, T, F: Fn(&T) -> bool>(skills: &[&'a T], keep: F) -> Vec<&'a T> {
    skills.iter().copied().filter(|s| keep(s)).collect()
}

fn status_subset<'a>(skills: &[&'a MatchedSkill], status: MatchStatus) -> Vec<&'a MatchedSkill> {
    skills.iter().copied().filter(|s| s.status == status).collect()
}

fn push_title(out: &mut String, title: &str) {
    out.push_str("\n## ");
    out.push_str(title);
    out.push('\n');
}

fn item_line(snapshot: &SkillSnapshot) -> String {
    let marker = if snapshot.is_hot() {
        "\u{1f525} "
    } else if snapshot.is_in_demand() {
        "\u{1f4c8} "
    } else {
        ""
    };
    let optional = if snapshot.is_required == Some(false) {
        " (optional)"
    } else {
        ""
    };
    format!("- {}{}{}", marker, snapshot.display_label(), optional)
}

fn level_line(caption: &str, level: &LevelSnapshot) -> String {
    let label = level.label.as_deref().unwrap_or("working");
    let score = level.score.unwrap_or(2.0);
    match level.years {
        Some(years) => format!("  {}: {} ({:.1}/4.0), {} yrs\n", caption, label, score, years),
        None => format!("  {}: {} ({:.1}/4.0)\n", caption, label, score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        build_analysis_from_legacy, AnalysisContext, LegacyEntry,
    };
    use serde_json::{json, Map};

    fn matched_entry(name: &str, status: &str, delta: f64, required: bool) -> LegacyEntry {
        LegacyEntry {
            token: Some(name.to_string()),
            matched: Some(json!({"skill_id": name, "name": name, "skill_type": "skill"})),
            score: Some(0.8),
            status: Some(status.to_string()),
            level_delta: Some(delta),
            candidate_level: Some(LevelSnapshot {
                label: Some("working".to_string()),
                score: Some(2.0),
                ..LevelSnapshot::default()
            }),
            required_level: Some(LevelSnapshot {
                label: Some("proficient".to_string()),
                score: Some(3.0),
                ..LevelSnapshot::default()
            }),
            is_required: Some(required),
            ..LegacyEntry::default()
        }
    }

    fn missing_entry(name: &str, hot: bool, required: bool) -> LegacyEntry {
        LegacyEntry {
            token: Some(name.to_string()),
            matched: Some(json!({"skill_id": name, "name": name, "skill_type": "skill"})),
            score: Some(0.7),
            is_hot_tech: Some(hot),
            is_in_demand: Some(false),
            is_required: Some(required),
            ..LegacyEntry::default()
        }
    }

    fn analysis(
        matched: Vec<LegacyEntry>,
        missing: Vec<LegacyEntry>,
        resume: Vec<LegacyEntry>,
    ) -> GapAnalysisResult {
        build_analysis_from_legacy(
            6.0,
            &matched,
            &missing,
            &resume,
            AnalysisContext::default(),
            None,
            Map::new(),
            Map::new(),
        )
    }

    #[test]
    fn all_sections_render_in_fixed_order() {
        let report = ReportRenderer::default().render(&analysis(vec![], vec![], vec![]));

        let titles = [
            "## Missing Skills (Required)",
            "## Hot Tech Missing (Required)",
            "## In-demand Missing (Required)",
            "## Underqualified Skills (Required)",
            "## Skills Meeting Requirements (Required)",
            "## Nice to Have - Missing Skills",
            "## Nice to Have - Underqualified Skills",
            "## Nice to Have - Skills Meeting Requirements",
            "## Resume Skills (All Detected Skills)",
        ];
        let mut last = 0;
        for title in titles {
            let pos = report.find(title).unwrap_or_else(|| panic!("missing {}", title));
            assert!(pos > last, "section out of order: {}", title);
            last = pos;
        }
        assert_eq!(report.matches(NONE_PLACEHOLDER).count(), 9);
    }

    #[test]
    fn header_carries_the_overall_score() {
        let report = ReportRenderer::default().render(&analysis(vec![], vec![], vec![]));
        assert!(report.starts_with("# Skill Gap Analysis"));
        assert!(report.contains("**Overall Match:** 6.00/10"));
    }

    #[test]
    fn hot_tech_missing_appears_twice_with_marker() {
        let report = ReportRenderer::default().render(&analysis(
            vec![],
            vec![missing_entry("Kubernetes", true, true)],
            vec![],
        ));
        assert_eq!(report.matches("- \u{1f525} Kubernetes").count(), 2);
    }

    #[test]
    fn underqualified_match_shows_levels_and_gap() {
        let report = ReportRenderer::default().render(&analysis(
            vec![matched_entry("Rust", "underqualified", 1.0, true)],
            vec![],
            vec![],
        ));

        assert!(report.contains("  Candidate Level: working (2.0/4.0)"));
        assert!(report.contains("  Required Level: proficient (3.0/4.0)"));
        assert!(report.contains("Level Gap: 1.0 points below required"));
    }

    #[test]
    fn gap_within_grace_has_no_warning() {
        let report = ReportRenderer::default().render(&analysis(
            vec![matched_entry("Rust", "meets_or_exceeds", 0.25, true)],
            vec![],
            vec![],
        ));
        assert!(!report.contains("Level Gap"));
    }

    #[test]
    fn optional_skills_go_to_nice_to_have_sections() {
        let report = ReportRenderer::default().render(&analysis(
            vec![matched_entry("Go", "meets_or_exceeds", 0.0, false)],
            vec![missing_entry("Kafka", false, false)],
            vec![],
        ));

        let required_section = &report[report.find("## Missing Skills (Required)").unwrap()
            ..report.find("## Hot Tech Missing (Required)").unwrap()];
        assert!(required_section.contains(NONE_PLACEHOLDER));

        let nice_missing = &report[report.find("## Nice to Have - Missing Skills").unwrap()
            ..report.find("## Nice to Have - Underqualified Skills").unwrap()];
        assert!(nice_missing.contains("- Kafka (optional)"));
    }

    #[test]
    fn resume_section_deduplicates_by_display_name() {
        let resume = vec![
            LegacyEntry {
                token: Some("Python".to_string()),
                ..LegacyEntry::default()
            },
            LegacyEntry {
                token: Some("python".to_string()),
                ..LegacyEntry::default()
            },
        ];
        let report = ReportRenderer::default().render(&analysis(vec![], vec![], resume));
        let section = &report[report.find("## Resume Skills").unwrap()..];
        assert_eq!(section.matches("- Python").count() + section.matches("- python").count(), 1);
    }

    #[test]
    fn legacy_value_payload_renders() {
        let payload = json!({
            "overall_match": 4.0,
            "matched_skills": [],
            "missing_skills": [{"token": "Go", "match": {"skill_id": "s1", "name": "Go", "skill_type": "skill"}}],
            "resume_skills": [],
        });
        let report = ReportRenderer::default().render_value(&payload).unwrap();
        assert!(report.contains("**Overall Match:** 4.00/10"));
        assert!(report.contains("- Go"));
    }
}

//! Offline keyword-based extractor
//!
//! Scans text for known ontology skill names instead of calling an LLM. Used
//! by the CLI and tests; production deployments plug in a remote extractor
//! behind the same [`Extractor`](super::Extractor) trait.

use aho_corasick::AhoCorasick;
use async_trait::async_trait;
use log::debug;
use regex::Regex;

use crate::error::{Result, SkillGapError};
use crate::extraction::{ExtractedDocument, ExtractedSkill, Extractor, LevelEstimate};

const EXTRACTOR_VERSION: &str = "keyword-v1";

pub struct KeywordExtractor {
    matcher: AhoCorasick,
    names: Vec<String>,
    years_re: Regex,
    nice_section_re: Regex,
}

impl KeywordExtractor {
    /// Build an extractor over the given skill vocabulary (typically the
    /// ontology's skill names).
    pub fn new(names: Vec<String>) -> Result<Self> {
        let mut names = names;
        // Longest-first so overlapping names prefer the longer match.
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        names.dedup();

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(aho_corasick::MatchKind::LeftmostLongest)
            .build(&names)
            .map_err(|e| SkillGapError::Extraction(format!("Failed to build matcher: {}", e)))?;

        let years_re = Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*\+?\s*(?:years?|yrs)")
            .map_err(|e| SkillGapError::Extraction(e.to_string()))?;
        let nice_section_re = Regex::new(
            r"(?is)(?:nice\s+to\s+have|preferred|bonus|optional)[\s:]*([^.]*?)(?:\n\n|\n[A-Z]|$)",
        )
        .map_err(|e| SkillGapError::Extraction(e.to_string()))?;

        Ok(Self {
            matcher,
            names,
            years_re,
            nice_section_re,
        })
    }

    /// Character span of the nice-to-have section, if the text has one.
    fn nice_section_span(&self, text: &str) -> Option<(usize, usize)> {
        self.nice_section_re
            .find(text)
            .map(|m| (m.start(), m.end()))
    }

    /// Years of experience mentioned on the line containing `position`.
    fn years_on_line(&self, text: &str, position: usize) -> Option<f64> {
        let line_start = text[..position].rfind('\n').map_or(0, |i| i + 1);
        let line_end = text[position..]
            .find('\n')
            .map_or(text.len(), |i| position + i);
        self.years_re
            .captures(&text[line_start..line_end])
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    }

    fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
        let before_ok = start == 0
            || !text[..start]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let after_ok = end == text.len()
            || !text[end..].chars().next().is_some_and(|c| c.is_alphanumeric());
        before_ok && after_ok
    }

    fn extract_responsibilities(text: &str) -> Vec<String> {
        text.lines()
            .filter_map(|line| {
                let trimmed = line.trim();
                let body = trimmed
                    .strip_prefix("- ")
                    .or_else(|| trimmed.strip_prefix("* "))
                    .or_else(|| trimmed.strip_prefix("\u{2022} "))?;
                let body = body.trim();
                // Skip short bullets; those are usually bare skill names.
                if body.split_whitespace().count() >= 4 {
                    Some(body.to_string())
                } else {
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl Extractor for KeywordExtractor {
    async fn extract(&self, text: &str, is_job_description: bool) -> Result<ExtractedDocument> {
        let nice_span = if is_job_description {
            self.nice_section_span(text)
        } else {
            None
        };

        let mut skills: Vec<ExtractedSkill> = Vec::new();
        let mut seen: Vec<String> = Vec::new();

        for mat in self.matcher.find_iter(text) {
            if !Self::is_word_boundary(text, mat.start(), mat.end()) {
                continue;
            }
            let name = self.names[mat.pattern().as_usize()].clone();
            let key = name.to_lowercase();
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);

            let level = self
                .years_on_line(text, mat.start())
                .map(LevelEstimate::from_years);
            let nice_to_have = nice_span
                .is_some_and(|(start, end)| mat.start() >= start && mat.start() < end);

            skills.push(ExtractedSkill {
                name,
                level,
                nice_to_have,
            });
        }

        let responsibilities = Self::extract_responsibilities(text);
        debug!(
            "Keyword extraction: {} skills, {} responsibilities (jd={})",
            skills.len(),
            responsibilities.len(),
            is_job_description
        );

        Ok(ExtractedDocument {
            skills,
            responsibilities,
        })
    }

    fn version(&self) -> &str {
        EXTRACTOR_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::LevelLabel;

    fn vocabulary() -> Vec<String> {
        vec![
            "Python".to_string(),
            "Rust".to_string(),
            "React.js".to_string(),
            "PostgreSQL".to_string(),
            "Kubernetes".to_string(),
        ]
    }

    #[tokio::test]
    async fn finds_known_skills_case_insensitively() {
        let extractor = KeywordExtractor::new(vocabulary()).unwrap();
        let doc = extractor
            .extract("Built services in python and rust on Kubernetes.", false)
            .await
            .unwrap();

        let names: Vec<&str> = doc.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Python", "Rust", "Kubernetes"]);
    }

    #[tokio::test]
    async fn deduplicates_repeated_mentions() {
        let extractor = KeywordExtractor::new(vocabulary()).unwrap();
        let doc = extractor
            .extract("Python, python and more Python.", false)
            .await
            .unwrap();
        assert_eq!(doc.skills.len(), 1);
    }

    #[tokio::test]
    async fn skips_substring_hits_inside_words() {
        let extractor = KeywordExtractor::new(vocabulary()).unwrap();
        let doc = extractor.extract("Rustacean meetup notes", false).await.unwrap();
        assert!(doc.skills.is_empty());
    }

    #[tokio::test]
    async fn years_on_same_line_set_the_level() {
        let extractor = KeywordExtractor::new(vocabulary()).unwrap();
        let doc = extractor
            .extract("5+ years of Python experience\nRust hobby projects", false)
            .await
            .unwrap();

        let python = doc.skills.iter().find(|s| s.name == "Python").unwrap();
        assert_eq!(python.level.as_ref().unwrap().label, LevelLabel::Proficient);
        assert_eq!(python.level.as_ref().unwrap().years, Some(5.0));

        let rust = doc.skills.iter().find(|s| s.name == "Rust").unwrap();
        assert!(rust.level.is_none());
    }

    #[tokio::test]
    async fn nice_to_have_section_flags_job_skills() {
        let extractor = KeywordExtractor::new(vocabulary()).unwrap();
        let text = "Requirements:\nPython and PostgreSQL\n\nNice to have:\nKubernetes\n";
        let doc = extractor.extract(text, true).await.unwrap();

        let kube = doc.skills.iter().find(|s| s.name == "Kubernetes").unwrap();
        assert!(kube.nice_to_have);
        let python = doc.skills.iter().find(|s| s.name == "Python").unwrap();
        assert!(!python.nice_to_have);
    }

    #[tokio::test]
    async fn bullet_lines_become_responsibilities() {
        let extractor = KeywordExtractor::new(vocabulary()).unwrap();
        let text = "Responsibilities:\n- Design and operate data pipelines\n- Rust\n";
        let doc = extractor.extract(text, true).await.unwrap();
        assert_eq!(doc.responsibilities, vec!["Design and operate data pipelines"]);
    }
}

//! End-to-end gap analysis pipeline
//!
//! Wires extraction, ontology mapping, comparison, scoring, and rendering
//! into one entry point. A failed stage fails the whole run; partial results
//! are never reported as a low score.

use log::{debug, info, warn};
use serde_json::{json, Map, Value};

use crate::analysis::{ComparisonOutput, GapComparator, Scorer};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::extraction::{ExtractedDocument, Extractor, SkillMention};
use crate::matching::{MappingOutcome, OntologyMatcher, SourceType, MAPPER_VERSION};
use crate::ontology::SearchOracle;
use crate::output::ReportRenderer;
use crate::schema::{
    build_analysis_from_legacy, AnalysisContext, GapAnalysisResult, StoredReport,
};

pub const ANALYZER_VERSION: &str = "gap-analyzer-v1";

/// One analysis request: the two documents plus optional context metadata
/// that is stamped into the result for provenance.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub resume_text: String,
    pub job_text: String,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub resume_id: Option<i64>,
    pub job_id: Option<i64>,
    pub processing_run_id: Option<i64>,
}

pub struct GapEngine<E: Extractor, O: SearchOracle> {
    extractor: E,
    matcher: OntologyMatcher<O>,
    comparator: GapComparator,
    scorer: Scorer,
    renderer: ReportRenderer,
    config: EngineConfig,
}

impl<E: Extractor, O: SearchOracle> GapEngine<E, O> {
    pub fn new(extractor: E, oracle: O, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let matcher = OntologyMatcher::new(oracle, config.match_strategy.clone());
        let comparator = GapComparator::new(config.score_weights.clone());
        let scorer = Scorer::new(config.score_weights.clone());
        let renderer = ReportRenderer::new(config.score_weights.level_grace);
        Ok(Self {
            extractor,
            matcher,
            comparator,
            scorer,
            renderer,
            config,
        })
    }

    /// Run the full pipeline and return the canonical analysis.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<GapAnalysisResult> {
        Ok(self.run(request).await?.0)
    }

    /// Run the full pipeline and additionally build the storage row.
    pub async fn analyze_to_storage(
        &self,
        request: &AnalysisRequest,
    ) -> Result<(GapAnalysisResult, StoredReport)> {
        let (analysis, comparison) = self.run(request).await?;
        let stored = StoredReport::from_run(
            analysis.metrics.overall_score,
            &comparison.matched,
            &comparison.missing,
            &comparison.resume_skills,
            &analysis,
        )?;
        Ok((analysis, stored))
    }

    async fn run(&self, request: &AnalysisRequest) -> Result<(GapAnalysisResult, ComparisonOutput)> {
        let resume_doc = self.extractor.extract(&request.resume_text, false).await?;
        let job_doc = self.extractor.extract(&request.job_text, true).await?;
        if job_doc.skills.is_empty() {
            warn!("No skills extracted from job description");
        }

        let resume_mentions = self.resume_mentions(&resume_doc);
        let job_mentions = self.job_mentions(&job_doc);
        debug!(
            "Extracted {} resume mentions, {} job mentions, {} responsibilities",
            resume_mentions.len(),
            job_mentions.len(),
            job_doc.responsibilities.len()
        );

        let resume_outcome = self
            .matcher
            .map_mentions(&resume_mentions, SourceType::Resume, Some(&request.resume_text))
            .await?;
        let job_outcome = self
            .matcher
            .map_mentions(&job_mentions, SourceType::Job, Some(&request.job_text))
            .await?;
        let task_outcome = self
            .matcher
            .map_tasks(&job_doc.responsibilities, Some(&request.job_text))
            .await?;

        let mut job_mapped = job_outcome.mapped.clone();
        job_mapped.extend(task_outcome.mapped.iter().cloned());

        let comparison = self.comparator.compare(&resume_outcome.mapped, &job_mapped);
        let score = self.scorer.score(&comparison.matched, &comparison.missing);

        let context = AnalysisContext {
            resume_id: request.resume_id,
            job_id: request.job_id,
            processing_run_id: request.processing_run_id,
            job_title: request.job_title.clone(),
            company: request.company.clone(),
            extractor_version: Some(self.extractor.version().to_string()),
            analyzer_version: Some(ANALYZER_VERSION.to_string()),
            mapper_version: Some(MAPPER_VERSION.to_string()),
            ..AnalysisContext::default()
        };

        let diagnostics = self.diagnostics(&resume_outcome, &job_outcome, &task_outcome, &comparison)?;

        let mut analysis = build_analysis_from_legacy(
            score,
            &comparison.matched,
            &comparison.missing,
            &comparison.resume_skills,
            context,
            None,
            diagnostics,
            Map::new(),
        );
        analysis.report_markdown = Some(self.renderer.render(&analysis));

        info!(
            "Analysis complete: score {:.2}, {} matched, {} missing",
            score,
            analysis.metrics.matched_skill_count,
            analysis.metrics.missing_skill_count
        );
        Ok((analysis, comparison))
    }

    fn resume_mentions(&self, doc: &ExtractedDocument) -> Vec<SkillMention> {
        doc.skills
            .iter()
            .map(|skill| SkillMention::new(skill.name.clone(), skill.level.clone(), None))
            .collect()
    }

    /// Job mentions carry requirement semantics: skills from a nice-to-have
    /// section become optional, and their implied levels are clamped unless
    /// the posting states explicit years.
    fn job_mentions(&self, doc: &ExtractedDocument) -> Vec<SkillMention> {
        let parse_nice = self.config.extraction.parse_nice_to_have;
        let cap_nice = self.config.extraction.cap_nice_to_have;

        doc.skills
            .iter()
            .map(|skill| {
                let nice = parse_nice && skill.nice_to_have;
                let mut level = skill.level.clone();
                if nice && cap_nice {
                    if let Some(l) = level.take() {
                        level = Some(if l.years.is_some() { l } else { l.capped_at_working() });
                    }
                }
                SkillMention::new(skill.name.clone(), level, Some(!nice))
            })
            .collect()
    }

    fn diagnostics(
        &self,
        resume: &MappingOutcome,
        job: &MappingOutcome,
        tasks: &MappingOutcome,
        comparison: &ComparisonOutput,
    ) -> Result<Map<String, Value>> {
        fn summary(outcome: &MappingOutcome) -> Value {
            json!({
                "accepted": outcome.total_accepted(),
                "dropped": outcome.total_dropped(),
                "ambiguous": outcome.total_ambiguous(),
                "average_cutoff": outcome.average_cutoff(),
            })
        }

        let mut diagnostics = Map::new();
        diagnostics.insert("strategy_params".to_string(), self.matcher.strategy_params());
        diagnostics.insert(
            "mapping".to_string(),
            json!({
                "resume": summary(resume),
                "job": summary(job),
                "tasks": summary(tasks),
            }),
        );
        diagnostics.insert(
            "comparison".to_string(),
            serde_json::to_value(&comparison.diagnostics)?,
        );
        Ok(diagnostics)
    }
}

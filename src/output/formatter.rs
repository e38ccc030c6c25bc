//! Output formatters for the analysis result

use colored::{Color, Colorize};

use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::report::ReportRenderer;
use crate::schema::{analysis_to_transport_payload, GapAnalysisResult, MatchStatus};

/// Trait for turning an analysis into printable output.
pub trait OutputFormatter {
    fn format(&self, analysis: &GapAnalysisResult) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Console formatter with a colored summary followed by the full report.
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// JSON formatter emitting the canonical transport payload.
pub struct JsonFormatter {
    pretty: bool,
}

/// Markdown formatter emitting the rendered gap report.
pub struct MarkdownFormatter;

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn score_color(score: f64) -> Color {
        if score >= 7.5 {
            Color::Green
        } else if score >= 5.0 {
            Color::Yellow
        } else {
            Color::Red
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, analysis: &GapAnalysisResult) -> Result<String> {
        let mut output = String::new();
        let metrics = &analysis.metrics;

        if let Some(title) = &analysis.context.job_title {
            let line = match &analysis.context.company {
                Some(company) => format!("{} @ {}", title, company),
                None => title.clone(),
            };
            output.push_str(&format!("{}\n", self.colorize(&line, Color::Cyan)));
        }

        let score_text = format!("Overall Match: {:.2}/10", metrics.overall_score);
        output.push_str(&format!(
            "{}\n",
            self.colorize(&score_text, Self::score_color(metrics.overall_score))
        ));
        output.push_str(&format!(
            "Matched: {} | Missing: {} | Underqualified: {} | Resume skills: {}\n",
            metrics.matched_skill_count,
            metrics.missing_skill_count,
            metrics.underqualified_skill_count,
            metrics.resume_skill_count
        ));

        if self.detailed {
            let weak: Vec<&str> = analysis
                .matched_skills
                .iter()
                .filter(|s| s.status == MatchStatus::Underqualified)
                .map(|s| s.snapshot.display_label())
                .collect();
            if !weak.is_empty() {
                output.push_str(&format!(
                    "{} {}\n",
                    self.colorize("Needs leveling up:", Color::Yellow),
                    weak.join(", ")
                ));
            }
        }

        output.push('\n');
        match &analysis.report_markdown {
            Some(report) => output.push_str(report),
            None => output.push_str(&ReportRenderer::default().render(analysis)),
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, analysis: &GapAnalysisResult) -> Result<String> {
        let payload = analysis_to_transport_payload(analysis)?;
        if self.pretty {
            Ok(serde_json::to_string_pretty(&payload)?)
        } else {
            Ok(serde_json::to_string(&payload)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format(&self, analysis: &GapAnalysisResult) -> Result<String> {
        Ok(match &analysis.report_markdown {
            Some(report) => report.clone(),
            None => ReportRenderer::default().render(analysis),
        })
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

/// Formatter matching the configured output format.
pub fn formatter_for(format: OutputFormat, color: bool, detailed: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Console => Box::new(ConsoleFormatter::new(color, detailed)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis() -> GapAnalysisResult {
        let mut analysis = GapAnalysisResult::default();
        analysis.metrics.overall_score = 6.0;
        analysis.context.job_title = Some("Backend Engineer".to_string());
        analysis.report_markdown = Some("# Skill Gap Analysis\n".to_string());
        analysis
    }

    #[test]
    fn console_output_without_colors_is_plain() {
        let output = ConsoleFormatter::new(false, false).format(&analysis()).unwrap();
        assert!(output.contains("Backend Engineer"));
        assert!(output.contains("Overall Match: 6.00/10"));
        assert!(output.contains("# Skill Gap Analysis"));
        assert!(!output.contains("\u{1b}["));
    }

    #[test]
    fn json_output_is_canonical_payload() {
        let output = JsonFormatter::new(false).format(&analysis()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["version"], "1.0.0");
        assert!(value.get("analysis_id").is_none());
    }

    #[test]
    fn markdown_output_prefers_stored_report() {
        let output = MarkdownFormatter.format(&analysis()).unwrap();
        assert_eq!(output, "# Skill Gap Analysis\n");
    }
}

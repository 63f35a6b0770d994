use crate::core::{display_path, HealthStatus, Severity};
use crate::pipeline::AnalysisResult;
use colored::*;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Terminal,
}

pub trait OutputWriter {
    fn write_result(&mut self, result: &AnalysisResult) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_result(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(result)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

/// Human-readable summary. Color follows the `colored` global switch.
pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_header(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", "Repository Vitals".bold().blue())?;
        writeln!(self.writer, "{}", "=================".blue())?;
        writeln!(self.writer, "Root: {}", result.root.display())?;
        writeln!(
            self.writer,
            "Generated: {}",
            result.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_metrics(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        let metrics = &result.metrics;
        writeln!(self.writer, "{}", "Metrics:".bold())?;
        self.write_score("Complexity", metrics.complexity)?;
        self.write_score("Documentation", metrics.documentation)?;
        self.write_score("Coverage", metrics.coverage)?;
        self.write_score("YAGNI", metrics.yagni)?;
        writeln!(self.writer, "  Tech debt: {:.1}", metrics.tech_debt)?;
        writeln!(
            self.writer,
            "  External dependencies: {}",
            metrics.dependencies
        )?;
        let v = &metrics.vulnerabilities;
        writeln!(
            self.writer,
            "  Vulnerabilities: {} critical, {} high, {} medium, {} low",
            v.critical, v.high, v.medium, v.low
        )?;
        writeln!(
            self.writer,
            "  Files analyzed: {} (skipped: {}{})",
            result.files_analyzed,
            result.files_skipped(),
            if result.files_truncated {
                ", file limit reached"
            } else {
                ""
            }
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_score(&mut self, label: &str, score: Option<f64>) -> anyhow::Result<()> {
        let rendered = match score {
            Some(s) if s >= 80.0 => format!("{s:.1}").green(),
            Some(s) if s >= 50.0 => format!("{s:.1}").yellow(),
            Some(s) => format!("{s:.1}").red(),
            None => "unavailable".dimmed(),
        };
        writeln!(self.writer, "  {label}: {rendered}")?;
        Ok(())
    }

    fn write_modules(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        writeln!(
            self.writer,
            "{} (overall health {:.2})",
            "Modules:".bold(),
            result.overall_health
        )?;
        for module in &result.modules {
            let status = match module.health_status() {
                HealthStatus::Critical => "critical".red(),
                HealthStatus::Warning => "warning".yellow(),
                HealthStatus::Healthy => "healthy".green(),
                HealthStatus::Optimal => "optimal".bright_green(),
            };
            writeln!(
                self.writer,
                "  {:<24} {:>8} lines  health {:.2}  {}",
                module.name, module.size, module.health, status
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_hotspots(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        let Some(complexity) = result.summaries.complexity_details() else {
            return Ok(());
        };
        if complexity.high_complexity_functions.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "{}", "Complexity hotspots:".bold().yellow())?;
        for function in &complexity.high_complexity_functions {
            writeln!(
                self.writer,
                "  {}:{} {} complexity {} ({})",
                display_path(&function.file),
                function.line,
                function.name,
                function.complexity,
                function.rank.letter()
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_issues(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        if result.issues.is_empty() {
            writeln!(self.writer, "{}", "No issues found".green())?;
            return Ok(());
        }
        writeln!(self.writer, "{} ({}):", "Issues".bold(), result.issues.len())?;
        for issue in &result.issues {
            let severity = match issue.severity {
                Severity::High => issue.severity.to_string().red(),
                Severity::Medium => issue.severity.to_string().yellow(),
                Severity::Low => issue.severity.to_string().normal(),
            };
            writeln!(
                self.writer,
                "  [{}] {}:{} {}",
                severity,
                display_path(&issue.file),
                issue.line,
                issue.message
            )?;
        }
        if result.cycles_truncated {
            writeln!(
                self.writer,
                "  {}",
                "Cycle list truncated at the configured limit".dimmed()
            )?;
        }
        Ok(())
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_result(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        self.write_header(result)?;
        self.write_metrics(result)?;
        self.write_modules(result)?;
        self.write_hotspots(result)?;
        self.write_issues(result)?;
        Ok(())
    }
}

pub fn create_writer(format: OutputFormat, writer: Box<dyn Write>) -> Box<dyn OutputWriter> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer)),
    }
}

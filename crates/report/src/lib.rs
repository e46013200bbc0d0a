//! Plain-text match analysis report.
//!
//! Renders the results of one batch into the fixed report layout and writes
//! it under its dated download filename.

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use skillmatch_model::MatchScore;
use skillmatch_request::JobDescription;
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use thiserror::Error;

const RULE_HEAVY: &str = "================================================================================";
const RULE_LIGHT: &str = "--------------------------------------------------------------------------------";
const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One résumé's line in the report.
#[derive(Debug, Clone, Copy)]
pub struct ReportEntry<'a> {
    pub filename: &'a str,
    pub score: &'a MatchScore,
}

/// Aggregate figures over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub average: f64,
    pub highest: f64,
    pub lowest: f64,
    /// Résumés whose remote scoring failed
    pub failed_items: usize,
}

/// Summarize overall scores. An empty batch summarizes to zeros.
pub fn summarize(entries: &[ReportEntry<'_>]) -> ReportSummary {
    if entries.is_empty() {
        return ReportSummary::default();
    }

    let overall: Vec<f64> = entries.iter().map(|e| e.score.overall).collect();

    ReportSummary {
        total: entries.len(),
        average: overall.iter().sum::<f64>() / overall.len() as f64,
        highest: overall.iter().copied().fold(f64::MIN, f64::max),
        lowest: overall.iter().copied().fold(f64::MAX, f64::min),
        failed_items: entries.iter().filter(|e| e.score.error.is_some()).count(),
    }
}

/// Download filename for a report generated on `date`.
pub fn report_filename(date: NaiveDate) -> String {
    format!("resume-match-report-{}.txt", date.format("%Y-%m-%d"))
}

/// Timestamp in the en-US locale form, e.g. `10/18/2026, 9:05:03 PM`.
fn locale_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

fn preview(content: &str) -> String {
    let head: String = content.chars().take(PREVIEW_CHARS).collect();
    format!("{head}...")
}

/// Render the full report.
pub fn render_report<Tz: TimeZone>(job: &JobDescription, entries: &[ReportEntry<'_>], generated_at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report_body(&mut out, job, entries, &locale_timestamp(generated_at));
    out
}

fn write_report_body(
    out: &mut String,
    job: &JobDescription,
    entries: &[ReportEntry<'_>],
    timestamp: &str,
) -> fmt::Result {
    writeln!(out, "{RULE_HEAVY}")?;
    writeln!(out, "RESUME MATCH ANALYSIS REPORT")?;
    writeln!(out, "{RULE_HEAVY}")?;
    writeln!(out)?;
    writeln!(out, "Generated At: {timestamp}")?;
    writeln!(out)?;

    let (source, filename) = match &job.file {
        Some(file) => ("Uploaded File", file.filename.as_str()),
        None => ("Manual Text", "Manual Entry"),
    };
    writeln!(out, "{RULE_LIGHT}")?;
    writeln!(out, "JOB DESCRIPTION DETAILS")?;
    writeln!(out, "{RULE_LIGHT}")?;
    writeln!(out, "Source: {source}")?;
    writeln!(out, "Filename: {filename}")?;
    writeln!(out, "Content Preview: {}", preview(&job.content()))?;
    writeln!(out)?;

    let summary = summarize(entries);
    writeln!(out, "{RULE_LIGHT}")?;
    writeln!(out, "SUMMARY")?;
    writeln!(out, "{RULE_LIGHT}")?;
    writeln!(out, "Total Resumes Analyzed: {}", summary.total)?;
    writeln!(out, "Average Match Percentage: {:.1}%", summary.average)?;
    writeln!(out, "Highest Match: {:.0}%", summary.highest)?;
    writeln!(out, "Lowest Match: {:.0}%", summary.lowest)?;
    writeln!(out)?;

    for (i, entry) in entries.iter().enumerate() {
        let score = entry.score;
        writeln!(out, "{RULE_HEAVY}")?;
        writeln!(out, "RESUME {}: {}", i + 1, entry.filename)?;
        writeln!(out, "{RULE_HEAVY}")?;
        writeln!(out, "Overall Match: {:.0}%", score.overall)?;
        writeln!(
            out,
            "Skills Matched: {} / {} ({:.0}%)",
            score.skills_matched, score.total_skills, score.skill_coverage
        )?;
        writeln!(out, "Experience Match: {:.0}%", score.experience_fit)?;
        writeln!(out, "Education Match: {:.0}%", score.education_fit)?;
        writeln!(out, "Certifications Match: {:.0}%", score.certification_fit)?;
        writeln!(out, "Role Match: {:.0}%", score.role_fit)?;
        writeln!(out)?;
        writeln!(out, "Explanation:")?;
        writeln!(out, "{}", score.explanation)?;
        writeln!(out)?;
        writeln!(out, "Skill Analysis:")?;
        for skill in &score.skill_tree {
            writeln!(out, "  - {}: {}", skill.skill_name, skill.match_status)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{RULE_HEAVY}")?;
    writeln!(out, "END OF REPORT")?;
    writeln!(out, "{RULE_HEAVY}")?;

    Ok(())
}

/// Write a rendered report into `dir` under its dated filename.
pub fn write_report(dir: &Path, content: &str, date: NaiveDate) -> Result<PathBuf, ReportError> {
    let path = dir.join(report_filename(date));

    std::fs::create_dir_all(dir)
        .and_then(|()| std::fs::write(&path, content))
        .map_err(|source| ReportError::Write {
            path: path.clone(),
            source,
        })?;

    tracing::info!(path = %path.display(), bytes = content.len(), "Wrote match report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use skillmatch_model::{ScoreSource, SkillTreeEntry};
    use skillmatch_request::UploadedFile;

    fn score(overall: f64, error: Option<&str>) -> MatchScore {
        MatchScore {
            source: ScoreSource::Remote,
            overall,
            major_skill_coverage: 100.0,
            skill_coverage: 50.0,
            experience_fit: 60.0,
            education_fit: 80.0,
            certification_fit: 0.0,
            role_fit: 75.0,
            skills_matched: 1,
            total_skills: 2,
            matched_major_skills: vec!["Design".into()],
            matched_skills: vec!["Figma".into()],
            missing_major_skills: vec![],
            missing_skills: vec!["Sketch".into()],
            skill_tree: vec![SkillTreeEntry::new("Figma", "matched"), SkillTreeEntry::new("Sketch", "missing")],
            explanation: "Good tooling overlap.".into(),
            error: error.map(String::from),
        }
    }

    #[test]
    fn test_report_filename() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(report_filename(date), "resume-match-report-2026-03-07.txt");
    }

    #[test]
    fn test_summarize() {
        let (a, b) = (score(77.0, None), score(40.0, Some("timeout")));
        let entries = [
            ReportEntry { filename: "a.pdf", score: &a },
            ReportEntry { filename: "b.pdf", score: &b },
        ];
        let summary = summarize(&entries);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.average, 58.5);
        assert_eq!(summary.highest, 77.0);
        assert_eq!(summary.lowest, 40.0);
        assert_eq!(summary.failed_items, 1);
        assert_eq!(summarize(&[]), ReportSummary::default());
    }

    #[test]
    fn test_render_manual_text_report() {
        let job = JobDescription::from_text("Product designer");
        let a = score(77.0, None);
        let entries = [ReportEntry { filename: "alice.pdf", score: &a }];
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 21, 5, 3).unwrap();

        let expected = "\
================================================================================
RESUME MATCH ANALYSIS REPORT
================================================================================

Generated At: 10/18/2026, 9:05:03 PM

--------------------------------------------------------------------------------
JOB DESCRIPTION DETAILS
--------------------------------------------------------------------------------
Source: Manual Text
Filename: Manual Entry
Content Preview: Product designer...

--------------------------------------------------------------------------------
SUMMARY
--------------------------------------------------------------------------------
Total Resumes Analyzed: 1
Average Match Percentage: 77.0%
Highest Match: 77%
Lowest Match: 77%

================================================================================
RESUME 1: alice.pdf
================================================================================
Overall Match: 77%
Skills Matched: 1 / 2 (50%)
Experience Match: 60%
Education Match: 80%
Certifications Match: 0%
Role Match: 75%

Explanation:
Good tooling overlap.

Skill Analysis:
  - Figma: matched
  - Sketch: missing

================================================================================
END OF REPORT
================================================================================
";
        assert_eq!(render_report(&job, &entries, &at), expected);
    }

    #[test]
    fn test_uploaded_file_preview_is_truncated() {
        let body = "x".repeat(450);
        let job = JobDescription::from_file(UploadedFile::new("jd.txt", body.into_bytes()));
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 8, 0, 0).unwrap();
        let report = render_report(&job, &[], &at);

        assert!(report.contains("Source: Uploaded File\nFilename: jd.txt\n"));
        assert!(report.contains(&format!("Content Preview: {}...\n", "x".repeat(200))));
        assert!(report.contains("Generated At: 1/2/2026, 8:00:00 AM"));
    }

    #[test]
    fn test_write_report() {
        let dir = std::env::temp_dir().join(format!("skillmatch-report-{}", std::process::id()));
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let path = write_report(&dir, "body", date).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "body");
        assert!(path.ends_with("resume-match-report-2026-10-18.txt"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}

//! Explanation generation for résumé match scores.
//!
//! Converts locally computed scores into human-readable explanations, and
//! records why a remote score was not used.

use serde::{Deserialize, Serialize};
use skillmatch_model::MatchScore;

/// Coarse fit level for one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitLevel {
    Strong,
    Moderate,
    Weak,
}

impl FitLevel {
    pub fn from_overall(overall: f64) -> Self {
        if overall >= 75.0 {
            Self::Strong
        } else if overall >= 50.0 {
            Self::Moderate
        } else {
            Self::Weak
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Strong => "STRONG MATCH",
            Self::Moderate => "MODERATE MATCH",
            Self::Weak => "WEAK MATCH",
        }
    }
}

/// Experience figures behind a local experience fit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExperienceEvidence {
    pub candidate_years: f64,
    pub required_years: f64,
}

/// Explain a locally computed score.
pub fn explain_local(score: &MatchScore, experience: ExperienceEvidence) -> String {
    let required_majors = score.matched_major_skills.len() + score.missing_major_skills.len();

    let mut parts = vec![format!(
        "Local estimate: matched {} of {} required major skills and {} of {} required skills.",
        score.matched_major_skills.len(),
        required_majors,
        score.skills_matched,
        score.total_skills
    )];

    parts.push(if experience.required_years > 0.0 {
        format!(
            "Candidate has {} of {} required years of experience.",
            format_years(experience.candidate_years),
            format_years(experience.required_years)
        )
    } else if experience.candidate_years > 0.0 {
        format!(
            "No minimum experience required; candidate has {} years.",
            format_years(experience.candidate_years)
        )
    } else {
        "No experience required or reported.".to_string()
    });

    if !score.missing_major_skills.is_empty() {
        parts.push(format!("Missing major skills: {}.", score.missing_major_skills.join(", ")));
    }
    if !score.missing_skills.is_empty() {
        parts.push(format!("Missing skills: {}.", score.missing_skills.join(", ")));
    }

    parts.push("Education, certification and role fit require the AI scoring service.".to_string());

    parts.join(" ")
}

/// Prefix an explanation with the reason the remote score was not used.
pub fn with_remote_failure(explanation: &str, error: &str) -> String {
    format!("AI scoring failed ({error}); showing local estimate. {explanation}")
}

/// One-line summary of a score.
pub fn summarize_fit(score: &MatchScore) -> String {
    let level = FitLevel::from_overall(score.overall);
    let mut summary = format!("{}: {:.0}% overall ({})", level.label(), score.overall, score.source);

    if let Some(error) = &score.error {
        summary.push_str(&format!(" [remote error: {error}]"));
    }

    summary
}

fn format_years(years: f64) -> String {
    if years.fract() == 0.0 {
        format!("{years:.0}")
    } else {
        format!("{years:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillmatch_model::ScoreSource;

    fn local_score() -> MatchScore {
        MatchScore {
            source: ScoreSource::Local,
            overall: 77.0,
            major_skill_coverage: 100.0,
            skill_coverage: 50.0,
            experience_fit: 60.0,
            education_fit: 0.0,
            certification_fit: 0.0,
            role_fit: 0.0,
            skills_matched: 1,
            total_skills: 2,
            matched_major_skills: vec!["Design".into()],
            matched_skills: vec!["Figma".into()],
            missing_major_skills: vec![],
            missing_skills: vec!["Sketch".into()],
            skill_tree: vec![],
            explanation: String::new(),
            error: None,
        }
    }

    #[test]
    fn test_explain_local() {
        let text = explain_local(
            &local_score(),
            ExperienceEvidence {
                candidate_years: 3.0,
                required_years: 5.0,
            },
        );
        assert!(text.contains("matched 1 of 1 required major skills and 1 of 2 required skills"));
        assert!(text.contains("3 of 5 required years"));
        assert!(text.contains("Missing skills: Sketch."));
    }

    #[test]
    fn test_remote_failure_prefix() {
        let text = with_remote_failure("Local estimate: ...", "timeout");
        assert!(text.starts_with("AI scoring failed (timeout)"));
    }

    #[test]
    fn test_fit_level() {
        assert_eq!(FitLevel::from_overall(77.0), FitLevel::Strong);
        assert_eq!(FitLevel::from_overall(55.0), FitLevel::Moderate);
        assert_eq!(FitLevel::from_overall(10.0), FitLevel::Weak);
        assert!(summarize_fit(&local_score()).starts_with("STRONG MATCH: 77% overall (local)"));
    }
}

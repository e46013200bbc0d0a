//! Core domain model for skillmatch résumé analysis.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `SkillRecord` / `MajorSkillRecord`: the canonical two-level skills taxonomy
//! - `ParsedCandidateProfile`: what résumé parsing extracted from one résumé
//! - `JobRequirement`: what a job posting asks for
//! - `MatchScore`: the reconciled fit of one résumé against one job
//! - `RemoteMatchOutcome`: the validated shape of a remote scoring result

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Unknown registry kind: {0}")]
    UnknownRegistryKind(String),
}

/// A leaf taxonomy entry. Every skill belongs to exactly one major skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub id: u64,
    pub name: String,
    pub major_skill_id: u64,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl SkillRecord {
    pub fn new(id: u64, name: impl Into<String>, major_skill_id: u64) -> Self {
        Self {
            id,
            name: name.into(),
            major_skill_id,
            active: true,
        }
    }
}

/// A parent taxonomy entry grouping skills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MajorSkillRecord {
    pub id: u64,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl MajorSkillRecord {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            active: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Which taxonomy registry a lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryKind {
    Skill,
    MajorSkill,
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skill => f.write_str("skill"),
            Self::MajorSkill => f.write_str("major_skill"),
        }
    }
}

impl FromStr for RegistryKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "skill" | "skills" => Ok(Self::Skill),
            "major_skill" | "major_skills" | "majorskill" => Ok(Self::MajorSkill),
            _ => Err(ModelError::UnknownRegistryKind(s.to_string())),
        }
    }
}

/// A snapshot of both taxonomy registries as fetched from the taxonomy service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomySnapshot {
    #[serde(default)]
    pub skills: Vec<SkillRecord>,
    #[serde(default)]
    pub major_skills: Vec<MajorSkillRecord>,
}

/// Parse years of experience from free text such as `"0-1 Years"` or `"8+ Years"`.
///
/// Takes the first integer token. Absent or unparseable text yields 0.
pub fn parse_experience_years(text: &str) -> f64 {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits.parse::<f64>().unwrap_or(0.0)
}

/// Accepts either a number or the free-text form of an experience field.
fn deserialize_experience<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Missing(Option<()>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n,
        Raw::Text(text) => parse_experience_years(&text),
        Raw::Missing(_) => 0.0,
    })
}

/// Output of résumé parsing for a single résumé.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedCandidateProfile {
    #[serde(default)]
    pub skill_names: Vec<String>,

    #[serde(default)]
    pub major_skill_names: Vec<String>,

    /// Authoritative skill IDs; when present, name matching is skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_skill_ids: Option<Vec<u64>>,

    /// Authoritative major skill IDs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_major_skill_ids: Option<Vec<u64>>,

    #[serde(default, deserialize_with = "deserialize_experience")]
    pub experience_years: f64,
}

impl ParsedCandidateProfile {
    pub fn new(skill_names: Vec<String>, major_skill_names: Vec<String>) -> Self {
        Self {
            skill_names,
            major_skill_names,
            ..Default::default()
        }
    }

    pub fn with_experience_years(mut self, years: f64) -> Self {
        self.experience_years = years;
        self
    }

    /// Set experience from résumé text like `"3-5 Years"`.
    pub fn with_experience_text(mut self, text: &str) -> Self {
        self.experience_years = parse_experience_years(text);
        self
    }

    pub fn with_matched_skill_ids(mut self, ids: Vec<u64>) -> Self {
        self.matched_skill_ids = Some(ids);
        self
    }

    pub fn with_matched_major_skill_ids(mut self, ids: Vec<u64>) -> Self {
        self.matched_major_skill_ids = Some(ids);
        self
    }
}

/// What a job posting requires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRequirement {
    #[serde(default)]
    pub major_skill_names: Vec<String>,

    #[serde(default)]
    pub skill_names: Vec<String>,

    #[serde(default, deserialize_with = "deserialize_experience")]
    pub experience_years: f64,
}

impl JobRequirement {
    pub fn new(major_skill_names: Vec<String>, skill_names: Vec<String>, experience_years: f64) -> Self {
        Self {
            major_skill_names,
            skill_names,
            experience_years,
        }
    }
}

/// Where a match score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    /// Authoritative AI scoring service
    Remote,
    /// Weighted local heuristic
    Local,
}

impl fmt::Display for ScoreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => f.write_str("remote"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// One line of a skill-by-skill analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillTreeEntry {
    pub skill_name: String,
    pub match_status: String,
}

pub const STATUS_MATCHED: &str = "matched";
pub const STATUS_MISSING: &str = "missing";

impl SkillTreeEntry {
    pub fn new(skill_name: impl Into<String>, match_status: impl Into<String>) -> Self {
        Self {
            skill_name: skill_name.into(),
            match_status: match_status.into(),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.match_status.trim().eq_ignore_ascii_case(STATUS_MATCHED)
    }
}

/// Clamp a percentage into `[0, 100]`. Non-finite input becomes 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// The reconciled fit of one résumé against one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub source: ScoreSource,
    pub overall: f64,
    pub major_skill_coverage: f64,
    pub skill_coverage: f64,
    pub experience_fit: f64,
    pub education_fit: f64,
    pub certification_fit: f64,
    pub role_fit: f64,

    /// Count of required skills matched
    pub skills_matched: u32,
    /// Count of required skills considered
    pub total_skills: u32,

    #[serde(default)]
    pub matched_major_skills: Vec<String>,
    #[serde(default)]
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub missing_major_skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,

    #[serde(default)]
    pub skill_tree: Vec<SkillTreeEntry>,

    pub explanation: String,

    /// Set when the remote service failed for this résumé.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A single résumé result as the remote service sends it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireMatchResult {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub match_percentage: f64,
    #[serde(default)]
    pub skills_matched: u32,
    #[serde(default)]
    pub total_skills: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_coverage: Option<f64>,
    #[serde(default)]
    pub experience_match: f64,
    #[serde(default)]
    pub education_match: f64,
    #[serde(default)]
    pub certifications_match: f64,
    #[serde(default)]
    pub role_match: f64,
    #[serde(default)]
    pub skill_tree: Vec<SkillTreeEntry>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response body of the remote scoring call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireMatchResponse {
    #[serde(default)]
    pub resumes: Vec<WireMatchResult>,
}

/// A successful remote result, validated at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteMatchResult {
    pub filename: String,
    pub match_percentage: f64,
    pub skills_matched: u32,
    pub total_skills: u32,
    pub skill_coverage: Option<f64>,
    pub experience_match: f64,
    pub education_match: f64,
    pub certifications_match: f64,
    pub role_match: f64,
    pub skill_tree: Vec<SkillTreeEntry>,
    pub explanation: String,
}

/// A remote result that reported a failure for its résumé.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteMatchError {
    pub filename: String,
    pub error: String,
}

/// Validated remote outcome for one résumé.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum RemoteMatchOutcome {
    Matched(RemoteMatchResult),
    Failed(RemoteMatchError),
}

impl RemoteMatchOutcome {
    pub fn failed(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Failed(RemoteMatchError {
            filename: filename.into(),
            error: error.into(),
        })
    }

    pub fn filename(&self) -> &str {
        match self {
            Self::Matched(result) => &result.filename,
            Self::Failed(failure) => &failure.filename,
        }
    }
}

impl From<WireMatchResult> for RemoteMatchOutcome {
    fn from(wire: WireMatchResult) -> Self {
        if let Some(error) = wire.error.filter(|e| !e.trim().is_empty()) {
            return Self::Failed(RemoteMatchError {
                filename: wire.filename,
                error,
            });
        }

        Self::Matched(RemoteMatchResult {
            filename: wire.filename,
            match_percentage: clamp_percent(wire.match_percentage),
            skills_matched: wire.skills_matched.min(wire.total_skills),
            total_skills: wire.total_skills,
            skill_coverage: wire.skill_coverage.map(clamp_percent),
            experience_match: clamp_percent(wire.experience_match),
            education_match: clamp_percent(wire.education_match),
            certifications_match: clamp_percent(wire.certifications_match),
            role_match: clamp_percent(wire.role_match),
            skill_tree: wire.skill_tree,
            explanation: wire.explanation,
        })
    }
}

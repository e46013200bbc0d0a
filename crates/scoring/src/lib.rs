//! Match scoring for résumés against a job.
//!
//! Resolves parsed names into taxonomy IDs, computes the weighted local fit
//! score, and reconciles it against an optional remote (AI) result:
//! - `ResolvedProfile` / `ResolvedJob`: ID sets produced from the taxonomy
//! - `compute_local`: coverage and fit percentages from those sets
//! - `reconcile`: remote wins when it succeeded, local otherwise

use skillmatch_explain::{explain_local, with_remote_failure, ExperienceEvidence};
use skillmatch_model::{
    clamp_percent, JobRequirement, MatchScore, ParsedCandidateProfile, RegistryKind, RemoteMatchOutcome,
    RemoteMatchResult, ScoreSource, SkillTreeEntry, STATUS_MATCHED, STATUS_MISSING,
};
use skillmatch_taxonomy::{names_equivalent, TaxonomyIndex};
use std::collections::BTreeSet;

/// Weights of the local overall score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub major_skill: f64,
    pub skill: f64,
    pub experience: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            major_skill: 0.5,
            skill: 0.3,
            experience: 0.2,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.major_skill + self.skill + self.experience
    }
}

/// A required job item and the taxonomy ID it resolved to, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredItem {
    pub name: String,
    pub id: Option<u64>,
}

/// A job requirement with its names resolved against one taxonomy snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedJob {
    pub major_skills: Vec<RequiredItem>,
    pub skills: Vec<RequiredItem>,
    pub experience_years: f64,
}

impl ResolvedJob {
    pub fn resolve(job: &JobRequirement, index: &TaxonomyIndex) -> Self {
        Self {
            major_skills: required_items(&job.major_skill_names, RegistryKind::MajorSkill, index),
            skills: required_items(&job.skill_names, RegistryKind::Skill, index),
            experience_years: job.experience_years,
        }
    }

    /// Number of distinct taxonomy IDs among the required major skills.
    pub fn major_skill_id_count(&self) -> usize {
        resolved_count(&self.major_skills)
    }

    /// Number of distinct taxonomy IDs among the required skills.
    pub fn skill_id_count(&self) -> usize {
        resolved_count(&self.skills)
    }
}

fn resolved_count(items: &[RequiredItem]) -> usize {
    items.iter().filter(|item| item.id.is_some()).count()
}

/// Deduplicate required names, keeping the first spelling.
///
/// Resolved names collapse by taxonomy ID, unresolved ones by name
/// equivalence. Unresolved names stay listed so they can be reported missing.
fn required_items(names: &[String], kind: RegistryKind, index: &TaxonomyIndex) -> Vec<RequiredItem> {
    let mut items: Vec<RequiredItem> = Vec::with_capacity(names.len());

    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            continue;
        }
        let id = index.lookup(trimmed, kind);
        let duplicate = items.iter().any(|item| match (item.id, id) {
            (Some(a), Some(b)) => a == b,
            (None, None) => names_equivalent(&item.name, trimmed),
            _ => false,
        });
        if !duplicate {
            items.push(RequiredItem {
                name: trimmed.to_string(),
                id,
            });
        }
    }

    items
}

/// A candidate profile reduced to taxonomy ID sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedProfile {
    pub major_skill_ids: BTreeSet<u64>,
    pub skill_ids: BTreeSet<u64>,
    pub experience_years: f64,
}

impl ResolvedProfile {
    /// Resolve a parsed profile.
    ///
    /// Supplied IDs are authoritative and skip name matching. Without supplied
    /// major skill IDs, the parents of the resolved skills are used, even when
    /// none of them has a known parent. Major skill names are matched only
    /// when no skill resolved at all.
    pub fn resolve(profile: &ParsedCandidateProfile, index: &TaxonomyIndex) -> Self {
        let skill_ids: BTreeSet<u64> = match &profile.matched_skill_ids {
            Some(ids) => ids.iter().copied().collect(),
            None => index.resolve_ids(&profile.skill_names, RegistryKind::Skill),
        };

        let major_skill_ids = match &profile.matched_major_skill_ids {
            Some(ids) => ids.iter().copied().collect(),
            None if skill_ids.is_empty() => index.resolve_ids(&profile.major_skill_names, RegistryKind::MajorSkill),
            None => index.major_skills_of(&skill_ids),
        };

        Self {
            major_skill_ids,
            skill_ids,
            experience_years: profile.experience_years,
        }
    }
}

/// `part / whole * 100`, or 0 when there is nothing to cover.
pub fn coverage_percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    clamp_percent(part as f64 / whole as f64 * 100.0)
}

/// Experience fit in percent. Negative inputs count as zero.
pub fn experience_fit(candidate_years: f64, required_years: f64) -> f64 {
    let candidate = non_negative(candidate_years);
    let required = non_negative(required_years);

    if required > 0.0 {
        clamp_percent((candidate / required * 100.0).min(100.0))
    } else if candidate > 0.0 {
        100.0
    } else {
        0.0
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Weighted overall score from the three locally computable dimensions.
pub fn weighted_overall(major_skill_coverage: f64, skill_coverage: f64, experience_fit: f64, weights: &ScoreWeights) -> f64 {
    clamp_percent(
        clamp_percent(major_skill_coverage) * weights.major_skill
            + clamp_percent(skill_coverage) * weights.skill
            + clamp_percent(experience_fit) * weights.experience,
    )
}

/// Split required items into matched and missing names. Unresolved items are
/// always missing.
fn partition(required: &[RequiredItem], held: &BTreeSet<u64>) -> (Vec<String>, Vec<String>) {
    let (matched, missing): (Vec<&RequiredItem>, Vec<&RequiredItem>) = required
        .iter()
        .partition(|item| item.id.is_some_and(|id| held.contains(&id)));

    (
        matched.into_iter().map(|item| item.name.clone()).collect(),
        missing.into_iter().map(|item| item.name.clone()).collect(),
    )
}

/// Compute a local score with the default weights.
pub fn compute_local(profile: &ResolvedProfile, job: &ResolvedJob) -> MatchScore {
    compute_local_with(profile, job, &ScoreWeights::default())
}

/// Compute a local score.
pub fn compute_local_with(profile: &ResolvedProfile, job: &ResolvedJob, weights: &ScoreWeights) -> MatchScore {
    let (matched_major_skills, missing_major_skills) = partition(&job.major_skills, &profile.major_skill_ids);
    let (matched_skills, missing_skills) = partition(&job.skills, &profile.skill_ids);

    // Coverage is over resolved IDs only; every matched item has one.
    let major_skill_coverage = coverage_percent(matched_major_skills.len(), job.major_skill_id_count());
    let skill_coverage = coverage_percent(matched_skills.len(), job.skill_id_count());
    let experience = experience_fit(profile.experience_years, job.experience_years);
    let overall = weighted_overall(major_skill_coverage, skill_coverage, experience, weights);

    let skill_tree = job
        .skills
        .iter()
        .map(|item| {
            let status = if matched_skills.contains(&item.name) {
                STATUS_MATCHED
            } else {
                STATUS_MISSING
            };
            SkillTreeEntry::new(item.name.clone(), status)
        })
        .collect();

    let mut score = MatchScore {
        source: ScoreSource::Local,
        overall,
        major_skill_coverage,
        skill_coverage,
        experience_fit: experience,
        education_fit: 0.0,
        certification_fit: 0.0,
        role_fit: 0.0,
        skills_matched: matched_skills.len() as u32,
        total_skills: job.skill_id_count() as u32,
        matched_major_skills,
        matched_skills,
        missing_major_skills,
        missing_skills,
        skill_tree,
        explanation: String::new(),
        error: None,
    };

    score.explanation = explain_local(
        &score,
        ExperienceEvidence {
            candidate_years: non_negative(profile.experience_years),
            required_years: non_negative(job.experience_years),
        },
    );

    score
}

/// Choose between a remote result and the local fallback.
///
/// Never fails. A successful remote result is passed through as the score;
/// a failed one keeps the local score and carries the remote error.
pub fn reconcile(remote: Option<&RemoteMatchOutcome>, local: MatchScore) -> MatchScore {
    match remote {
        Some(RemoteMatchOutcome::Matched(result)) => from_remote(result, local),
        Some(RemoteMatchOutcome::Failed(failure)) => MatchScore {
            explanation: with_remote_failure(&local.explanation, &failure.error),
            error: Some(failure.error.clone()),
            ..local
        },
        None => local,
    }
}

fn from_remote(result: &RemoteMatchResult, local: MatchScore) -> MatchScore {
    let skill_coverage = result
        .skill_coverage
        .map(clamp_percent)
        .unwrap_or_else(|| coverage_percent(result.skills_matched as usize, result.total_skills as usize));

    // The local skill tree lists every required skill in job order.
    let required = local.skill_tree.into_iter().map(|entry| entry.skill_name);

    let (matched_skills, missing_skills): (Vec<String>, Vec<String>) = required.partition(|name| {
        result
            .skill_tree
            .iter()
            .any(|entry| entry.is_matched() && names_equivalent(&entry.skill_name, name))
    });

    MatchScore {
        source: ScoreSource::Remote,
        overall: clamp_percent(result.match_percentage),
        major_skill_coverage: local.major_skill_coverage,
        skill_coverage,
        experience_fit: clamp_percent(result.experience_match),
        education_fit: clamp_percent(result.education_match),
        certification_fit: clamp_percent(result.certifications_match),
        role_fit: clamp_percent(result.role_match),
        skills_matched: result.skills_matched,
        total_skills: result.total_skills,
        matched_major_skills: local.matched_major_skills,
        matched_skills,
        missing_major_skills: local.missing_major_skills,
        missing_skills,
        skill_tree: result.skill_tree.clone(),
        explanation: result.explanation.clone(),
        error: None,
    }
}

/// Resolve both sides against the index and compute the local score.
pub fn score_locally(profile: &ParsedCandidateProfile, job: &JobRequirement, index: &TaxonomyIndex) -> MatchScore {
    compute_local(&ResolvedProfile::resolve(profile, index), &ResolvedJob::resolve(job, index))
}

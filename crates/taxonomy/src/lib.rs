//! Skills taxonomy index and name resolution.
//!
//! Provides pure functions and an immutable index for resolving free-text
//! skill names from résumés into canonical taxonomy IDs:
//! - Name normalization (trimmed lowercase key, whitespace-free fallback key)
//! - `TaxonomyIndex`: per-snapshot lookup over skills and major skills
//! - Suggestions for names that did not resolve (phonetic, edit distance)
//!
//! Names that do not resolve are dropped silently. Résumé text is noisy and
//! an unknown skill name is an expected outcome, not an error.

use rphonetic::{Encoder, Metaphone, Soundex};
use serde::{Deserialize, Serialize};
use skillmatch_model::{MajorSkillRecord, RegistryKind, SkillRecord, TaxonomySnapshot};
use std::collections::{BTreeSet, HashMap};

/// Primary lookup key: trimmed and lowercased.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Fallback lookup key: lowercased with all whitespace removed.
pub fn compact_key(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Two names are equivalent if either of their keys match.
pub fn names_equivalent(a: &str, b: &str) -> bool {
    name_key(a) == name_key(b) || compact_key(a) == compact_key(b)
}

/// Lookup tables for one registry.
#[derive(Debug, Clone, Default)]
struct Registry {
    by_name: HashMap<String, u64>,
    by_compact: HashMap<String, u64>,
    names: HashMap<u64, String>,
    /// Active entries in registry order, for suggestions
    active: Vec<(u64, String)>,
}

impl Registry {
    fn insert(&mut self, id: u64, name: &str, active: bool) {
        self.names.entry(id).or_insert_with(|| name.to_string());

        if !active {
            return;
        }

        let key = name_key(name);
        if key.is_empty() {
            return;
        }

        // First registration of a key wins.
        self.by_name.entry(key).or_insert(id);
        self.by_compact.entry(compact_key(name)).or_insert(id);
        self.active.push((id, name.to_string()));
    }

    fn lookup(&self, name: &str) -> Option<u64> {
        let key = name_key(name);
        if key.is_empty() {
            return None;
        }

        self.by_name
            .get(&key)
            .or_else(|| self.by_compact.get(&compact_key(name)))
            .copied()
    }
}

/// Immutable lookup structure over one taxonomy snapshot.
///
/// Rebuilt whenever the upstream registries change. There is no way to
/// mutate an existing index; callers swap in a new one.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyIndex {
    skills: Registry,
    major_skills: Registry,
    skill_parent: HashMap<u64, u64>,
}

impl TaxonomyIndex {
    /// Build an index. Only active records are reachable by name; parent
    /// links and ID-to-name lookups cover every record.
    pub fn build(skills: &[SkillRecord], major_skills: &[MajorSkillRecord]) -> Self {
        let mut index = Self::default();

        for major in major_skills {
            index.major_skills.insert(major.id, &major.name, major.active);
        }

        for skill in skills {
            index.skills.insert(skill.id, &skill.name, skill.active);
            index.skill_parent.insert(skill.id, skill.major_skill_id);
        }

        index
    }

    pub fn from_snapshot(snapshot: &TaxonomySnapshot) -> Self {
        Self::build(&snapshot.skills, &snapshot.major_skills)
    }

    fn registry(&self, kind: RegistryKind) -> &Registry {
        match kind {
            RegistryKind::Skill => &self.skills,
            RegistryKind::MajorSkill => &self.major_skills,
        }
    }

    /// Resolve a single name. Tries the primary key, then the compact key.
    pub fn lookup(&self, name: &str, kind: RegistryKind) -> Option<u64> {
        self.registry(kind).lookup(name)
    }

    /// Resolve names into a deduplicated set of canonical IDs.
    pub fn resolve_ids<S: AsRef<str>>(&self, names: &[S], kind: RegistryKind) -> BTreeSet<u64> {
        names
            .iter()
            .filter_map(|name| self.lookup(name.as_ref(), kind))
            .collect()
    }

    /// Resolve names into canonical IDs rendered as strings.
    ///
    /// Unmatched names are dropped. Output order does not follow input order.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S], kind: RegistryKind) -> Vec<String> {
        self.resolve_ids(names, kind)
            .into_iter()
            .map(|id| id.to_string())
            .collect()
    }

    pub fn name_of(&self, id: u64, kind: RegistryKind) -> Option<&str> {
        self.registry(kind).names.get(&id).map(String::as_str)
    }

    /// Parent major skill of a skill.
    pub fn major_skill_of(&self, skill_id: u64) -> Option<u64> {
        self.skill_parent.get(&skill_id).copied()
    }

    /// Deduplicated parents of a set of skills.
    pub fn major_skills_of<'a, I>(&self, skill_ids: I) -> BTreeSet<u64>
    where
        I: IntoIterator<Item = &'a u64>,
    {
        skill_ids
            .into_iter()
            .filter_map(|id| self.major_skill_of(*id))
            .collect()
    }

    /// Number of names resolvable in a registry.
    pub fn len(&self, kind: RegistryKind) -> usize {
        self.registry(kind).active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.active.is_empty() && self.major_skills.active.is_empty()
    }

    /// Suggest canonical names for a name that did not resolve.
    ///
    /// Advisory only. `resolve` never uses suggestions.
    pub fn suggest(&self, name: &str, kind: RegistryKind, limit: usize) -> Vec<Suggestion> {
        let query = compact_key(name);
        if query.is_empty() || self.lookup(name, kind).is_some() {
            return Vec::new();
        }

        let max_distance = (query.chars().count() / 4).max(1);

        let mut suggestions: Vec<Suggestion> = self
            .registry(kind)
            .active
            .iter()
            .filter_map(|(id, candidate)| {
                let reason = if let Some((algorithm, code)) = phonetic_match(&query, &compact_key(candidate)) {
                    SuggestReason::Phonetic { algorithm, code }
                } else {
                    let distance = edit_distance(&query, &compact_key(candidate));
                    if distance > max_distance {
                        return None;
                    }
                    SuggestReason::Spelling { distance }
                };

                Some(Suggestion {
                    id: *id,
                    name: candidate.clone(),
                    reason,
                })
            })
            .collect();

        suggestions.sort_by_key(|s| (s.reason.rank(), s.name.to_lowercase()));
        suggestions.truncate(limit);
        suggestions
    }
}

/// A canonical name that an unresolved input may have meant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: u64,
    pub name: String,
    pub reason: SuggestReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SuggestReason {
    /// Sounds alike
    Phonetic { algorithm: String, code: String },
    /// Spelled alike
    Spelling { distance: usize },
}

impl SuggestReason {
    fn rank(&self) -> usize {
        match self {
            Self::Spelling { distance } => *distance,
            // Phonetic matches rank just after one-character typos.
            Self::Phonetic { .. } => 2,
        }
    }
}

/// Check if two names are phonetically similar.
pub fn phonetic_match(text1: &str, text2: &str) -> Option<(String, String)> {
    let letters1 = ascii_letters(text1);
    let letters2 = ascii_letters(text2);
    if letters1.is_empty() || letters2.is_empty() {
        return None;
    }

    let soundex = Soundex::default();
    let (s1, s2) = (soundex.encode(&letters1), soundex.encode(&letters2));
    if !s1.is_empty() && s1 == s2 {
        return Some(("soundex".to_string(), s1));
    }

    let metaphone = Metaphone::default();
    let (m1, m2) = (metaphone.encode(&letters1), metaphone.encode(&letters2));
    if !m1.is_empty() && m1 == m2 {
        return Some(("metaphone".to_string(), m1));
    }

    None
}

fn ascii_letters(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_alphabetic()).collect()
}

/// Compute Levenshtein edit distance between two strings.
pub fn edit_distance(s1: &str, s2: &str) -> usize {
    let s1: Vec<char> = s1.chars().collect();
    let s2: Vec<char> = s2.chars().collect();

    let mut previous: Vec<usize> = (0..=s2.len()).collect();
    let mut current = vec![0; s2.len() + 1];

    for i in 1..=s1.len() {
        current[0] = i;
        for j in 1..=s2.len() {
            let cost = if s1[i - 1] == s2[j - 1] { 0 } else { 1 };
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[s2.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> TaxonomyIndex {
        let majors = vec![
            MajorSkillRecord::new(1, "Design"),
            MajorSkillRecord::new(2, "Backend Development"),
        ];
        let skills = vec![
            SkillRecord::new(10, "Figma", 1),
            SkillRecord::new(11, "Sketch", 1),
            SkillRecord::new(20, "node.js", 2),
            SkillRecord::new(21, "Postgre SQL", 2),
            SkillRecord {
                active: false,
                ..SkillRecord::new(22, "CoffeeScript", 2)
            },
        ];
        TaxonomyIndex::build(&skills, &majors)
    }

    #[test]
    fn test_keys() {
        assert_eq!(name_key("  Node.JS  "), "node.js");
        assert_eq!(compact_key(" Postgre  SQL "), "postgresql");
    }

    #[test]
    fn test_equivalence_is_symmetric_and_tolerant() {
        assert!(names_equivalent("Node.js", "node.js"));
        assert!(names_equivalent("  Node.JS  ", "node.js"));
        assert!(names_equivalent("node.js", "  Node.JS  "));
        assert!(names_equivalent("PostgreSQL", "Postgre SQL"));
        assert!(names_equivalent("Postgre SQL", "PostgreSQL"));
        assert!(!names_equivalent("Java", "JavaScript"));
    }

    #[test]
    fn test_resolve_case_and_whitespace() {
        let index = sample_index();
        assert_eq!(index.resolve(&["  Node.JS  "], RegistryKind::Skill), vec!["20"]);
        assert_eq!(index.resolve(&["postgresql"], RegistryKind::Skill), vec!["21"]);
    }

    #[test]
    fn test_resolve_drops_noise_and_duplicates() {
        let index = sample_index();
        let ids = index.resolve(&["figma", "FIGMA", "lorem ipsum", "", "Sketch"], RegistryKind::Skill);
        assert_eq!(ids, vec!["10", "11"]);
    }

    #[test]
    fn test_resolve_respects_registry_kind() {
        let index = sample_index();
        assert!(index.resolve(&["Design"], RegistryKind::Skill).is_empty());
        assert_eq!(index.resolve(&["design"], RegistryKind::MajorSkill), vec!["1"]);
    }

    #[test]
    fn test_inactive_records_do_not_resolve() {
        let index = sample_index();
        assert!(index.lookup("CoffeeScript", RegistryKind::Skill).is_none());
        assert_eq!(index.major_skill_of(22), Some(2));
        assert_eq!(index.name_of(22, RegistryKind::Skill), Some("CoffeeScript"));
    }

    #[test]
    fn test_empty_registries() {
        let index = TaxonomyIndex::build(&[], &[]);
        assert!(index.is_empty());
        assert!(index.resolve(&["Rust"], RegistryKind::Skill).is_empty());
    }

    #[test]
    fn test_major_skills_of_deduplicates() {
        let index = sample_index();
        let majors = index.major_skills_of(&[10, 11, 20, 99]);
        assert_eq!(majors, BTreeSet::from([1, 2]));
    }

    #[test]
    fn test_suggest_for_typo() {
        let index = sample_index();
        let suggestions = index.suggest("Figmma", RegistryKind::Skill, 3);
        assert_eq!(suggestions.first().map(|s| s.id), Some(10));
    }

    #[test]
    fn test_suggest_nothing_for_resolved_name() {
        let index = sample_index();
        assert!(index.suggest("figma", RegistryKind::Skill, 3).is_empty());
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("figma", "figma"), 0);
        assert_eq!(edit_distance("figma", "figmma"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
    }

    #[test]
    fn test_phonetic_match() {
        assert!(phonetic_match("SMITH", "SMYTH").is_some());
        assert!(phonetic_match("c++", "figma").is_none());
    }
}

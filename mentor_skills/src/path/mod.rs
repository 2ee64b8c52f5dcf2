//! Learning path generation
//!
//! Ranking, in priority order:
//! 1. prerequisite domains flagged by gap detection, by severity (descending)
//! 2. every other domain below `Advanced`, by level (ascending), then weighted
//!    score (ascending), then enumeration order
//!
//! The generator only selects and orders. All prose comes from the static
//! table in `steps`.

mod steps;

pub use steps::next_steps;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::graph::PrerequisiteGap;
use crate::level::{Level, LevelClassifier};
use crate::profile::UserProfile;

/// Why a domain is on the path
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathReason {
    /// Foundation for domains the learner is already ahead in
    PrerequisiteGap { unlocks: Vec<Domain>, severity: u8 },
    /// Low level on its own
    Weakness,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearningPathEntry {
    pub domain: Domain,
    pub current_level: Level,
    pub target_level: Level,
    pub weighted_score: f64,
    pub reason: PathReason,
    pub rationale: String,
    pub next_steps: Vec<String>,
}

/// Path generator settings
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Truncate the ordered path to this many entries
    #[serde(default)]
    pub max_entries: Option<usize>,
}

/// Build the ordered path for `profile`.
///
/// `gaps` must come from `PrerequisiteGraph::detect_gaps` on the same profile.
pub fn generate(
    profile: &UserProfile,
    gaps: &[PrerequisiteGap],
    classifier: &LevelClassifier,
    config: &PathConfig,
) -> Vec<LearningPathEntry> {
    // prerequisite -> (max severity, dependents it unlocks)
    let mut foundations: IndexMap<Domain, (u8, Vec<Domain>)> = IndexMap::new();
    for gap in gaps {
        let slot = foundations.entry(gap.prerequisite).or_insert((0, Vec::new()));
        slot.0 = slot.0.max(gap.severity);
        if !slot.1.contains(&gap.domain) {
            slot.1.push(gap.domain);
        }
    }

    let mut gapped: Vec<(Domain, u8, Vec<Domain>)> = foundations
        .into_iter()
        .map(|(domain, (severity, mut unlocks))| {
            unlocks.sort();
            (domain, severity, unlocks)
        })
        .collect();
    gapped.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut entries: Vec<LearningPathEntry> = gapped
        .into_iter()
        .map(|(domain, severity, unlocks)| {
            let current = profile.level(domain, classifier);
            let rationale = format!(
                "{} is at {} while {} already {} ahead of it; build this foundation first",
                domain,
                current,
                join(&unlocks),
                if unlocks.len() == 1 { "is" } else { "are" },
            );
            entry(
                profile,
                domain,
                current,
                PathReason::PrerequisiteGap { unlocks, severity },
                rationale,
            )
        })
        .collect();

    let mut weak: Vec<(Domain, Level, f64)> = Domain::ALL
        .iter()
        .copied()
        .filter(|d| !entries.iter().any(|e| e.domain == *d))
        .map(|d| (d, profile.level(d, classifier), profile.weighted_score(d)))
        .filter(|(_, level, _)| *level < Level::Advanced)
        .collect();
    weak.sort_by(|a, b| {
        a.1.cmp(&b.1)
            .then(a.2.total_cmp(&b.2))
            .then(a.0.cmp(&b.0))
    });

    entries.extend(weak.into_iter().map(|(domain, current, score)| {
        let rationale = if profile.get(domain).is_none() {
            format!("No evidence recorded for {} yet", domain)
        } else {
            format!("{} is at {} with a weighted score of {:.1}", domain, current, score)
        };
        entry(profile, domain, current, PathReason::Weakness, rationale)
    }));

    if let Some(max) = config.max_entries {
        entries.truncate(max);
    }
    entries
}

/// Domains at `Solid` or above, in enumeration order
pub fn strengths(profile: &UserProfile, classifier: &LevelClassifier) -> Vec<Domain> {
    Domain::ALL
        .iter()
        .copied()
        .filter(|d| profile.level(*d, classifier) >= Level::Solid)
        .collect()
}

fn entry(
    profile: &UserProfile,
    domain: Domain,
    current: Level,
    reason: PathReason,
    rationale: String,
) -> LearningPathEntry {
    LearningPathEntry {
        domain,
        current_level: current,
        target_level: current.next().unwrap_or(current),
        weighted_score: profile.weighted_score(domain),
        reason,
        rationale,
        next_steps: next_steps(domain, current).iter().map(|s| s.to_string()).collect(),
    }
}

fn join(domains: &[Domain]) -> String {
    domains
        .iter()
        .map(|d| d.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GapPolicy, PrerequisiteGraph};
    use crate::profile::SkillState;

    fn profile_with(scores: &[(Domain, f64)]) -> UserProfile {
        let mut profile = UserProfile::new();
        for (domain, score) in scores {
            let mut state = SkillState::new(*domain);
            state.weighted_score = *score;
            state.raw_score = *score;
            state.baseline_raw = *score;
            state.baseline_weighted = *score;
            profile.skills.insert(*domain, state);
        }
        profile
    }

    fn path_for(profile: &UserProfile) -> Vec<LearningPathEntry> {
        let classifier = LevelClassifier::default();
        let gaps = PrerequisiteGraph::default().detect_gaps(profile, &classifier, &GapPolicy::default());
        generate(profile, &gaps, &classifier, &PathConfig::default())
    }

    #[test]
    fn test_empty_profile_lists_every_domain_in_order() {
        let path = path_for(&UserProfile::new());
        let domains: Vec<Domain> = path.iter().map(|e| e.domain).collect();
        assert_eq!(domains, Domain::ALL.to_vec());
        for e in &path {
            assert_eq!(e.current_level, Level::Unknown);
            assert_eq!(e.target_level, Level::Beginner);
            assert_eq!(e.reason, PathReason::Weakness);
            assert!(!e.next_steps.is_empty());
        }
    }

    #[test]
    fn test_gapped_prerequisite_ranks_first() {
        // security is solid, cloud_platform is beginner with a higher raw score
        // than testing, which is unknown and not gapped
        let profile = profile_with(&[
            (Domain::Security, 20.0),
            (Domain::CloudPlatform, 4.0),
            (Domain::Testing, 0.5),
        ]);
        let path = path_for(&profile);

        assert_eq!(path[0].domain, Domain::CloudPlatform);
        assert_eq!(
            path[0].reason,
            PathReason::PrerequisiteGap {
                unlocks: vec![Domain::Security],
                severity: 2
            }
        );
        assert_eq!(path[0].target_level, Level::Developing);

        let testing = path.iter().position(|e| e.domain == Domain::Testing).unwrap();
        assert!(testing > 0);
    }

    #[test]
    fn test_weak_domains_sorted_by_level_then_score_then_order() {
        let profile = profile_with(&[
            (Domain::CiCd, 6.0),       // developing
            (Domain::Containers, 3.0), // beginner
            (Domain::Testing, 2.5),    // beginner, lower score
            (Domain::InfrastructureAsCode, 1.0),
        ]);
        let path = path_for(&profile);
        let domains: Vec<Domain> = path.iter().map(|e| e.domain).collect();

        assert_eq!(
            domains,
            vec![
                Domain::CloudPlatform,        // unknown, 0.0
                Domain::Security,             // unknown, 0.0
                Domain::Observability,        // unknown, 0.0
                Domain::InfrastructureAsCode, // unknown, 1.0
                Domain::Testing,              // beginner, 2.5
                Domain::Containers,           // beginner, 3.0
                Domain::CiCd,                 // developing
            ]
        );
    }

    #[test]
    fn test_advanced_domains_are_omitted_and_listed_as_strengths() {
        let profile = profile_with(&[(Domain::Testing, 31.0), (Domain::CiCd, 16.0)]);
        let path = path_for(&profile);
        assert!(path.iter().all(|e| e.domain != Domain::Testing));

        let solid = path.iter().find(|e| e.domain == Domain::CiCd).unwrap();
        assert_eq!(solid.target_level, Level::Advanced);

        let classifier = LevelClassifier::default();
        assert_eq!(strengths(&profile, &classifier), vec![Domain::CiCd, Domain::Testing]);
    }

    #[test]
    fn test_shared_prerequisite_merges_gaps() {
        let profile = profile_with(&[
            (Domain::Security, 31.0),
            (Domain::InfrastructureAsCode, 6.0),
        ]);
        let path = path_for(&profile);

        let cloud: Vec<&LearningPathEntry> =
            path.iter().filter(|e| e.domain == Domain::CloudPlatform).collect();
        assert_eq!(cloud.len(), 1);
        assert_eq!(
            cloud[0].reason,
            PathReason::PrerequisiteGap {
                unlocks: vec![Domain::InfrastructureAsCode, Domain::Security],
                severity: 4
            }
        );
        assert!(cloud[0].rationale.contains("are"));
    }

    #[test]
    fn test_max_entries_truncates_after_ordering() {
        let profile = profile_with(&[(Domain::Security, 31.0)]);
        let classifier = LevelClassifier::default();
        let gaps = PrerequisiteGraph::default().detect_gaps(&profile, &classifier, &GapPolicy::default());
        let path = generate(
            &profile,
            &gaps,
            &classifier,
            &PathConfig { max_entries: Some(2) },
        );
        assert_eq!(path.len(), 2);
        assert_eq!(path[0].domain, Domain::CloudPlatform);
    }
}

//! Per-user skill state
//!
//! A `UserProfile` maps each domain a user has evidence for to its
//! `SkillState`. The state is an explicit value: it is loaded from the profile
//! store, passed through the scoring engine, and saved back. Levels are never
//! stored authoritatively; they are re-derived from the weighted score on read.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::evidence::Evidence;
use crate::level::{Level, LevelClassifier};

const REPLAY_TOLERANCE: f64 = 1e-9;

/// Opaque user identifier supplied by the caller
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Accumulated evidence for one (user, domain) pair
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillState {
    pub domain: Domain,
    pub raw_score: f64,
    pub weighted_score: f64,
    pub evidence_count: u64,
    /// Append-only, in acceptance order
    pub history: Vec<Evidence>,
    pub last_updated: Option<DateTime<Utc>>,
    /// Raw score carried over from a record that predates history tracking
    pub baseline_raw: f64,
    /// Weighted score carried over from a record that predates history tracking
    pub baseline_weighted: f64,
}

impl SkillState {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            raw_score: 0.0,
            weighted_score: 0.0,
            evidence_count: 0,
            history: Vec::new(),
            last_updated: None,
            baseline_raw: 0.0,
            baseline_weighted: 0.0,
        }
    }

    pub fn level(&self, classifier: &LevelClassifier) -> Level {
        classifier.level(self.domain, self.weighted_score)
    }

    /// Whether evidence with the same (source, signal) is already in history
    pub fn contains(&self, evidence: &Evidence) -> bool {
        self.history
            .iter()
            .any(|e| e.dedup_key() == evidence.dedup_key())
    }

    /// Recompute (raw, weighted) from the baseline plus every history entry
    pub fn replay(&self) -> (f64, f64) {
        self.history.iter().fold(
            (self.baseline_raw, self.baseline_weighted),
            |(raw, weighted), e| (raw + e.weight, weighted + e.weighted_value()),
        )
    }

    /// True when the stored scores match a replay of the history
    pub fn verify(&self) -> bool {
        let (raw, weighted) = self.replay();
        (raw - self.raw_score).abs() <= REPLAY_TOLERANCE
            && (weighted - self.weighted_score).abs() <= REPLAY_TOLERANCE
    }
}

/// All skill state for one user
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub skills: BTreeMap<Domain, SkillState>,
}

impl UserProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, domain: Domain) -> Option<&SkillState> {
        self.skills.get(&domain)
    }

    /// Level for a domain; a domain without state is `Unknown`
    pub fn level(&self, domain: Domain, classifier: &LevelClassifier) -> Level {
        self.skills
            .get(&domain)
            .map(|s| s.level(classifier))
            .unwrap_or(Level::Unknown)
    }

    pub fn weighted_score(&self, domain: Domain) -> f64 {
        self.skills
            .get(&domain)
            .map(|s| s.weighted_score)
            .unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Floor of the mean level rank across domains that are past `Unknown`
    pub fn overall_level(&self, classifier: &LevelClassifier) -> Level {
        let ranks: Vec<u32> = self
            .skills
            .values()
            .map(|s| s.level(classifier))
            .filter(|l| *l != Level::Unknown)
            .map(|l| u32::from(l.rank()))
            .collect();

        if ranks.is_empty() {
            return Level::Unknown;
        }
        let mean = ranks.iter().sum::<u32>() / ranks.len() as u32;
        Level::from_rank(mean as u8)
    }

    /// Weakest level among `domains` that have state, `None` when none do
    pub fn weakest_level(&self, domains: &[Domain], classifier: &LevelClassifier) -> Option<Level> {
        domains
            .iter()
            .filter_map(|d| self.skills.get(d))
            .map(|s| s.level(classifier))
            .min()
    }
}

/// Read-only view of one domain for presentation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillSnapshot {
    pub level: Level,
    pub weighted_score: f64,
    pub evidence_count: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl SkillSnapshot {
    pub fn of(state: &SkillState, classifier: &LevelClassifier) -> Self {
        Self {
            level: state.level(classifier),
            weighted_score: state.weighted_score,
            evidence_count: state.evidence_count,
            last_updated: state.last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_score(domain: Domain, weighted: f64) -> SkillState {
        let mut s = SkillState::new(domain);
        s.weighted_score = weighted;
        s.raw_score = weighted;
        s.baseline_raw = weighted;
        s.baseline_weighted = weighted;
        s
    }

    #[test]
    fn test_missing_domain_is_unknown() {
        let profile = UserProfile::new();
        let classifier = LevelClassifier::default();
        assert_eq!(profile.level(Domain::Security, &classifier), Level::Unknown);
        assert_eq!(profile.weighted_score(Domain::Security), 0.0);
    }

    #[test]
    fn test_replay_includes_baseline() {
        let mut s = state_with_score(Domain::Containers, 3.0);
        let e = Evidence::new(Domain::Containers, "dockerfile", 2.0, 1.5, "repo").unwrap();
        s.history.push(e);
        s.raw_score += 2.0;
        s.weighted_score += 3.0;

        assert_eq!(s.replay(), (5.0, 6.0));
        assert!(s.verify());

        s.weighted_score += 1.0;
        assert!(!s.verify());
    }

    #[test]
    fn test_overall_level_ignores_unknown() {
        let classifier = LevelClassifier::default();
        let mut profile = UserProfile::new();
        profile.skills.insert(Domain::CiCd, state_with_score(Domain::CiCd, 16.0)); // solid (3)
        profile.skills.insert(Domain::Testing, state_with_score(Domain::Testing, 2.0)); // beginner (1)
        profile.skills.insert(Domain::Security, state_with_score(Domain::Security, 0.5)); // unknown

        assert_eq!(profile.overall_level(&classifier), Level::Developing);
        assert_eq!(UserProfile::new().overall_level(&classifier), Level::Unknown);
    }

    #[test]
    fn test_weakest_level_only_counts_tracked_domains() {
        let classifier = LevelClassifier::default();
        let mut profile = UserProfile::new();
        profile.skills.insert(Domain::CiCd, state_with_score(Domain::CiCd, 16.0));
        profile.skills.insert(Domain::Containers, state_with_score(Domain::Containers, 6.0));

        let weakest = profile.weakest_level(
            &[Domain::CiCd, Domain::Containers, Domain::Security],
            &classifier,
        );
        assert_eq!(weakest, Some(Level::Developing));
        assert_eq!(profile.weakest_level(&[Domain::Security], &classifier), None);
    }
}

//! Scoring engine
//!
//! Folds evidence into a `UserProfile`:
//! - validates at the boundary (rejection leaves the profile untouched)
//! - drops repeats of a (domain, source, signal) key as a no-op
//! - otherwise appends to history and adds `weight` to the raw score and
//!   `weight * maturity_multiplier` to the weighted score
//!
//! The engine works on an explicit profile value. Persistence and per-user
//! locking belong to the caller (see `SkillService`).

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SkillError};
use crate::evidence::{normalize_signal, Evidence};
use crate::profile::{SkillState, UserProfile};

/// Result of offering one piece of evidence
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordOutcome {
    /// State of the evidence's domain after the call
    pub state: SkillState,
    /// False when the evidence was a duplicate and nothing changed
    pub accepted: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Fold one piece of evidence into `profile`.
    ///
    /// # Errors
    /// `SkillError::MalformedEvidence` when the evidence fails validation or
    /// would push a score past the largest finite value; the profile is not
    /// modified in either case.
    pub fn record(&self, profile: &mut UserProfile, mut evidence: Evidence) -> Result<RecordOutcome> {
        evidence.validate()?;
        evidence.signal = normalize_signal(&evidence.signal);
        evidence.source = evidence.source.trim().to_string();

        if let Some(existing) = profile.skills.get(&evidence.domain) {
            if existing.contains(&evidence) {
                tracing::debug!(
                    domain = %evidence.domain,
                    signal = %evidence.signal,
                    source = %evidence.source,
                    "Duplicate evidence ignored"
                );
                return Ok(RecordOutcome {
                    state: existing.clone(),
                    accepted: false,
                });
            }
        }

        let (raw_before, weighted_before) = profile
            .skills
            .get(&evidence.domain)
            .map(|s| (s.raw_score, s.weighted_score))
            .unwrap_or((0.0, 0.0));
        let contribution = evidence.weighted_value();
        let raw_after = raw_before + evidence.weight;
        let weighted_after = weighted_before + contribution;
        if !contribution.is_finite() || !raw_after.is_finite() || !weighted_after.is_finite() {
            return Err(SkillError::MalformedEvidence(format!(
                "evidence for {} would overflow the score (weight {}, multiplier {})",
                evidence.domain, evidence.weight, evidence.maturity_multiplier
            )));
        }

        let state = profile
            .skills
            .entry(evidence.domain)
            .or_insert_with(|| SkillState::new(evidence.domain));

        state.raw_score = raw_after;
        state.weighted_score = weighted_after;
        state.evidence_count += 1;
        state.last_updated = Some(Utc::now());

        tracing::debug!(
            domain = %evidence.domain,
            signal = %evidence.signal,
            contribution,
            weighted_score = state.weighted_score,
            "Evidence recorded"
        );

        state.history.push(evidence);

        Ok(RecordOutcome {
            state: state.clone(),
            accepted: true,
        })
    }

    /// Fold a batch of evidence, validating all of it first.
    ///
    /// Either every item is offered to the profile or, when any item is
    /// malformed or would overflow a score, none is. Duplicates inside the batch are no-ops like any
    /// other duplicate.
    pub fn record_all(
        &self,
        profile: &mut UserProfile,
        batch: Vec<Evidence>,
    ) -> Result<Vec<RecordOutcome>> {
        for evidence in &batch {
            evidence.validate()?;
        }
        let mut working = profile.clone();
        let outcomes = batch
            .into_iter()
            .map(|evidence| self.record(&mut working, evidence))
            .collect::<Result<Vec<_>>>()?;
        *profile = working;
        Ok(outcomes)
    }
}

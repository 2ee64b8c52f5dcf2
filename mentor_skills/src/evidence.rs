//! Evidence model
//!
//! Evidence is one timestamped, attributable signal that a user exhibited a
//! domain-relevant behaviour. It is immutable once recorded; the scoring
//! engine appends it to a skill's history and never edits it afterwards.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Domain;
use crate::errors::{Result, SkillError};

/// Unique identifier for a piece of evidence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvidenceId(pub Uuid);

impl EvidenceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EvidenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EvidenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated scoring input
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: EvidenceId,
    pub domain: Domain,
    /// Keyword or signal identifier, trimmed and lowercased
    pub signal: String,
    pub weight: f64,
    pub maturity_multiplier: f64,
    /// Where the signal came from (repository, file, prompt id); used for de-duplication
    pub source: String,
    pub recorded_at: DateTime<Utc>,
}

impl Evidence {
    /// Build evidence stamped with the current time.
    ///
    /// # Errors
    /// `SkillError::MalformedEvidence` for a negative or non-finite weight or
    /// multiplier, or an empty signal or source.
    pub fn new(
        domain: Domain,
        signal: impl Into<String>,
        weight: f64,
        maturity_multiplier: f64,
        source: impl Into<String>,
    ) -> Result<Self> {
        Self::at(domain, signal, weight, maturity_multiplier, source, Utc::now())
    }

    /// Build evidence with an explicit timestamp
    pub fn at(
        domain: Domain,
        signal: impl Into<String>,
        weight: f64,
        maturity_multiplier: f64,
        source: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self> {
        let evidence = Self {
            id: EvidenceId::new(),
            domain,
            signal: normalize_signal(&signal.into()),
            weight,
            maturity_multiplier,
            source: source.into().trim().to_string(),
            recorded_at,
        };
        evidence.validate()?;
        Ok(evidence)
    }

    /// Check the numeric and identity invariants.
    ///
    /// Fields are public, so the scoring engine calls this again at its boundary.
    pub fn validate(&self) -> Result<()> {
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(SkillError::MalformedEvidence(format!(
                "weight must be a finite non-negative number, got {}",
                self.weight
            )));
        }
        if !self.maturity_multiplier.is_finite() || self.maturity_multiplier < 0.0 {
            return Err(SkillError::MalformedEvidence(format!(
                "maturity multiplier must be a finite non-negative number, got {}",
                self.maturity_multiplier
            )));
        }
        if self.signal.trim().is_empty() {
            return Err(SkillError::MalformedEvidence("signal is empty".to_string()));
        }
        if self.source.trim().is_empty() {
            return Err(SkillError::MalformedEvidence("source is empty".to_string()));
        }
        Ok(())
    }

    /// Contribution to the weighted score
    pub fn weighted_value(&self) -> f64 {
        self.weight * self.maturity_multiplier
    }

    /// Two pieces of evidence with the same key teach the same thing.
    ///
    /// Normalised here as well as at construction: fields are public and
    /// stored history may predate normalisation.
    pub fn dedup_key(&self) -> (Domain, String, String) {
        (
            self.domain,
            self.source.trim().to_string(),
            normalize_signal(&self.signal),
        )
    }
}

pub(crate) fn normalize_signal(signal: &str) -> String {
    signal.trim().to_lowercase()
}

/// Loosely typed evidence as submitted by collaborators
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvidenceInput {
    pub domain: String,
    pub signal: String,
    pub weight: f64,
    #[serde(default = "default_multiplier")]
    pub maturity_multiplier: f64,
    pub source: String,
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

fn default_multiplier() -> f64 {
    1.0
}

impl TryFrom<EvidenceInput> for Evidence {
    type Error = SkillError;

    fn try_from(input: EvidenceInput) -> Result<Self> {
        let domain = input
            .domain
            .parse::<Domain>()
            .map_err(|e| SkillError::MalformedEvidence(e.to_string()))?;
        Evidence::at(
            domain,
            input.signal,
            input.weight,
            input.maturity_multiplier,
            input.source,
            input.recorded_at.unwrap_or_else(Utc::now),
        )
    }
}

/// Repository maturity verdict reported by analysers.
///
/// This is the collaborator side of the multiplier contract: a producer maps
/// its verdict to a tier and passes `tier.multiplier()` with its evidence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaturityTier {
    Early,
    Basic,
    Developing,
    ProductionLeaning,
}

impl MaturityTier {
    pub fn multiplier(self) -> f64 {
        match self {
            MaturityTier::Early => 0.5,
            MaturityTier::Basic => 0.75,
            MaturityTier::Developing => 1.0,
            MaturityTier::ProductionLeaning => 1.5,
        }
    }

    /// Parse an analyser verdict, falling back to `Basic` for anything unrecognised
    pub fn from_verdict(verdict: &str) -> Self {
        verdict.parse().unwrap_or(MaturityTier::Basic)
    }
}

impl FromStr for MaturityTier {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "early" => Ok(MaturityTier::Early),
            "basic" => Ok(MaturityTier::Basic),
            "developing" => Ok(MaturityTier::Developing),
            "production-leaning" | "production" => Ok(MaturityTier::ProductionLeaning),
            other => Err(SkillError::MalformedEvidence(format!(
                "unknown maturity tier '{}'",
                other
            ))),
        }
    }
}

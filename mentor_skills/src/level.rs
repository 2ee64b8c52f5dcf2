//! Proficiency levels and the threshold classifier
//!
//! Classification is a pure function of the weighted score. Each threshold is
//! a closed lower bound: a score exactly on a boundary maps to the higher level.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::errors::{Result, SkillError};

/// Five-point ordinal proficiency scale
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Unknown,
    Beginner,
    Developing,
    Solid,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Unknown,
        Level::Beginner,
        Level::Developing,
        Level::Solid,
        Level::Advanced,
    ];

    /// Ordinal rank, 0 for `Unknown` through 4 for `Advanced`
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn from_rank(rank: u8) -> Level {
        Level::ALL[usize::from(rank.min(4))]
    }

    /// The level one step up, `None` at the top
    pub fn next(self) -> Option<Level> {
        match self {
            Level::Advanced => None,
            other => Some(Level::from_rank(other.rank() + 1)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Unknown => "unknown",
            Level::Beginner => "beginner",
            Level::Developing => "developing",
            Level::Solid => "solid",
            Level::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self> {
        Level::ALL
            .into_iter()
            .find(|l| l.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| SkillError::InvalidConfiguration(format!("unknown level '{}'", s)))
    }
}

/// Lower bounds of every level above `Unknown`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelThresholds {
    pub beginner: f64,
    pub developing: f64,
    pub solid: f64,
    pub advanced: f64,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            beginner: 2.0,
            developing: 5.0,
            solid: 15.0,
            advanced: 30.0,
        }
    }
}

impl LevelThresholds {
    /// Thresholds must be finite, non-negative and strictly increasing
    pub fn validate(&self) -> Result<()> {
        let bounds = self.bounds();
        for (level, bound) in &bounds {
            if !bound.is_finite() || *bound < 0.0 {
                return Err(SkillError::InvalidConfiguration(format!(
                    "threshold for {} must be a finite non-negative number, got {}",
                    level, bound
                )));
            }
        }
        for pair in bounds.windows(2) {
            if pair[1].1 <= pair[0].1 {
                return Err(SkillError::InvalidConfiguration(format!(
                    "threshold for {} ({}) must be greater than threshold for {} ({})",
                    pair[1].0, pair[1].1, pair[0].0, pair[0].1
                )));
            }
        }
        Ok(())
    }

    /// Map a weighted score to its level.
    ///
    /// Total over all inputs: negative scores and NaN classify as `Unknown`.
    pub fn classify(&self, weighted_score: f64) -> Level {
        self.bounds()
            .iter()
            .rev()
            .find(|(_, bound)| weighted_score >= *bound)
            .map(|(level, _)| *level)
            .unwrap_or(Level::Unknown)
    }

    /// Smallest score that classifies as `level`
    pub fn floor_of(&self, level: Level) -> f64 {
        match level {
            Level::Unknown => 0.0,
            Level::Beginner => self.beginner,
            Level::Developing => self.developing,
            Level::Solid => self.solid,
            Level::Advanced => self.advanced,
        }
    }

    fn bounds(&self) -> [(Level, f64); 4] {
        [
            (Level::Beginner, self.beginner),
            (Level::Developing, self.developing),
            (Level::Solid, self.solid),
            (Level::Advanced, self.advanced),
        ]
    }
}

/// Threshold table with optional per-domain overrides
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelClassifier {
    #[serde(default)]
    pub default: LevelThresholds,
    #[serde(default)]
    pub overrides: BTreeMap<Domain, LevelThresholds>,
}

impl LevelClassifier {
    pub fn new(default: LevelThresholds) -> Self {
        Self {
            default,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_override(mut self, domain: Domain, thresholds: LevelThresholds) -> Self {
        self.overrides.insert(domain, thresholds);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.default.validate()?;
        for (domain, thresholds) in &self.overrides {
            thresholds.validate().map_err(|e| {
                SkillError::InvalidConfiguration(format!("{} override: {}", domain, e))
            })?;
        }
        Ok(())
    }

    pub fn thresholds(&self, domain: Domain) -> &LevelThresholds {
        self.overrides.get(&domain).unwrap_or(&self.default)
    }

    pub fn level(&self, domain: Domain, weighted_score: f64) -> Level {
        self.thresholds(domain).classify(weighted_score)
    }
}

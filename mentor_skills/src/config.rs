//! Engine configuration
//!
//! Every field has a default, so an empty YAML document is a valid config.
//!
//! ```yaml
//! levels:
//!   default: { beginner: 2, developing: 5, solid: 15, advanced: 30 }
//!   overrides:
//!     security: { beginner: 3, developing: 8, solid: 20, advanced: 40 }
//! gaps:
//!   dependent_at_least: developing
//!   prerequisite_at_most: beginner
//! prerequisites:
//!   - { domain: security, depends_on: cloud_platform }
//! signals:
//!   testing:
//!     - { signal: pytest, weight: 2.0 }
//! path:
//!   max_entries: 5
//! storage:
//!   dir: .mentor/profiles
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SkillError};
use crate::graph::{default_edges, EdgeSpec, GapPolicy, PrerequisiteGraph};
use crate::level::LevelClassifier;
use crate::path::PathConfig;
use crate::signals::{Signal, SignalCatalog};

/// Where the file-backed profile store keeps its records
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".mentor/profiles"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub levels: LevelClassifier,
    pub gaps: GapPolicy,
    pub prerequisites: Vec<EdgeSpec>,
    /// Domain name -> signals
    pub signals: BTreeMap<String, Vec<Signal>>,
    pub path: PathConfig,
    pub storage: StorageConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            levels: LevelClassifier::default(),
            gaps: GapPolicy::default(),
            prerequisites: default_edges(),
            signals: SignalCatalog::default().to_table(),
            path: PathConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_yaml_str(&content)
    }

    /// Check everything that would otherwise fail at service start-up.
    ///
    /// # Errors
    /// `InvalidConfiguration` for bad thresholds, a gap policy that could flag
    /// two domains at the same level, or a bad signal table;
    /// `InvalidGraphConfiguration` for unknown domains or cycles in
    /// `prerequisites`.
    pub fn validate(&self) -> Result<()> {
        self.levels.validate()?;
        if self.gaps.dependent_at_least <= self.gaps.prerequisite_at_most {
            return Err(SkillError::InvalidConfiguration(format!(
                "gaps.dependent_at_least ({}) must be above gaps.prerequisite_at_most ({})",
                self.gaps.dependent_at_least, self.gaps.prerequisite_at_most
            )));
        }
        if self.path.max_entries == Some(0) {
            return Err(SkillError::InvalidConfiguration(
                "path.max_entries must be at least 1".to_string(),
            ));
        }
        PrerequisiteGraph::from_edges(&self.prerequisites)?;
        SignalCatalog::from_table(&self.signals)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use crate::level::Level;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.prerequisites.len(), 4);
        assert_eq!(config.levels.default.developing, 5.0);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = EngineConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = r#"
levels:
  overrides:
    security: { beginner: 3, developing: 8, solid: 20, advanced: 40 }
gaps:
  dependent_at_least: solid
  prerequisite_at_most: unknown
prerequisites:
  - { domain: testing, depends_on: ci-cd }
path:
  max_entries: 3
storage:
  dir: /var/lib/mentor
"#;
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.levels.level(Domain::Security, 7.0), Level::Beginner);
        assert_eq!(config.levels.level(Domain::Testing, 7.0), Level::Developing);
        assert_eq!(config.gaps.dependent_at_least, Level::Solid);
        assert_eq!(config.prerequisites.len(), 1);
        assert_eq!(config.path.max_entries, Some(3));
        assert_eq!(config.storage.dir, PathBuf::from("/var/lib/mentor"));
        // untouched sections keep their defaults
        assert_eq!(config.signals, SignalCatalog::default().to_table());
    }

    #[test]
    fn test_cycle_fails_validation() {
        let yaml = r#"
prerequisites:
  - { domain: security, depends_on: cloud_platform }
  - { domain: cloud_platform, depends_on: security }
"#;
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(SkillError::InvalidGraphConfiguration(_))
        ));
    }

    #[test]
    fn test_non_increasing_thresholds_fail_validation() {
        let yaml = "levels: { default: { beginner: 2, developing: 2, solid: 15, advanced: 30 } }";
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(SkillError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_overlapping_gap_policy_fails_validation() {
        let mut config = EngineConfig::default();
        config.gaps.dependent_at_least = Level::Beginner;
        config.gaps.prerequisite_at_most = Level::Beginner;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_signal_domain_fails_validation() {
        let yaml = "signals: { kubernetes: [ { signal: helm, weight: 2.0 } ] }";
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(SkillError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mentor.yaml");
        tokio::fs::write(&path, "path: { max_entries: 2 }\n").await.unwrap();

        let config = EngineConfig::from_file(&path).await.unwrap();
        assert_eq!(config.path.max_entries, Some(2));
    }
}

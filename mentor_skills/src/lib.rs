//! Mentor Skills
//!
//! Skill tracking and learning path engine for a DevOps mentoring assistant:
//! - Scoring: fold weighted evidence into per-domain skill state
//! - Levels: classify weighted scores into a 5-point scale
//! - Prerequisites: detect domains that outpace their foundations
//! - Learning paths: rank what to learn next, with concrete steps
//! - Persistence: versioned, atomically written per-user records

// Module declarations
pub mod config;
pub mod domain;
pub mod errors;
pub mod evidence;
pub mod graph;
pub mod level;
pub mod path;
pub mod profile;
pub mod scoring;
pub mod service;
pub mod signals;
pub mod store;

// Re-export main types
pub use config::{EngineConfig, StorageConfig};

pub use domain::{Domain, UnknownDomain};

pub use errors::{Result, SkillError, StorageError};

pub use evidence::{Evidence, EvidenceId, EvidenceInput, MaturityTier};

pub use graph::{default_edges, EdgeSpec, GapPolicy, PrerequisiteGap, PrerequisiteGraph};

pub use level::{Level, LevelClassifier, LevelThresholds};

pub use path::{LearningPathEntry, PathConfig, PathReason};

pub use profile::{SkillSnapshot, SkillState, UserId, UserProfile};

pub use scoring::{RecordOutcome, ScoringEngine};

pub use service::{LearningPath, SkillProfileView, SkillService};

pub use signals::{Signal, SignalCatalog};

pub use store::{InMemoryProfileStore, JsonFileProfileStore, LoadedProfile, ProfileStore, StoreWarning};

/// Version of the mentor skills crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the skill engine
pub fn init() {
    tracing::info!("Mentor Skills v{}", VERSION);
}

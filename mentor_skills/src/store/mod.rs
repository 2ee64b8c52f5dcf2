//! Profile persistence
//!
//! Provides trait-based storage with an in-memory implementation for tests
//! and a JSON file implementation for real use. Loads never fail: a missing
//! user is a fresh profile, and an unreadable or corrupted record falls back
//! to an empty profile with a warning attached.

mod file;
mod memory;
pub mod record;

pub use file::JsonFileProfileStore;
pub use memory::InMemoryProfileStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::profile::{UserId, UserProfile};

/// Why a load fell back to an empty profile
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StoreWarning {
    /// The record exists but could not be decoded
    Corrupted(String),
    /// The backing storage could not be read
    Unavailable(String),
}

impl std::fmt::Display for StoreWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreWarning::Corrupted(detail) => write!(f, "stored profile corrupted: {}", detail),
            StoreWarning::Unavailable(detail) => write!(f, "profile storage unavailable: {}", detail),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoadedProfile {
    pub profile: UserProfile,
    pub warning: Option<StoreWarning>,
}

impl LoadedProfile {
    pub fn clean(profile: UserProfile) -> Self {
        Self {
            profile,
            warning: None,
        }
    }

    pub fn fallback(warning: StoreWarning) -> Self {
        Self {
            profile: UserProfile::new(),
            warning: Some(warning),
        }
    }
}

/// Storage trait for user profiles (allows test mocks)
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load a user's profile; absent users get an empty profile
    async fn load(&self, user: &UserId) -> LoadedProfile;

    /// Persist a user's profile, replacing any previous record atomically
    async fn save(&self, user: &UserId, profile: &UserProfile) -> Result<()>;
}

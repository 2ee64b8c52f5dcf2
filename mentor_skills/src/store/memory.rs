use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{LoadedProfile, ProfileStore};
use crate::errors::Result;
use crate::profile::{UserId, UserProfile};

/// In-memory storage for testing and embedding
#[derive(Clone, Default)]
pub struct InMemoryProfileStore {
    profiles: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn load(&self, user: &UserId) -> LoadedProfile {
        let store = self.profiles.read().await;
        LoadedProfile::clean(store.get(user).cloned().unwrap_or_default())
    }

    async fn save(&self, user: &UserId, profile: &UserProfile) -> Result<()> {
        let mut store = self.profiles.write().await;
        store.insert(user.clone(), profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use crate::profile::SkillState;

    #[tokio::test]
    async fn test_missing_user_is_empty_profile() {
        let store = InMemoryProfileStore::new();
        let loaded = store.load(&UserId::from("nobody")).await;
        assert!(loaded.profile.is_empty());
        assert!(loaded.warning.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = InMemoryProfileStore::new();
        let user = UserId::from("alice");
        let mut profile = UserProfile::new();
        profile.skills.insert(Domain::Testing, SkillState::new(Domain::Testing));

        store.save(&user, &profile).await.unwrap();
        assert_eq!(store.load(&user).await.profile, profile);
        assert_eq!(store.len().await, 1);
    }
}

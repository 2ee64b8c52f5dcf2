//! Skill service
//!
//! Provides the high-level API consumed by reviewers, the prompt adapter and
//! the presentation layer. Every operation on one user runs under that
//! user's lock (load, modify, save), so evidence arriving close together is
//! never lost to a read-modify-write race. Different users never share a
//! lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::config::EngineConfig;
use crate::domain::Domain;
use crate::errors::{Result, StorageError};
use crate::evidence::{Evidence, MaturityTier};
use crate::graph::{PrerequisiteGap, PrerequisiteGraph};
use crate::level::Level;
use crate::path::{self, LearningPathEntry};
use crate::profile::{SkillSnapshot, UserId, UserProfile};
use crate::scoring::{RecordOutcome, ScoringEngine};
use crate::signals::SignalCatalog;
use crate::store::{JsonFileProfileStore, ProfileStore, StoreWarning};

/// Per-domain view of one user's skills
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillProfileView {
    pub user_id: UserId,
    pub overall_level: Level,
    /// Only domains with recorded state
    pub skills: BTreeMap<Domain, SkillSnapshot>,
    pub warning: Option<StoreWarning>,
}

/// Ranked recommendations for one user
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    pub user_id: UserId,
    pub entries: Vec<LearningPathEntry>,
    pub gaps: Vec<PrerequisiteGap>,
    pub strengths: Vec<Domain>,
    pub warning: Option<StoreWarning>,
}

pub struct SkillService {
    config: EngineConfig,
    graph: PrerequisiteGraph,
    catalog: SignalCatalog,
    engine: ScoringEngine,
    store: Arc<dyn ProfileStore>,
    locks: LockRegistry,
}

/// Per-user async locks, created on demand and dropped once nobody holds
/// or waits on them
#[derive(Default)]
struct LockRegistry {
    locks: Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>,
}

impl LockRegistry {
    async fn acquire(&self, user: &UserId) -> UserLease<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(user.clone()).or_default())
        };
        let guard = lock.lock_owned().await;
        UserLease {
            registry: self,
            user: user.clone(),
            guard: Some(guard),
        }
    }

    /// Remove `user`'s entry when the registry holds the only reference.
    fn prune(&self, user: &UserId) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(user).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(user);
        }
    }

    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Holds one user's lock; releasing it prunes the registry entry
struct UserLease<'a> {
    registry: &'a LockRegistry,
    user: UserId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserLease<'_> {
    fn drop(&mut self) {
        // the guard owns an Arc to the lock; release it before counting
        drop(self.guard.take());
        self.registry.prune(&self.user);
    }
}

impl SkillService {
    /// Build a service over `store`.
    ///
    /// # Errors
    /// Any configuration defect (see `EngineConfig::validate`). Nothing is
    /// served from an invalid configuration.
    pub fn new(config: EngineConfig, store: Arc<dyn ProfileStore>) -> Result<Self> {
        config.validate()?;
        let graph = PrerequisiteGraph::from_edges(&config.prerequisites)?;
        let catalog = SignalCatalog::from_table(&config.signals)?;

        tracing::info!(
            edges = graph.edges().len(),
            storage = %config.storage.dir.display(),
            "Skill service ready"
        );

        Ok(Self {
            config,
            graph,
            catalog,
            engine: ScoringEngine::new(),
            store,
            locks: LockRegistry::default(),
        })
    }

    /// Build a service backed by JSON files under `config.storage.dir`.
    pub async fn open(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let store =
            JsonFileProfileStore::open(config.storage.dir.clone(), config.levels.clone()).await?;
        Self::new(config, Arc::new(store))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &PrerequisiteGraph {
        &self.graph
    }

    pub fn catalog(&self) -> &SignalCatalog {
        &self.catalog
    }

    /// Fold one piece of evidence into `user`'s profile and persist it.
    ///
    /// Duplicates return `accepted = false` and write nothing.
    ///
    /// # Errors
    /// - `MalformedEvidence`: nothing is loaded or written
    /// - `Storage`: the stored profile could not be read (so it is not
    ///   overwritten) or the save failed
    pub async fn record(&self, user: &UserId, evidence: Evidence) -> Result<RecordOutcome> {
        evidence.validate()?;
        let _lease = self.locks.acquire(user).await;

        let mut profile = self.load_for_update(user).await?;
        let outcome = self.engine.record(&mut profile, evidence)?;
        if outcome.accepted {
            self.store.save(user, &profile).await?;
        }
        Ok(outcome)
    }

    /// Fold a batch with a single load and save.
    ///
    /// The whole batch is validated before anything is applied.
    pub async fn record_batch(
        &self,
        user: &UserId,
        batch: Vec<Evidence>,
    ) -> Result<Vec<RecordOutcome>> {
        for evidence in &batch {
            evidence.validate()?;
        }
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let _lease = self.locks.acquire(user).await;

        let mut profile = self.load_for_update(user).await?;
        let outcomes = self.engine.record_all(&mut profile, batch)?;
        if outcomes.iter().any(|o| o.accepted) {
            self.store.save(user, &profile).await?;
        }
        Ok(outcomes)
    }

    /// Scan free text for catalog signals and record every match.
    pub async fn record_text(
        &self,
        user: &UserId,
        text: &str,
        source: &str,
        tier: MaturityTier,
    ) -> Result<Vec<RecordOutcome>> {
        let found = self.catalog.scan(text, source, tier.multiplier())?;
        tracing::debug!(user = %user, source = %source, matches = found.len(), "Scanned text for signals");
        self.record_batch(user, found).await
    }

    pub async fn get_skill_profile(&self, user: &UserId) -> SkillProfileView {
        let (profile, warning) = self.load(user).await;
        let classifier = &self.config.levels;

        SkillProfileView {
            user_id: user.clone(),
            overall_level: profile.overall_level(classifier),
            skills: profile
                .skills
                .iter()
                .map(|(domain, state)| (*domain, SkillSnapshot::of(state, classifier)))
                .collect(),
            warning,
        }
    }

    pub async fn get_learning_path(&self, user: &UserId) -> LearningPath {
        let (profile, warning) = self.load(user).await;
        let classifier = &self.config.levels;

        let gaps = self.graph.detect_gaps(&profile, classifier, &self.config.gaps);
        let entries = path::generate(&profile, &gaps, classifier, &self.config.path);

        LearningPath {
            user_id: user.clone(),
            entries,
            strengths: path::strengths(&profile, classifier),
            gaps,
            warning,
        }
    }

    pub async fn skill_level(&self, user: &UserId, domain: Domain) -> Level {
        let (profile, _) = self.load(user).await;
        profile.level(domain, &self.config.levels)
    }

    /// Level to adapt explanations to when a request touches `domains`.
    ///
    /// The weakest tracked level among `domains`; when none of them is
    /// tracked, the user's overall level. A user with no tracked domain at
    /// all is `Level::Unknown`: nothing is assumed about skill that has not
    /// been observed, and callers pick their own default for that case.
    pub async fn effective_level(&self, user: &UserId, domains: &[Domain]) -> Level {
        let (profile, _) = self.load(user).await;
        let classifier = &self.config.levels;
        profile
            .weakest_level(domains, classifier)
            .unwrap_or_else(|| profile.overall_level(classifier))
    }

    /// Drop all state for one domain. Returns whether there was any.
    pub async fn reset_domain(&self, user: &UserId, domain: Domain) -> Result<bool> {
        let _lease = self.locks.acquire(user).await;

        let mut profile = self.load_for_update(user).await?;
        if profile.skills.remove(&domain).is_none() {
            return Ok(false);
        }
        self.store.save(user, &profile).await?;
        tracing::info!(user = %user, domain = %domain, "Skill domain reset");
        Ok(true)
    }

    /// Read path: serialized with writers, never fails
    async fn load(&self, user: &UserId) -> (UserProfile, Option<StoreWarning>) {
        let _lease = self.locks.acquire(user).await;
        let loaded = self.store.load(user).await;
        (loaded.profile, loaded.warning)
    }

    /// Write path: caller holds the user's lock
    async fn load_for_update(&self, user: &UserId) -> Result<UserProfile> {
        let loaded = self.store.load(user).await;
        match loaded.warning {
            Some(StoreWarning::Unavailable(detail)) => Err(StorageError::Unavailable(detail).into()),
            Some(StoreWarning::Corrupted(detail)) => {
                tracing::warn!(user = %user, detail = %detail, "Recording over corrupted profile as a new user");
                Ok(loaded.profile)
            }
            None => Ok(loaded.profile),
        }
    }
}

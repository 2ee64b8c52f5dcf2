//! One JSON file per user in a directory
//!
//! Writes are atomic: the record goes to `<user>.json.tmp`, is synced, then
//! renamed over `<user>.json`. A crash mid-write leaves at most a stale
//! `.tmp` file, which is removed the next time the store is opened.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::record::{self, compute_checksum};
use super::{LoadedProfile, ProfileStore, StoreWarning};
use crate::errors::{Result, StorageError};
use crate::level::LevelClassifier;
use crate::profile::{UserId, UserProfile};

pub struct JsonFileProfileStore {
    dir: PathBuf,
    classifier: LevelClassifier,
}

impl JsonFileProfileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    ///
    /// `classifier` is used to turn levels from legacy records back into
    /// scores.
    pub async fn open(dir: impl Into<PathBuf>, classifier: LevelClassifier) -> Result<Self> {
        let store = Self {
            dir: dir.into(),
            classifier,
        };
        fs::create_dir_all(&store.dir)
            .await
            .map_err(|e| StorageError::Unavailable(format!("{}: {}", store.dir.display(), e)))?;
        store.recover_interrupted_writes().await;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `user`'s record
    pub fn path_for(&self, user: &UserId) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(user)))
    }

    async fn write_atomic(&self, path: &Path, content: &str) -> std::result::Result<(), StorageError> {
        let tmp_path = path.with_extension("json.tmp");
        let failed = |e: std::io::Error| StorageError::WriteFailed(format!("{}: {}", path.display(), e));

        fs::write(&tmp_path, content).await.map_err(failed)?;

        let tmp_path_clone = tmp_path.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::File::open(&tmp_path_clone).and_then(|file| file.sync_all())
        })
        .await
        .map_err(|e| StorageError::WriteFailed(format!("sync task failed: {}", e)))?
        .map_err(failed)?;

        fs::rename(&tmp_path, path).await.map_err(failed)?;

        debug!(path = %path.display(), "Atomic write completed");
        Ok(())
    }

    async fn recover_interrupted_writes(&self) {
        if let Ok(mut entries) = fs::read_dir(&self.dir).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "tmp") {
                    debug!(path = %path.display(), "Removing interrupted write");
                    let _ = fs::remove_file(&path).await;
                }
            }
        }
    }

    /// Keep a copy of an undecodable record next to it before it is overwritten
    async fn quarantine(&self, path: &Path) {
        let backup = path.with_extension("json.corrupt");
        if let Err(e) = fs::copy(path, &backup).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to back up corrupted profile");
        }
    }
}

#[async_trait]
impl ProfileStore for JsonFileProfileStore {
    async fn load(&self, user: &UserId) -> LoadedProfile {
        let path = self.path_for(user);
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return LoadedProfile::clean(UserProfile::new());
            }
            Err(e) => {
                tracing::warn!(user = %user, path = %path.display(), error = %e, "Profile unreadable");
                return LoadedProfile::fallback(StoreWarning::Unavailable(e.to_string()));
            }
        };

        match record::decode(&text, &self.classifier) {
            Ok(profile) => LoadedProfile::clean(profile),
            Err(e) => {
                tracing::warn!(user = %user, path = %path.display(), error = %e, "Corrupted profile, starting fresh");
                self.quarantine(&path).await;
                LoadedProfile::fallback(StoreWarning::Corrupted(e.to_string()))
            }
        }
    }

    async fn save(&self, user: &UserId, profile: &UserProfile) -> Result<()> {
        let content = record::encode(user, profile)?;
        self.write_atomic(&self.path_for(user), &content).await?;
        Ok(())
    }
}

/// Filesystem-safe stem for a user id.
///
/// Characters outside `[A-Za-z0-9_-]` become `_`; when anything was replaced
/// a short hash of the original id is appended so distinct ids never share a
/// file.
fn file_stem(user: &UserId) -> String {
    let id = user.as_str();
    let safe: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if safe == id && !safe.is_empty() {
        safe
    } else {
        format!("{}-{}", safe, &compute_checksum(id.as_bytes())[..12])
    }
}

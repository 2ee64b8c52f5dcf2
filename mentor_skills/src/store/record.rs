//! Versioned on-disk record for one user's profile
//!
//! Current layout (version 2):
//!
//! ```json
//! { "version": 2, "user_id": "...", "saved_at": "...", "checksum": "<sha256 hex>",
//!   "skills": { "<domain>": { ...SkillState... } } }
//! ```
//!
//! Version 1 records carry `user_level` and a `skills` map of
//! `{level, evidence_count, last_feedback}` keyed by legacy names (`docker`,
//! `terraform`, ...). Every record, whatever its version, is decoded
//! leniently: missing fields are filled from what is present, so scoring and
//! ranking code only ever sees complete `SkillState` values.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::Domain;
use crate::errors::{Result, StorageError};
use crate::evidence::Evidence;
use crate::level::{Level, LevelClassifier};
use crate::profile::{SkillState, UserId, UserProfile};

pub const CURRENT_VERSION: u64 = 2;

/// Compute SHA-256 checksum of record data
pub fn compute_checksum(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[derive(Serialize)]
struct RecordEnvelope<'a> {
    version: u64,
    user_id: &'a str,
    saved_at: DateTime<Utc>,
    checksum: String,
    skills: Value,
}

/// Serialized skill entry with every field optional
#[derive(Deserialize)]
struct StoredSkill {
    #[serde(default)]
    raw_score: Option<f64>,
    #[serde(default)]
    weighted_score: Option<f64>,
    /// Only present in version 1 records
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    evidence_count: Option<u64>,
    /// Version 1 stored feedback strings here; those entries are dropped
    #[serde(default)]
    history: Vec<Value>,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    baseline_raw: Option<f64>,
    #[serde(default)]
    baseline_weighted: Option<f64>,
}

/// Encode `profile` as a current-version record.
pub fn encode(user: &UserId, profile: &UserProfile) -> Result<String> {
    let skills: BTreeMap<&str, &SkillState> = profile
        .skills
        .iter()
        .map(|(domain, state)| (domain.as_str(), state))
        .collect();
    let skills = serde_json::to_value(skills)?;
    let checksum = compute_checksum(&serde_json::to_vec(&skills)?);

    let envelope = RecordEnvelope {
        version: CURRENT_VERSION,
        user_id: user.as_str(),
        saved_at: Utc::now(),
        checksum,
        skills,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Decode a record of any known version.
///
/// # Errors
/// `StorageError::Corrupted` when the text is not a JSON object, the version
/// is newer than this build understands, the `skills` section is missing or
/// malformed, or a version 2 checksum does not match.
pub fn decode(text: &str, classifier: &LevelClassifier) -> std::result::Result<UserProfile, StorageError> {
    let doc: Value = serde_json::from_str(text)
        .map_err(|e| StorageError::Corrupted(format!("not valid JSON: {}", e)))?;
    let obj = doc
        .as_object()
        .ok_or_else(|| StorageError::Corrupted("record is not a JSON object".to_string()))?;

    let version = obj.get("version").and_then(Value::as_u64).unwrap_or(1);
    if version > CURRENT_VERSION {
        return Err(StorageError::Corrupted(format!(
            "unsupported record version {}",
            version
        )));
    }

    let skills = obj
        .get("skills")
        .ok_or_else(|| StorageError::Corrupted("record has no skills section".to_string()))?;

    if version >= 2 {
        let stored = obj.get("checksum").and_then(Value::as_str).unwrap_or_default();
        let bytes = serde_json::to_vec(skills)
            .map_err(|e| StorageError::Corrupted(e.to_string()))?;
        let expected = compute_checksum(&bytes);
        if stored != expected {
            return Err(StorageError::Corrupted(format!(
                "checksum mismatch: expected {}, got {}",
                expected, stored
            )));
        }
    }

    let entries: BTreeMap<String, StoredSkill> = serde_json::from_value(skills.clone())
        .map_err(|e| StorageError::Corrupted(format!("malformed skills section: {}", e)))?;

    let mut profile = UserProfile::new();
    for (key, stored) in entries {
        let domain = match key.parse::<Domain>() {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Skipping unknown domain in stored profile");
                continue;
            }
        };
        if profile.skills.contains_key(&domain) {
            tracing::warn!(key = %key, domain = %domain, "Skipping duplicate domain in stored profile");
            continue;
        }
        profile.skills.insert(domain, fill_defaults(domain, stored, classifier));
    }
    Ok(profile)
}

/// Complete a stored entry so it behaves like a freshly computed state.
///
/// raw falls back to weighted, then to the floor of a stored level, then 0;
/// weighted falls back to raw. Whatever the surviving history does not
/// account for becomes the baseline.
fn fill_defaults(domain: Domain, stored: StoredSkill, classifier: &LevelClassifier) -> SkillState {
    let level_floor = stored.level.as_deref().and_then(|name| match name.parse::<Level>() {
        Ok(level) => Some(classifier.thresholds(domain).floor_of(level)),
        Err(_) => {
            tracing::warn!(domain = %domain, level = %name, "Ignoring unknown stored level");
            None
        }
    });

    let raw_score = stored
        .raw_score
        .or(stored.weighted_score)
        .or(level_floor)
        .unwrap_or(0.0);
    let weighted_score = stored.weighted_score.unwrap_or(raw_score);

    let history: Vec<Evidence> = stored
        .history
        .into_iter()
        .filter_map(|v| serde_json::from_value::<Evidence>(v).ok())
        .filter(|e| e.domain == domain && e.validate().is_ok())
        .collect();

    let (history_raw, history_weighted) = history
        .iter()
        .fold((0.0, 0.0), |(r, w), e| (r + e.weight, w + e.weighted_value()));

    SkillState {
        domain,
        raw_score,
        weighted_score,
        evidence_count: stored.evidence_count.unwrap_or(history.len() as u64),
        last_updated: stored
            .last_updated
            .or_else(|| history.iter().map(|e| e.recorded_at).max()),
        baseline_raw: stored.baseline_raw.unwrap_or(raw_score - history_raw),
        baseline_weighted: stored
            .baseline_weighted
            .unwrap_or(weighted_score - history_weighted),
        history,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoringEngine;

    fn sample_profile() -> UserProfile {
        let engine = ScoringEngine::new();
        let mut profile = UserProfile::new();
        for (domain, signal, weight, multiplier) in [
            (Domain::Security, "oidc", 5.0, 1.0),
            (Domain::Security, "encryption", 3.0, 1.2),
            (Domain::CiCd, "workflow", 1.5, 0.75),
        ] {
            let e = Evidence::new(domain, signal, weight, multiplier, "repo").unwrap();
            engine.record(&mut profile, e).unwrap();
        }
        profile
    }

    #[test]
    fn test_encode_then_decode_preserves_profile() {
        let profile = sample_profile();
        let text = encode(&UserId::from("alice"), &profile).unwrap();
        let decoded = decode(&text, &LevelClassifier::default()).unwrap();
        assert_eq!(decoded, profile);
        assert!(decoded.skills.values().all(SkillState::verify));
    }

    #[test]
    fn test_tampered_record_is_corrupted() {
        let text = encode(&UserId::from("alice"), &sample_profile()).unwrap();
        let tampered = text.replacen("\"evidence_count\": 2", "\"evidence_count\": 9", 1);
        assert_ne!(tampered, text);

        let err = decode(&tampered, &LevelClassifier::default()).unwrap_err();
        assert!(matches!(err, StorageError::Corrupted(_)));
    }

    #[test]
    fn test_garbage_is_corrupted() {
        let classifier = LevelClassifier::default();
        assert!(decode("{\"skills\": ", &classifier).is_err());
        assert!(decode("[1, 2, 3]", &classifier).is_err());
        assert!(decode("{\"user_level\": \"junior\"}", &classifier).is_err());
        assert!(decode("{\"version\": 99, \"skills\": {}}", &classifier).is_err());
    }

    #[test]
    fn test_legacy_level_only_record() {
        let legacy = r#"{
            "user_level": "junior",
            "skills": {
                "docker": {"level": "developing", "evidence_count": 3, "last_feedback": "some feedback"},
                "aws": {"level": "beginner", "evidence_count": 1, "history": ["used IAM roles"]}
            }
        }"#;
        let classifier = LevelClassifier::default();
        let profile = decode(legacy, &classifier).unwrap();

        let containers = profile.get(Domain::Containers).unwrap();
        assert_eq!(containers.raw_score, 5.0);
        assert_eq!(containers.weighted_score, 5.0);
        assert_eq!(containers.evidence_count, 3);
        assert!(containers.history.is_empty());
        assert_eq!(containers.level(&classifier), Level::Developing);
        assert!(containers.verify());

        let cloud = profile.get(Domain::CloudPlatform).unwrap();
        assert_eq!(cloud.level(&classifier), Level::Beginner);
        assert!(cloud.history.is_empty());
    }

    #[test]
    fn test_missing_weighted_defaults_to_raw() {
        let record = r#"{"skills": {"testing": {"raw_score": 7.5, "evidence_count": 4}}}"#;
        let profile = decode(record, &LevelClassifier::default()).unwrap();
        let testing = profile.get(Domain::Testing).unwrap();
        assert_eq!(testing.weighted_score, 7.5);
        assert_eq!(testing.baseline_weighted, 7.5);
        assert!(testing.verify());
    }

    #[test]
    fn test_unknown_domain_keys_are_skipped() {
        let record = r#"{"skills": {"kubernetes": {"raw_score": 3.0}, "terraform": {"raw_score": 2.0}}}"#;
        let profile = decode(record, &LevelClassifier::default()).unwrap();
        assert_eq!(profile.skills.len(), 1);
        assert_eq!(profile.weighted_score(Domain::InfrastructureAsCode), 2.0);
    }
}

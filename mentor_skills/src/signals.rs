//! Signal catalog: the domain -> {signal, weight} table
//!
//! Loaded once at start-up and read-only afterwards. Collaborators that only
//! have free text (review findings, prompts) use `scan` to turn it into
//! evidence; structured producers look weights up with `weight_of`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::errors::{Result, SkillError};
use crate::evidence::{normalize_signal, Evidence};

/// One keyword and the base weight it contributes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub signal: String,
    pub weight: f64,
}

impl Signal {
    pub fn new(signal: &str, weight: f64) -> Self {
        Self {
            signal: normalize_signal(signal),
            weight,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SignalCatalog {
    entries: BTreeMap<Domain, Vec<Signal>>,
}

impl SignalCatalog {
    /// Build from a table keyed by domain name.
    ///
    /// # Errors
    /// `InvalidConfiguration` for an unknown domain name, an empty signal, or
    /// a negative / non-finite weight.
    pub fn from_table(table: &BTreeMap<String, Vec<Signal>>) -> Result<Self> {
        let mut entries: BTreeMap<Domain, Vec<Signal>> = BTreeMap::new();
        for (name, signals) in table {
            let domain = name
                .parse::<Domain>()
                .map_err(|e| SkillError::InvalidConfiguration(format!("signal table: {}", e)))?;
            let slot = entries.entry(domain).or_default();
            for s in signals {
                let signal = Signal::new(&s.signal, s.weight);
                if signal.signal.is_empty() {
                    return Err(SkillError::InvalidConfiguration(format!(
                        "signal table: empty signal for {}",
                        domain
                    )));
                }
                if !signal.weight.is_finite() || signal.weight < 0.0 {
                    return Err(SkillError::InvalidConfiguration(format!(
                        "signal table: weight for '{}' must be finite and non-negative",
                        signal.signal
                    )));
                }
                slot.push(signal);
            }
        }
        Ok(Self { entries })
    }

    pub fn signals(&self, domain: Domain) -> &[Signal] {
        self.entries.get(&domain).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn weight_of(&self, domain: Domain, signal: &str) -> Option<f64> {
        let key = normalize_signal(signal);
        self.signals(domain)
            .iter()
            .find(|s| s.signal == key)
            .map(|s| s.weight)
    }

    /// Every catalog signal that occurs in `text`, as evidence.
    ///
    /// Matching is a case-insensitive substring test. Output follows domain
    /// order, then catalog order within a domain.
    pub fn scan(&self, text: &str, source: &str, maturity_multiplier: f64) -> Result<Vec<Evidence>> {
        let haystack = text.to_lowercase();
        let mut found = Vec::new();
        for (domain, signals) in &self.entries {
            for s in signals.iter().filter(|s| haystack.contains(s.signal.as_str())) {
                found.push(Evidence::new(*domain, &s.signal, s.weight, maturity_multiplier, source)?);
            }
        }
        Ok(found)
    }

    /// The table in its configuration form
    pub fn to_table(&self) -> BTreeMap<String, Vec<Signal>> {
        self.entries
            .iter()
            .map(|(d, s)| (d.as_str().to_string(), s.clone()))
            .collect()
    }
}

impl Default for SignalCatalog {
    fn default() -> Self {
        let table: [(Domain, &[(&str, f64)]); 7] = [
            (
                Domain::CiCd,
                &[
                    ("github actions", 2.0),
                    ("workflow", 1.5),
                    ("pipeline", 1.5),
                    ("ci", 1.0),
                    ("deploy", 1.0),
                    ("artifact", 1.5),
                    ("matrix strategy", 2.0),
                    ("concurrency", 1.5),
                ],
            ),
            (
                Domain::Containers,
                &[
                    ("dockerfile", 2.0),
                    ("docker-compose", 2.0),
                    ("container", 1.0),
                    ("multi-stage", 2.0),
                    ("docker", 1.0),
                ],
            ),
            (
                Domain::InfrastructureAsCode,
                &[
                    ("terraform", 2.0),
                    ("hcl", 2.0),
                    ("tfstate", 2.0),
                    ("tfvars", 1.5),
                    ("provider", 1.5),
                    ("module", 1.5),
                    ("remote backend", 2.0),
                    ("state locking", 2.0),
                ],
            ),
            (
                Domain::CloudPlatform,
                &[
                    ("iam", 2.0),
                    ("s3", 1.5),
                    ("ec2", 1.5),
                    ("lambda", 1.5),
                    ("ecs", 1.5),
                    ("eks", 2.0),
                    ("rds", 1.5),
                    ("cloudfront", 1.5),
                    ("vpc", 1.5),
                    ("security group", 2.0),
                    ("auto-scaling", 2.0),
                    ("aws", 1.0),
                ],
            ),
            (
                Domain::Security,
                &[
                    ("secrets", 2.0),
                    ("iam", 1.5),
                    ("oidc", 2.0),
                    ("rbac", 2.0),
                    ("least-privilege", 2.0),
                    ("permissions", 1.0),
                    ("encryption", 2.0),
                    ("hardcoded credential", 2.0),
                ],
            ),
            (
                Domain::Observability,
                &[
                    ("prometheus", 2.0),
                    ("grafana", 2.0),
                    ("datadog", 2.0),
                    ("cloudwatch", 2.0),
                    ("logging", 1.0),
                    ("monitoring", 1.0),
                    ("alerting", 1.5),
                    ("tracing", 2.0),
                ],
            ),
            (
                Domain::Testing,
                &[
                    ("pytest", 2.0),
                    ("jest", 2.0),
                    ("unittest", 1.5),
                    ("coverage", 1.5),
                    ("integration test", 2.0),
                    ("e2e", 2.0),
                    ("test", 1.0),
                ],
            ),
        ];

        let entries = table
            .iter()
            .map(|(domain, signals)| {
                let signals = signals.iter().map(|(s, w)| Signal::new(s, *w)).collect();
                (*domain, signals)
            })
            .collect();
        Self { entries }
    }
}

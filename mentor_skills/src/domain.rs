//! Closed set of skill domains
//!
//! Declaration order is significant: it is the final tie-breaker wherever
//! domains are ranked, so results never depend on map iteration order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A DevOps skill area
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    #[serde(alias = "cicd")]
    CiCd,
    #[serde(alias = "docker")]
    Containers,
    #[serde(alias = "terraform")]
    InfrastructureAsCode,
    #[serde(alias = "aws")]
    CloudPlatform,
    Security,
    Observability,
    Testing,
}

impl Domain {
    /// Every domain, in enumeration order
    pub const ALL: [Domain; 7] = [
        Domain::CiCd,
        Domain::Containers,
        Domain::InfrastructureAsCode,
        Domain::CloudPlatform,
        Domain::Security,
        Domain::Observability,
        Domain::Testing,
    ];

    /// Canonical storage key
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::CiCd => "ci_cd",
            Domain::Containers => "containers",
            Domain::InfrastructureAsCode => "infrastructure_as_code",
            Domain::CloudPlatform => "cloud_platform",
            Domain::Security => "security",
            Domain::Observability => "observability",
            Domain::Testing => "testing",
        }
    }

    /// Position in enumeration order
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a name does not map to any domain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown domain '{0}'")]
pub struct UnknownDomain(pub String);

impl FromStr for Domain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' || c == '/' { '_' } else { c })
            .collect();

        match key.as_str() {
            "ci_cd" | "cicd" | "ci" => Ok(Domain::CiCd),
            "containers" | "container" | "docker" => Ok(Domain::Containers),
            "infrastructure_as_code" | "iac" | "terraform" => Ok(Domain::InfrastructureAsCode),
            "cloud_platform" | "cloud" | "aws" => Ok(Domain::CloudPlatform),
            "security" => Ok(Domain::Security),
            "observability" => Ok(Domain::Observability),
            "testing" => Ok(Domain::Testing),
            _ => Err(UnknownDomain(s.to_string())),
        }
    }
}

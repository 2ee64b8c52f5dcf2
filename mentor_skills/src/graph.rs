//! Prerequisite graph and gap detection
//!
//! Edge direction: A -> B means "A depends on B", so B is a prerequisite of A
//! and A is a dependent of B. The graph is built once at start-up and must be
//! acyclic; it is read-only afterwards.

use std::collections::HashMap;

use indexmap::IndexSet;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::errors::{Result, SkillError};
use crate::level::{Level, LevelClassifier};
use crate::profile::UserProfile;

/// Edge as written in configuration, by domain name
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub domain: String,
    pub depends_on: String,
}

impl EdgeSpec {
    pub fn new(domain: Domain, depends_on: Domain) -> Self {
        Self {
            domain: domain.as_str().to_string(),
            depends_on: depends_on.as_str().to_string(),
        }
    }
}

const DEFAULT_EDGES: [(Domain, Domain); 4] = [
    (Domain::Security, Domain::CloudPlatform),
    (Domain::InfrastructureAsCode, Domain::CloudPlatform),
    (Domain::Observability, Domain::CiCd),
    (Domain::Observability, Domain::Containers),
];

/// Default prerequisite relation
pub fn default_edges() -> Vec<EdgeSpec> {
    DEFAULT_EDGES
        .iter()
        .map(|(domain, depends_on)| EdgeSpec::new(*domain, *depends_on))
        .collect()
}

/// When a dependent/prerequisite pair counts as a gap
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapPolicy {
    /// Dependent must be at or above this level
    pub dependent_at_least: Level,
    /// Prerequisite must be at or below this level
    pub prerequisite_at_most: Level,
}

impl Default for GapPolicy {
    fn default() -> Self {
        Self {
            dependent_at_least: Level::Developing,
            prerequisite_at_most: Level::Beginner,
        }
    }
}

/// Advanced surface skill without the foundation underneath it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteGap {
    pub domain: Domain,
    pub prerequisite: Domain,
    pub domain_level: Level,
    pub prerequisite_level: Level,
    /// Rank distance between the two levels
    pub severity: u8,
}

#[derive(Clone, Debug)]
pub struct PrerequisiteGraph {
    graph: DiGraph<Domain, ()>,
    node_indices: HashMap<Domain, NodeIndex>,
}

impl PrerequisiteGraph {
    /// Build and validate the graph.
    ///
    /// # Errors
    /// `InvalidGraphConfiguration` if an edge names an unknown domain or the
    /// edges contain a cycle (a self-edge included).
    pub fn from_edges(edges: &[EdgeSpec]) -> Result<Self> {
        let mut pairs = Vec::with_capacity(edges.len());
        for edge in edges {
            let from = parse_endpoint(&edge.domain)?;
            let to = parse_endpoint(&edge.depends_on)?;
            if from == to {
                return Err(SkillError::InvalidGraphConfiguration(format!(
                    "{} cannot depend on itself",
                    from
                )));
            }
            pairs.push((from, to));
        }

        let built = Self::build(&pairs);
        let cycles = built.detect_cycles();
        if let Some(cycle) = cycles.first() {
            let names: Vec<&str> = cycle.iter().map(|d| d.as_str()).collect();
            return Err(SkillError::InvalidGraphConfiguration(format!(
                "prerequisite cycle between: {}",
                names.join(", ")
            )));
        }
        Ok(built)
    }

    /// Domains `domain` depends on directly, in enumeration order
    pub fn prerequisites(&self, domain: Domain) -> IndexSet<Domain> {
        self.neighbors(domain, petgraph::Direction::Outgoing)
    }

    /// Domains that depend directly on `domain`, in enumeration order
    pub fn dependents(&self, domain: Domain) -> IndexSet<Domain> {
        self.neighbors(domain, petgraph::Direction::Incoming)
    }

    /// All (dependent, prerequisite) pairs, in enumeration order
    pub fn edges(&self) -> Vec<(Domain, Domain)> {
        Domain::ALL
            .iter()
            .flat_map(|d| self.prerequisites(*d).into_iter().map(move |p| (*d, p)))
            .collect()
    }

    /// Strongly connected components with more than one member
    pub fn detect_cycles(&self) -> Vec<Vec<Domain>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut members: Vec<Domain> = scc.into_iter().map(|idx| self.graph[idx]).collect();
                members.sort();
                members
            })
            .collect()
    }

    /// Find every dependent that outpaces one of its prerequisites.
    ///
    /// Domains without state count as `Unknown`. Output is ordered by severity
    /// (descending), then dependent, then prerequisite in enumeration order.
    pub fn detect_gaps(
        &self,
        profile: &UserProfile,
        classifier: &LevelClassifier,
        policy: &GapPolicy,
    ) -> Vec<PrerequisiteGap> {
        let mut gaps: Vec<PrerequisiteGap> = self
            .edges()
            .into_iter()
            .filter_map(|(domain, prerequisite)| {
                let domain_level = profile.level(domain, classifier);
                let prerequisite_level = profile.level(prerequisite, classifier);
                if domain_level >= policy.dependent_at_least
                    && prerequisite_level <= policy.prerequisite_at_most
                {
                    Some(PrerequisiteGap {
                        domain,
                        prerequisite,
                        domain_level,
                        prerequisite_level,
                        severity: domain_level.rank().saturating_sub(prerequisite_level.rank()),
                    })
                } else {
                    None
                }
            })
            .collect();

        gaps.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(a.domain.cmp(&b.domain))
                .then(a.prerequisite.cmp(&b.prerequisite))
        });
        gaps
    }

    fn build(pairs: &[(Domain, Domain)]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        for domain in Domain::ALL {
            node_indices.insert(domain, graph.add_node(domain));
        }
        for (from, to) in pairs {
            let (a, b) = (node_indices[from], node_indices[to]);
            if graph.find_edge(a, b).is_none() {
                graph.add_edge(a, b, ());
            }
        }
        Self { graph, node_indices }
    }

    fn neighbors(&self, domain: Domain, direction: petgraph::Direction) -> IndexSet<Domain> {
        let idx = self.node_indices[&domain];
        let mut found: Vec<Domain> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n])
            .collect();
        found.sort();
        found.into_iter().collect()
    }
}

impl Default for PrerequisiteGraph {
    fn default() -> Self {
        Self::build(&DEFAULT_EDGES)
    }
}

fn parse_endpoint(name: &str) -> Result<Domain> {
    name.parse::<Domain>()
        .map_err(|e| SkillError::InvalidGraphConfiguration(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::SkillState;

    fn profile_with(levels: &[(Domain, f64)]) -> UserProfile {
        let mut profile = UserProfile::new();
        for (domain, score) in levels {
            let mut state = SkillState::new(*domain);
            state.weighted_score = *score;
            state.raw_score = *score;
            state.baseline_raw = *score;
            state.baseline_weighted = *score;
            profile.skills.insert(*domain, state);
        }
        profile
    }

    #[test]
    fn test_default_matches_default_edges() {
        let built = PrerequisiteGraph::from_edges(&default_edges()).unwrap();
        assert_eq!(built.edges(), PrerequisiteGraph::default().edges());
        assert_eq!(built.edges().len(), 4);
    }

    #[test]
    fn test_prerequisites_and_dependents() {
        let graph = PrerequisiteGraph::default();
        let prereqs = graph.prerequisites(Domain::Observability);
        assert_eq!(prereqs.into_iter().collect::<Vec<_>>(), vec![Domain::CiCd, Domain::Containers]);

        let dependents = graph.dependents(Domain::CloudPlatform);
        assert_eq!(
            dependents.into_iter().collect::<Vec<_>>(),
            vec![Domain::InfrastructureAsCode, Domain::Security]
        );
        assert!(graph.prerequisites(Domain::Testing).is_empty());
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut edges = default_edges();
        edges.push(EdgeSpec::new(Domain::CloudPlatform, Domain::Security));
        let err = PrerequisiteGraph::from_edges(&edges).unwrap_err();
        assert!(matches!(err, SkillError::InvalidGraphConfiguration(_)));
    }

    #[test]
    fn test_self_edge_is_rejected() {
        let edges = vec![EdgeSpec::new(Domain::Testing, Domain::Testing)];
        assert!(PrerequisiteGraph::from_edges(&edges).is_err());
    }

    #[test]
    fn test_unknown_domain_is_rejected() {
        let edges = vec![EdgeSpec {
            domain: "security".to_string(),
            depends_on: "networking".to_string(),
        }];
        let err = PrerequisiteGraph::from_edges(&edges).unwrap_err();
        assert!(matches!(err, SkillError::InvalidGraphConfiguration(_)));
    }

    #[test]
    fn test_advanced_without_foundation_is_a_gap() {
        let graph = PrerequisiteGraph::default();
        let classifier = LevelClassifier::default();
        // cloud_platform has no state at all
        let profile = profile_with(&[(Domain::Security, 40.0)]);

        let gaps = graph.detect_gaps(&profile, &classifier, &GapPolicy::default());
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].domain, Domain::Security);
        assert_eq!(gaps[0].prerequisite, Domain::CloudPlatform);
        assert_eq!(gaps[0].prerequisite_level, Level::Unknown);
        assert_eq!(gaps[0].severity, 4);
    }

    #[test]
    fn test_both_advanced_is_not_a_gap() {
        let graph = PrerequisiteGraph::default();
        let classifier = LevelClassifier::default();
        let profile = profile_with(&[(Domain::Security, 40.0), (Domain::CloudPlatform, 35.0)]);

        assert!(graph
            .detect_gaps(&profile, &classifier, &GapPolicy::default())
            .is_empty());
    }

    #[test]
    fn test_gaps_ordered_by_severity() {
        let graph = PrerequisiteGraph::default();
        let classifier = LevelClassifier::default();
        let profile = profile_with(&[
            (Domain::Observability, 6.0),  // developing
            (Domain::Security, 31.0),      // advanced
            (Domain::Containers, 2.5),     // beginner
        ]);

        let gaps = graph.detect_gaps(&profile, &classifier, &GapPolicy::default());
        let pairs: Vec<(Domain, Domain, u8)> =
            gaps.iter().map(|g| (g.domain, g.prerequisite, g.severity)).collect();
        assert_eq!(
            pairs,
            vec![
                (Domain::Security, Domain::CloudPlatform, 4),
                (Domain::Observability, Domain::CiCd, 2),
                (Domain::Observability, Domain::Containers, 1),
            ]
        );
    }

    #[test]
    fn test_policy_controls_detection() {
        let graph = PrerequisiteGraph::default();
        let classifier = LevelClassifier::default();
        let profile = profile_with(&[(Domain::Security, 6.0)]); // developing

        let strict = GapPolicy {
            dependent_at_least: Level::Advanced,
            prerequisite_at_most: Level::Unknown,
        };
        assert!(graph.detect_gaps(&profile, &classifier, &strict).is_empty());
        assert_eq!(graph.detect_gaps(&profile, &classifier, &GapPolicy::default()).len(), 1);
    }
}

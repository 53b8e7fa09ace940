use std::collections::HashMap;

use crate::ir::{GraphSnapshot, MaritalStatus, Person, RelationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpouseLink {
    pub spouse: usize,
    pub status: MaritalStatus,
}

/// Index-based view of one snapshot. Person `i` is `persons[i]`; every
/// adjacency list holds indices into the same arena, in input order.
#[derive(Debug, Clone, Default)]
pub struct FamilyGraph {
    pub persons: Vec<Person>,
    pub index: HashMap<String, usize>,
    pub children: Vec<Vec<usize>>,
    pub parents: Vec<Vec<usize>>,
    pub spouses: Vec<Vec<SpouseLink>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub dropped_nodes: usize,
    pub dropped_edges: usize,
}

impl FamilyGraph {
    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    pub fn lookup(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn is_root(&self, idx: usize) -> bool {
        self.parents[idx].is_empty()
    }

    pub fn is_isolated(&self, idx: usize) -> bool {
        self.parents[idx].is_empty() && self.children[idx].is_empty() && self.spouses[idx].is_empty()
    }

    pub fn spouse_count(&self, idx: usize) -> usize {
        self.spouses[idx].len()
    }

    pub fn are_spouses(&self, a: usize, b: usize) -> bool {
        self.spouses[a].iter().any(|link| link.spouse == b)
    }

    /// Unordered spouse pairs, each once, ordered by the lower index.
    pub fn spouse_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (a, links) in self.spouses.iter().enumerate() {
            for link in links {
                if a < link.spouse {
                    pairs.push((a, link.spouse));
                }
            }
        }
        pairs
    }

    fn add_person(&mut self, person: Person) {
        if let Some(&idx) = self.index.get(&person.id) {
            self.persons[idx] = person;
            return;
        }
        let idx = self.persons.len();
        self.index.insert(person.id.clone(), idx);
        self.persons.push(person);
        self.children.push(Vec::new());
        self.parents.push(Vec::new());
        self.spouses.push(Vec::new());
    }

    fn add_parent(&mut self, parent: usize, child: usize) {
        if self.children[parent].contains(&child) {
            return;
        }
        self.children[parent].push(child);
        self.parents[child].push(parent);
    }

    fn add_spouse(&mut self, a: usize, b: usize, status: MaritalStatus) {
        for (from, to) in [(a, b), (b, a)] {
            let links = &mut self.spouses[from];
            match links.iter_mut().find(|link| link.spouse == to) {
                Some(link) => link.status = status,
                None => links.push(SpouseLink { spouse: to, status }),
            }
        }
    }
}

pub fn build_graph(snapshot: &GraphSnapshot) -> FamilyGraph {
    build_graph_with_report(snapshot).0
}

/// Normalize a snapshot into a `FamilyGraph`. Records without ids, edges with
/// missing or unknown endpoints, self-loops and unknown edge types are dropped
/// and counted in the report; nothing here fails.
pub fn build_graph_with_report(snapshot: &GraphSnapshot) -> (FamilyGraph, BuildReport) {
    let mut graph = FamilyGraph::default();
    let mut report = BuildReport::default();

    for node in &snapshot.nodes {
        let Some(id) = node.id.as_ref().and_then(|id| id.key()) else {
            report.dropped_nodes += 1;
            continue;
        };
        graph.add_person(Person::from_record(id, &node.data));
    }

    for edge in &snapshot.edges {
        let endpoints = edge
            .source
            .as_ref()
            .and_then(|id| id.key())
            .zip(edge.target.as_ref().and_then(|id| id.key()));
        let Some((source, target)) = endpoints else {
            report.dropped_edges += 1;
            continue;
        };
        let (Some(a), Some(b)) = (graph.lookup(&source), graph.lookup(&target)) else {
            tracing::trace!(%source, %target, "edge references unknown person");
            report.dropped_edges += 1;
            continue;
        };
        if a == b {
            report.dropped_edges += 1;
            continue;
        }
        match edge.kind.as_deref().and_then(RelationKind::from_token) {
            Some(RelationKind::Parent) => graph.add_parent(a, b),
            Some(RelationKind::Spouse) => {
                let status = edge
                    .marital_status
                    .as_deref()
                    .and_then(MaritalStatus::from_token)
                    .unwrap_or_default();
                graph.add_spouse(a, b, status);
            }
            None => report.dropped_edges += 1,
        }
    }

    if report.dropped_nodes > 0 || report.dropped_edges > 0 {
        tracing::debug!(
            dropped_nodes = report.dropped_nodes,
            dropped_edges = report.dropped_edges,
            "discarded malformed snapshot records"
        );
    }

    (graph, report)
}

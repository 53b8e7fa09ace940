use std::collections::VecDeque;

use crate::graph::FamilyGraph;

/// Hard cap on spouse reconciliation sweeps.
pub const MAX_RECONCILE_PASSES: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Levels {
    /// Generation per person; `None` when no root reaches the person.
    pub level: Vec<Option<usize>>,
    /// Reconciliation sweeps that ran, at most `MAX_RECONCILE_PASSES`.
    pub passes: usize,
}

impl Levels {
    pub fn get(&self, idx: usize) -> Option<usize> {
        self.level.get(idx).copied().flatten()
    }

    pub fn max_level(&self) -> Option<usize> {
        self.level.iter().flatten().copied().max()
    }
}

pub fn assign_levels(graph: &FamilyGraph) -> Levels {
    let seeds = lineage_roots(graph);
    let mut level = breadth_first_levels(graph, &seeds);
    let passes = reconcile_spouse_levels(graph, &mut level);
    Levels { level, passes }
}

/// Roots that start a lineage: no recorded parents, and nobody they are
/// (transitively) married to has recorded parents either. People who only
/// married into a rooted family get their level from their spouse instead.
/// If that leaves no seed at all, every root is used.
pub(super) fn lineage_roots(graph: &FamilyGraph) -> Vec<usize> {
    let mut married_in = vec![false; graph.len()];
    let mut seen = vec![false; graph.len()];
    for start in 0..graph.len() {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut component = vec![start];
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            for link in &graph.spouses[idx] {
                if !seen[link.spouse] {
                    seen[link.spouse] = true;
                    component.push(link.spouse);
                    stack.push(link.spouse);
                }
            }
        }
        if component.iter().any(|&member| !graph.is_root(member)) {
            for member in component {
                married_in[member] = true;
            }
        }
    }

    let roots: Vec<usize> = (0..graph.len()).filter(|&idx| graph.is_root(idx)).collect();
    let seeds: Vec<usize> = roots.iter().copied().filter(|&idx| !married_in[idx]).collect();
    if seeds.is_empty() { roots } else { seeds }
}

/// Multi-source BFS from `seeds`. A child keeps the level of the first
/// parent that reaches it.
pub(super) fn breadth_first_levels(graph: &FamilyGraph, seeds: &[usize]) -> Vec<Option<usize>> {
    let mut level = vec![None; graph.len()];
    let mut queue = VecDeque::new();
    for &idx in seeds {
        level[idx] = Some(0);
        queue.push_back(idx);
    }
    descend(graph, &mut level, queue);
    level
}

fn descend(graph: &FamilyGraph, level: &mut [Option<usize>], mut queue: VecDeque<usize>) -> bool {
    let mut assigned = false;
    while let Some(idx) = queue.pop_front() {
        let Some(current) = level[idx] else {
            continue;
        };
        for &child in &graph.children[idx] {
            if level[child].is_none() {
                level[child] = Some(current + 1);
                queue.push_back(child);
                assigned = true;
            }
        }
    }
    assigned
}

/// Pull spouses onto a shared generation. The spouse with recorded parents
/// decides; otherwise the deeper level wins. After each sweep, descendants
/// that are still unlevelled inherit from newly levelled parents. Returns the
/// number of sweeps run.
pub(super) fn reconcile_spouse_levels(graph: &FamilyGraph, level: &mut [Option<usize>]) -> usize {
    let pairs = graph.spouse_pairs();
    if pairs.is_empty() {
        return 0;
    }

    let mut passes = 0;
    while passes < MAX_RECONCILE_PASSES {
        passes += 1;
        let mut changed = false;
        for &(a, b) in &pairs {
            let (la, lb) = (level[a], level[b]);
            if la == lb {
                continue;
            }
            let a_has_parents = !graph.is_root(a);
            let b_has_parents = !graph.is_root(b);
            let target = if a_has_parents && !b_has_parents {
                la.or(lb)
            } else if b_has_parents && !a_has_parents {
                lb.or(la)
            } else {
                la.max(lb)
            };
            let Some(target) = target else {
                continue;
            };
            if la != Some(target) {
                level[a] = Some(target);
                changed = true;
            }
            if lb != Some(target) {
                level[b] = Some(target);
                changed = true;
            }
        }
        let levelled: VecDeque<usize> = (0..graph.len()).filter(|&idx| level[idx].is_some()).collect();
        if descend(graph, level, levelled) {
            changed = true;
        }
        if !changed {
            break;
        }
    }

    if passes == MAX_RECONCILE_PASSES {
        tracing::warn!(passes, "spouse level reconciliation hit the pass cap");
    } else {
        tracing::debug!(passes, "spouse levels reconciled");
    }
    passes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::ir::{GraphSnapshot, MaritalStatus};

    fn level_of(graph: &FamilyGraph, levels: &Levels, id: &str) -> Option<usize> {
        levels.get(graph.lookup(id).unwrap())
    }

    #[test]
    fn bfs_counts_generations_from_roots() {
        let mut snapshot = GraphSnapshot::new();
        snapshot
            .person("g", "Grandparent", None)
            .person("p", "Parent", None)
            .person("c", "Child", None)
            .parent("g", "p")
            .parent("p", "c");
        let graph = build_graph(&snapshot);
        let levels = assign_levels(&graph);
        assert_eq!(level_of(&graph, &levels, "g"), Some(0));
        assert_eq!(level_of(&graph, &levels, "p"), Some(1));
        assert_eq!(level_of(&graph, &levels, "c"), Some(2));
        assert_eq!(levels.passes, 0);
    }

    #[test]
    fn first_discovery_wins_for_multiple_parents() {
        // c is a child of root r (depth 1) and of p (depth 1 -> 2).
        let mut snapshot = GraphSnapshot::new();
        snapshot
            .person("r", "R", None)
            .person("g", "G", None)
            .person("p", "P", None)
            .person("c", "C", None)
            .parent("g", "p")
            .parent("r", "c")
            .parent("p", "c");
        let graph = build_graph(&snapshot);
        let levels = assign_levels(&graph);
        assert_eq!(level_of(&graph, &levels, "c"), Some(1));
    }

    #[test]
    fn married_in_spouse_takes_the_rooted_level() {
        let mut snapshot = GraphSnapshot::new();
        snapshot
            .person("g", "G", None)
            .person("h", "Husband", Some("male"))
            .person("w", "Wife", Some("female"))
            .parent("g", "h")
            .spouse("h", "w", MaritalStatus::Married);
        let graph = build_graph(&snapshot);
        let levels = assign_levels(&graph);
        assert_eq!(level_of(&graph, &levels, "h"), Some(1));
        assert_eq!(level_of(&graph, &levels, "w"), Some(1));
        assert!(levels.passes >= 1);
    }

    #[test]
    fn married_in_parent_does_not_flatten_the_next_generation() {
        let mut snapshot = GraphSnapshot::new();
        snapshot
            .person("g", "G", None)
            .person("dad", "Dad", Some("male"))
            .person("mom", "Mom", Some("female"))
            .person("kid", "Kid", None)
            .person("half", "Half-sibling", None)
            .parent("g", "dad")
            .spouse("dad", "mom", MaritalStatus::Married)
            .parent("mom", "kid")
            .parent("dad", "kid")
            .parent("mom", "half");
        let graph = build_graph(&snapshot);
        assert_eq!(lineage_roots(&graph), vec![graph.lookup("g").unwrap()]);
        let levels = assign_levels(&graph);
        assert_eq!(level_of(&graph, &levels, "mom"), Some(1));
        assert_eq!(level_of(&graph, &levels, "kid"), Some(2));
        assert_eq!(level_of(&graph, &levels, "half"), Some(2));
    }

    #[test]
    fn married_in_root_is_not_a_seed() {
        // Seeding every root would start mom at 0 and put her own child on
        // level 1, beside her once reconciliation lifts her to dad's level.
        let mut snapshot = GraphSnapshot::new();
        snapshot
            .person("g", "G", None)
            .person("dad", "Dad", Some("male"))
            .person("mom", "Mom", Some("female"))
            .person("son", "Son", None)
            .parent("g", "dad")
            .spouse("dad", "mom", MaritalStatus::Married)
            .parent("mom", "son");
        let graph = build_graph(&snapshot);
        let (mom, son) = (graph.lookup("mom").unwrap(), graph.lookup("son").unwrap());

        let all_roots: Vec<usize> = (0..graph.len()).filter(|&idx| graph.is_root(idx)).collect();
        let mut flat = breadth_first_levels(&graph, &all_roots);
        reconcile_spouse_levels(&graph, &mut flat);
        assert_eq!(flat[mom], Some(1));
        assert_eq!(flat[son], Some(1));

        assert!(!lineage_roots(&graph).contains(&mom));
        let levels = assign_levels(&graph);
        assert_eq!(levels.get(mom), Some(1));
        assert_eq!(levels.get(son), Some(2));
    }

    #[test]
    fn root_couples_still_seed_the_search() {
        let mut snapshot = GraphSnapshot::new();
        snapshot
            .person("a", "A", None)
            .person("b", "B", None)
            .person("c", "C", None)
            .spouse("a", "b", MaritalStatus::Married)
            .parent("a", "c");
        let graph = build_graph(&snapshot);
        assert_eq!(lineage_roots(&graph).len(), 2);
        let levels = assign_levels(&graph);
        assert_eq!(level_of(&graph, &levels, "b"), Some(0));
        assert_eq!(level_of(&graph, &levels, "c"), Some(1));
    }

    #[test]
    fn both_rooted_spouses_take_the_deeper_level() {
        let mut snapshot = GraphSnapshot::new();
        snapshot
            .person("a0", "A0", None)
            .person("a1", "A1", None)
            .person("a2", "A2", None)
            .person("b0", "B0", None)
            .person("b1", "B1", None)
            .parent("a0", "a1")
            .parent("a1", "a2")
            .parent("b0", "b1")
            .spouse("a2", "b1", MaritalStatus::Married);
        let graph = build_graph(&snapshot);
        let levels = assign_levels(&graph);
        assert_eq!(level_of(&graph, &levels, "a2"), Some(2));
        assert_eq!(level_of(&graph, &levels, "b1"), Some(2));
    }

    #[test]
    fn unreachable_cycle_has_no_level() {
        let mut snapshot = GraphSnapshot::new();
        snapshot
            .person("x", "X", None)
            .person("y", "Y", None)
            .parent("x", "y")
            .parent("y", "x");
        let graph = build_graph(&snapshot);
        let levels = assign_levels(&graph);
        assert_eq!(levels.max_level(), None);
    }

    #[test]
    fn pathological_spouse_cycle_terminates_within_cap() {
        // a married to her own descendant: levels can never agree with the
        // parent chain, the loop must still stop.
        let mut snapshot = GraphSnapshot::new();
        snapshot.person("a", "A", None);
        for i in 0..30 {
            let parent = if i == 0 { "a".to_string() } else { format!("d{}", i - 1) };
            let child = format!("d{i}");
            snapshot.person(child.as_str(), &child, None);
            snapshot.parent(parent.as_str(), child.as_str());
        }
        snapshot.spouse("a", "d29", MaritalStatus::Married);
        for i in 0..29 {
            snapshot.spouse(format!("d{i}").as_str(), "a", MaritalStatus::Divorced);
        }
        let graph = build_graph(&snapshot);
        let levels = assign_levels(&graph);
        assert!(levels.passes <= MAX_RECONCILE_PASSES);
        assert_eq!(levels.level.len(), graph.len());
    }
}

use crate::config::ParentPolicy;
use crate::graph::FamilyGraph;

/// Decides which person a child is laid out under. The result does not have to
/// be a recorded parent (see `GenderHeuristic`), but it must be a valid index.
pub trait ParentSelector {
    fn designated_parent(&self, graph: &FamilyGraph, child: usize) -> Option<usize>;
}

/// Mother-first rule: a female parent, otherwise a female spouse of one of the
/// parents, otherwise the first recorded parent.
///
/// This mirrors how most family charts are drawn but has no answer for
/// same-sex or non-binary parents beyond falling back to input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenderHeuristic;

impl ParentSelector for GenderHeuristic {
    fn designated_parent(&self, graph: &FamilyGraph, child: usize) -> Option<usize> {
        let parents = &graph.parents[child];
        let first = *parents.first()?;
        if let Some(&mother) = parents.iter().find(|&&p| graph.persons[p].is_female()) {
            return Some(mother);
        }
        let spouse_mother = parents.iter().find_map(|&p| {
            graph.spouses[p]
                .iter()
                .map(|link| link.spouse)
                .find(|&s| s != child && graph.persons[s].is_female())
        });
        Some(spouse_mother.unwrap_or(first))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FirstParent;

impl ParentSelector for FirstParent {
    fn designated_parent(&self, graph: &FamilyGraph, child: usize) -> Option<usize> {
        graph.parents[child].first().copied()
    }
}

pub fn selector_for(policy: ParentPolicy) -> &'static dyn ParentSelector {
    match policy {
        ParentPolicy::GenderHeuristic => &GenderHeuristic,
        ParentPolicy::FirstParent => &FirstParent,
    }
}

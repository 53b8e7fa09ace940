use crate::graph::FamilyGraph;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyUnit {
    pub anchor: usize,
    /// Members in input order; always contains `anchor`.
    pub members: Vec<usize>,
}

impl FamilyUnit {
    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct FamilyUnits {
    pub units: Vec<FamilyUnit>,
    /// Unit index for every person.
    pub unit_of: Vec<usize>,
}

impl FamilyUnits {
    pub fn unit_for(&self, person: usize) -> &FamilyUnit {
        &self.units[self.unit_of[person]]
    }
}

struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    fn find(&mut self, mut idx: usize) -> usize {
        while self.parent[idx] != idx {
            self.parent[idx] = self.parent[self.parent[idx]];
            idx = self.parent[idx];
        }
        idx
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Group people joined (transitively) by spouse edges. Units are ordered by
/// their first member in input order; the anchor is the member with the most
/// spouse links, earliest member on ties.
pub fn resolve_units(graph: &FamilyGraph) -> FamilyUnits {
    let mut sets = DisjointSet::new(graph.len());
    for (a, b) in graph.spouse_pairs() {
        sets.union(a, b);
    }

    let mut unit_by_root: Vec<Option<usize>> = vec![None; graph.len()];
    let mut unit_of = vec![0; graph.len()];
    let mut units: Vec<FamilyUnit> = Vec::new();
    for idx in 0..graph.len() {
        let root = sets.find(idx);
        let unit_idx = match unit_by_root[root] {
            Some(unit_idx) => unit_idx,
            None => {
                units.push(FamilyUnit {
                    anchor: idx,
                    members: Vec::new(),
                });
                unit_by_root[root] = Some(units.len() - 1);
                units.len() - 1
            }
        };
        units[unit_idx].members.push(idx);
        unit_of[idx] = unit_idx;
    }

    for unit in &mut units {
        unit.anchor = pick_anchor(&unit.members, |idx| graph.spouse_count(idx));
    }

    let married = units.iter().filter(|unit| !unit.is_single()).count();
    tracing::debug!(units = units.len(), married, "family units resolved");

    FamilyUnits { units, unit_of }
}

/// First member with the greatest key.
pub(super) fn pick_anchor<K: Ord>(members: &[usize], key: impl Fn(usize) -> K) -> usize {
    let mut best = members[0];
    let mut best_key = key(best);
    for &member in &members[1..] {
        let member_key = key(member);
        if member_key > best_key {
            best = member;
            best_key = member_key;
        }
    }
    best
}

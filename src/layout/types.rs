use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub level: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitLayout {
    pub anchor: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LayoutStats {
    pub persons: usize,
    pub max_level: usize,
    pub reconcile_passes: usize,
    pub residual: usize,
    pub fallback: usize,
}

/// Result of one layout run. `positions` holds exactly one entry per person
/// that survived graph building.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FamilyLayout {
    pub positions: BTreeMap<String, Position>,
    pub units: Vec<UnitLayout>,
    pub width: f32,
    pub height: f32,
    pub stats: LayoutStats,
}

impl FamilyLayout {
    pub fn get(&self, id: &str) -> Option<&Position> {
        self.positions.get(id)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn level_of(&self, id: &str) -> Option<usize> {
        self.positions.get(id).map(|pos| pos.level)
    }
}

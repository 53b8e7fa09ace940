pub mod levels;
pub mod position;
pub mod selector;
pub(crate) mod types;
pub mod units;
pub use types::*;

use std::collections::BTreeMap;

use crate::config::LayoutConfig;
use crate::graph::{FamilyGraph, build_graph};
use crate::ir::GraphSnapshot;

use levels::assign_levels;
use position::{PlacementContext, assign_positions};
use selector::{ParentSelector, selector_for};
use units::resolve_units;

pub fn compute_layout(snapshot: &GraphSnapshot, config: &LayoutConfig) -> FamilyLayout {
    compute_layout_with(snapshot, config, selector_for(config.parent_policy))
}

/// Same as `compute_layout` but with a caller-supplied designated-parent rule.
pub fn compute_layout_with(
    snapshot: &GraphSnapshot,
    config: &LayoutConfig,
    selector: &dyn ParentSelector,
) -> FamilyLayout {
    let graph = build_graph(snapshot);
    layout_graph(&graph, config, selector)
}

pub fn layout_graph(
    graph: &FamilyGraph,
    config: &LayoutConfig,
    selector: &dyn ParentSelector,
) -> FamilyLayout {
    if graph.is_empty() {
        return FamilyLayout::default();
    }

    let levels = assign_levels(graph);
    let units = resolve_units(graph);
    let ctx = PlacementContext::new(graph, &levels, &units, config, selector);
    let placement = assign_positions(&ctx);
    let table = &placement.table;

    let mut positions = BTreeMap::new();
    let mut max_x = 0.0f32;
    let mut max_y = 0.0f32;
    let mut max_level = 0usize;
    for (idx, person) in graph.persons.iter().enumerate() {
        // assign_positions covers everyone; the defaults only guard the type.
        let level = table.level(idx).unwrap_or(0);
        let x = table.x(idx).unwrap_or(config.padding);
        let y = config.padding + level as f32 * config.level_step();
        max_x = max_x.max(x);
        max_y = max_y.max(y);
        max_level = max_level.max(level);
        positions.insert(person.id.clone(), Position { x, y, level });
    }

    let units_out = units
        .units
        .iter()
        .map(|unit| UnitLayout {
            anchor: graph.persons[unit.anchor].id.clone(),
            members: unit
                .members
                .iter()
                .map(|&member| graph.persons[member].id.clone())
                .collect(),
        })
        .collect();

    let stats = LayoutStats {
        persons: positions.len(),
        max_level,
        reconcile_passes: levels.passes,
        residual: placement.residual,
        fallback: placement.fallback,
    };
    tracing::debug!(
        persons = stats.persons,
        max_level = stats.max_level,
        reconcile_passes = stats.reconcile_passes,
        residual = stats.residual,
        fallback = stats.fallback,
        "family layout computed"
    );

    FamilyLayout {
        positions,
        units: units_out,
        width: max_x + config.node_size + config.padding,
        height: max_y + config.node_size + config.padding,
        stats,
    }
}

/// Keeps the last snapshot and its layout; recomputes only when the snapshot
/// or configuration changes structurally.
#[derive(Debug, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
    cached: Option<(GraphSnapshot, FamilyLayout)>,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            cached: None,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
        self.cached = None;
    }

    pub fn is_cached(&self, snapshot: &GraphSnapshot) -> bool {
        self.cached
            .as_ref()
            .is_some_and(|(cached, _)| cached == snapshot)
    }

    pub fn layout(&mut self, snapshot: &GraphSnapshot) -> &FamilyLayout {
        if self.is_cached(snapshot) {
            tracing::trace!("layout cache hit");
        } else {
            self.cached = None;
        }
        let config = &self.config;
        let (_, layout) = self
            .cached
            .get_or_insert_with(|| (snapshot.clone(), compute_layout(snapshot, config)));
        layout
    }
}

use std::collections::BTreeMap;
use std::f32::consts::PI;

use serde::Serialize;

use crate::config::{Orientation, ViewConfig};
use crate::layout::FamilyLayout;

/// Screen coordinates for one person. `angle` (radians) and `radius` are only
/// set for the radial orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewPoint {
    pub x: f32,
    pub y: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
}

impl ViewPoint {
    fn flat(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            angle: None,
            radius: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewLayout {
    pub orientation: Orientation,
    pub points: BTreeMap<String, ViewPoint>,
    pub width: f32,
    pub height: f32,
}

pub fn project(layout: &FamilyLayout, config: &ViewConfig) -> ViewLayout {
    match config.orientation {
        Orientation::Vertical => ViewLayout {
            orientation: Orientation::Vertical,
            points: layout
                .positions
                .iter()
                .map(|(id, pos)| (id.clone(), ViewPoint::flat(pos.x, pos.y)))
                .collect(),
            width: layout.width,
            height: layout.height,
        },
        Orientation::Horizontal => ViewLayout {
            orientation: Orientation::Horizontal,
            points: layout
                .positions
                .iter()
                .map(|(id, pos)| (id.clone(), ViewPoint::flat(pos.y, pos.x)))
                .collect(),
            width: layout.height,
            height: layout.width,
        },
        Orientation::Radial => project_radial(layout, config),
    }
}

/// Levels become rings, the primary axis becomes the angle. Angles start at
/// 12 o'clock and run clockwise; a full sweep leaves one slot free so the
/// first and last person of a ring do not collide.
fn project_radial(layout: &FamilyLayout, config: &ViewConfig) -> ViewLayout {
    if layout.positions.is_empty() {
        return ViewLayout {
            orientation: Orientation::Radial,
            ..Default::default()
        };
    }

    let min_x = layout
        .positions
        .values()
        .map(|pos| pos.x)
        .fold(f32::INFINITY, f32::min);
    let max_x = layout
        .positions
        .values()
        .map(|pos| pos.x)
        .fold(f32::NEG_INFINITY, f32::max);
    let max_level = layout.stats.max_level;

    let sweep = config.sweep_degrees.clamp(1.0, 360.0).to_radians();
    let span = max_x - min_x;
    let slots = distinct_slots(layout);
    let divisor = if (sweep - 2.0 * PI).abs() < 1e-4 {
        span * slots as f32 / (slots as f32 - 1.0).max(1.0)
    } else {
        span
    };
    // Partial fans open symmetrically around 12 o'clock.
    let start = if (sweep - 2.0 * PI).abs() < 1e-4 {
        -PI / 2.0
    } else {
        -PI / 2.0 - sweep / 2.0
    };

    let outer = config.inner_radius + max_level as f32 * config.ring_spacing;
    let margin = layout_margin(layout);
    let center = outer + margin;

    let points = layout
        .positions
        .iter()
        .map(|(id, pos)| {
            let t = if divisor > 0.0 { (pos.x - min_x) / divisor } else { 0.0 };
            let angle = start + t * sweep;
            let radius = config.inner_radius + pos.level as f32 * config.ring_spacing;
            let point = ViewPoint {
                x: center + radius * angle.cos(),
                y: center + radius * angle.sin(),
                angle: Some(angle),
                radius: Some(radius),
            };
            (id.clone(), point)
        })
        .collect();

    ViewLayout {
        orientation: Orientation::Radial,
        points,
        width: center * 2.0,
        height: center * 2.0,
    }
}

fn distinct_slots(layout: &FamilyLayout) -> usize {
    let mut xs: Vec<f32> = layout.positions.values().map(|pos| pos.x).collect();
    xs.sort_by(f32::total_cmp);
    xs.dedup_by(|a, b| (*a - *b).abs() < 1e-3);
    xs.len().max(1)
}

fn layout_margin(layout: &FamilyLayout) -> f32 {
    // padding + node size, recovered from the vertical extents
    let max_y = layout
        .positions
        .values()
        .map(|pos| pos.y)
        .fold(0.0, f32::max);
    (layout.height - max_y).max(0.0)
}

use crate::config::Orientation;
use crate::graph::FamilyGraph;
use crate::ir::Gender;
use crate::layout::{FamilyLayout, LayoutStats, UnitLayout};
use crate::view::ViewLayout;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub orientation: Orientation,
    pub width: f32,
    pub height: f32,
    pub persons: Vec<PersonDump>,
    pub units: Vec<UnitLayout>,
    pub stats: LayoutStats,
}

#[derive(Debug, Serialize)]
pub struct PersonDump {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,
    pub level: usize,
    /// Generic layout coordinates, before projection.
    pub layout_x: f32,
    pub layout_y: f32,
    pub x: f32,
    pub y: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl LayoutDump {
    /// Persons are listed in snapshot order.
    pub fn from_layout(layout: &FamilyLayout, view: &ViewLayout, graph: &FamilyGraph) -> Self {
        let persons = graph
            .persons
            .iter()
            .filter_map(|person| {
                let pos = layout.positions.get(&person.id)?;
                let point = view.points.get(&person.id)?;
                Some(PersonDump {
                    id: person.id.clone(),
                    name: person.name.clone(),
                    gender: person.gender,
                    birth_date: person.birth_date.clone(),
                    death_date: person.death_date.clone(),
                    level: pos.level,
                    layout_x: pos.x,
                    layout_y: pos.y,
                    x: point.x,
                    y: point.y,
                    angle: point.angle,
                    radius: point.radius,
                    payload: person.payload.clone(),
                })
            })
            .collect();

        LayoutDump {
            orientation: view.orientation,
            width: view.width,
            height: view.height,
            persons,
            units: layout.units.clone(),
            stats: layout.stats,
        }
    }

    pub fn to_json(&self, pretty: bool) -> anyhow::Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

pub fn write_layout_dump(path: &Path, dump: &LayoutDump, pretty: bool) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    if pretty {
        serde_json::to_writer_pretty(writer, dump)?;
    } else {
        serde_json::to_writer(writer, dump)?;
    }
    Ok(())
}

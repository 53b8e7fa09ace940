use family_tree_layout::config::{Config, parse_config};
use family_tree_layout::graph::build_graph;
use family_tree_layout::layout::layout_graph;
use family_tree_layout::layout::selector::selector_for;
use family_tree_layout::layout_dump::LayoutDump;
use family_tree_layout::parser::parse_snapshot;
use family_tree_layout::view::project;
use wasm_bindgen::prelude::*;

fn layout_to_json(snapshot_json: &str, options_json: Option<&str>) -> Result<String, String> {
    let config = match options_json {
        Some(raw) if !raw.trim().is_empty() => parse_config(raw).map_err(|error| format!("{error:#}"))?,
        _ => Config::default(),
    };
    let snapshot = parse_snapshot(snapshot_json).map_err(|error| error.to_string())?;
    let graph = build_graph(&snapshot);
    let layout = layout_graph(&graph, &config.layout, selector_for(config.layout.parent_policy));
    let view = project(&layout, &config.view);
    LayoutDump::from_layout(&layout, &view, &graph)
        .to_json(false)
        .map_err(|error| error.to_string())
}

/// Lay out a graph snapshot and return the positioned persons as JSON.
/// `options_json` uses the same camelCase keys as the CLI config file.
#[wasm_bindgen]
pub fn compute_family_layout(snapshot_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    layout_to_json(snapshot_json, options_json.as_deref()).map_err(|error| JsValue::from_str(&error))
}

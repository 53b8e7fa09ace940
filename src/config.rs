use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which parent a child is hung under when it has several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParentPolicy {
    /// Female parent, else a female spouse of a parent, else the first parent.
    #[default]
    GenderHeuristic,
    FirstParent,
}

impl ParentPolicy {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "gender-heuristic" | "gender" | "mother" => Some(Self::GenderHeuristic),
            "first-parent" | "first" => Some(Self::FirstParent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SiblingOrder {
    #[default]
    Input,
    BirthDate,
}

impl SiblingOrder {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "input" => Some(Self::Input),
            "birth-date" | "birth" => Some(Self::BirthDate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
    Radial,
}

impl Orientation {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "vertical" | "TD" | "TB" => Some(Self::Vertical),
            "horizontal" | "LR" => Some(Self::Horizontal),
            "radial" | "fan" => Some(Self::Radial),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_size: f32,
    pub sibling_spacing: f32,
    pub spouse_spacing: f32,
    pub level_spacing: f32,
    pub padding: f32,
    pub parent_policy: ParentPolicy,
    pub sibling_order: SiblingOrder,
    pub separate_overlaps: bool,
    pub normalize_origin: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_size: 120.0,
            sibling_spacing: 40.0,
            spouse_spacing: 20.0,
            level_spacing: 80.0,
            padding: 40.0,
            parent_policy: ParentPolicy::GenderHeuristic,
            sibling_order: SiblingOrder::Input,
            separate_overlaps: true,
            normalize_origin: true,
        }
    }
}

impl LayoutConfig {
    pub fn sibling_step(&self) -> f32 {
        self.node_size + self.sibling_spacing
    }

    pub fn spouse_step(&self) -> f32 {
        self.node_size + self.spouse_spacing
    }

    pub fn level_step(&self) -> f32 {
        self.node_size + self.level_spacing
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    pub orientation: Orientation,
    pub inner_radius: f32,
    pub ring_spacing: f32,
    pub sweep_degrees: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Vertical,
            inner_radius: 0.0,
            ring_spacing: 160.0,
            sweep_degrees: 360.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub view: ViewConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    node_size: Option<f32>,
    sibling_spacing: Option<f32>,
    spouse_spacing: Option<f32>,
    level_spacing: Option<f32>,
    padding: Option<f32>,
    parent_policy: Option<String>,
    sibling_order: Option<String>,
    separate_overlaps: Option<bool>,
    normalize_origin: Option<bool>,
    orientation: Option<String>,
    inner_radius: Option<f32>,
    ring_spacing: Option<f32>,
    sweep_degrees: Option<f32>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = serde_json::from_str(contents)?;
    let mut config = Config::default();

    if let Some(v) = parsed.node_size {
        config.layout.node_size = non_negative("nodeSize", v)?;
    }
    if let Some(v) = parsed.sibling_spacing {
        config.layout.sibling_spacing = non_negative("siblingSpacing", v)?;
    }
    if let Some(v) = parsed.spouse_spacing {
        config.layout.spouse_spacing = non_negative("spouseSpacing", v)?;
    }
    if let Some(v) = parsed.level_spacing {
        config.layout.level_spacing = non_negative("levelSpacing", v)?;
    }
    if let Some(v) = parsed.padding {
        config.layout.padding = non_negative("padding", v)?;
    }
    if let Some(v) = parsed.parent_policy.as_deref() {
        config.layout.parent_policy = ParentPolicy::from_token(v)
            .ok_or_else(|| anyhow::anyhow!("unknown parentPolicy `{v}`"))?;
    }
    if let Some(v) = parsed.sibling_order.as_deref() {
        config.layout.sibling_order = SiblingOrder::from_token(v)
            .ok_or_else(|| anyhow::anyhow!("unknown siblingOrder `{v}`"))?;
    }
    if let Some(v) = parsed.separate_overlaps {
        config.layout.separate_overlaps = v;
    }
    if let Some(v) = parsed.normalize_origin {
        config.layout.normalize_origin = v;
    }
    if let Some(v) = parsed.orientation.as_deref() {
        config.view.orientation = Orientation::from_token(v)
            .ok_or_else(|| anyhow::anyhow!("unknown orientation `{v}`"))?;
    }
    if let Some(v) = parsed.inner_radius {
        config.view.inner_radius = non_negative("innerRadius", v)?;
    }
    if let Some(v) = parsed.ring_spacing {
        config.view.ring_spacing = non_negative("ringSpacing", v)?;
    }
    if let Some(v) = parsed.sweep_degrees {
        config.view.sweep_degrees = v.clamp(1.0, 360.0);
    }

    Ok(config)
}

fn non_negative(key: &str, value: f32) -> anyhow::Result<f32> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(anyhow::anyhow!("{key} must be a non-negative number, got {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_keeps_defaults() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config.layout.node_size, 120.0);
        assert_eq!(config.layout.parent_policy, ParentPolicy::GenderHeuristic);
        assert_eq!(config.view.orientation, Orientation::Vertical);
    }

    #[test]
    fn overlays_camel_case_keys() {
        let config = parse_config(
            r#"{"nodeSize": 80, "spouseSpacing": 10, "parentPolicy": "first-parent",
                "siblingOrder": "birth-date", "orientation": "radial", "sweepDegrees": 720}"#,
        )
        .unwrap();
        assert_eq!(config.layout.node_size, 80.0);
        assert_eq!(config.layout.spouse_step(), 90.0);
        assert_eq!(config.layout.parent_policy, ParentPolicy::FirstParent);
        assert_eq!(config.layout.sibling_order, SiblingOrder::BirthDate);
        assert_eq!(config.view.orientation, Orientation::Radial);
        assert_eq!(config.view.sweep_degrees, 360.0);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_config(r#"{"nodeSize": -1}"#).is_err());
        assert!(parse_config(r#"{"orientation": "diagonal"}"#).is_err());
    }

    #[test]
    fn missing_path_is_default() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.padding, 40.0);
    }
}

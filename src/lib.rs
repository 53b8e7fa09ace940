#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod view;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, Orientation, ParentPolicy, SiblingOrder, ViewConfig};
pub use error::SnapshotError;
pub use ir::{GraphSnapshot, MaritalStatus};
pub use layout::selector::{FirstParent, GenderHeuristic, ParentSelector};
pub use layout::{FamilyLayout, LayoutEngine, Position, compute_layout, compute_layout_with};
pub use parser::parse_snapshot;
pub use view::{ViewLayout, ViewPoint, project};

/// Parse, lay out and project a snapshot in one call.
pub fn layout_snapshot_text(input: &str, config: &Config) -> Result<(FamilyLayout, ViewLayout), SnapshotError> {
    let snapshot = parse_snapshot(input)?;
    let layout = compute_layout(&snapshot, &config.layout);
    let view = project(&layout, &config.view);
    Ok((layout, view))
}

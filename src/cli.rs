use crate::config::{Config, Orientation, ParentPolicy, SiblingOrder, load_config};
use crate::graph::build_graph;
use crate::layout::layout_graph;
use crate::layout::selector::selector_for;
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::parser::parse_snapshot;
use crate::view::project;
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "famtree", version, about = "Compute family tree layouts from a graph snapshot")]
pub struct Args {
    /// Snapshot file (.json / .json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the JSON layout dump. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Layout config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Override the configured orientation
    #[arg(short = 'r', long = "orientation", value_enum)]
    pub orientation: Option<OrientationArg>,

    /// Override the designated-parent rule
    #[arg(long = "parent-policy", value_enum)]
    pub parent_policy: Option<ParentPolicyArg>,

    /// Order siblings by birth date instead of input order
    #[arg(long = "by-birth")]
    pub by_birth: bool,

    /// Pretty-print the JSON output
    #[arg(long = "pretty")]
    pub pretty: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OrientationArg {
    Vertical,
    Horizontal,
    Radial,
}

impl From<OrientationArg> for Orientation {
    fn from(value: OrientationArg) -> Self {
        match value {
            OrientationArg::Vertical => Orientation::Vertical,
            OrientationArg::Horizontal => Orientation::Horizontal,
            OrientationArg::Radial => Orientation::Radial,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ParentPolicyArg {
    GenderHeuristic,
    FirstParent,
}

impl From<ParentPolicyArg> for ParentPolicy {
    fn from(value: ParentPolicyArg) -> Self {
        match value {
            ParentPolicyArg::GenderHeuristic => ParentPolicy::GenderHeuristic,
            ParentPolicyArg::FirstParent => ParentPolicy::FirstParent,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = apply_overrides(load_config(args.config.as_deref())?, &args);
    let input = read_input(args.input.as_deref())?;
    let snapshot = parse_snapshot(&input).context("failed to read graph snapshot")?;

    let graph = build_graph(&snapshot);
    let layout = layout_graph(&graph, &config.layout, selector_for(config.layout.parent_policy));
    let view = project(&layout, &config.view);
    let dump = LayoutDump::from_layout(&layout, &view, &graph);
    tracing::info!(
        persons = layout.stats.persons,
        levels = layout.stats.max_level + 1,
        fallback = layout.stats.fallback,
        "layout written"
    );

    match args.output.as_deref() {
        Some(path) => write_layout_dump(path, &dump, args.pretty)?,
        None => {
            let json = dump.to_json(args.pretty)?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn apply_overrides(mut config: Config, args: &Args) -> Config {
    if let Some(orientation) = args.orientation {
        config.view.orientation = orientation.into();
    }
    if let Some(policy) = args.parent_policy {
        config.layout.parent_policy = policy.into();
    }
    if args.by_birth {
        config.layout.sibling_order = SiblingOrder::BirthDate;
    }
    config
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

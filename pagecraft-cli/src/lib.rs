//! # Pagecraft CLI
//!
//! Headless runner for the editor engine. A scenario file bundles a starting
//! document, a synthetic layout (the boxes a browser would have measured)
//! and a list of input events; `pagecraft replay` feeds the events through
//! the editor and prints the resulting document.
//!
//! ## Usage
//!
//! ```bash
//! pagecraft replay scenario.json --pretty
//! RUST_LOG=pagecraft_core=trace pagecraft replay scenario.json --zoom 2
//! ```
//!
//! ## Scenario format
//!
//! ```json
//! {
//!   "document": { "elements": {}, "rootElementIds": [], ... },
//!   "layout": { "canvas": { "x": 0, "y": 0, "width": 1200, "height": 900 },
//!               "boxes": { "<uuid>": { "x": 0, "y": 0, "width": 10, "height": 10 } } },
//!   "config": { "dragThreshold": 5 },
//!   "events": [ { "type": "pointerDown", "data": { "x": 10, "y": 10 } } ]
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use pagecraft_core::{Document, Editor, EditorConfig, EditorEvent, StaticLayout};
use serde::{Deserialize, Serialize};

/// Command-line arguments for pagecraft.
#[derive(Debug, Clone, Parser)]
#[command(name = "pagecraft")]
#[command(about = "Pagecraft page-builder engine tools")]
#[command(version)]
pub struct CliArgs {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Replay a scenario file and print the resulting document
    Replay(ReplayArgs),
}

/// Arguments for `pagecraft replay`.
#[derive(Debug, Clone, clap::Args)]
pub struct ReplayArgs {
    /// Scenario JSON file
    pub scenario: PathBuf,

    /// Editor configuration JSON file (overrides the scenario's config)
    #[arg(long, env = "PAGECRAFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Initial zoom factor
    #[arg(long)]
    pub zoom: Option<f64>,

    /// Enable snap-to-grid
    #[arg(long)]
    pub snap: bool,

    /// Pretty-print the output document
    #[arg(long)]
    pub pretty: bool,
}

/// A recorded interaction session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Scenario {
    /// Starting document (empty when absent).
    pub document: Option<Document>,
    /// Synthetic layout answering hit tests and measurements.
    pub layout: StaticLayout,
    /// Editor configuration (defaults when absent).
    pub config: Option<EditorConfig>,
    /// Events to dispatch, in order.
    pub events: Vec<EditorEvent>,
}

/// Summary of a replay.
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    /// Final document.
    pub document: Document,
    /// Events the editor handled.
    pub consumed: usize,
    /// Events that fell through to their default.
    pub ignored: usize,
    /// Undo steps recorded.
    pub undo_steps: usize,
}

/// Load and parse a scenario file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid scenario.
pub fn load_scenario(path: &Path) -> anyhow::Result<Scenario> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid scenario {}", path.display()))
}

/// Load and validate an editor configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the config is invalid.
pub fn load_config(path: &Path) -> anyhow::Result<EditorConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    EditorConfig::from_json(&text).with_context(|| format!("Invalid config {}", path.display()))
}

/// Dispatch every event of a scenario through a fresh editor.
///
/// # Errors
///
/// Returns an error if the config is invalid or the starting document
/// violates the tree invariants.
pub fn replay(scenario: Scenario, zoom: Option<f64>, snap: bool) -> anyhow::Result<ReplayOutcome> {
    let config = scenario.config.unwrap_or_default();
    let mut editor =
        Editor::with_config(config, scenario.layout).context("Invalid editor config")?;
    if let Some(document) = scenario.document {
        document
            .check_invariants()
            .context("Scenario document is inconsistent")?;
        editor.load_document(document);
    }
    if let Some(zoom) = zoom {
        editor.viewport_mut().set_zoom(zoom);
    }
    if snap {
        editor.viewport_mut().snap_to_grid = true;
    }

    let mut consumed = 0;
    let mut ignored = 0;
    for (i, event) in scenario.events.iter().enumerate() {
        let disposition = editor.dispatch(event);
        tracing::debug!("Event {i} {:?} -> {disposition:?}", event_name(event));
        if disposition.is_consumed() {
            consumed += 1;
        } else {
            ignored += 1;
        }
    }

    tracing::info!(
        "Replayed {} events ({consumed} consumed), final state {}",
        scenario.events.len(),
        editor.state().name()
    );
    let undo_steps = editor.history().undo_len();
    Ok(ReplayOutcome {
        document: editor.document().clone(),
        consumed,
        ignored,
        undo_steps,
    })
}

/// Run `pagecraft replay` and return the JSON to print.
///
/// # Errors
///
/// Returns an error if loading, replaying or serializing fails.
pub fn run_replay(args: &ReplayArgs) -> anyhow::Result<String> {
    let mut scenario = load_scenario(&args.scenario)?;
    if let Some(path) = &args.config {
        scenario.config = Some(load_config(path)?);
    }
    let outcome = replay(scenario, args.zoom, args.snap)?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&outcome.document)?
    } else {
        serde_json::to_string(&outcome.document)?
    };
    Ok(json)
}

fn event_name(event: &EditorEvent) -> &'static str {
    match event {
        EditorEvent::PointerDown(_) => "pointerDown",
        EditorEvent::PointerMove(_) => "pointerMove",
        EditorEvent::PointerUp(_) => "pointerUp",
        EditorEvent::Wheel(_) => "wheel",
        EditorEvent::ContextMenu(_) => "contextMenu",
        EditorEvent::KeyDown(_) => "keyDown",
        EditorEvent::ResizeStart { .. } => "resizeStart",
        EditorEvent::DragOver(_) => "dragOver",
        EditorEvent::Drop { .. } => "drop",
        EditorEvent::AnimationFrame => "animationFrame",
    }
}

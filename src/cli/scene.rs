use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use fmgraph::{Config, Snapshot, ViewportSize};
use tracing::instrument;

use super::load_model;

#[derive(Debug, Parser)]
#[command(about = "Print the full scene snapshot as JSON")]
pub struct Scene {
    /// Path to the model JSON file
    model: PathBuf,

    /// Highlight features whose label contains this text
    #[arg(long, short, default_value = "")]
    query: String,

    /// Width of the drawing surface
    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    /// Height of the drawing surface
    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Emit compact JSON on a single line
    #[arg(long)]
    compact: bool,
}

impl Scene {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let model = load_model(&self.model)?;
        let snapshot = Snapshot::compute(
            &model,
            &self.query,
            ViewportSize::new(self.width, self.height),
            config,
        )
        .context("failed to build the feature tree")?;

        for omission in &snapshot.omitted {
            tracing::warn!(id = %omission.id, reason = ?omission.reason, "feature left out of the tree");
        }

        let json = if self.compact {
            serde_json::to_string(&snapshot)?
        } else {
            serde_json::to_string_pretty(&snapshot)?
        };
        println!("{json}");
        Ok(())
    }
}

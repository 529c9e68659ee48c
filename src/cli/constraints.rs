use std::path::PathBuf;

use clap::Parser;
use fmgraph::{Config, ConstraintKind};
use serde::Serialize;
use tracing::instrument;

use super::{OutputFormat, build_hierarchy, load_model, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Print constraint curves between placed features")]
pub struct Constraints {
    /// Path to the model JSON file
    model: PathBuf,

    /// Output format (table, json)
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

#[derive(Debug, Serialize)]
struct Curve<'a> {
    from: &'a str,
    to: &'a str,
    kind: ConstraintKind,
    path: String,
}

impl Constraints {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let model = load_model(&self.model)?;
        let hierarchy = build_hierarchy(&model, config)?;
        let layout = fmgraph::layout(
            hierarchy.as_ref().map(|hierarchy| &hierarchy.root),
            config.layout(),
        );
        let overlay = fmgraph::compute_overlay(&model.constraints, &layout.by_id(), config.overlay());

        let curves: Vec<_> = overlay
            .iter()
            .map(|curve| Curve {
                from: curve.from,
                to: curve.to,
                kind: curve.kind,
                path: curve.path_data(),
            })
            .collect();
        let skipped = model.constraints.len() - curves.len();

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&curves)?),
            OutputFormat::Table => {
                for curve in &curves {
                    println!(
                        "{} {} {}  {}",
                        curve.from,
                        curve.kind.to_string().constraint(curve.kind),
                        curve.to,
                        curve.path.dim()
                    );
                }
                if curves.is_empty() {
                    println!("No constraints between placed features.");
                }
                if skipped > 0 {
                    println!();
                    println!(
                        "{}",
                        format!("{skipped} constraint(s) reference features outside the tree")
                            .warning()
                    );
                }
            }
        }

        Ok(())
    }
}

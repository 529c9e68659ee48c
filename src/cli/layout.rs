use std::path::PathBuf;

use clap::Parser;
use fmgraph::{Config, scene::SceneBounds};
use serde::Serialize;
use tracing::instrument;

use super::{OutputFormat, build_hierarchy, load_model, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Print node positions and the content bounds")]
pub struct Layout {
    /// Path to the model JSON file
    model: PathBuf,

    /// Output format (table, json)
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

#[derive(Debug, Serialize)]
struct Placed<'a> {
    id: &'a str,
    parent: Option<&'a str>,
    depth: usize,
    x: f64,
    y: f64,
}

#[derive(Debug, Serialize)]
struct Output<'a> {
    nodes: Vec<Placed<'a>>,
    bounds: SceneBounds,
}

impl Layout {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let model = load_model(&self.model)?;
        let hierarchy = build_hierarchy(&model, config)?;
        let layout = fmgraph::layout(
            hierarchy.as_ref().map(|hierarchy| &hierarchy.root),
            config.layout(),
        );

        let output = Output {
            nodes: layout
                .nodes
                .iter()
                .map(|node| Placed {
                    id: node.id(),
                    parent: node.parent,
                    depth: node.depth,
                    x: node.position.x,
                    y: node.position.y,
                })
                .collect(),
            bounds: layout.bounds.into(),
        };

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
            OutputFormat::Table => {
                if output.nodes.is_empty() {
                    println!("Nothing to lay out.");
                    return Ok(());
                }
                println!("{:<24} {:>6} {:>10} {:>10}", "ID", "Depth", "X", "Y");
                println!("{}", "─".repeat(53).dim());
                for node in &output.nodes {
                    println!(
                        "{:<24} {:>6} {:>10.1} {:>10.1}",
                        node.id, node.depth, node.x, node.y
                    );
                }
                println!();
                let bounds = output.bounds;
                println!(
                    "Bounds: {}",
                    format!(
                        "x={:.1} y={:.1} width={:.1} height={:.1}",
                        bounds.x, bounds.y, bounds.width, bounds.height
                    )
                    .info()
                );
            }
        }

        Ok(())
    }
}

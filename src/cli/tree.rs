use std::path::PathBuf;

use clap::Parser;
use fmgraph::{Config, FeatureKind, HierarchyNode};
use serde::Serialize;
use tracing::instrument;

use super::{
    OutputFormat, build_hierarchy, load_model,
    terminal::{Colorize, is_narrow},
};

#[derive(Debug, Parser)]
#[command(about = "Print the feature hierarchy")]
pub struct Tree {
    /// Path to the model JSON file
    model: PathBuf,

    /// Output format (table, json)
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Only print this many levels below the root (0 = unlimited)
    #[arg(long, value_name = "N", default_value_t = 0)]
    depth: usize,
}

#[derive(Debug, Serialize)]
struct Row<'a> {
    id: &'a str,
    label: &'a str,
    kind: &'a FeatureKind,
    parent: Option<&'a str>,
    depth: usize,
}

impl Tree {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let model = load_model(&self.model)?;
        let Some(hierarchy) = build_hierarchy(&model, config)? else {
            println!("No root feature found.");
            return Ok(());
        };

        let rows = self.rows(&hierarchy.root);
        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
            OutputFormat::Table => {
                let narrow = is_narrow();
                for row in &rows {
                    let indent = "  ".repeat(row.depth);
                    if narrow {
                        println!("{indent}{}", row.label);
                    } else {
                        println!(
                            "{indent}{} {} {}",
                            row.label,
                            format!("({})", row.id).dim(),
                            format!("[{}]", row.kind).info()
                        );
                    }
                }
                if !hierarchy.omitted.is_empty() {
                    println!();
                    println!(
                        "{}",
                        format!("{} feature(s) left out of the tree", hierarchy.omitted.len())
                            .warning()
                    );
                }
            }
        }

        Ok(())
    }

    fn rows<'a>(&self, root: &'a HierarchyNode) -> Vec<Row<'a>> {
        let mut parents: Vec<&'a str> = Vec::new();
        root.iter()
            .filter(|(_, depth)| self.depth == 0 || *depth <= self.depth)
            .map(|(node, depth)| {
                parents.truncate(depth);
                let parent = parents.last().copied();
                parents.push(node.id());
                Row {
                    id: node.id(),
                    label: node.label(),
                    kind: &node.feature.kind,
                    parent,
                    depth,
                }
            })
            .collect()
    }
}

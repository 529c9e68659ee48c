use std::{collections::HashSet, path::PathBuf};

use clap::Parser;
use fmgraph::{Config, scene::Emphasis};
use serde::Serialize;
use tracing::instrument;

use super::{OutputFormat, build_hierarchy, load_model, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Search feature labels and show the highlighted closure")]
pub struct Search {
    /// Path to the model JSON file
    model: PathBuf,

    /// Case-insensitive substring to look for in labels
    query: String,

    /// Output format (table, json)
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Only print matching features
    #[arg(long)]
    matches_only: bool,
}

#[derive(Debug, Serialize)]
struct Output<'a> {
    matches: Vec<&'a str>,
    nodes: Vec<Node<'a>>,
}

#[derive(Debug, Serialize)]
struct Node<'a> {
    id: &'a str,
    label: &'a str,
    depth: usize,
    emphasis: Emphasis,
}

impl Search {
    #[instrument(level = "debug", skip(self, config), fields(query = %self.query))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let model = load_model(&self.model)?;
        let hierarchy = build_hierarchy(&model, config)?;
        let matches = fmgraph::search(&model.features, &self.query);

        let nodes = hierarchy.as_ref().map_or_else(Vec::new, |hierarchy| {
            let matched: HashSet<&str> = matches.iter().copied().collect();
            let highlight = fmgraph::expand(&matched, &hierarchy.root);
            hierarchy
                .root
                .iter()
                .map(|(node, depth)| Node {
                    id: node.id(),
                    label: node.label(),
                    depth,
                    emphasis: highlight.emphasis(node.id()),
                })
                .filter(|node| !self.matches_only || node.emphasis == Emphasis::Match)
                .collect()
        });

        let output = Output { matches, nodes };
        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
            OutputFormat::Table => {
                if output.matches.is_empty() {
                    println!("No features match '{}'.", self.query.trim());
                    return Ok(());
                }
                for node in &output.nodes {
                    let indent = if self.matches_only {
                        String::new()
                    } else {
                        "  ".repeat(node.depth)
                    };
                    println!("{indent}{}", node.label.emphasis(node.emphasis));
                }
                println!();
                println!("Matches: {}", output.matches.len().to_string().success());
            }
        }

        Ok(())
    }
}

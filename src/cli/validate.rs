use std::path::PathBuf;

use clap::Parser;
use fmgraph::domain::{Issue, diagnose};
use tracing::instrument;

use super::{OutputFormat, load_model, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Report structural problems in a model")]
pub struct Validate {
    /// Path to the model JSON file
    model: PathBuf,

    /// Output format (table, json)
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,
}

impl Validate {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let model = load_model(&self.model)?;
        let issues = diagnose(&model);

        if !self.quiet {
            match self.output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&issues)?),
                OutputFormat::Table => Self::print_table(&issues),
            }
        }

        if !issues.is_empty() {
            // Exit with code 2 so CI can tell problems from load failures
            std::process::exit(2);
        }
        Ok(())
    }

    fn print_table(issues: &[Issue]) {
        if issues.is_empty() {
            println!("{} No structural problems found", "✓".success());
            return;
        }
        for issue in issues {
            println!("{} {issue}", "⚠".warning());
        }
        println!();
        println!(
            "{}",
            format!("{} problem(s) found", issues.len()).warning()
        );
    }
}

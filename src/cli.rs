use std::path::{Path, PathBuf};

mod constraints;
mod layout;
mod search;
mod scene;
mod terminal;
mod tree;
mod validate;
mod viewport;

use anyhow::Context;
use clap::ArgAction;
use constraints::Constraints;
use fmgraph::{
    Config, FeatureModel,
    domain::{Hierarchy, HierarchyBuilder, config::DEFAULT_FILE_NAME},
};
use layout::Layout;
use scene::Scene;
use search::Search;
use tracing::{instrument, warn};
use tree::Tree;
use validate::Validate;
use viewport::Viewport;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a config file (defaults to ./fmg.toml when present)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        if let Command::Init(init) = &self.command {
            return init.run();
        }

        let config = Config::discover(self.config.as_deref(), Path::new("."))
            .context("failed to load configuration")?;
        self.command.run(&config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Write a default config file to the current directory
    Init(Init),

    /// Print the feature hierarchy
    Tree(Tree),

    /// Print node positions and the content bounds
    Layout(Layout),

    /// Search feature labels and show the highlighted closure
    Search(Search),

    /// Print constraint curves between placed features
    Constraints(Constraints),

    /// Compute a viewport transform for the laid out model
    Viewport(Viewport),

    /// Print the full scene snapshot as JSON
    Scene(Scene),

    /// Report structural problems in a model
    Validate(Validate),
}

impl Command {
    fn run(self, config: &Config) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => command.run()?,
            Self::Tree(command) => command.run(config)?,
            Self::Layout(command) => command.run(config)?,
            Self::Search(command) => command.run(config)?,
            Self::Constraints(command) => command.run(config)?,
            Self::Viewport(command) => command.run(config)?,
            Self::Scene(command) => command.run(config)?,
            Self::Validate(command) => command.run()?,
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Init {
    /// Overwrite an existing config file
    #[arg(long)]
    force: bool,
}

impl Init {
    #[instrument(level = "debug")]
    fn run(&self) -> anyhow::Result<()> {
        let path = Path::new(DEFAULT_FILE_NAME);
        if path.exists() && !self.force {
            anyhow::bail!("{DEFAULT_FILE_NAME} already exists (use --force to overwrite)");
        }
        Config::default()
            .save(path)
            .with_context(|| format!("failed to write {DEFAULT_FILE_NAME}"))?;
        println!("Created {DEFAULT_FILE_NAME}");
        Ok(())
    }
}

/// Output format shared by the table-capable subcommands.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Reads the model JSON file at `path`.
fn load_model(path: &Path) -> anyhow::Result<FeatureModel> {
    FeatureModel::load(path).with_context(|| format!("failed to load model {}", path.display()))
}

/// Builds the hierarchy under the configured root policy, warning about
/// every feature left out of the tree.
fn build_hierarchy(model: &FeatureModel, config: &Config) -> anyhow::Result<Option<Hierarchy>> {
    let hierarchy = HierarchyBuilder::new(config.root_policy()).build(&model.features)?;
    if let Some(hierarchy) = &hierarchy {
        for omission in &hierarchy.omitted {
            warn!(id = %omission.id, reason = ?omission.reason, "feature left out of the tree");
        }
    }
    Ok(hierarchy)
}

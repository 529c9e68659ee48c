use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use fmgraph::{Config, ViewportSize, ViewportState, scene::Viewport as ViewportModel};
use kurbo::Point;
use serde::Serialize;
use tracing::instrument;

use super::{OutputFormat, build_hierarchy, load_model, terminal::Colorize};

/// Parse a point given as `X,Y`.
fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{s}'"))?;
    let coordinate = |value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{value}': {e}"))
    };
    Ok(Point::new(coordinate(x)?, coordinate(y)?))
}

#[derive(Debug, Parser)]
#[command(about = "Compute a viewport transform for the laid out model")]
pub struct Viewport {
    /// Path to the model JSON file
    model: PathBuf,

    /// What to do with the viewport
    #[arg(value_enum, default_value_t)]
    action: Action,

    /// Width of the drawing surface
    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    /// Height of the drawing surface
    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Current translation, as X,Y (defaults to the fitted transform)
    #[arg(long, value_parser = parse_point, requires = "scale", allow_hyphen_values = true)]
    translate: Option<Point>,

    /// Current scale (defaults to the fitted transform)
    #[arg(long, requires = "translate")]
    scale: Option<f64>,

    /// Pan distance in screen units, as DX,DY
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true, required_if_eq("action", "pan"))]
    by: Option<Point>,

    /// Zoom factor
    #[arg(long, required_if_eq("action", "zoom"))]
    factor: Option<f64>,

    /// Zoom anchor in screen units, as X,Y (defaults to the surface centre)
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    anchor: Option<Point>,

    /// Output format (table, json)
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Action {
    /// Fit the whole tree into the surface
    #[default]
    Fit,
    /// Centre the tree at the current scale
    AlignCenter,
    /// Restore the fitted scale around the surface centre
    ResetZoom,
    /// Move the content by --by
    Pan,
    /// Scale by --factor about --anchor
    Zoom,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Output {
    fitted: ViewportState,
    current: ViewportState,
}

impl Viewport {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let model = load_model(&self.model)?;
        let hierarchy = build_hierarchy(&model, config)?;
        let layout = fmgraph::layout(
            hierarchy.as_ref().map(|hierarchy| &hierarchy.root),
            config.layout(),
        );

        let size = ViewportSize::new(self.width, self.height);
        let mut viewport = ViewportModel::new(layout.bounds, size, *config.viewport());
        if let (Some(translate), Some(scale)) = (self.translate, self.scale) {
            viewport.set_current(ViewportState {
                translate_x: translate.x,
                translate_y: translate.y,
                scale,
            });
        }

        let current = match self.action {
            Action::Fit => viewport.fit_to_view(),
            Action::AlignCenter => viewport.align_center(),
            Action::ResetZoom => viewport.reset_zoom(),
            Action::Pan => {
                let by = self.by.unwrap_or(Point::ORIGIN);
                viewport.pan(by.x, by.y)
            }
            Action::Zoom => viewport.pinch(
                self.factor.unwrap_or(1.0),
                self.anchor.unwrap_or_else(|| size.center()),
            ),
        };

        let output = Output {
            fitted: viewport.fitted(),
            current,
        };
        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
            OutputFormat::Table => {
                for (name, state) in [("fitted", output.fitted), ("current", output.current)] {
                    println!(
                        "{name:<8} {}",
                        format!(
                            "translate=({:.3}, {:.3}) scale={:.4}",
                            state.translate_x, state.translate_y, state.scale
                        )
                        .info()
                    );
                }
            }
        }

        Ok(())
    }
}

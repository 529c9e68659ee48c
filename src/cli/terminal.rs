//! Terminal capability detection and styling helpers

use fmgraph::{ConstraintKind, scene::Emphasis};
use owo_colors::{OwoColorize, colors::css};

/// Detects whether colored output should be enabled
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Check if terminal is narrow (< 60 columns)
pub fn is_narrow() -> bool {
    terminal_size::terminal_size().is_some_and(|(width, _)| width.0 < 60)
}

/// Extension trait for colorizing output
pub trait Colorize {
    /// Color as success (green)
    fn success(&self) -> String;
    /// Color as warning (amber)
    fn warning(&self) -> String;
    /// Color as info (blue)
    fn info(&self) -> String;
    /// Dim the text
    fn dim(&self) -> String;
    /// Bold the text
    fn strong(&self) -> String;

    /// Style according to search emphasis
    fn emphasis(&self, emphasis: Emphasis) -> String {
        match emphasis {
            Emphasis::Normal => self.plain(),
            Emphasis::Match => self.strong(),
            Emphasis::Related => self.info(),
            Emphasis::Dimmed => self.dim(),
        }
    }

    /// Style according to constraint kind
    fn constraint(&self, kind: ConstraintKind) -> String {
        match kind {
            ConstraintKind::Requires => self.success(),
            ConstraintKind::Excludes => self.warning(),
        }
    }

    /// The text, unstyled
    fn plain(&self) -> String;
}

impl Colorize for str {
    fn success(&self) -> String {
        if supports_color() {
            self.fg::<css::Green>().to_string()
        } else {
            self.to_string()
        }
    }

    fn warning(&self) -> String {
        if supports_color() {
            self.fg::<css::Orange>().to_string()
        } else {
            self.to_string()
        }
    }

    fn info(&self) -> String {
        if supports_color() {
            self.fg::<css::LightBlue>().to_string()
        } else {
            self.to_string()
        }
    }

    fn dim(&self) -> String {
        if supports_color() {
            self.dimmed().to_string()
        } else {
            self.to_string()
        }
    }

    fn strong(&self) -> String {
        if supports_color() {
            self.bold().to_string()
        } else {
            self.to_string()
        }
    }

    fn plain(&self) -> String {
        self.to_string()
    }
}

//! Terminal implementation of the dashboard

use crate::chart::price_chart;
use analyst_market::{AnalystError, Dashboard, MetricTile, Notice, NoticeLevel, PricePoint, TextSurface};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::io::{self, Write};

type Result<T> = analyst_market::Result<T>;

/// Dashboard that writes to any [`Write`], normally stdout
///
/// A terminal cannot redraw earlier output cheaply, so the streaming text
/// area prints only what each update adds to the previous one.
pub struct TerminalDashboard<W: Write> {
    out: W,
    /// Streaming text already written
    printed: String,
    /// Whether the streaming text area is open
    streaming: bool,
}

impl TerminalDashboard<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalDashboard<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            printed: String::new(),
            streaming: false,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print an input prompt without a trailing newline
    pub fn prompt(&mut self, text: &str) -> Result<()> {
        write!(self.out, "{text}").map_err(display_error)?;
        self.out.flush().map_err(display_error)
    }

    /// Print plain lines outside any section
    pub fn println(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{text}").map_err(display_error)
    }

    fn write_all(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes()).map_err(display_error)?;
        self.out.flush().map_err(display_error)
    }

    fn underlined(&mut self, title: &str, rule: char) -> Result<()> {
        let line: String = std::iter::repeat_n(rule, title.chars().count()).collect();
        writeln!(self.out, "\n{title}\n{line}").map_err(display_error)
    }
}

fn display_error(err: io::Error) -> AnalystError {
    AnalystError::Display(err.to_string())
}

/// Metric tiles as a one-row table under their labels
pub fn tiles_table(tiles: &[MetricTile]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(tiles.iter().map(|t| t.label))
        .add_row(tiles.iter().map(|t| t.value.as_str()));
    table
}

impl<W: Write> TextSurface for TerminalDashboard<W> {
    fn show(&mut self, text: &str) -> Result<()> {
        let addition = match text.strip_prefix(self.printed.as_str()) {
            Some(rest) if self.streaming => rest,
            _ => {
                if self.streaming {
                    self.write_all("\n")?;
                }
                text
            },
        };

        self.streaming = true;
        self.write_all(addition)?;
        text.clone_into(&mut self.printed);
        Ok(())
    }

    fn finish(&mut self, text: &str) -> Result<()> {
        if self.streaming {
            self.show(text)?;
        } else {
            self.write_all(text)?;
        }
        self.streaming = false;
        self.printed.clear();
        self.write_all("\n")
    }
}

impl<W: Write + Send> Dashboard for TerminalDashboard<W> {
    fn header(&mut self, title: &str) -> Result<()> {
        self.underlined(title, '=')
    }

    fn subheader(&mut self, title: &str) -> Result<()> {
        self.underlined(title, '-')
    }

    fn metrics(&mut self, tiles: &[MetricTile]) -> Result<()> {
        writeln!(self.out, "{}", tiles_table(tiles)).map_err(display_error)
    }

    fn line_chart(&mut self, series: &[PricePoint]) -> Result<()> {
        writeln!(self.out, "{}", price_chart(series)).map_err(display_error)
    }

    fn notify(&mut self, notice: &Notice) -> Result<()> {
        let tag = match notice.level {
            NoticeLevel::Info => "💡",
            NoticeLevel::Warning => "⚠",
            NoticeLevel::Error => "❌",
        };
        writeln!(self.out, "{tag} {}", notice.message).map_err(display_error)
    }

    fn status(&mut self, message: &str) -> Result<()> {
        writeln!(self.out, "{message}").map_err(display_error)?;
        self.out.flush().map_err(display_error)
    }
}

//! Output rendering for `--output`.
//!
//! Commands print lists of per-node or per-flow records. Each record type
//! implements [`Listing`] once; [`Printer`] picks the table row, the plain
//! line or the serde document depending on the selected format.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};

/// A record printed by a command.
pub trait Listing: Serialize {
    type Row: Tabled;

    /// Table row. `color` is set when ANSI styles may be used.
    fn row(&self, color: bool) -> Self::Row;

    /// Tab-separated line for `--output plain`.
    fn line(&self) -> String;
}

/// Output settings resolved from the global flags.
pub struct Printer {
    format: OutputFormat,
    color: bool,
    quiet: bool,
}

impl Printer {
    pub fn new(global: &GlobalOpts) -> Self {
        let color = matches!(global.output, OutputFormat::Table) && color_enabled(&global.color);
        Self {
            format: global.output.clone(),
            color,
            quiet: global.quiet,
        }
    }

    pub fn render_list<T: Listing>(&self, items: &[T]) -> String {
        match self.format {
            OutputFormat::Table => {
                let rows: Vec<T::Row> = items.iter().map(|i| i.row(self.color)).collect();
                Table::new(rows).with(Style::rounded()).to_string()
            }
            OutputFormat::Plain => items.iter().map(T::line).collect::<Vec<_>>().join("\n"),
            _ => self.structured(items),
        }
    }

    /// Render one document. Table and plain formats show `text`.
    pub fn render_document<T: Serialize + ?Sized>(
        &self,
        data: &T,
        text: impl FnOnce() -> String,
    ) -> String {
        match self.format {
            OutputFormat::Table | OutputFormat::Plain => text(),
            _ => self.structured(data),
        }
    }

    pub fn list<T: Listing>(&self, items: &[T]) {
        self.emit(&self.render_list(items));
    }

    pub fn document<T: Serialize + ?Sized>(&self, data: &T, text: impl FnOnce() -> String) {
        self.emit(&self.render_document(data, text));
    }

    /// Write `output` to stdout unless `--quiet` was given.
    pub fn emit(&self, output: &str) {
        if !self.quiet {
            emit(output);
        }
    }

    fn structured<T: Serialize + ?Sized>(&self, data: &T) -> String {
        match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(data).unwrap_or_else(serialization_failed),
            OutputFormat::JsonCompact => {
                serde_json::to_string(data).unwrap_or_else(serialization_failed)
            }
            _ => serde_json::to_string_pretty(data).unwrap_or_else(serialization_failed),
        }
    }
}

// ── Status words ─────────────────────────────────────────────────────

pub fn ok(text: &str, color: bool) -> String {
    paint(text, color, |t| t.green().to_string())
}

pub fn failed(text: &str, color: bool) -> String {
    paint(text, color, |t| t.red().bold().to_string())
}

pub fn changed(text: &str, color: bool) -> String {
    paint(text, color, |t| t.yellow().to_string())
}

fn paint(text: &str, color: bool, style: impl FnOnce(&str) -> String) -> String {
    if color { style(text) } else { text.to_owned() }
}

fn serialization_failed(e: impl std::fmt::Display) -> String {
    format!("<serialization failed: {e}>")
}

/// Whether `--color` allows ANSI styles on stdout.
fn color_enabled(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Write one block to stdout. Empty output prints nothing.
pub fn emit(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Entry {
        node: &'static str,
        id: &'static str,
    }

    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "Flow")]
        id: String,
        #[tabled(rename = "State")]
        state: String,
    }

    impl Listing for Entry {
        type Row = EntryRow;

        fn row(&self, color: bool) -> EntryRow {
            EntryRow {
                id: self.id.to_owned(),
                state: if color { "ok*" } else { "ok" }.to_owned(),
            }
        }

        fn line(&self) -> String {
            format!("{}\t{}", self.node, self.id)
        }
    }

    fn printer(format: OutputFormat, color: bool) -> Printer {
        Printer {
            format,
            color,
            quiet: false,
        }
    }

    fn entries() -> [Entry; 2] {
        [
            Entry { node: "openflow:1", id: "1" },
            Entry { node: "openflow:1", id: "2_0" },
        ]
    }

    #[test]
    fn plain_emits_one_line_per_record() {
        let out = printer(OutputFormat::Plain, false).render_list(&entries());
        assert_eq!(out, "openflow:1\t1\nopenflow:1\t2_0");
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = printer(OutputFormat::JsonCompact, false).render_list(&entries());
        assert_eq!(
            out,
            r#"[{"node":"openflow:1","id":"1"},{"node":"openflow:1","id":"2_0"}]"#
        );
    }

    #[test]
    fn table_has_headers_and_rows() {
        let out = printer(OutputFormat::Table, false).render_list(&entries());
        assert!(out.contains("Flow"));
        assert!(out.contains("2_0"));
        assert!(!out.contains("ok*"));
    }

    #[test]
    fn document_uses_text_outside_structured_formats() {
        let data = serde_json::json!({"profile": "lab"});
        let text = printer(OutputFormat::Plain, false).render_document(&data, || "lab".into());
        assert_eq!(text, "lab");
        let yaml = printer(OutputFormat::Yaml, false).render_document(&data, || "lab".into());
        assert_eq!(yaml, "profile: lab\n");
    }

    #[test]
    fn status_words_are_plain_without_color() {
        assert_eq!(ok("in sync", false), "in sync");
        assert_ne!(failed("failed", true), "failed");
    }
}

//! Output formatting: table, JSON, YAML, plain.
//!
//! Table uses `tabled`, structured formats serialize the records as served,
//! plain emits one identifier per line.

use std::io::{self, Write};

use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of records in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(Table::new(rows).with(Style::rounded()).to_string())
        }
        OutputFormat::Plain => Ok(data.iter().map(id_fn).collect::<Vec<_>>().join("\n")),
        structured => render_structured(structured, data),
    }
}

/// Render one record. Table output uses `detail_fn`, a pre-formatted
/// key/value block.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Plain => Ok(id_fn(data)),
        structured => render_structured(structured, data),
    }
}

/// Print to stdout unless quiet.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Aligned `key: value` lines for detail views; empty values are skipped.
pub fn detail_block(fields: &[(&str, String)]) -> String {
    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    fields
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{k:<width$}  {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_structured<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    let rendered = match format {
        OutputFormat::JsonCompact => serde_json::to_string(data).map_err(|e| e.to_string()),
        OutputFormat::Yaml => serde_yaml::to_string(data).map_err(|e| e.to_string()),
        _ => serde_json::to_string_pretty(data).map_err(|e| e.to_string()),
    };
    rendered.map_err(CliError::Render)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Item {
        id: &'static str,
        name: &'static str,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: String,
    }

    fn items() -> Vec<Item> {
        vec![Item { id: "a", name: "Alpha" }, Item { id: "b", name: "Beta" }]
    }

    #[test]
    fn plain_lists_ids() {
        let out = render_list(
            OutputFormat::Plain,
            &items(),
            |i| Row { id: i.id.into() },
            |i| i.id.into(),
        )
        .unwrap();
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn compact_json_is_one_line() {
        let out = render_list(
            OutputFormat::JsonCompact,
            &items(),
            |i| Row { id: i.id.into() },
            |i| i.id.into(),
        )
        .unwrap();
        assert_eq!(out, r#"[{"id":"a","name":"Alpha"},{"id":"b","name":"Beta"}]"#);
    }

    #[test]
    fn table_has_header() {
        let out = render_list(
            OutputFormat::Table,
            &items(),
            |i| Row { id: i.id.into() },
            |i| i.id.into(),
        )
        .unwrap();
        assert!(out.contains("ID"));
        assert!(out.contains('b'));
    }

    #[test]
    fn detail_block_aligns_and_skips_empty() {
        let out = detail_block(&[("Name", "Alpha".into()), ("Tenant URL", String::new()), ("ID", "a".into())]);
        assert_eq!(out, "Name        Alpha\nID          a");
    }
}

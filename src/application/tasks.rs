//! Task bodies driven by the `taskdeck` binary: the bundled demo tasks and
//! decks built from files on disk.

use std::{fs, path::Path};

use crate::application::deck::{Deck, DeckRegistry};
use crate::application::error::AppError;
use crate::application::render::{Payload, RendererRegistry, Series, Table};
use crate::domain::slug::derive_deck_name;
use crate::infra::error::InfraError;

pub const SAMPLE_MARKDOWN: &str = "# Hello Flyte\n## Hello Flyte\n### Hello Flyte";

const IRIS_COLUMNS: [&str; 5] = [
    "sepal_length",
    "sepal_width",
    "petal_length",
    "petal_width",
    "species",
];

const IRIS_ROWS: [[&str; 5]; 12] = [
    ["5.1", "3.5", "1.4", "0.2", "setosa"],
    ["4.9", "3.0", "1.4", "0.2", "setosa"],
    ["4.7", "3.2", "1.3", "0.2", "setosa"],
    ["4.6", "3.1", "1.5", "0.2", "setosa"],
    ["7.0", "3.2", "4.7", "1.4", "versicolor"],
    ["6.4", "3.2", "4.5", "1.5", "versicolor"],
    ["6.9", "3.1", "4.9", "1.5", "versicolor"],
    ["5.5", "2.3", "4.0", "1.3", "versicolor"],
    ["6.3", "3.3", "6.0", "2.5", "virginica"],
    ["5.8", "2.7", "5.1", "1.9", "virginica"],
    ["7.1", "3.0", "5.9", "2.1", "virginica"],
    ["6.3", "2.9", "5.6", "1.8", "virginica"],
];

/// Scatter plot of `0..x` against itself plus a markdown note, written to a
/// `demo` deck; the note is also dropped into the default deck.
pub fn scatter_markdown_task(
    registry: &DeckRegistry,
    renderers: &RendererRegistry,
    x: u32,
) -> Result<String, AppError> {
    let markdown = renderers.render("markdown", &Payload::markdown(SAMPLE_MARKDOWN))?;
    let points = Series::new((0..x).map(f64::from), (0..x).map(f64::from));
    let scatter = renderers.render("scatter", &Payload::Series(points))?;

    let deck = Deck::new(registry, "demo", scatter)?;
    deck.append(&markdown);
    registry.default_deck().append(&markdown);

    Ok(SAMPLE_MARKDOWN.to_string())
}

/// Renders the iris sample through the frame renderer into a `custom` deck.
pub fn iris_frame_task(
    registry: &DeckRegistry,
    renderers: &RendererRegistry,
) -> Result<Table, AppError> {
    let table = iris_sample();
    let html = renderers.render("frame", &Payload::Table(table.clone()))?;
    Deck::new(registry, "custom", html)?;
    Ok(table)
}

pub fn iris_sample() -> Table {
    let mut table = Table::new(IRIS_COLUMNS);
    for row in IRIS_ROWS {
        table.push_row(row);
    }
    table
}

/// Create one deck from a file. Markdown files use the markdown renderer,
/// JSON arrays of objects the frame renderer, anything else the code
/// renderer keyed by extension.
pub fn deck_from_file(
    registry: &DeckRegistry,
    renderers: &RendererRegistry,
    path: &Path,
) -> Result<Deck, AppError> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| {
            AppError::validation(format!("`{}` has no usable file name", path.display()))
        })?;
    let name = derive_deck_name(stem)?;
    let source = fs::read_to_string(path).map_err(InfraError::from)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let (renderer, payload) = match extension.as_deref() {
        Some("md" | "markdown") => ("markdown", Payload::markdown(source)),
        Some("json") => {
            let value: serde_json::Value = serde_json::from_str(&source).map_err(|err| {
                AppError::validation(format!("`{}` is not valid JSON: {err}", path.display()))
            })?;
            ("frame", Payload::Table(Table::from_json_records(&value)?))
        }
        other => ("code", Payload::code(other, source)),
    };

    let html = renderers.render(renderer, &payload)?;
    Ok(Deck::new(registry, name, html)?)
}

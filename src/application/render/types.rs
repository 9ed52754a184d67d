use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discriminant of a [`Payload`], used to name the offending input in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Table,
    Markdown,
    Series,
    Code,
}

impl PayloadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PayloadKind::Table => "table",
            PayloadKind::Markdown => "markdown",
            PayloadKind::Series => "series",
            PayloadKind::Code => "code",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed input accepted by renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Table(Table),
    Markdown { source: String },
    Series(Series),
    Code {
        language: Option<String>,
        source: String,
    },
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Table(_) => PayloadKind::Table,
            Payload::Markdown { .. } => PayloadKind::Markdown,
            Payload::Series(_) => PayloadKind::Series,
            Payload::Code { .. } => PayloadKind::Code,
        }
    }

    pub fn markdown(source: impl Into<String>) -> Self {
        Payload::Markdown {
            source: source.into(),
        }
    }

    pub fn code(language: Option<&str>, source: impl Into<String>) -> Self {
        Payload::Code {
            language: language.map(str::to_string),
            source: source.into(),
        }
    }
}

impl From<Table> for Payload {
    fn from(table: Table) -> Self {
        Payload::Table(table)
    }
}

impl From<Series> for Payload {
    fn from(series: Series) -> Self {
        Payload::Series(series)
    }
}

/// Column-oriented header with row-major string cells.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_row<I, S>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_row(row);
        self
    }

    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    /// Build a table from a JSON array of flat objects. Columns are the union of
    /// record keys: each record contributes its keys in sorted order, and keys
    /// not seen in an earlier record are added after the existing columns.
    /// Missing cells render empty.
    pub fn from_json_records(value: &serde_json::Value) -> Result<Self, RenderError> {
        let records = value.as_array().ok_or_else(|| {
            RenderError::malformed(PayloadKind::Table, "expected a JSON array of objects")
        })?;

        let mut columns: Vec<String> = Vec::new();
        for (index, record) in records.iter().enumerate() {
            let object = record.as_object().ok_or_else(|| {
                RenderError::malformed(
                    PayloadKind::Table,
                    format!("record {index} is not a JSON object"),
                )
            })?;
            for key in object.keys() {
                if !columns.iter().any(|column| column == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .filter_map(serde_json::Value::as_object)
            .map(|object| {
                columns
                    .iter()
                    .map(|column| object.get(column).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Paired coordinate sequences for 2-D plots.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Series {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    #[serde(default)]
    pub label: Option<String>,
}

impl Series {
    pub fn new(x: impl IntoIterator<Item = f64>, y: impl IntoIterator<Item = f64>) -> Self {
        Self {
            x: x.into_iter().collect(),
            y: y.into_iter().collect(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Structured errors surfaced by renderers. A renderer never returns empty or
/// partial markup in place of an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("renderer `{renderer}` does not support {payload} payloads")]
    UnsupportedPayload {
        renderer: &'static str,
        payload: PayloadKind,
    },
    #[error("malformed {payload} payload: {message}")]
    MalformedPayload {
        payload: PayloadKind,
        message: String,
    },
    #[error("markdown rendering failed: {message}")]
    Markdown { message: String },
    #[error("syntax highlighting failed: {language}: {message}")]
    Highlighting { language: String, message: String },
    #[error("no renderer registered under `{name}`")]
    UnknownRenderer { name: String },
}

impl RenderError {
    pub fn unsupported(renderer: &'static str, payload: &Payload) -> Self {
        Self::UnsupportedPayload {
            renderer,
            payload: payload.kind(),
        }
    }

    pub fn malformed(payload: PayloadKind, message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            payload,
            message: message.into(),
        }
    }
}

/// Capability implemented by every renderer variant. Implementations must be
/// pure and deterministic: the same payload yields the same markup or error.
pub trait Renderer: Send + Sync {
    /// Stable name used for registration and error reporting.
    fn name(&self) -> &'static str;

    fn render(&self, payload: &Payload) -> Result<String, RenderError>;
}

use super::types::{Payload, PayloadKind, RenderError, Renderer, Table};

pub const DEFAULT_MAX_ROWS: usize = 10;

/// Renders tabular payloads as an HTML `<table>`, showing at most `max_rows`
/// body rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRenderer {
    max_rows: usize,
}

impl Default for FrameRenderer {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl FrameRenderer {
    pub fn new(max_rows: usize) -> Self {
        Self { max_rows }
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn render_table(&self, table: &Table) -> Result<String, RenderError> {
        if let Some((index, row)) = table
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != table.columns.len())
        {
            return Err(RenderError::malformed(
                PayloadKind::Table,
                format!(
                    "row {index} has {} cells but the table has {} columns",
                    row.len(),
                    table.columns.len()
                ),
            ));
        }

        let total = table.rows.len();
        let shown = total.min(self.max_rows);

        let mut html = String::from("<table class=\"deck-frame\">\n");
        if shown < total {
            html.push_str(&format!("<caption>{shown} of {total} rows</caption>\n"));
        }

        html.push_str("<thead><tr>");
        for column in &table.columns {
            html.push_str("<th>");
            html.push_str(&ammonia::clean_text(column));
            html.push_str("</th>");
        }
        html.push_str("</tr></thead>\n<tbody>\n");

        for row in table.rows.iter().take(shown) {
            html.push_str("<tr>");
            for cell in row {
                html.push_str("<td>");
                html.push_str(&ammonia::clean_text(cell));
                html.push_str("</td>");
            }
            html.push_str("</tr>\n");
        }

        html.push_str("</tbody>\n</table>");
        Ok(html)
    }
}

impl Renderer for FrameRenderer {
    fn name(&self) -> &'static str {
        "frame"
    }

    fn render(&self, payload: &Payload) -> Result<String, RenderError> {
        match payload {
            Payload::Table(table) => self.render_table(table),
            other => Err(RenderError::unsupported(self.name(), other)),
        }
    }
}

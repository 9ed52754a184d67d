use once_cell::sync::Lazy;
use syntect::{
    highlighting::{Theme, ThemeSet},
    html::highlighted_html_for_string,
    parsing::{SyntaxReference, SyntaxSet},
};

use super::types::{Payload, RenderError, Renderer};

const DEFAULT_THEME: &str = "InspiredGitHub";

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// Highlights source code with Syntect using inline styles, so each deck
/// artifact stays self-contained without a shared stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRenderer {
    theme: String,
}

impl Default for CodeRenderer {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

impl CodeRenderer {
    pub fn with_theme(theme: impl Into<String>) -> Self {
        Self {
            theme: theme.into(),
        }
    }

    pub fn render_code(&self, language: Option<&str>, code: &str) -> Result<String, RenderError> {
        let lang_token = language.unwrap_or("text");
        let theme = self.theme()?;
        let syntax = find_syntax(&SYNTAX_SET, lang_token)
            .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());

        let mut code_with_newline = code.to_string();
        if !code_with_newline.ends_with('\n') {
            code_with_newline.push('\n');
        }

        let highlighted = highlighted_html_for_string(&code_with_newline, &SYNTAX_SET, syntax, theme)
            .map_err(|err| RenderError::Highlighting {
                language: lang_token.to_string(),
                message: err.to_string(),
            })?;

        Ok(format!(
            "<div class=\"deck-code\" data-language=\"{}\">{highlighted}</div>",
            ammonia::clean_text(&lang_token.to_ascii_lowercase())
        ))
    }

    fn theme(&self) -> Result<&'static Theme, RenderError> {
        THEME_SET
            .themes
            .get(&self.theme)
            .ok_or_else(|| RenderError::Highlighting {
                language: String::new(),
                message: format!("unknown theme `{}`", self.theme),
            })
    }
}

impl Renderer for CodeRenderer {
    fn name(&self) -> &'static str {
        "code"
    }

    fn render(&self, payload: &Payload) -> Result<String, RenderError> {
        match payload {
            Payload::Code { language, source } => self.render_code(language.as_deref(), source),
            other => Err(RenderError::unsupported(self.name(), other)),
        }
    }
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    let lowercase = token.to_ascii_lowercase();
    syntax_set
        .find_syntax_by_token(&lowercase)
        .or_else(|| syntax_set.find_syntax_by_name(token))
        .or_else(|| syntax_set.find_syntax_by_extension(&lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_known_language() {
        let html = CodeRenderer::default()
            .render_code(Some("rust"), "fn main() {}")
            .expect("renders");

        assert!(html.starts_with("<div class=\"deck-code\" data-language=\"rust\">"));
        assert!(html.contains("<pre style="));
        assert!(html.contains("main"));
    }

    #[test]
    fn falls_back_to_plain_text() {
        let html = CodeRenderer::default()
            .render_code(Some("no-such-language"), "plain words")
            .expect("renders");

        assert!(html.contains("plain words"));
    }

    #[test]
    fn unknown_theme_is_an_error() {
        let err = CodeRenderer::with_theme("missing")
            .render_code(None, "x")
            .expect_err("unknown theme");
        assert!(matches!(err, RenderError::Highlighting { .. }));
    }
}

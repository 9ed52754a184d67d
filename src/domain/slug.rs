//! Deck naming rules and artifact file name allocation.
//!
//! Deck names double as artifact file stems, so they are restricted to a
//! filename-safe alphabet. Free text can be turned into a valid name with
//! [`derive_deck_name`], which bridges ASCII slugification (`slug` crate) with
//! Chinese transliteration (`pinyin` crate) so inputs like “训练损失” become
//! `xun-lian-sun-shi`.

use std::collections::HashSet;

use pinyin::{Pinyin, ToPinyin};
use slug::slugify;

use super::error::DeckError;

pub const MAX_DECK_NAME_LEN: usize = 128;
pub const ARTIFACT_EXTENSION: &str = "html";
pub const INDEX_STEM: &str = "deck";

/// Check that `name` can be used verbatim as an artifact file stem.
pub fn validate_deck_name(name: &str) -> Result<(), DeckError> {
    if name.is_empty() {
        return Err(DeckError::invalid_argument("name", "deck name is empty"));
    }
    if name.len() > MAX_DECK_NAME_LEN {
        return Err(DeckError::invalid_argument(
            "name",
            format!("deck name exceeds {MAX_DECK_NAME_LEN} bytes"),
        ));
    }
    if name.starts_with('.') {
        return Err(DeckError::invalid_argument(
            "name",
            format!("deck name `{name}` must not start with `.`"),
        ));
    }
    if let Some(bad) = name.chars().find(|ch| !is_name_char(*ch)) {
        return Err(DeckError::invalid_argument(
            "name",
            format!("deck name `{name}` contains unsupported character {bad:?}"),
        ));
    }
    Ok(())
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')
}

/// Derive a valid deck name from human-readable text.
pub fn derive_deck_name(input: &str) -> Result<String, DeckError> {
    if input.trim().is_empty() {
        return Err(DeckError::invalid_argument("name", "deck title is empty"));
    }

    let transliterated = transliterate_to_ascii(input);
    let mut candidate = slugify(&transliterated);
    candidate.truncate(MAX_DECK_NAME_LEN);
    let candidate = candidate.trim_end_matches('-').to_string();

    if candidate.is_empty() {
        return Err(DeckError::invalid_argument(
            "name",
            format!("failed to derive a deck name from `{input}`"),
        ));
    }

    validate_deck_name(&candidate)?;
    Ok(candidate)
}

/// Allocates one artifact file name per deck within a single bundle.
///
/// The first deck with a given name receives `<name>.html`; later decks with
/// the same name receive monotonic suffixes (`<name>-2.html`, …). The index
/// stem is reserved so no deck can overwrite `deck.html`.
#[derive(Debug)]
pub struct ArtifactNamer {
    used: HashSet<String>,
}

impl Default for ArtifactNamer {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactNamer {
    pub fn new() -> Self {
        Self {
            used: HashSet::from([INDEX_STEM.to_string()]),
        }
    }

    /// Returns the artifact file name and whether it differs from the plain
    /// `<name>.html` form. Stems are compared case-insensitively so bundles
    /// stay intact on case-insensitive filesystems.
    pub fn file_name_for(&mut self, name: &str) -> (String, bool) {
        if self.used.insert(name.to_ascii_lowercase()) {
            return (artifact_file_name(name), false);
        }

        let mut attempt = 2usize;
        loop {
            let candidate = format!("{name}-{attempt}");
            if self.used.insert(candidate.to_ascii_lowercase()) {
                return (artifact_file_name(&candidate), true);
            }
            attempt += 1;
        }
    }
}

pub fn artifact_file_name(stem: &str) -> String {
    format!("{stem}.{ARTIFACT_EXTENSION}")
}

pub fn index_file_name() -> String {
    artifact_file_name(INDEX_STEM)
}

fn transliterate_to_ascii(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        if ch.is_ascii() {
            output.push(ch);
            continue;
        }

        match ch.to_pinyin() {
            Some(py) => append_pinyin(&mut output, py),
            None if ch.is_whitespace() => output.push(' '),
            None => output.push(ch),
        }
    }

    output
}

fn append_pinyin(buffer: &mut String, pinyin: Pinyin) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(pinyin.plain());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_filename_safe_names() {
        for name in ["default", "demo", "train_loss", "v1.2-final", "A9"] {
            validate_deck_name(name).expect("valid name");
        }
    }

    #[test]
    fn rejects_unsafe_names() {
        for name in ["", "../etc", "a/b", "with space", ".hidden", "tab\t", "é"] {
            let err = validate_deck_name(name).expect_err("invalid name");
            assert!(matches!(
                err,
                DeckError::InvalidArgument {
                    argument: "name",
                    ..
                }
            ));
        }
    }

    #[test]
    fn rejects_overlong_names() {
        let name = "a".repeat(MAX_DECK_NAME_LEN + 1);
        assert!(validate_deck_name(&name).is_err());
        validate_deck_name(&"a".repeat(MAX_DECK_NAME_LEN)).expect("boundary length");
    }

    #[test]
    fn derive_deck_name_slugifies_and_transliterates() {
        assert_eq!(
            derive_deck_name("Training Loss / Epoch").expect("name"),
            "training-loss-epoch"
        );
        assert_eq!(derive_deck_name("训练损失").expect("name"), "xun-lian-sun-shi");
    }

    #[test]
    fn derive_deck_name_rejects_blank_input() {
        assert!(derive_deck_name("   ").is_err());
        assert!(derive_deck_name("!!!").is_err());
    }

    #[test]
    fn artifact_namer_disambiguates_duplicates() {
        let mut namer = ArtifactNamer::new();

        assert_eq!(namer.file_name_for("demo"), ("demo.html".to_string(), false));
        assert_eq!(namer.file_name_for("demo"), ("demo-2.html".to_string(), true));
        assert_eq!(namer.file_name_for("demo-3"), ("demo-3.html".to_string(), false));
        assert_eq!(namer.file_name_for("demo"), ("demo-4.html".to_string(), true));
    }

    #[test]
    fn artifact_namer_ignores_case_when_disambiguating() {
        let mut namer = ArtifactNamer::new();

        assert_eq!(namer.file_name_for("Demo"), ("Demo.html".to_string(), false));
        assert_eq!(namer.file_name_for("demo"), ("demo-2.html".to_string(), true));
        assert_eq!(namer.file_name_for("DEMO-2"), ("DEMO-2-2.html".to_string(), true));
    }

    #[test]
    fn artifact_namer_reserves_index_stem() {
        let mut namer = ArtifactNamer::new();
        assert_eq!(namer.file_name_for("deck"), ("deck-2.html".to_string(), true));
        assert_eq!(namer.file_name_for("DECK"), ("DECK-3.html".to_string(), true));
        assert_eq!(index_file_name(), "deck.html");
    }
}

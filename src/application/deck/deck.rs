use std::{
    fmt,
    sync::{Arc, Mutex},
};

use crate::application::render::{Payload, RenderError, Renderer};
use crate::domain::{error::DeckError, slug::validate_deck_name};
use crate::infra::lock::mutex_lock;

use super::registry::DeckRegistry;

/// Delimiter inserted before every appended fragment.
pub const FRAGMENT_DELIMITER: char = '\n';

/// Named, append-only collector of rendered markup.
///
/// `Deck` is a cheap handle: clones share the same content, so a deck can be
/// handed to concurrent sub-activities and appended to from each of them.
#[derive(Clone)]
pub struct Deck {
    inner: Arc<DeckInner>,
}

struct DeckInner {
    name: String,
    content: Mutex<String>,
}

impl Deck {
    /// Create a deck and register it in `registry`.
    pub fn new(
        registry: &DeckRegistry,
        name: impl Into<String>,
        html: impl Into<String>,
    ) -> Result<Self, DeckError> {
        let name = name.into();
        validate_deck_name(&name)?;
        let deck = Self::detached(name, html.into());
        registry.register(deck.clone());
        Ok(deck)
    }

    /// Create a deck in the registry of the currently executing task.
    pub fn in_current(name: impl Into<String>, html: impl Into<String>) -> Result<Self, DeckError> {
        let registry = DeckRegistry::current()?;
        Self::new(&registry, name, html)
    }

    /// Build a deck that is not registered anywhere. Callers own registration.
    pub(crate) fn detached(name: String, html: String) -> Self {
        Self {
            inner: Arc::new(DeckInner {
                name,
                content: Mutex::new(html),
            }),
        }
    }

    /// Append a pre-rendered fragment. The delimiter and fragment are written
    /// under one lock acquisition, so concurrent appends never interleave.
    pub fn append(&self, html: impl AsRef<str>) -> &Self {
        let html = html.as_ref();
        let mut content = mutex_lock(&self.inner.content, "application::deck", "append");
        content.reserve(html.len() + FRAGMENT_DELIMITER.len_utf8());
        content.push(FRAGMENT_DELIMITER);
        content.push_str(html);
        self
    }

    /// Render `payload` with `renderer` and append the result. Nothing is
    /// appended when rendering fails.
    pub fn append_rendered(
        &self,
        renderer: &dyn Renderer,
        payload: &Payload,
    ) -> Result<&Self, RenderError> {
        let html = renderer.render(payload)?;
        Ok(self.append(html))
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Snapshot of the accumulated markup.
    pub fn content(&self) -> String {
        mutex_lock(&self.inner.content, "application::deck", "content").clone()
    }

    /// Whether both handles refer to the same deck.
    pub fn ptr_eq(&self, other: &Deck) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let content_len = mutex_lock(&self.inner.content, "application::deck", "debug").len();
        f.debug_struct("Deck")
            .field("name", &self.inner.name)
            .field("content_len", &content_len)
            .finish()
    }
}

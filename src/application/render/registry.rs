use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::{
    code::CodeRenderer,
    frame::FrameRenderer,
    markdown::MarkdownRenderer,
    scatter::ScatterRenderer,
    types::{Payload, RenderError, Renderer},
};

/// Name-addressed set of renderers. New variants can be registered at any
/// time without touching deck or materializer code.
#[derive(Default, Clone)]
pub struct RendererRegistry {
    renderers: Arc<DashMap<String, Arc<dyn Renderer>>>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in renderers.
    pub fn with_builtin(frame_max_rows: usize) -> Self {
        let registry = Self::new();
        registry.register(FrameRenderer::new(frame_max_rows));
        registry.register(MarkdownRenderer::new());
        registry.register(ScatterRenderer::default());
        registry.register(CodeRenderer::default());
        registry
    }

    /// Register a renderer under its own name, returning any renderer it
    /// replaced.
    pub fn register<R>(&self, renderer: R) -> Option<Arc<dyn Renderer>>
    where
        R: Renderer + 'static,
    {
        let name = renderer.name().to_string();
        self.register_as(name, Arc::new(renderer))
    }

    pub fn register_as(
        &self,
        name: impl Into<String>,
        renderer: Arc<dyn Renderer>,
    ) -> Option<Arc<dyn Renderer>> {
        let name = name.into();
        debug!(
            target = "application::render",
            renderer = %name,
            "registered renderer"
        );
        self.renderers.insert(name, renderer)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Renderer>> {
        self.renderers
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn render(&self, name: &str, payload: &Payload) -> Result<String, RenderError> {
        let renderer = self.get(name).ok_or_else(|| RenderError::UnknownRenderer {
            name: name.to_string(),
        })?;
        renderer.render(payload)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .renderers
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }
}

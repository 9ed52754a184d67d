//! Renderers turning typed payloads into embeddable HTML fragments.
//!
//! Every renderer is pure: it accepts a payload, produces deterministic markup,
//! and surfaces structured errors instead of partial output. Variants are an
//! open set behind the [`Renderer`] trait; [`RendererRegistry`] addresses them
//! by name.

mod code;
mod frame;
mod markdown;
mod registry;
mod scatter;
mod types;

pub use code::CodeRenderer;
pub use frame::{DEFAULT_MAX_ROWS, FrameRenderer};
pub use markdown::MarkdownRenderer;
pub use registry::RendererRegistry;
pub use scatter::ScatterRenderer;
pub use types::{Payload, PayloadKind, RenderError, Renderer, Series, Table};

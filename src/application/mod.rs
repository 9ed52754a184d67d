//! Application layer: renderers, decks, and task execution.

pub mod deck;
pub mod error;
pub mod execution;
pub mod render;
pub mod tasks;

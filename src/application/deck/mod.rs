//! Per-execution report decks.
//!
//! Decks collect rendered fragments while a task runs. Every deck registers in
//! the task's [`DeckRegistry`] when it is created, and [`materialize`] writes
//! the whole registry out as one bundle at the end of the execution.

mod deck;
mod materialize;
mod registry;

pub use deck::{Deck, FRAGMENT_DELIMITER};
pub use materialize::{
    ArtifactWriteFailure, DeckArtifact, MaterializeError, MaterializedDeck, materialize,
    materialize_into, publish_bundle, publish_to_root,
};
pub use registry::{DEFAULT_DECK_NAME, DeckRegistry, INPUT_DECK_NAME, OUTPUT_DECK_NAME};

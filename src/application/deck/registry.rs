use std::{
    fmt,
    future::Future,
    sync::{Arc, Mutex},
};

use once_cell::sync::OnceCell;
use uuid::Uuid;

use crate::domain::error::DeckError;
use crate::infra::lock::mutex_lock;

use super::deck::Deck;

pub const DEFAULT_DECK_NAME: &str = "default";
pub const INPUT_DECK_NAME: &str = "input";
pub const OUTPUT_DECK_NAME: &str = "output";

tokio::task_local! {
    static CURRENT_REGISTRY: DeckRegistry;
}

/// Ordered set of every deck created during one task execution.
///
/// The default deck is created with the registry and always comes first.
/// Input and output decks are created on first access. Clones share state, so
/// a registry handle can be passed to concurrently running sub-activities.
#[derive(Clone)]
pub struct DeckRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    id: Uuid,
    decks: Mutex<Vec<Deck>>,
    default_deck: Deck,
    input_deck: OnceCell<Deck>,
    output_deck: OnceCell<Deck>,
}

impl Default for DeckRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckRegistry {
    pub fn new() -> Self {
        let default_deck = Deck::detached(DEFAULT_DECK_NAME.to_string(), String::new());
        Self {
            inner: Arc::new(RegistryInner {
                id: Uuid::new_v4(),
                decks: Mutex::new(vec![default_deck.clone()]),
                default_deck,
                input_deck: OnceCell::new(),
                output_deck: OnceCell::new(),
            }),
        }
    }

    /// Registry bound to the currently executing task.
    ///
    /// Only code running inside [`DeckRegistry::scope`] or
    /// [`DeckRegistry::sync_scope`] sees a registry. Tasks spawned from inside
    /// the scope do not inherit it and should receive a cloned handle instead.
    pub fn current() -> Result<Self, DeckError> {
        CURRENT_REGISTRY
            .try_with(|registry| registry.clone())
            .map_err(|_| DeckError::NoActiveExecution)
    }

    /// Run `future` with this registry installed as the current one.
    pub async fn scope<F>(&self, future: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_REGISTRY.scope(self.clone(), future).await
    }

    /// Run `work` synchronously with this registry installed as the current one.
    pub fn sync_scope<F, R>(&self, work: F) -> R
    where
        F: FnOnce() -> R,
    {
        CURRENT_REGISTRY.sync_scope(self.clone(), work)
    }

    /// Append a deck to the registration sequence.
    pub fn register(&self, deck: Deck) {
        mutex_lock(&self.inner.decks, "application::deck::registry", "register").push(deck);
    }

    pub fn default_deck(&self) -> &Deck {
        &self.inner.default_deck
    }

    pub fn input_deck(&self) -> &Deck {
        self.inner
            .input_deck
            .get_or_init(|| self.register_builtin(INPUT_DECK_NAME))
    }

    pub fn output_deck(&self) -> &Deck {
        self.inner
            .output_deck
            .get_or_init(|| self.register_builtin(OUTPUT_DECK_NAME))
    }

    fn register_builtin(&self, name: &str) -> Deck {
        let deck = Deck::detached(name.to_string(), String::new());
        self.register(deck.clone());
        deck
    }

    /// Snapshot of registered decks in registration order.
    pub fn decks(&self) -> Vec<Deck> {
        mutex_lock(&self.inner.decks, "application::deck::registry", "decks").clone()
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.inner.decks, "application::deck::registry", "len").len()
    }

    /// Always false: the default deck is registered at construction.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn ptr_eq(&self, other: &DeckRegistry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for DeckRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeckRegistry")
            .field("id", &self.inner.id)
            .field("decks", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn starts_with_default_deck() {
        let registry = DeckRegistry::new();
        let decks = registry.decks();

        assert_eq!(decks.len(), 1);
        assert_eq!(decks[0].name(), DEFAULT_DECK_NAME);
        assert!(decks[0].ptr_eq(registry.default_deck()));
        assert!(!registry.is_empty());
    }

    #[test]
    fn preserves_construction_order() {
        let registry = DeckRegistry::new();
        let names = ["first", "second", "third", "fourth"];
        for name in names {
            Deck::new(&registry, name, "").expect("deck");
        }

        let registered: Vec<String> = registry
            .decks()
            .iter()
            .map(|deck| deck.name().to_string())
            .collect();
        assert_eq!(
            registered,
            vec!["default", "first", "second", "third", "fourth"]
        );
    }

    #[test]
    fn input_and_output_decks_are_lazy_and_unique() {
        let registry = DeckRegistry::new();
        assert_eq!(registry.len(), 1);

        let input = registry.input_deck().clone();
        let again = registry.input_deck().clone();
        assert!(input.ptr_eq(&again));
        assert_eq!(registry.len(), 2);

        registry.output_deck().append("<p>out</p>");
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.decks()[2].name(), OUTPUT_DECK_NAME);
    }

    #[test]
    fn registries_do_not_share_state() {
        let first = DeckRegistry::new();
        let second = DeckRegistry::new();

        first.default_deck().append("only-first");
        Deck::new(&first, "extra", "").expect("deck");

        assert_eq!(second.len(), 1);
        assert_eq!(second.default_deck().content(), "");
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn current_requires_active_scope() {
        assert_eq!(
            DeckRegistry::current().expect_err("no scope"),
            DeckError::NoActiveExecution
        );

        let registry = DeckRegistry::new();
        let seen = registry.sync_scope(|| DeckRegistry::current().expect("in scope"));
        assert!(seen.ptr_eq(&registry));
    }

    #[test]
    fn in_current_registers_into_scoped_registry() {
        let registry = DeckRegistry::new();
        registry.sync_scope(|| {
            Deck::in_current("scoped", "<p>hi</p>").expect("deck");
        });

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.decks()[1].name(), "scoped");
        assert!(Deck::in_current("outside", "").is_err());
    }

    #[tokio::test]
    async fn async_scope_exposes_registry() {
        let registry = DeckRegistry::new();
        let name = registry
            .scope(async {
                tokio::task::yield_now().await;
                let deck = Deck::in_current("async-deck", "").expect("deck");
                deck.name().to_string()
            })
            .await;

        assert_eq!(name, "async-deck");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn concurrent_registration_keeps_every_deck() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 25;

        let registry = DeckRegistry::new();
        thread::scope(|scope| {
            for worker in 0..THREADS {
                let registry = registry.clone();
                scope.spawn(move || {
                    for index in 0..PER_THREAD {
                        Deck::new(&registry, format!("w{worker}-{index}"), "").expect("deck");
                    }
                });
            }
        });

        let decks = registry.decks();
        assert_eq!(decks.len(), THREADS * PER_THREAD + 1);

        // Each worker's own decks appear in the order that worker created them.
        for worker in 0..THREADS {
            let prefix = format!("w{worker}-");
            let indices: Vec<usize> = decks
                .iter()
                .filter_map(|deck| deck.name().strip_prefix(prefix.as_str()))
                .map(|suffix| suffix.parse().expect("numeric suffix"))
                .collect();
            assert_eq!(indices, (0..PER_THREAD).collect::<Vec<_>>());
        }
    }
}

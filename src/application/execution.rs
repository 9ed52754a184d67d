//! Execution context binding one task run to its deck registry.

use std::{future::Future, path::Path, sync::Arc};

use tracing::{Instrument, error, info, info_span, warn};

use crate::application::deck::{
    DeckRegistry, MaterializeError, MaterializedDeck, materialize, publish_to_root,
};
use crate::infra::staging::FileStaging;

/// Output of [`TaskExecution::run`]: the task's own result and, independently,
/// the outcome of writing its decks.
#[derive(Debug)]
pub struct ExecutionOutcome<T> {
    pub result: T,
    pub deck: Result<MaterializedDeck, MaterializeError>,
}

impl<T> ExecutionOutcome<T> {
    /// Log deck problems, publish the bundle under `publish_root` when given,
    /// and return the task's own result. Deck failures never change it.
    pub fn settle(self, task_name: &str, publish_root: Option<&Path>) -> T {
        let ExecutionOutcome { result, deck } = self;

        let bundle = match deck {
            Ok(bundle) => bundle,
            Err(err) => {
                error!(
                    target = "application::execution",
                    task = %task_name,
                    error = %err,
                    "task finished without a deck bundle"
                );
                return result;
            }
        };

        for failure in &bundle.failures {
            error!(
                target = "application::execution",
                task = %task_name,
                error = %failure,
                "deck missing from bundle"
            );
        }

        if let Some(root) = publish_root {
            match publish_to_root(&bundle, root) {
                Ok(prefix) => info!(
                    target = "application::execution",
                    task = %task_name,
                    "deck bundle available at file://{}/{prefix}/deck.html",
                    root.display()
                ),
                Err(err) => warn!(
                    target = "application::execution",
                    task = %task_name,
                    error = %err,
                    "deck bundle publish failed"
                ),
            }
        }

        result
    }
}

/// One execution attempt of a task.
///
/// The registry is installed as [`DeckRegistry::current`] while the task body
/// runs, and the decks are materialized afterwards whether the body
/// succeeded or failed.
pub struct TaskExecution {
    task_name: String,
    registry: DeckRegistry,
    staging: Arc<dyn FileStaging>,
}

impl TaskExecution {
    pub fn new(task_name: impl Into<String>, staging: Arc<dyn FileStaging>) -> Self {
        Self {
            task_name: task_name.into(),
            registry: DeckRegistry::new(),
            staging,
        }
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn registry(&self) -> &DeckRegistry {
        &self.registry
    }

    pub fn run<T, F>(self, work: F) -> ExecutionOutcome<T>
    where
        F: FnOnce(&DeckRegistry) -> T,
    {
        let span = info_span!("task_execution", task = %self.task_name);
        let _entered = span.enter();

        let result = self.registry.sync_scope(|| work(&self.registry));
        let deck = self.finish();
        ExecutionOutcome { result, deck }
    }

    pub async fn run_async<T, F, Fut>(self, work: F) -> ExecutionOutcome<T>
    where
        F: FnOnce(DeckRegistry) -> Fut,
        Fut: Future<Output = T>,
    {
        let span = info_span!("task_execution", task = %self.task_name);

        let result = self
            .registry
            .scope(work(self.registry.clone()))
            .instrument(span.clone())
            .await;
        let deck = span.in_scope(|| self.finish());
        ExecutionOutcome { result, deck }
    }

    fn finish(&self) -> Result<MaterializedDeck, MaterializeError> {
        let outcome = materialize(&self.task_name, &self.registry, self.staging.as_ref());
        if let Err(err) = &outcome {
            warn!(
                target = "application::execution",
                task = %self.task_name,
                error = %err,
                "deck materialization failed"
            );
        }
        outcome
    }
}

use std::{
    fs,
    path::{Path, PathBuf},
};

use askama::Template;
use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::slug::{ArtifactNamer, index_file_name};
use crate::infra::staging::{FileStaging, LocalStaging, StagingError};
use crate::infra::telemetry::{
    ARTIFACT_WRITE_FAILURES_TOTAL, ARTIFACTS_WRITTEN_TOTAL, DECKS_MATERIALIZED_TOTAL,
};

use super::registry::DeckRegistry;

/// One deck persisted to the bundle directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckArtifact {
    pub name: String,
    pub file_name: String,
}

/// A deck whose artifact could not be written. The remaining decks and the
/// index are still produced.
#[derive(Debug, Error)]
#[error("failed to write deck `{name}` to `{}`: {source}", .path.display())]
pub struct ArtifactWriteFailure {
    pub name: String,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error("failed to render deck index: {0}")]
    Template(#[from] askama::Error),
    #[error("failed to write deck index `{}`: {source}", .path.display())]
    IndexWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of a materialization pass.
#[derive(Debug)]
pub struct MaterializedDeck {
    pub task_name: String,
    pub directory: PathBuf,
    pub index_path: PathBuf,
    /// Written artifacts in registry order.
    pub artifacts: Vec<DeckArtifact>,
    pub failures: Vec<ArtifactWriteFailure>,
}

impl MaterializedDeck {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// File name of the first artifact written for `name`.
    pub fn file_name_for(&self, name: &str) -> Option<&str> {
        self.artifacts
            .iter()
            .find(|artifact| artifact.name == name)
            .map(|artifact| artifact.file_name.as_str())
    }

    pub fn artifact_path(&self, artifact: &DeckArtifact) -> PathBuf {
        self.directory.join(&artifact.file_name)
    }
}

#[derive(Template)]
#[template(path = "deck.html")]
struct DeckIndexTemplate<'a> {
    task_name: &'a str,
    artifacts: &'a [DeckArtifact],
}

/// Persist every deck of `registry` into a fresh staging directory together
/// with a `deck.html` index.
pub fn materialize(
    task_name: &str,
    registry: &DeckRegistry,
    staging: &dyn FileStaging,
) -> Result<MaterializedDeck, MaterializeError> {
    let directory = staging.random_local_directory()?;
    materialize_into(task_name, registry, &directory)
}

/// Persist every deck of `registry` into `directory`, which must exist.
///
/// Each deck is written independently: a failed write is recorded in
/// [`MaterializedDeck::failures`], left out of the index, and does not stop
/// the remaining decks. Only a failure to produce the index itself is
/// returned as an error.
pub fn materialize_into(
    task_name: &str,
    registry: &DeckRegistry,
    directory: &Path,
) -> Result<MaterializedDeck, MaterializeError> {
    let mut namer = ArtifactNamer::new();
    let mut artifacts = Vec::new();
    let mut failures = Vec::new();

    for deck in registry.decks() {
        let (file_name, renamed) = namer.file_name_for(deck.name());
        if renamed {
            warn!(
                target = "application::deck",
                task = %task_name,
                deck = %deck.name(),
                file_name = %file_name,
                "duplicate deck name; artifact written under a suffixed file name"
            );
        }

        let path = directory.join(&file_name);
        match fs::write(&path, deck.content()) {
            Ok(()) => {
                counter!(ARTIFACTS_WRITTEN_TOTAL).increment(1);
                artifacts.push(DeckArtifact {
                    name: deck.name().to_string(),
                    file_name,
                });
            }
            Err(source) => {
                counter!(ARTIFACT_WRITE_FAILURES_TOTAL).increment(1);
                let failure = ArtifactWriteFailure {
                    name: deck.name().to_string(),
                    path,
                    source,
                };
                warn!(
                    target = "application::deck",
                    task = %task_name,
                    error = %failure,
                    "deck artifact write failed"
                );
                failures.push(failure);
            }
        }
    }

    let index_html = DeckIndexTemplate {
        task_name,
        artifacts: &artifacts,
    }
    .render()?;

    let index_path = directory.join(index_file_name());
    fs::write(&index_path, index_html).map_err(|source| MaterializeError::IndexWrite {
        path: index_path.clone(),
        source,
    })?;

    counter!(DECKS_MATERIALIZED_TOTAL).increment(1);
    info!(
        target = "application::deck",
        task = %task_name,
        artifacts = artifacts.len(),
        failures = failures.len(),
        "{task_name} output deck html to file://{}",
        index_path.display()
    );

    Ok(MaterializedDeck {
        task_name: task_name.to_string(),
        directory: directory.to_path_buf(),
        index_path,
        artifacts,
        failures,
    })
}

/// Copy a materialized bundle to durable storage under `remote_prefix`,
/// returning the remote paths written. The index is uploaded last so readers
/// never see an index that references missing artifacts.
pub fn publish_bundle(
    bundle: &MaterializedDeck,
    staging: &dyn FileStaging,
    remote_prefix: &str,
) -> Result<Vec<String>, StagingError> {
    let prefix = remote_prefix.trim_end_matches('/');
    let mut uploaded = Vec::with_capacity(bundle.artifacts.len() + 1);

    let files = bundle
        .artifacts
        .iter()
        .map(|artifact| (bundle.artifact_path(artifact), artifact.file_name.clone()))
        .chain(std::iter::once((
            bundle.index_path.clone(),
            index_file_name(),
        )));

    for (local, file_name) in files {
        let remote = format!("{prefix}/{file_name}");
        staging.put_data(&local, &remote)?;
        uploaded.push(remote);
    }

    info!(
        target = "application::deck",
        task = %bundle.task_name,
        remote = %prefix,
        files = uploaded.len(),
        "published deck bundle"
    );

    Ok(uploaded)
}

/// Publish `bundle` into the local directory `root` under
/// `<task>/<run id>/`, returning that prefix.
pub fn publish_to_root(bundle: &MaterializedDeck, root: &Path) -> Result<String, StagingError> {
    let staging = LocalStaging::new(&bundle.directory).with_remote_root(root);
    let run_id = bundle
        .directory
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("latest");
    let prefix = format!("{}/{run_id}", bundle.task_name);
    publish_bundle(bundle, &staging, &prefix)?;
    Ok(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::deck::Deck;

    #[test]
    fn default_only_registry_produces_index() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let registry = DeckRegistry::new();

        let bundle = materialize_into("t0", &registry, scratch.path()).expect("materialize");

        assert_eq!(
            bundle.artifacts,
            vec![DeckArtifact {
                name: "default".into(),
                file_name: "default.html".into(),
            }]
        );
        let index = fs::read_to_string(&bundle.index_path).expect("index");
        assert_eq!(index.matches("<a href=").count(), 1);
        assert!(index.contains("href=\"default.html\""));
        assert!(scratch.path().join("default.html").is_file());
    }

    #[test]
    fn duplicate_names_get_distinct_files() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let registry = DeckRegistry::new();
        Deck::new(&registry, "plot", "first").expect("deck");
        Deck::new(&registry, "plot", "second").expect("deck");

        let bundle = materialize_into("dup", &registry, scratch.path()).expect("materialize");

        let files: Vec<&str> = bundle
            .artifacts
            .iter()
            .map(|artifact| artifact.file_name.as_str())
            .collect();
        assert_eq!(files, vec!["default.html", "plot.html", "plot-2.html"]);
        assert_eq!(
            fs::read_to_string(scratch.path().join("plot.html")).expect("read"),
            "first"
        );
        assert_eq!(
            fs::read_to_string(scratch.path().join("plot-2.html")).expect("read"),
            "second"
        );
        assert_eq!(bundle.file_name_for("plot"), Some("plot.html"));
    }

    #[test]
    fn deck_named_deck_does_not_clobber_index() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let registry = DeckRegistry::new();
        Deck::new(&registry, "deck", "<p>mine</p>").expect("deck");

        let bundle = materialize_into("t", &registry, scratch.path()).expect("materialize");

        assert_eq!(bundle.file_name_for("deck"), Some("deck-2.html"));
        let index = fs::read_to_string(&bundle.index_path).expect("index");
        assert!(index.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn write_failure_is_isolated() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let registry = DeckRegistry::new();
        Deck::new(&registry, "blocked", "x").expect("deck");
        Deck::new(&registry, "fine", "y").expect("deck");
        // A directory where the artifact file should go makes the write fail.
        fs::create_dir(scratch.path().join("blocked.html")).expect("blocker");

        let bundle = materialize_into("t", &registry, scratch.path()).expect("materialize");

        assert!(!bundle.is_complete());
        assert_eq!(bundle.failures.len(), 1);
        assert_eq!(bundle.failures[0].name, "blocked");
        assert_eq!(bundle.file_name_for("fine"), Some("fine.html"));
        assert_eq!(bundle.file_name_for("blocked"), None);

        let index = fs::read_to_string(&bundle.index_path).expect("index");
        assert!(index.contains("fine.html"));
        assert!(!index.contains("blocked.html"));
    }

    #[test]
    fn index_escapes_task_name() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let registry = DeckRegistry::new();

        let bundle =
            materialize_into("<t1>", &registry, scratch.path()).expect("materialize");

        let index = fs::read_to_string(&bundle.index_path).expect("index");
        assert!(!index.contains("<t1>"));
        assert!(index.contains("&#60;t1&#62;"));
    }

    #[test]
    fn publish_copies_every_file() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let staging = LocalStaging::new(scratch.path());
        let registry = DeckRegistry::new();
        Deck::new(&registry, "demo", "<p>demo</p>").expect("deck");

        let bundle = materialize("t1", &registry, &staging).expect("materialize");
        let uploaded = publish_bundle(&bundle, &staging, "runs/1/").expect("publish");

        assert_eq!(
            uploaded,
            vec!["runs/1/default.html", "runs/1/demo.html", "runs/1/deck.html"]
        );
        let remote_demo = staging.remote_root().join("runs/1/demo.html");
        assert_eq!(fs::read_to_string(remote_demo).expect("read"), "<p>demo</p>");
    }
}

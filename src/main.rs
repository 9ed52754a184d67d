use std::{process, sync::Arc};

use taskdeck::{
    application::{
        error::AppError,
        execution::TaskExecution,
        render::RendererRegistry,
        tasks,
    },
    config::{self, BuildArgs, DeckSettings, DemoArgs},
    infra::{
        error::InfraError,
        staging::{FileStaging, LocalStaging},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let causes = error.messages().join(": ");
    if dispatcher::has_been_set() {
        error!(error = %causes, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %causes, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| InfraError::configuration(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Demo(DemoArgs::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let staging: Arc<dyn FileStaging> =
        Arc::new(LocalStaging::new(settings.deck.staging_root.clone()));
    let renderers = RendererRegistry::with_builtin(settings.deck.frame_max_rows);

    match command {
        config::Command::Demo(args) => run_demo(&settings.deck, staging, &renderers, &args).await,
        config::Command::Build(args) => {
            run_build(&settings.deck, staging, &renderers, &args).await
        }
    }
}

async fn run_demo(
    settings: &DeckSettings,
    staging: Arc<dyn FileStaging>,
    renderers: &RendererRegistry,
    args: &DemoArgs,
) -> Result<(), AppError> {
    let x = args.x;
    let scatter = TaskExecution::new("t1", staging.clone())
        .run_async(|registry| async move { tasks::scatter_markdown_task(&registry, renderers, x) })
        .await;
    let markdown = scatter.settle("t1", settings.publish_root.as_deref())?;
    info!(target = "taskdeck::demo", task = "t1", chars = markdown.len(), "task returned");

    let frame = TaskExecution::new("t2", staging)
        .run_async(|registry| async move { tasks::iris_frame_task(&registry, renderers) })
        .await;
    let table = frame.settle("t2", settings.publish_root.as_deref())?;
    info!(target = "taskdeck::demo", task = "t2", rows = table.rows.len(), "task returned");

    Ok(())
}

async fn run_build(
    settings: &DeckSettings,
    staging: Arc<dyn FileStaging>,
    renderers: &RendererRegistry,
    args: &BuildArgs,
) -> Result<(), AppError> {
    let files = args.files.as_slice();
    let outcome = TaskExecution::new(args.task.clone(), staging)
        .run_async(|registry| async move {
            for path in files {
                tasks::deck_from_file(&registry, renderers, path)?;
            }
            Ok::<_, AppError>(files.len())
        })
        .await;
    let built = outcome.settle(&args.task, settings.publish_root.as_deref())?;
    info!(target = "taskdeck::build", task = %args.task, decks = built, "task returned");
    Ok(())
}

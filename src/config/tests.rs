use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.deck.frame_max_rows = Some(20);
    raw.logging.level = Some("info".to_string());

    let overrides = DeckOverrides {
        frame_max_rows: Some(5),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_deck_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.deck.frame_max_rows, 5);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_are_applied() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.deck.frame_max_rows, DEFAULT_MAX_ROWS);
    assert!(settings.deck.staging_root.ends_with(DEFAULT_STAGING_DIR));
    assert!(settings.deck.publish_root.is_none());
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn zero_frame_rows_is_rejected() {
    let mut raw = RawSettings::default();
    raw.deck.frame_max_rows = Some(0);

    let err = Settings::from_raw(raw).expect_err("invalid rows");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "deck.frame_max_rows",
            ..
        }
    ));
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = DeckOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_deck_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn parse_demo_arguments() {
    let args = CliArgs::parse_from([
        "taskdeck",
        "demo",
        "--x",
        "25",
        "--frame-max-rows",
        "3",
        "--staging-root",
        "/tmp/decks",
    ]);

    match args.command.expect("demo command") {
        Command::Demo(demo) => {
            assert_eq!(demo.x, 25);
            assert_eq!(demo.overrides.frame_max_rows, Some(3));
            assert_eq!(
                demo.overrides.staging_root,
                Some(PathBuf::from("/tmp/decks"))
            );
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_build_arguments() {
    let args = CliArgs::parse_from([
        "taskdeck",
        "build",
        "--task",
        "nightly",
        "--publish-root",
        "/srv/decks",
        "notes.md",
        "metrics.json",
    ]);

    match args.command.expect("build command") {
        Command::Build(build) => {
            assert_eq!(build.task, "nightly");
            assert_eq!(
                build.files,
                vec![PathBuf::from("notes.md"), PathBuf::from("metrics.json")]
            );
            assert_eq!(
                build.overrides.publish_root,
                Some(PathBuf::from("/srv/decks"))
            );
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn build_requires_files() {
    assert!(CliArgs::try_parse_from(["taskdeck", "build"]).is_err());
}

#[test]
fn default_to_demo_command() {
    let args = CliArgs::parse_from(["taskdeck"]);
    let command = args
        .command
        .unwrap_or(Command::Demo(DemoArgs::default()));
    assert!(matches!(command, Command::Demo(demo) if demo.x == DEFAULT_DEMO_X));
}

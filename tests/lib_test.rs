//! Library integration tests.

use pipewright::PipewrightError;

#[test]
fn error_types_are_public() {
    let err = PipewrightError::RunNotFound {
        run_id: "exec_test".into(),
    };
    assert!(err.to_string().contains("exec_test"));
    assert!(!err.is_rejection());
}

#[test]
fn rejections_are_distinguished() {
    let err = PipewrightError::SchemaError {
        violations: vec!["steps: required".into()],
    };
    assert!(err.is_rejection());
    assert!(err.to_string().contains("steps: required"));
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> pipewright::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use pipewright::cli::{Cli, Commands};
    use clap::Parser;

    let cli = Cli::parse_from(["pipewright", "info", "--json"]);
    assert!(cli.command.is_some());

    if let Some(Commands::Info(args)) = cli.command {
        assert!(args.json);
    } else {
        panic!("Expected Info command");
    }
}

#[test]
fn run_args_parse_from_cli() {
    use pipewright::cli::{Cli, Commands};
    use clap::Parser;

    let cli = Cli::parse_from([
        "pipewright",
        "run",
        "--max-leads",
        "5",
        "--checkpoint-dir",
        "ckpt",
        "--resume",
        "exec_1",
    ]);
    let Some(Commands::Run(args)) = cli.command else {
        panic!("Expected Run command");
    };
    assert_eq!(args.max_leads, Some(5));
    assert_eq!(args.resume.as_deref(), Some("exec_1"));
}

#[test]
fn ui_types_are_public() {
    use pipewright::ui::{MockUI, OutputMode, UserInterface};

    let mut ui = MockUI::new();
    ui.message("hello");
    assert!(ui.has_message("hello"));
    assert_eq!(OutputMode::default(), OutputMode::Normal);
}

// tests/cli_run.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::io::Write;

use clap::Parser;
use tempfile::NamedTempFile;

use calcdag::cli::CliArgs;
use calcdag::errors::CalcdagError;
use calcdag::{run, run_with_output};

fn fast_config() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[orchestrator]
worker_count = 2
operation_duration = "0ms"
poll_interval = "50ms"
"#
    )
    .unwrap();
    file
}

fn args(config: &NamedTempFile, rest: &[&str]) -> CliArgs {
    let path = config.path().to_str().unwrap();
    let mut argv = vec!["calcdag", "--config", path];
    argv.extend_from_slice(rest);
    CliArgs::try_parse_from(argv).unwrap()
}

#[tokio::test]
async fn evaluates_expressions_end_to_end() {
    init_tracing();
    let config = fast_config();
    let mut out = Vec::new();
    with_timeout(run_with_output(
        args(&config, &["--json", "2+2*2", "5/0"]),
        &mut out,
    ))
    .await
    .unwrap();

    let reports: Vec<serde_json::Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(reports.len(), 2);

    assert_eq!(reports[0]["expression"], "2+2*2");
    assert_eq!(reports[0]["state"], "done");
    assert_eq!(reports[0]["result"], 6.0);

    assert_eq!(reports[1]["expression"], "5/0");
    assert_eq!(reports[1]["state"], "error");
    assert!(reports[1].get("result").is_none());
    let status = reports[1]["status"].as_str().unwrap();
    assert!(status.contains("division by zero"), "{status}");
}

#[tokio::test]
async fn plain_text_reports_one_line_per_expression() {
    init_tracing();
    let config = fast_config();
    let mut out = Vec::new();
    let err = with_timeout(run_with_output(args(&config, &["2+2*2", "1+"]), &mut out))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("could not be parsed"));

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "2+2*2 = 6");
    assert!(lines[1].starts_with("1+: error:"), "{text}");
}

#[tokio::test]
async fn rejected_expression_makes_run_fail_after_reporting() {
    init_tracing();
    let config = fast_config();
    let err = with_timeout(run(args(&config, &["1+1", "1+"])))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("1 expression(s) could not be parsed"));
}

#[tokio::test]
async fn cli_override_is_validated_like_the_file() {
    init_tracing();
    let config = fast_config();
    let err = run(args(&config, &["--workers", "0", "1+1"]))
        .await
        .unwrap_err();
    let err = err.downcast::<CalcdagError>().unwrap();
    assert!(matches!(err, CalcdagError::ConfigError(msg) if msg.contains("worker_count")));
}

#[tokio::test]
async fn missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.toml");
    let argv = ["calcdag", "--config", path.to_str().unwrap(), "1+1"];
    let err = run(CliArgs::try_parse_from(argv).unwrap()).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CalcdagError>(),
        Some(CalcdagError::IoError(_))
    ));
}

#[tokio::test]
async fn dry_run_does_not_need_workers() {
    let config = fast_config();
    let mut out = Vec::new();
    with_timeout(run_with_output(
        args(&config, &["--dry-run", "(1+2)*(3-4)", "oops"]),
        &mut out,
    ))
    .await
    .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("calcdag dry-run"));
    assert_eq!(text.matches("(root)").count(), 1);
    assert!(text.contains("  error:"), "{text}");
}

use std::io::Write;

use clap::Parser;
use deploycfg::cli::CliArgs;
use deploycfg::run;
use deploycfg_test_utils::init_tracing;
use tempfile::NamedTempFile;

fn complete_env_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
API_URL = "https://api.example.com"
DB_URL = "postgres://app@db.internal:5432/app"
DB_PASSWORD = "correct-horse-battery-staple"
JWT_SECRET = "0123456789abcdef0123456789abcdef"
GITHUB_REPO = "git@github.com:example/app.git"
DEPLOY_HOSTS = ["host1", "host2"]
"#
    )
    .unwrap();
    file
}

fn args(extra: &[&str]) -> CliArgs {
    init_tracing();
    let mut argv = vec!["deploycfg"];
    argv.extend_from_slice(extra);
    CliArgs::try_parse_from(argv).unwrap()
}

#[test]
fn run_prints_config_from_env_file_only() {
    let file = complete_env_file();
    let path = file.path().to_str().unwrap();
    let result = run(args(&["--no-process-env", "--env-file", path, "--section", "server"]));
    assert!(result.is_ok(), "{:?}", result.err());
}

#[test]
fn run_check_fails_without_required_values() {
    let result = run(args(&["--no-process-env", "--check"]));
    let err = result.unwrap_err();
    assert!(err.to_string().contains("7 configuration problem(s)"));
}

#[test]
fn run_check_rejects_instance_count_the_supervisor_cannot_run() {
    let mut file = complete_env_file();
    writeln!(file, "PROCESS_INSTANCES = \"5000000000\"").unwrap();
    let path = file.path().to_str().unwrap();

    let err = run(args(&["--no-process-env", "--env-file", path, "--check"])).unwrap_err();
    assert!(err.to_string().contains("1 configuration problem(s)"));
}

#[test]
fn run_check_passes_on_complete_env_file() {
    let file = complete_env_file();
    let path = file.path().to_str().unwrap();
    assert!(run(args(&["--no-process-env", "--env-file", path, "--check"])).is_ok());
}

#[test]
fn run_rejects_unknown_section() {
    let result = run(args(&["--print-schema", "--section", "database"]));
    let err = result.unwrap_err();
    assert!(err.to_string().contains("unknown section 'database'"));
}

#[test]
fn run_prints_schema() {
    assert!(run(args(&["--print-schema"])).is_ok());
}

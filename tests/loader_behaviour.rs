use std::error::Error;

use deploycfg::config::{ValueSource, check, load};
use deploycfg::errors::DeploycfgError;
use deploycfg::types::Value;
use deploycfg_test_utils::builders::{EnvBuilder, SchemaBuilder, port_field, small_schema};
use deploycfg_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn small_env() -> EnvBuilder {
    EnvBuilder::new()
        .var("API_URL", "https://api.example.com")
        .var("JWT_SECRET", "s3cr3t")
}

#[test]
fn port_defaults_to_3000_when_unset() -> TestResult {
    init_tracing();
    let schema = SchemaBuilder::new().with_section("server", vec![port_field()]).build();

    let cfg = load(&schema, &EnvBuilder::new().build())?;

    assert_eq!(cfg.get("server", "port")?, Some(&Value::Number(3000)));
    assert_eq!(cfg.source("server", "port")?, &ValueSource::Default);
    Ok(())
}

#[test]
fn non_numeric_port_is_a_type_mismatch() {
    init_tracing();
    let schema = SchemaBuilder::new().with_section("server", vec![port_field()]).build();

    let result = load(&schema, &EnvBuilder::new().var("PORT", "abc").build());

    match result {
        Err(DeploycfgError::TypeMismatch {
            section,
            field,
            expected,
        }) => {
            assert_eq!(section, "server");
            assert_eq!(field, "port");
            assert_eq!(expected, "number");
        }
        Err(e) => panic!("Expected TypeMismatch, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn valid_environment_populates_every_field() -> TestResult {
    init_tracing();
    let schema = small_schema();
    let cfg = load(&schema, &small_env().var("PORT", "8080").build())?;

    assert_eq!(cfg.number("server", "port")?, Some(8080));
    assert_eq!(cfg.string("server", "api_url")?, Some("https://api.example.com"));
    assert_eq!(cfg.string("server", "jwt_secret")?, Some("s3cr3t"));
    assert_eq!(cfg.number("process", "max_restarts")?, Some(10));
    assert_eq!(cfg.get("server", "asset_prefix")?, None);
    assert_eq!(cfg.source("server", "asset_prefix")?, &ValueSource::Unset);
    Ok(())
}

#[test]
fn missing_required_field_is_named() {
    init_tracing();
    let result = load(&small_schema(), &small_env().without("API_URL").build());

    match result {
        Err(DeploycfgError::MissingRequiredField {
            section,
            field,
            env,
        }) => {
            assert_eq!((section.as_str(), field.as_str()), ("server", "api_url"));
            assert_eq!(env, "API_URL");
        }
        Err(e) => panic!("Expected MissingRequiredField, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn empty_required_value_counts_as_missing() {
    init_tracing();
    let result = load(&small_schema(), &small_env().var("JWT_SECRET", "").build());
    assert!(matches!(
        result,
        Err(DeploycfgError::MissingRequiredField { field, .. }) if field == "jwt_secret"
    ));
}

#[test]
fn rule_violation_is_reported_with_rule() {
    init_tracing();
    let result = load(&small_schema(), &small_env().var("API_URL", "ftp://files").build());
    match result {
        Err(DeploycfgError::ValidationFailed { field, rule, .. }) => {
            assert_eq!(field, "api_url");
            assert!(rule.contains("http(s) URL"));
        }
        other => panic!("Expected ValidationFailed, got: {:?}", other),
    }
}

#[test]
fn unknown_field_is_rejected() -> TestResult {
    init_tracing();
    let cfg = load(&small_schema(), &small_env().build())?;

    for (section, field) in [("server", "prot"), ("serv", "port"), ("images", "domains")] {
        match cfg.get(section, field) {
            Err(DeploycfgError::UnknownField { section: s, field: f }) => {
                assert_eq!((s.as_str(), f.as_str()), (section, field));
            }
            other => panic!("Expected UnknownField for {section}.{field}, got: {:?}", other),
        }
    }
    Ok(())
}

#[test]
fn loading_twice_gives_equal_configs() -> TestResult {
    init_tracing();
    let schema = small_schema();
    let env = small_env().var("PROCESS_NODE_ARGS", "--expose-gc").build();

    let first = load(&schema, &env)?;
    let second = load(&schema, &env)?;

    assert_eq!(first, second);
    Ok(())
}

#[test]
fn failure_is_all_or_nothing_and_first_in_schema_order() {
    init_tracing();
    // Both server.port and process.max_restarts are bad; server comes first.
    let env = small_env()
        .var("PORT", "eighty")
        .var("PROCESS_MAX_RESTARTS", "lots")
        .build();

    let err = load(&small_schema(), &env).unwrap_err();
    assert_eq!(err.field(), Some(("server", "port")));

    let problems = check(&small_schema(), &env);
    let fields: Vec<_> = problems.iter().filter_map(|p| p.field()).collect();
    assert_eq!(fields, vec![("server", "port"), ("process", "max_restarts")]);
}

#[test]
fn secret_values_stay_out_of_errors_and_debug() -> TestResult {
    init_tracing();
    let cfg = load(&small_schema(), &small_env().build())?;
    assert!(!format!("{cfg:?}").contains("s3cr3t"));
    assert!(!cfg.render_toml(None)?.contains("s3cr3t"));

    // A type error never echoes the raw input.
    let err = load(
        &small_schema(),
        &small_env().var("PORT", "hunter2-password").build(),
    )
    .unwrap_err();
    assert!(!err.to_string().contains("hunter2"));
    Ok(())
}

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use deploycfg::config::{ValueSource, check, load};
use deploycfg::errors::DeploycfgError;
use deploycfg::schema::standard_schema;
use deploycfg::views::{ExecMode, Instances, SupervisorSettings, WEB_ROLE, WebServerSettings};
use deploycfg_test_utils::builders::EnvBuilder;
use deploycfg_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn standard_env_loads_with_production_defaults() -> TestResult {
    init_tracing();
    let schema = standard_schema()?;
    let cfg = load(&schema, &EnvBuilder::standard().build())?;

    assert_eq!(cfg.number("server", "port")?, Some(3000));
    assert_eq!(cfg.string("server", "environment")?, Some("production"));
    assert_eq!(cfg.byte_size("process", "max_memory_restart")?, Some(1 << 30));
    assert_eq!(cfg.duration("process", "min_uptime")?, Some(Duration::from_secs(5)));
    assert_eq!(
        cfg.source("deploy", "repo")?,
        &ValueSource::Environment("GITHUB_REPO".into())
    );
    assert!(check(&schema, &EnvBuilder::standard().build()).is_empty());
    Ok(())
}

#[test]
fn web_server_view_carries_security_headers() -> TestResult {
    init_tracing();
    let env = EnvBuilder::standard()
        .var("PORT", "8080")
        .var("ASSET_PREFIX", "https://cdn.example.com/")
        .var("SERVER_FRAME_OPTIONS", "deny")
        .build();
    let cfg = load(&standard_schema()?, &env)?;
    let web = WebServerSettings::from_config(&cfg)?;

    assert_eq!(web.port, 8080);
    assert!(web.is_production());
    assert!(!web.powered_by_header);
    assert_eq!(
        web.server_only.jwt_secret.expose(),
        "0123456789abcdef0123456789abcdef"
    );
    assert_eq!(
        web.public.entries(),
        [
            ("api_url", "https://api.example.com"),
            ("environment", "production")
        ]
    );
    assert!(!format!("{web:?}").contains("0123456789abcdef"));
    assert_eq!(web.asset_url("/_next/static/app.js"), "https://cdn.example.com/_next/static/app.js");

    let headers = web.security_headers();
    assert!(headers.contains(&(
        "Strict-Transport-Security",
        "max-age=63072000; includeSubDomains; preload".to_string()
    )));
    assert!(headers.contains(&("X-Frame-Options", "DENY".to_string())));
    assert!(headers.contains(&("X-Content-Type-Options", "nosniff".to_string())));

    assert_eq!(web.images.device_sizes.first(), Some(&640));
    assert_eq!(web.images.minimum_cache_ttl, Duration::from_secs(60));
    assert!(web.images.allows_domain("assets.example.com"));
    Ok(())
}

#[test]
fn supervisor_view_reads_the_web_app() -> TestResult {
    init_tracing();
    let env = EnvBuilder::standard()
        .var("PROJECT_NAME", "shop")
        .var("PROCESS_INSTANCES", "4")
        .var("PROCESS_EXEC_MODE", "fork")
        .var("PROCESS_MAX_MEMORY_RESTART", "500M")
        .build();
    let cfg = load(&standard_schema()?, &env)?;
    let sup = SupervisorSettings::from_config(&cfg)?;
    let web = sup.app(WEB_ROLE).ok_or("web app missing")?;

    assert_eq!(web.name, "shop");
    assert_eq!(web.script, "node_modules/next/dist/bin/next");
    assert_eq!(web.args, vec!["start"]);
    assert_eq!(web.cwd, PathBuf::from("/var/www/app/current"));
    assert_eq!(web.instances, Instances::Count(4));
    assert_eq!(web.exec_mode, ExecMode::Fork);
    assert!(!web.watch);
    assert_eq!(web.restart.max_memory_restart, Some(500 * 1024 * 1024));
    assert_eq!(web.restart.max_restarts, Some(10));
    assert_eq!(web.restart.restart_delay, Some(Duration::from_millis(4000)));
    assert_eq!(web.kill_timeout, Some(Duration::from_millis(1600)));
    assert_eq!(web.status_interval, Some(Duration::from_secs(30)));
    assert_eq!(web.metrics_port, Some(9209));
    assert!(web.source_map_support);
    assert_eq!(web.node_args, vec!["--max-old-space-size=2048", "--expose-gc"]);
    assert_eq!(
        web.logs.error_file,
        PathBuf::from("/var/www/app/shared/logs/app.error.log")
    );
    Ok(())
}

#[test]
fn worker_and_cron_apps_have_their_own_defaults() -> TestResult {
    init_tracing();
    let cfg = load(
        &standard_schema()?,
        &EnvBuilder::standard().var("PROJECT_NAME", "shop").build(),
    )?;
    let sup = SupervisorSettings::from_config(&cfg)?;

    let roles: Vec<&str> = sup.apps.iter().map(|app| app.role.as_str()).collect();
    assert_eq!(roles, vec!["web", "worker", "cron"]);

    let worker = sup.app("worker").ok_or("worker app missing")?;
    assert_eq!(worker.name, "shop-worker");
    assert_eq!(worker.script, "worker.js");
    assert_eq!(worker.instances, Instances::Count(2));
    assert_eq!(worker.exec_mode, ExecMode::Cluster);
    assert_eq!(worker.restart.max_memory_restart, Some(500 * 1024 * 1024));
    assert_eq!(worker.restart.max_restarts, None);
    assert_eq!(worker.metrics_port, None);
    assert_eq!(
        worker.logs.out_file,
        PathBuf::from("/var/www/app/shared/logs/worker.out.log")
    );

    let cron = sup.app("cron").ok_or("cron app missing")?;
    assert_eq!(cron.name, "shop-cron");
    assert_eq!(cron.script, "cron.js");
    assert_eq!(cron.instances, Instances::Count(1));
    assert_eq!(cron.exec_mode, ExecMode::Fork);
    assert_eq!(cron.restart.cron_restart.as_deref(), Some("0 */6 * * *"));
    assert_eq!(cron.restart.max_memory_restart, None);

    assert_eq!(sup.total_processes(8), 8 + 2 + 1);
    Ok(())
}

#[test]
fn extra_app_name_can_be_overridden() -> TestResult {
    let env = EnvBuilder::standard()
        .var("PROCESS_WORKER_NAME", "queue-runner")
        .build();
    let sup = SupervisorSettings::from_config(&load(&standard_schema()?, &env)?)?;
    assert_eq!(sup.app("worker").ok_or("worker app missing")?.name, "queue-runner");
    assert_eq!(sup.app("cron").ok_or("cron app missing")?.name, "nextjs-app-cron");
    Ok(())
}

#[test]
fn production_and_staging_targets() -> TestResult {
    init_tracing();
    let cfg = load(&standard_schema()?, &EnvBuilder::standard().build())?;
    let sup = SupervisorSettings::from_config(&cfg)?;

    let names: Vec<&str> = sup.targets.iter().map(|t| t.target.as_str()).collect();
    assert_eq!(names, vec!["production", "staging"]);

    let production = sup.target("production").ok_or("production missing")?;
    assert_eq!(production.hosts, vec!["host1", "host2"]);
    assert_eq!(production.git_ref, "origin/main");
    assert_eq!(production.node_env, "production");
    assert_eq!(production.post_deploy_steps().len(), 3);

    let staging = sup.target("staging").ok_or("staging missing")?;
    assert_eq!(staging.hosts, vec!["staging-host"]);
    assert_eq!(staging.git_ref, "origin/develop");
    assert_eq!(staging.repo, production.repo);
    assert_eq!(staging.node_env, "staging");
    assert_eq!(
        staging.post_deploy_steps().last(),
        Some(&"pm2 reload ecosystem.config.js --env staging")
    );
    assert_eq!(staging.targets(), vec!["deploy@staging-host"]);
    Ok(())
}

#[test]
fn max_instances_is_the_default() -> TestResult {
    let cfg = load(&standard_schema()?, &EnvBuilder::standard().build())?;
    let sup = SupervisorSettings::from_config(&cfg)?;
    assert_eq!(sup.app(WEB_ROLE).ok_or("web app missing")?.instances, Instances::Max);
    Ok(())
}

#[test]
fn instance_count_is_case_insensitive_and_bounded() -> TestResult {
    let schema = standard_schema()?;

    let env = EnvBuilder::standard().var("PROCESS_INSTANCES", "MAX").build();
    let sup = SupervisorSettings::from_config(&load(&schema, &env)?)?;
    assert_eq!(sup.app(WEB_ROLE).ok_or("web app missing")?.instances, Instances::Max);

    let env = EnvBuilder::standard()
        .var("PROCESS_INSTANCES", "5000000000")
        .build();
    let problems = check(&schema, &env);
    assert_eq!(problems.len(), 1);
    assert!(matches!(
        &problems[0],
        DeploycfgError::ValidationFailed { section, field, .. }
            if section == "process" && field == "instances"
    ));
    Ok(())
}

#[test]
fn short_jwt_secret_fails_validation() -> TestResult {
    init_tracing();
    let env = EnvBuilder::standard().var("JWT_SECRET", "too-short").build();
    match load(&standard_schema()?, &env) {
        Err(DeploycfgError::ValidationFailed { section, field, rule }) => {
            assert_eq!((section.as_str(), field.as_str()), ("server", "jwt_secret"));
            assert!(rule.contains("32"));
        }
        other => panic!("Expected ValidationFailed, got: {:?}", other),
    }
    Ok(())
}

#[test]
fn bad_instances_and_memory_size_are_caught() -> TestResult {
    init_tracing();
    let env = EnvBuilder::standard()
        .var("PROCESS_INSTANCES", "0")
        .var("PROCESS_MAX_MEMORY_RESTART", "lots")
        .build();
    let problems = check(&standard_schema()?, &env);

    assert_eq!(problems.len(), 2);
    assert!(matches!(
        &problems[0],
        DeploycfgError::ValidationFailed { field, .. } if field == "instances"
    ));
    assert!(matches!(
        &problems[1],
        DeploycfgError::TypeMismatch { field, .. } if field == "max_memory_restart"
    ));
    Ok(())
}

#[test]
fn empty_environment_reports_every_required_field() -> TestResult {
    let problems = check(&standard_schema()?, &EnvBuilder::new().build());
    let missing: Vec<_> = problems
        .iter()
        .filter_map(|p| match p {
            DeploycfgError::MissingRequiredField { env, .. } => Some(env.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        missing,
        vec![
            "API_URL",
            "DB_URL",
            "DB_PASSWORD",
            "JWT_SECRET",
            "DEPLOY_HOSTS",
            "GITHUB_REPO",
            "GITHUB_REPO"
        ]
    );
    Ok(())
}

#[test]
fn render_masks_secrets_and_filters_sections() -> TestResult {
    let cfg = load(&standard_schema()?, &EnvBuilder::standard().build())?;

    let all = cfg.render_toml(None)?;
    let headers: Vec<&str> = all.lines().filter(|l| l.starts_with('[')).collect();
    assert_eq!(
        headers,
        vec![
            "[server]",
            "[images]",
            "[process]",
            "[process_worker]",
            "[process_cron]",
            "[deploy]",
            "[deploy_staging]"
        ]
    );
    assert!(!all.contains("correct-horse-battery-staple"));
    assert!(all.contains("max_memory_restart = \"1G\""));

    let process_only = cfg.render_toml(Some("process"))?;
    assert!(process_only.contains("[process]"));
    assert!(!process_only.contains("[server]"));
    Ok(())
}

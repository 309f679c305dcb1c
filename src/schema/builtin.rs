// src/schema/builtin.rs

//! The standard schema for a web application deployment.
//!
//! `server` and `images` are consumed by the web server process. `process`
//! (the web app), `process_<role>` (extra apps) and `deploy` / `deploy_<target>`
//! are consumed by the process supervisor. Secrets and endpoints have no
//! defaults.

use crate::errors::Result;
use crate::schema::field::{ConfigField, Rule};
use crate::schema::model::{ConfigSchema, RawSchema, SectionSchema};
use crate::types::FieldType;

pub const SERVER: &str = "server";
pub const IMAGES: &str = "images";
pub const PROCESS: &str = "process";
pub const PROCESS_WORKER: &str = "process_worker";
pub const PROCESS_CRON: &str = "process_cron";
pub const DEPLOY: &str = "deploy";
pub const DEPLOY_STAGING: &str = "deploy_staging";

/// Sections named `process_<role>` declare further supervised apps.
pub const APP_SECTION_PREFIX: &str = "process_";
/// Sections named `deploy_<target>` declare further deploy targets.
pub const TARGET_SECTION_PREFIX: &str = "deploy_";

const NODE_ENVS: [&str; 4] = ["development", "production", "test", "staging"];

/// Build and validate the standard schema.
pub fn standard_schema() -> Result<ConfigSchema> {
    ConfigSchema::try_from(
        RawSchema::new()
            .section(server_section())
            .section(images_section())
            .section(process_section())
            .section(worker_section())
            .section(cron_section())
            .section(deploy_section())
            .section(staging_section()),
    )
}

fn server_section() -> SectionSchema {
    SectionSchema::new(SERVER)
        .field(
            ConfigField::new("port", FieldType::Number)
                .env("PORT")
                .default_value("3000")
                .rule(Rule::port())
                .describe("TCP port the web server listens on"),
        )
        .field(
            ConfigField::new(
                "environment",
                FieldType::enumeration(NODE_ENVS),
            )
            .env("NODE_ENV")
            .default_value("production"),
        )
        .field(
            ConfigField::new("asset_prefix", FieldType::String)
                .env("ASSET_PREFIX")
                .describe("CDN prefix for static assets"),
        )
        .field(
            ConfigField::new("api_url", FieldType::String)
                .env("API_URL")
                .required()
                .rule(Rule::Url),
        )
        .field(
            ConfigField::new("db_url", FieldType::String)
                .env("DB_URL")
                .required()
                .secret()
                .rule(Rule::NonEmpty),
        )
        .field(
            ConfigField::new("db_password", FieldType::String)
                .env("DB_PASSWORD")
                .required()
                .secret(),
        )
        .field(
            ConfigField::new("jwt_secret", FieldType::String)
                .env("JWT_SECRET")
                .required()
                .secret()
                .rule(Rule::MinLength(32))
                .describe("HMAC key for session tokens"),
        )
        .field(ConfigField::new("powered_by_header", FieldType::Boolean).default_value("false"))
        .field(ConfigField::new("compress", FieldType::Boolean).default_value("true"))
        .field(ConfigField::new("generate_etags", FieldType::Boolean).default_value("true"))
        .field(
            ConfigField::new("hsts_max_age", FieldType::Number)
                .default_value("63072000")
                .rule(Rule::range(0, i64::from(u32::MAX))),
        )
        .field(
            ConfigField::new("frame_options", FieldType::enumeration(["DENY", "SAMEORIGIN"]))
                .default_value("SAMEORIGIN"),
        )
        .field(
            ConfigField::new("referrer_policy", FieldType::String)
                .default_value("origin-when-cross-origin")
                .rule(Rule::NonEmpty),
        )
}

fn images_section() -> SectionSchema {
    SectionSchema::new(IMAGES)
        .field(
            ConfigField::new("domains", FieldType::list_of(FieldType::String))
                .default_value("assets.example.com"),
        )
        .field(
            ConfigField::new("device_sizes", FieldType::list_of(FieldType::Number))
                .default_value("640,750,828,1080,1200,1920,2048,3840")
                .rule(Rule::NonEmpty)
                .rule(Rule::each(Rule::range(1, 10_000))),
        )
        .field(
            ConfigField::new("image_sizes", FieldType::list_of(FieldType::Number))
                .default_value("16,32,48,64,96,128,256,384")
                .rule(Rule::each(Rule::range(1, 10_000))),
        )
        .field(
            ConfigField::new("minimum_cache_ttl", FieldType::Number)
                .default_value("60")
                .rule(Rule::range(0, i64::from(u32::MAX)))
                .describe("seconds"),
        )
}

/// `max` or a positive count that fits the supervisor's `u32`.
const INSTANCES_PATTERN: &str = r"(?i)^(max|[1-9][0-9]{0,8})$";

/// Five or six whitespace-separated cron fields.
const CRON_PATTERN: &str = r"^\S+(\s+\S+){4,5}$";

const APP_ROOT: &str = "/var/www/app/current";
const LOG_DIR: &str = "/var/www/app/shared/logs";

fn instances_field(default: &str) -> ConfigField {
    ConfigField::new("instances", FieldType::String)
        .default_value(default)
        .rule(Rule::pattern(INSTANCES_PATTERN))
        .describe("`max` for one per CPU, or a fixed count")
}

fn exec_mode_field(default: &str) -> ConfigField {
    ConfigField::new("exec_mode", FieldType::enumeration(["cluster", "fork"]))
        .default_value(default)
}

/// Fields every supervised app declares.
fn app_section(name: &str, script: &str, log_stem: &str) -> SectionSchema {
    SectionSchema::new(name)
        .field(
            ConfigField::new("script", FieldType::String)
                .default_value(script)
                .rule(Rule::NonEmpty),
        )
        .field(
            ConfigField::new("cwd", FieldType::String)
                .default_value(APP_ROOT)
                .rule(Rule::pattern("^/")),
        )
        .field(ConfigField::new("watch", FieldType::Boolean).default_value("false"))
        .field(ConfigField::new("autorestart", FieldType::Boolean).default_value("true"))
        .field(
            ConfigField::new("error_file", FieldType::String)
                .default_value(format!("{LOG_DIR}/{log_stem}.error.log"))
                .rule(Rule::NonEmpty),
        )
        .field(
            ConfigField::new("out_file", FieldType::String)
                .default_value(format!("{LOG_DIR}/{log_stem}.out.log"))
                .rule(Rule::NonEmpty),
        )
        .field(ConfigField::new("merge_logs", FieldType::Boolean).default_value("true"))
}

/// An extra app's name; unset means `<process.name>-<role>`.
fn derived_name_field() -> ConfigField {
    ConfigField::new("name", FieldType::String)
        .rule(Rule::pattern(r"^[A-Za-z0-9][A-Za-z0-9._-]*$"))
        .describe("defaults to the web app name with the role appended")
}

fn process_section() -> SectionSchema {
    let mut section = SectionSchema::new(PROCESS).field(
        ConfigField::new("name", FieldType::String)
            .env("PROJECT_NAME")
            .default_value("nextjs-app")
            .rule(Rule::pattern(r"^[A-Za-z0-9][A-Za-z0-9._-]*$")),
    );
    section
        .fields
        .extend(app_section(PROCESS, "node_modules/next/dist/bin/next", "app").fields);
    section
        .field(
            ConfigField::new("args", FieldType::list_of(FieldType::String)).default_value("start"),
        )
        .field(instances_field("max"))
        .field(exec_mode_field("cluster"))
        .field(
            ConfigField::new("max_memory_restart", FieldType::ByteSize)
                .default_value("1G")
                .rule(Rule::range(1 << 20, i64::MAX)),
        )
        .field(
            ConfigField::new("max_restarts", FieldType::Number)
                .default_value("10")
                .rule(Rule::range(0, 1_000)),
        )
        .field(ConfigField::new("min_uptime", FieldType::Duration).default_value("5s"))
        .field(ConfigField::new("restart_delay", FieldType::Duration).default_value("4000ms"))
        .field(
            ConfigField::new("log_date_format", FieldType::String)
                .default_value("YYYY-MM-DD HH:mm:ss Z"),
        )
        .field(
            ConfigField::new("metrics_port", FieldType::Number)
                .default_value("9209")
                .rule(Rule::port()),
        )
        .field(ConfigField::new("status_interval", FieldType::Duration).default_value("30s"))
        .field(ConfigField::new("wait_ready", FieldType::Boolean).default_value("true"))
        .field(ConfigField::new("listen_timeout", FieldType::Duration).default_value("8000ms"))
        .field(ConfigField::new("kill_timeout", FieldType::Duration).default_value("1600ms"))
        .field(ConfigField::new("source_map_support", FieldType::Boolean).default_value("true"))
        .field(
            ConfigField::new("node_args", FieldType::list_of(FieldType::String))
                .default_value("--max-old-space-size=2048,--expose-gc"),
        )
}

fn worker_section() -> SectionSchema {
    app_section(PROCESS_WORKER, "worker.js", "worker")
        .field(derived_name_field())
        .field(instances_field("2"))
        .field(exec_mode_field("cluster"))
        .field(
            ConfigField::new("max_memory_restart", FieldType::ByteSize)
                .default_value("500M")
                .rule(Rule::range(1 << 20, i64::MAX)),
        )
}

fn cron_section() -> SectionSchema {
    app_section(PROCESS_CRON, "cron.js", "cron")
        .field(derived_name_field())
        .field(instances_field("1"))
        .field(exec_mode_field("fork"))
        .field(
            ConfigField::new("cron_restart", FieldType::String)
                .default_value("0 */6 * * *")
                .rule(Rule::pattern(CRON_PATTERN))
                .describe("restart schedule in cron syntax"),
        )
}

/// Fields every deploy target declares. `repo` always comes from
/// `GITHUB_REPO`.
fn target_section(
    name: &str,
    hosts: ConfigField,
    git_ref: ConfigField,
    node_env: &str,
) -> SectionSchema {
    SectionSchema::new(name)
        .field(
            ConfigField::new("user", FieldType::String)
                .default_value("deploy")
                .rule(Rule::NonEmpty),
        )
        .field(hosts.rule(Rule::MinItems(1)))
        .field(git_ref)
        .field(
            ConfigField::new("repo", FieldType::String)
                .env("GITHUB_REPO")
                .required()
                .rule(Rule::NonEmpty),
        )
        .field(
            ConfigField::new("path", FieldType::String)
                .default_value("/var/www/app")
                .rule(Rule::pattern("^/")),
        )
        .field(
            ConfigField::new("node_env", FieldType::enumeration(NODE_ENVS))
                .default_value(node_env),
        )
        .field(ConfigField::new("post_deploy", FieldType::String).default_value(format!(
            "yarn install --frozen-lockfile && yarn build && pm2 reload ecosystem.config.js --env {node_env}"
        )))
}

fn deploy_section() -> SectionSchema {
    target_section(
        DEPLOY,
        ConfigField::new("hosts", FieldType::list_of(FieldType::String)).required(),
        ConfigField::new("git_ref", FieldType::String)
            .env("DEPLOY_REF")
            .default_value("origin/main"),
        "production",
    )
}

fn staging_section() -> SectionSchema {
    target_section(
        DEPLOY_STAGING,
        ConfigField::new("hosts", FieldType::list_of(FieldType::String))
            .default_value("staging-host"),
        ConfigField::new("git_ref", FieldType::String).default_value("origin/develop"),
        "staging",
    )
}

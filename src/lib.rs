// src/lib.rs

pub mod cli;
pub mod config;
pub mod env;
pub mod errors;
pub mod logging;
pub mod schema;
pub mod types;
pub mod views;

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ResolvedConfig, check, load};
use crate::env::{Layered, ProcessEnv, load_overrides};
use crate::schema::{ConfigSchema, standard_schema};
use crate::views::{SupervisorSettings, WebServerSettings};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the standard schema
/// - the environment snapshot and optional overrides file
/// - load / check
/// - the consumer views, so a config that loads but cannot feed the web
///   server or supervisor is still rejected
pub fn run(args: CliArgs) -> Result<()> {
    let schema = standard_schema()?;

    if let Some(name) = args.section.as_deref() {
        if schema.section(name).is_none() {
            bail!("unknown section '{name}'");
        }
    }

    if args.print_schema {
        print_schema(&schema, args.section.as_deref());
        return Ok(());
    }

    let base = if args.no_process_env {
        ProcessEnv::default()
    } else {
        ProcessEnv::capture()
    };
    let overrides = match &args.env_file {
        Some(path) => {
            info!(path = %path.display(), "loading overrides");
            load_overrides(path)?
        }
        None => BTreeMap::new(),
    };
    let env = Layered::new(overrides, base);

    if args.check {
        let problems = check(&schema, &env);
        if problems.is_empty() {
            build_views(&load(&schema, &env)?)?;
            println!("configuration OK ({} fields)", schema.len());
            return Ok(());
        }
        for problem in problems.iter() {
            eprintln!("  - {problem}");
        }
        bail!("{} configuration problem(s) found", problems.len());
    }

    let cfg = load(&schema, &env)?;
    build_views(&cfg)?;

    print!("{}", cfg.render_toml(args.section.as_deref())?);
    Ok(())
}

/// Build both consumer views; a config they cannot read is rejected.
fn build_views(cfg: &ResolvedConfig) -> Result<()> {
    let web = WebServerSettings::from_config(cfg)?;
    let supervisor = SupervisorSettings::from_config(cfg)?;
    debug!(
        port = web.port,
        environment = %web.public.environment,
        apps = supervisor.apps.len(),
        targets = supervisor.targets.len(),
        "consumer views built"
    );
    Ok(())
}

/// Human-readable schema listing.
fn print_schema(schema: &ConfigSchema, only: Option<&str>) {
    for section in schema.sections() {
        if only.is_some_and(|name| name != section.name) {
            continue;
        }
        println!("[{}]", section.name);
        for field in section.fields.iter() {
            let mut flags = Vec::new();
            if field.required {
                flags.push("required".to_string());
            }
            if field.secret {
                flags.push("secret".to_string());
            }
            if let Some(default) = &field.default {
                flags.push(format!("default={default}"));
            }
            for rule in field.rules.iter() {
                flags.push(rule.to_string());
            }

            println!(
                "  {:<20} {:<28} {}",
                field.name,
                field.ty.to_string(),
                field.env_var(&section.name)
            );
            if !flags.is_empty() {
                println!("      {}", flags.join("; "));
            }
            if let Some(text) = &field.description {
                println!("      {text}");
            }
        }
        println!();
    }
}

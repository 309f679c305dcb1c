// src/views/supervisor.rs

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::ResolvedConfig;
use crate::errors::{DeploycfgError, Result};
use crate::schema::builtin::{APP_SECTION_PREFIX, DEPLOY, PROCESS, TARGET_SECTION_PREFIX};
use crate::views::{convert, required, string_list};

/// How many copies of the app the supervisor runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instances {
    /// One per available CPU.
    Max,
    Count(u32),
}

impl Instances {
    /// Concrete instance count on a machine with `available_cpus` CPUs.
    pub fn resolve(&self, available_cpus: usize) -> usize {
        match self {
            Instances::Max => available_cpus.max(1),
            Instances::Count(n) => *n as usize,
        }
    }
}

impl FromStr for Instances {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("max") {
            return Ok(Instances::Max);
        }
        match s.parse::<u32>() {
            Ok(n) if n > 0 => Ok(Instances::Count(n)),
            _ => Err(format!(
                "invalid instances: {s} (expected \"max\" or a positive integer)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    #[default]
    Cluster,
    Fork,
}

impl FromStr for ExecMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cluster" => Ok(ExecMode::Cluster),
            "fork" => Ok(ExecMode::Fork),
            other => Err(format!(
                "invalid exec_mode: {other} (expected \"cluster\" or \"fork\")"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartPolicy {
    pub autorestart: bool,
    /// Restart when resident memory exceeds this many bytes.
    pub max_memory_restart: Option<u64>,
    /// Consecutive unstable restarts before giving up.
    pub max_restarts: Option<u32>,
    /// Uptime below which a run counts as unstable.
    pub min_uptime: Option<Duration>,
    pub restart_delay: Option<Duration>,
    /// Scheduled restart in cron syntax.
    pub cron_restart: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub error_file: PathBuf,
    pub out_file: PathBuf,
    pub date_format: Option<String>,
    pub merge_logs: bool,
}

/// One supervised app.
///
/// Built from `process` (role `web`) or a `process_<role>` section. Fields
/// a section does not declare are left to the supervisor's own defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub role: String,
    pub name: String,
    pub script: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub instances: Instances,
    pub exec_mode: ExecMode,
    pub watch: bool,
    pub restart: RestartPolicy,
    pub wait_ready: bool,
    pub listen_timeout: Option<Duration>,
    pub kill_timeout: Option<Duration>,
    pub status_interval: Option<Duration>,
    pub logs: LogSettings,
    pub metrics_port: Option<u16>,
    pub source_map_support: bool,
    pub node_args: Vec<String>,
}

/// One deploy target, from `deploy` (`production`) or a `deploy_<target>`
/// section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySettings {
    pub target: String,
    pub user: String,
    pub hosts: Vec<String>,
    pub git_ref: String,
    pub repo: String,
    pub path: PathBuf,
    pub node_env: String,
    pub post_deploy: String,
}

/// Everything the process supervisor reads: every app and every deploy
/// target, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorSettings {
    pub apps: Vec<AppSettings>,
    pub targets: Vec<DeploySettings>,
}

/// Role of the app built from the `process` section.
pub const WEB_ROLE: &str = "web";
const PRIMARY_TARGET: &str = "production";

impl SupervisorSettings {
    pub fn from_config(cfg: &ResolvedConfig) -> Result<Self> {
        let web = AppSettings::from_section(cfg, PROCESS, None)?;
        let mut apps = Vec::new();
        let mut targets = vec![DeploySettings::from_section(cfg, DEPLOY)?];

        for section in cfg.sections() {
            if section.name().starts_with(APP_SECTION_PREFIX) {
                let extra = AppSettings::from_section(cfg, section.name(), Some(web.name.as_str()))?;
                apps.push(extra);
            } else if section.name().starts_with(TARGET_SECTION_PREFIX) {
                targets.push(DeploySettings::from_section(cfg, section.name())?);
            }
        }
        apps.insert(0, web);

        Ok(Self { apps, targets })
    }

    pub fn app(&self, role: &str) -> Option<&AppSettings> {
        self.apps.iter().find(|app| app.role == role)
    }

    pub fn target(&self, name: &str) -> Option<&DeploySettings> {
        self.targets.iter().find(|t| t.target == name)
    }

    /// Processes across all apps on a machine with `available_cpus` CPUs.
    pub fn total_processes(&self, available_cpus: usize) -> usize {
        self.apps
            .iter()
            .map(|app| app.instances.resolve(available_cpus))
            .sum()
    }
}

impl AppSettings {
    /// `web_name` names the primary app; extra apps without a name of their
    /// own become `<web_name>-<role>`.
    pub fn from_section(
        cfg: &ResolvedConfig,
        section: &str,
        web_name: Option<&str>,
    ) -> Result<Self> {
        let role = section
            .strip_prefix(APP_SECTION_PREFIX)
            .unwrap_or(WEB_ROLE)
            .to_string();
        let text = |field: &str| -> Result<String> {
            Ok(required(cfg, section, field, cfg.string(section, field)?)?.to_string())
        };
        let duration =
            |field: &str| -> Result<Option<Duration>> { declared(cfg.duration(section, field)) };
        let flag = |field: &str, default: bool| -> Result<bool> {
            Ok(declared(cfg.boolean(section, field))?.unwrap_or(default))
        };
        let invalid = |field: &str, rule: String| DeploycfgError::ValidationFailed {
            section: section.to_string(),
            field: field.to_string(),
            rule,
        };

        let name = match (declared(cfg.string(section, "name"))?, web_name) {
            (Some(name), _) => name.to_string(),
            (None, Some(web)) => format!("{web}-{role}"),
            (None, None) => return Err(cfg.missing(section, "name")),
        };
        let instances = text("instances")?
            .parse::<Instances>()
            .map_err(|rule| invalid("instances", rule))?;
        let exec_mode = text("exec_mode")?
            .parse::<ExecMode>()
            .map_err(|rule| invalid("exec_mode", rule))?;

        let max_restarts = declared(cfg.number(section, "max_restarts"))?
            .map(|n| convert(n, section, "max_restarts", "restart count"))
            .transpose()?;
        let metrics_port = declared(cfg.number(section, "metrics_port"))?
            .map(|n| convert(n, section, "metrics_port", "port number"))
            .transpose()?;

        Ok(Self {
            name,
            script: text("script")?,
            args: declared_strings(cfg, section, "args")?,
            cwd: PathBuf::from(text("cwd")?),
            instances,
            exec_mode,
            watch: flag("watch", false)?,
            restart: RestartPolicy {
                autorestart: flag("autorestart", true)?,
                max_memory_restart: declared(cfg.byte_size(section, "max_memory_restart"))?,
                max_restarts,
                min_uptime: duration("min_uptime")?,
                restart_delay: duration("restart_delay")?,
                cron_restart: declared(cfg.string(section, "cron_restart"))?.map(str::to_string),
            },
            wait_ready: flag("wait_ready", false)?,
            listen_timeout: duration("listen_timeout")?,
            kill_timeout: duration("kill_timeout")?,
            status_interval: duration("status_interval")?,
            logs: LogSettings {
                error_file: PathBuf::from(text("error_file")?),
                out_file: PathBuf::from(text("out_file")?),
                date_format: declared(cfg.string(section, "log_date_format"))?
                    .map(str::to_string),
                merge_logs: flag("merge_logs", false)?,
            },
            metrics_port,
            source_map_support: flag("source_map_support", false)?,
            node_args: declared_strings(cfg, section, "node_args")?,
            role,
        })
    }
}

impl DeploySettings {
    pub fn from_section(cfg: &ResolvedConfig, section: &str) -> Result<Self> {
        let text = |field: &str| -> Result<String> {
            Ok(required(cfg, section, field, cfg.string(section, field)?)?.to_string())
        };

        let hosts = string_list(cfg, section, "hosts")?;
        if hosts.is_empty() {
            return Err(cfg.missing(section, "hosts"));
        }
        let target = section
            .strip_prefix(TARGET_SECTION_PREFIX)
            .unwrap_or(PRIMARY_TARGET)
            .to_string();

        Ok(Self {
            user: text("user")?,
            hosts,
            git_ref: text("git_ref")?,
            repo: text("repo")?,
            path: PathBuf::from(text("path")?),
            node_env: declared(cfg.string(section, "node_env"))?
                .unwrap_or(target.as_str())
                .to_string(),
            post_deploy: declared(cfg.string(section, "post_deploy"))?
                .unwrap_or_default()
                .to_string(),
            target,
        })
    }

    /// The post-deploy hook split into its `&&`-chained commands.
    pub fn post_deploy_steps(&self) -> Vec<&str> {
        self.post_deploy
            .split("&&")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// `user@host` targets, one per host.
    pub fn targets(&self) -> Vec<String> {
        self.hosts
            .iter()
            .map(|host| format!("{}@{host}", self.user))
            .collect()
    }
}

/// A field the section does not declare reads as unset.
fn declared<T>(value: Result<Option<T>>) -> Result<Option<T>> {
    match value {
        Err(DeploycfgError::UnknownField { .. }) => Ok(None),
        other => other,
    }
}

fn declared_strings(cfg: &ResolvedConfig, section: &str, field: &str) -> Result<Vec<String>> {
    if cfg.field(section, field).is_err() {
        return Ok(Vec::new());
    }
    string_list(cfg, section, field)
}

// src/views/web.rs

use std::time::Duration;

use crate::config::ResolvedConfig;
use crate::errors::Result;
use crate::schema::builtin::{IMAGES, SERVER};
use crate::views::{Secret, convert, number_list, required, string_list};

/// Everything the web server process reads at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebServerSettings {
    pub port: u16,
    pub asset_prefix: Option<String>,
    /// Safe to ship to browsers.
    pub public: PublicRuntimeConfig,
    /// Never leaves the server process.
    pub server_only: ServerRuntimeConfig,
    pub powered_by_header: bool,
    pub compress: bool,
    pub generate_etags: bool,
    pub hsts_max_age: u32,
    pub frame_options: String,
    pub referrer_policy: String,
    pub images: ImageSettings,
}

/// Runtime values exposed to both server and client code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicRuntimeConfig {
    pub api_url: String,
    pub environment: String,
}

impl PublicRuntimeConfig {
    /// Key/value pairs to embed in pages.
    pub fn entries(&self) -> [(&'static str, &str); 2] {
        [
            ("api_url", self.api_url.as_str()),
            ("environment", self.environment.as_str()),
        ]
    }
}

/// Runtime values only the server may read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRuntimeConfig {
    pub db_url: Secret,
    pub db_password: Secret,
    pub jwt_secret: Secret,
}

/// Image optimisation parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSettings {
    pub domains: Vec<String>,
    pub device_sizes: Vec<u32>,
    pub image_sizes: Vec<u32>,
    pub minimum_cache_ttl: Duration,
}

impl WebServerSettings {
    pub fn from_config(cfg: &ResolvedConfig) -> Result<Self> {
        let port = required(cfg, SERVER, "port", cfg.number(SERVER, "port")?)?;
        let hsts = required(cfg, SERVER, "hsts_max_age", cfg.number(SERVER, "hsts_max_age")?)?;
        let secret = |field: &str| -> Result<Secret> {
            let value = required(cfg, SERVER, field, cfg.string(SERVER, field)?)?;
            Ok(Secret::new(value))
        };

        Ok(Self {
            port: convert(port, SERVER, "port", "port number")?,
            asset_prefix: cfg.string(SERVER, "asset_prefix")?.map(str::to_string),
            public: PublicRuntimeConfig {
                api_url: required(cfg, SERVER, "api_url", cfg.string(SERVER, "api_url")?)?
                    .to_string(),
                environment: required(
                    cfg,
                    SERVER,
                    "environment",
                    cfg.string(SERVER, "environment")?,
                )?
                .to_string(),
            },
            server_only: ServerRuntimeConfig {
                db_url: secret("db_url")?,
                db_password: secret("db_password")?,
                jwt_secret: secret("jwt_secret")?,
            },
            powered_by_header: cfg.boolean(SERVER, "powered_by_header")?.unwrap_or(false),
            compress: cfg.boolean(SERVER, "compress")?.unwrap_or(true),
            generate_etags: cfg.boolean(SERVER, "generate_etags")?.unwrap_or(true),
            hsts_max_age: convert(hsts, SERVER, "hsts_max_age", "seconds")?,
            frame_options: cfg
                .string(SERVER, "frame_options")?
                .unwrap_or("SAMEORIGIN")
                .to_string(),
            referrer_policy: cfg
                .string(SERVER, "referrer_policy")?
                .unwrap_or("origin-when-cross-origin")
                .to_string(),
            images: ImageSettings::from_config(cfg)?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.public.environment == "production"
    }

    /// Headers attached to every response.
    pub fn security_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("X-DNS-Prefetch-Control", "on".to_string()),
            (
                "Strict-Transport-Security",
                format!("max-age={}; includeSubDomains; preload", self.hsts_max_age),
            ),
            ("X-XSS-Protection", "1; mode=block".to_string()),
            ("X-Frame-Options", self.frame_options.clone()),
            ("X-Content-Type-Options", "nosniff".to_string()),
            ("Referrer-Policy", self.referrer_policy.clone()),
        ]
    }

    /// URL prefix for static assets, empty when served from the origin.
    pub fn asset_url(&self, path: &str) -> String {
        let prefix = self.asset_prefix.as_deref().unwrap_or("").trim_end_matches('/');
        format!("{prefix}/{}", path.trim_start_matches('/'))
    }
}

impl ImageSettings {
    pub fn from_config(cfg: &ResolvedConfig) -> Result<Self> {
        let ttl = cfg.number(IMAGES, "minimum_cache_ttl")?.unwrap_or(60);
        let ttl: u64 = convert(ttl, IMAGES, "minimum_cache_ttl", "seconds")?;

        Ok(Self {
            domains: string_list(cfg, IMAGES, "domains")?,
            device_sizes: number_list(cfg, IMAGES, "device_sizes")?,
            image_sizes: number_list(cfg, IMAGES, "image_sizes")?,
            minimum_cache_ttl: Duration::from_secs(ttl),
        })
    }

    /// Whether images from `host` may be optimised.
    pub fn allows_domain(&self, host: &str) -> bool {
        self.domains.iter().any(|d| d.eq_ignore_ascii_case(host))
    }
}

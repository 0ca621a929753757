// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use biodex_app::UserId;
use biodex_store::{DEFAULT_TABLE, RestOptions};
use log::LevelFilter;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "biodex";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub user: UserSection,
    #[serde(default)]
    pub log: LogSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            store: StoreSection::default(),
            user: UserSection::default(),
            log: LogSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub table: Option<String>,
    pub timeout: Option<String>,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            access_token: None,
            table: Some(DEFAULT_TABLE.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSection {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSection {
    pub path: Option<String>,
    pub level: Option<String>,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            path: None,
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("BIODEX_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set BIODEX_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and put values under [store], [user], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(timeout) = &self.store.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "store.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(base_url) = &self.store.base_url {
            let trimmed = base_url.trim();
            if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
                bail!(
                    "store.base_url in {} must start with http:// or https://, got {:?}",
                    path.display(),
                    base_url
                );
            }
        }

        if let Some(level) = &self.log.level {
            parse_level(level)
                .with_context(|| format!("invalid log.level in {}", path.display()))?;
        }

        if let Some(id) = &self.user.id {
            UserId::parse(id).with_context(|| format!("invalid user.id in {}", path.display()))?;
        }

        Ok(())
    }

    /// Configured user, with `BIODEX_USER_ID` taking precedence.
    pub fn user_id(&self) -> Result<UserId> {
        let raw = env_override("BIODEX_USER_ID").or_else(|| self.user.id.clone());
        UserId::parse(raw.as_deref().unwrap_or_default())
    }

    pub fn rest_options(&self) -> Result<RestOptions> {
        let base_url = self.store.base_url.clone().ok_or_else(|| {
            anyhow!("store.base_url is not set -- add it under [store] or run with --demo")
        })?;
        let api_key = env_override("BIODEX_API_KEY")
            .or_else(|| self.store.api_key.clone())
            .ok_or_else(|| {
                anyhow!("store.api_key is not set -- set [store].api_key or BIODEX_API_KEY")
            })?;
        let access_token =
            env_override("BIODEX_ACCESS_TOKEN").or_else(|| self.store.access_token.clone());

        Ok(RestOptions {
            base_url,
            api_key,
            access_token,
            table: self.table().to_owned(),
            timeout: self.store_timeout()?,
        })
    }

    pub fn table(&self) -> &str {
        self.store.table.as_deref().unwrap_or(DEFAULT_TABLE)
    }

    pub fn store_timeout(&self) -> Result<Duration> {
        parse_duration(self.store.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => {
                let data_root = dirs::data_dir().ok_or_else(|| {
                    anyhow!("cannot resolve data directory; set [log].path in the config file")
                })?;
                Ok(data_root.join(APP_NAME).join("biodex.log"))
            }
        }
    }

    pub fn log_level(&self) -> Result<LevelFilter> {
        parse_level(self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# biodex config\n# Place this file at: {}\n\nversion = 1\n\n[store]\n# Project URL of the hosted database (the REST API lives under /rest/v1)\nbase_url = \"https://your-project.example.co\"\n# Public API key; BIODEX_API_KEY overrides this value\napi_key = \"\"\n# Optional signed-in user token; defaults to the API key. BIODEX_ACCESS_TOKEN overrides\n# access_token = \"\"\ntable = \"{}\"\ntimeout = \"{}\"\n\n[user]\n# Your user id; only species you authored are listed. BIODEX_USER_ID overrides\n# id = \"00000000-0000-0000-0000-000000000000\"\n\n[log]\n# Optional. Default is platform data dir (for example ~/.local/share/biodex/biodex.log)\n# path = \"/absolute/path/to/biodex.log\"\nlevel = \"{}\"\n",
            path.display(),
            DEFAULT_TABLE,
            DEFAULT_TIMEOUT,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn env_override(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_level(raw: &str) -> Result<LevelFilter> {
    raw.trim().parse::<LevelFilter>().map_err(|_| {
        anyhow!("unknown log level {raw:?}; use one of: off, error, warn, info, debug, trace")
    })
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("timeout {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}

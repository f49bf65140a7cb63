//! `typedsql.toml`:
//!
//! ```toml
//! version = "1"
//!
//! [render]
//! indent = ${TYPEDSQL_INDENT}
//! placeholder = "dollar"
//! max_tokens = 20000
//! ```
//!
//! `${VAR}` references are expanded from the environment before parsing.

use crate::cli::DEFAULT_CONFIG;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use typedsql::RenderConfig;

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// `None` when no file was found and defaults are in use.
    pub config_path: Option<PathBuf>,
    pub file: ConfigFile,
}

impl ProjectConfig {
    /// Load `config_path`. A missing file at the default location yields the
    /// default config; a missing file that was asked for explicitly is an error.
    pub fn load(config_path: PathBuf) -> anyhow::Result<Self> {
        if !config_path.exists() && config_path == Path::new(DEFAULT_CONFIG) {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self {
                config_path: None,
                file: ConfigFile::default(),
            });
        }

        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            anyhow::anyhow!("failed to read config file {}: {e}", config_path.display())
        })?;

        let file = ConfigFile::parse(&raw).map_err(|e| {
            anyhow::anyhow!("invalid config file {}: {e:#}", config_path.display())
        })?;
        tracing::debug!(path = %config_path.display(), render = ?file.render, "loaded config");

        Ok(Self {
            config_path: Some(config_path),
            file,
        })
    }

    pub fn render(&self) -> &RenderConfig {
        &self.file.render
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub render: RenderConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            render: RenderConfig::default(),
        }
    }
}

impl ConfigFile {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded = expand_env_vars(raw)?;
        let file: ConfigFile = toml::from_str(&expanded)?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }
        self.render.validate()?;
        Ok(())
    }
}

fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    expand_with(input, |key| std::env::var(key).ok())
}

fn expand_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' || chars.peek() != Some(&'{') {
            out.push(c);
            continue;
        }
        chars.next();

        let mut key = String::new();
        let mut closed = false;
        for ch in chars.by_ref() {
            if ch == '}' {
                closed = true;
                break;
            }
            key.push(ch);
        }

        if !closed {
            anyhow::bail!("unterminated env var reference: ${{{key}");
        }
        if key.is_empty() {
            anyhow::bail!("invalid env var reference: ${{}}");
        }
        let Some(value) = lookup(&key) else {
            anyhow::bail!("missing env var for config expansion: {key}");
        };
        out.push_str(&value);
    }

    Ok(out)
}

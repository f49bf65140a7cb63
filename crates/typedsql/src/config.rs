//! Render configuration.
//!
//! ```toml
//! indent = 4
//! placeholder = "dollar"
//! max_tokens = 20000
//! ```

use crate::error::{SqlGenError, SqlGenResult};
use serde::Deserialize;

/// Placeholder marker emitted for each bind occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// `?`
    #[default]
    Question,
    /// `$1`, `$2`, ... numbered by position
    Dollar,
}

impl PlaceholderStyle {
    pub(crate) fn write(&self, out: &mut String, position: usize) {
        match self {
            PlaceholderStyle::Question => out.push('?'),
            PlaceholderStyle::Dollar => {
                use std::fmt::Write;
                let _ = write!(out, "${position}");
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Width of one indentation level, in spaces.
    #[serde(default = "default_indent")]
    pub indent: usize,
    #[serde(default)]
    pub placeholder: PlaceholderStyle,
    /// Upper bound on tokens in one raw SQL fragment, checked when a query
    /// holding the fragment is rendered. Construction through
    /// [`RawSql::parse`](crate::RawSql::parse) caps fragments at
    /// [`DEFAULT_MAX_TOKENS`](crate::tokenizer::DEFAULT_MAX_TOKENS) regardless.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

fn default_indent() -> usize {
    4
}

fn default_max_tokens() -> usize {
    10_000
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            placeholder: PlaceholderStyle::default(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl RenderConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(raw: &str) -> SqlGenResult<Self> {
        let config: RenderConfig =
            toml::from_str(raw).map_err(|e| SqlGenError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SqlGenResult<()> {
        if self.indent < 2 {
            return Err(SqlGenError::Config(format!(
                "indent must be at least 2, got {}",
                self.indent
            )));
        }
        if self.max_tokens == 0 {
            return Err(SqlGenError::Config("max_tokens must be positive".to_string()));
        }
        Ok(())
    }

    /// One indentation level as a string of spaces.
    pub fn indent_str(&self) -> String {
        " ".repeat(self.indent)
    }
}

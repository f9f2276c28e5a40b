//! Engine configuration.
//!
//! All options are validated eagerly in [`crate::EngineBuilder::build`];
//! an invalid value is a configuration error, never deferred to the first
//! render.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// An ordered pair of tag marker strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    pub start: String,
    pub end: String,
}

impl Delimiters {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for marker in [&self.start, &self.end] {
            if marker.is_empty() {
                return Err(Error::invalid_delimiters("delimiter must not be empty"));
            }
            if marker.chars().any(char::is_whitespace) {
                return Err(Error::invalid_delimiters(format!(
                    "delimiter '{marker}' must not contain whitespace"
                )));
            }
            if marker.contains('=') {
                return Err(Error::invalid_delimiters(format!(
                    "delimiter '{marker}' must not contain '='"
                )));
            }
        }
        Ok(())
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new("{{", "}}")
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default delimiter pair, before any `{{=..=}}` tag takes effect.
    pub delimiters: Delimiters,

    /// HTML-escape interpolated values by default (`{{key}}`); raw
    /// interpolation is always available via `{{{key}}}` or `{{&key}}`.
    pub escape_html: bool,

    /// Maximum partial/extend/lambda re-entry depth for a single render
    /// call. Exceeding it aborts the render.
    pub recursion_limit: usize,

    /// Remove the surrounding whitespace and one trailing newline of tags
    /// standing alone on a line.
    pub trim_standalone: bool,

    /// Text encoding used when reading template sources from files.
    pub default_encoding: String,

    /// Compile every locatable template when the engine is built.
    pub precompile_all: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            delimiters: Delimiters::default(),
            escape_html: true,
            recursion_limit: 10,
            trim_standalone: true,
            default_encoding: "utf-8".to_string(),
            precompile_all: false,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.delimiters.validate()?;
        if self.recursion_limit == 0 {
            return Err(Error::config("recursion_limit must be at least 1"));
        }
        let encoding = self.default_encoding.to_ascii_lowercase();
        if encoding != "utf-8" && encoding != "utf8" {
            return Err(Error::config(format!(
                "unsupported encoding '{}': template sources are read as UTF-8",
                self.default_encoding
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_delimiter_rejected() {
        let delims = Delimiters::new("", "}}");
        assert_eq!(
            delims.validate().unwrap_err().error_code(),
            "E_COMPILE_INVALID_DELIMITERS"
        );
    }

    #[test]
    fn test_whitespace_delimiter_rejected() {
        assert!(Delimiters::new("{ {", "}}").validate().is_err());
    }

    #[test]
    fn test_equals_delimiter_rejected() {
        assert!(Delimiters::new("<=", "=>").validate().is_err());
    }

    #[test]
    fn test_zero_recursion_limit_rejected() {
        let config = EngineConfig {
            recursion_limit: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate().unwrap_err().error_code(),
            "E_CONFIG_INVALID_VALUE"
        );
    }

    #[test]
    fn test_unsupported_encoding_rejected() {
        let config = EngineConfig {
            default_encoding: "latin-1".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_utf8_spellings_accepted() {
        for enc in ["utf-8", "UTF-8", "utf8"] {
            let config = EngineConfig {
                default_encoding: enc.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }
    }
}

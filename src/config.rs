//! Command configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via JSONSTREAM_CONFIG or --config)
//! 3. Environment variables
//! 4. Command-line flags (applied by the caller)

use jsonstream_framing::{Framing, FramingConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration for both sides of a conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How the input stream is framed.
    pub input: FramingConfig,
    /// How the output stream is framed.
    pub output: FramingConfig,
}

impl Config {
    /// Loads configuration from `path` (or JSONSTREAM_CONFIG), then applies
    /// environment variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("JSONSTREAM_CONFIG").map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Applies overrides looked up by variable name.
    ///
    /// The separator and size limit apply to both sides.
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("JSONSTREAM_INPUT_FRAMING") {
            self.input.framing = parse_framing("JSONSTREAM_INPUT_FRAMING", &name)?;
        }
        if let Some(name) = lookup("JSONSTREAM_OUTPUT_FRAMING") {
            self.output.framing = parse_framing("JSONSTREAM_OUTPUT_FRAMING", &name)?;
        }
        if let Some(sep) = lookup("JSONSTREAM_SEPARATOR") {
            let sep = parse_separator(&sep).map_err(|e| {
                ConfigError::ValidationError(format!("JSONSTREAM_SEPARATOR: {}", e))
            })?;
            self.input.separator = sep;
            self.output.separator = sep;
        }
        if let Some(max) = lookup("JSONSTREAM_MAX_DOCUMENT_SIZE") {
            let max: usize = max.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "JSONSTREAM_MAX_DOCUMENT_SIZE: not a byte count: {:?}",
                    max
                ))
            })?;
            self.input.max_document_size = max;
            self.output.max_document_size = max;
        }
        Ok(())
    }

    /// Rejects settings that would make every read fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.max_document_size == 0 {
            return Err(ConfigError::ValidationError(
                "input.max_document_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_framing(var: &str, value: &str) -> Result<Framing, ConfigError> {
    value
        .parse()
        .map_err(|e| ConfigError::ValidationError(format!("{}: {}", var, e)))
}

/// Parses a separator byte given as a decimal number (`30`), a hex number
/// (`0x1e`), or a single ASCII character (`|`).
pub fn parse_separator(s: &str) -> Result<u8, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).ok()
    } else if s.len() == 1 && s.is_ascii() && !s.as_bytes()[0].is_ascii_digit() {
        Some(s.as_bytes()[0])
    } else {
        s.parse().ok()
    };
    parsed.ok_or_else(|| format!("invalid separator byte: {:?}", s))
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {}", .0.display(), .1)]
    IoError(PathBuf, std::io::Error),

    #[error("failed to parse config file '{}': {}", .0.display(), .1)]
    ParseError(PathBuf, String),

    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonstream_framing::{DEFAULT_MAX_DOCUMENT_SIZE, DEFAULT_SEPARATOR};
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.input.framing, Framing::Ndjson);
        assert_eq!(config.output.framing, Framing::Ndjson);
        assert_eq!(config.input.separator, DEFAULT_SEPARATOR);
        assert_eq!(config.input.max_document_size, DEFAULT_MAX_DOCUMENT_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "input:\n  framing: length-prefixed\n  max_document_size: 4096\noutput:\n  framing: seq\n  separator: 124"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.input.framing, Framing::LengthPrefixed);
        assert_eq!(config.input.max_document_size, 4096);
        assert_eq!(config.output.framing, Framing::RecordSeparator);
        assert_eq!(config.output.separator, b'|');
        // Unset fields keep their defaults.
        assert_eq!(config.input.separator, DEFAULT_SEPARATOR);
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "output:\n  framing: concat").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.output.framing, Framing::Concatenated);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/jsonstream.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(..)));
        assert!(err.to_string().contains("/nonexistent/jsonstream.yaml"));
    }

    #[test]
    fn test_invalid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "input:\n  framing: xml").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(..)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup(&[
                ("JSONSTREAM_INPUT_FRAMING", "concat"),
                ("JSONSTREAM_OUTPUT_FRAMING", "lp"),
                ("JSONSTREAM_SEPARATOR", "0x1f"),
                ("JSONSTREAM_MAX_DOCUMENT_SIZE", "1024"),
            ]))
            .unwrap();

        assert_eq!(config.input.framing, Framing::Concatenated);
        assert_eq!(config.output.framing, Framing::LengthPrefixed);
        assert_eq!(config.input.separator, 0x1f);
        assert_eq!(config.output.separator, 0x1f);
        assert_eq!(config.input.max_document_size, 1024);
    }

    #[test]
    fn test_env_override_errors() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup(&[("JSONSTREAM_INPUT_FRAMING", "csv")]))
            .unwrap_err();
        assert!(err.to_string().contains("JSONSTREAM_INPUT_FRAMING"));

        let err = config
            .apply_overrides(lookup(&[("JSONSTREAM_MAX_DOCUMENT_SIZE", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_zero_max_document_size_rejected() {
        let mut config = Config::default();
        config.input.max_document_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_separator() {
        assert_eq!(parse_separator("30"), Ok(0x1e));
        assert_eq!(parse_separator("0x1E"), Ok(0x1e));
        assert_eq!(parse_separator("|"), Ok(b'|'));
        assert_eq!(parse_separator("7"), Ok(7));
        assert!(parse_separator("256").is_err());
        assert!(parse_separator("ab").is_err());
        assert!(parse_separator("é").is_err());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = Config {
            input: FramingConfig::new(Framing::Concatenated),
            output: FramingConfig::new(Framing::RecordSeparator).with_separator(b';'),
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }
}

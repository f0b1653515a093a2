//! Configuration and data directory management.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Civil timezone every prompt and validation is anchored to.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Madrid;
pub const DEFAULT_PORT: u16 = 3004;

/// Paths to Consulta data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// LLM configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            llm_config_file: root.join("llm-config.json"),
            root,
        })
    }
}

/// Top-level Consulta configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultaConfig {
    /// HTTP server port.
    pub port: u16,
    /// IANA timezone; its name is written into prompts and required by the validator.
    pub timezone: Tz,
    /// Data directory paths.
    pub data_paths: DataPaths,
}

impl ConsultaConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        Self::from_vars(data_dir, |key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    pub fn from_vars(
        data_dir: impl AsRef<Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> std::io::Result<Self> {
        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let timezone = match lookup("CONSULTA_TIMEZONE").filter(|tz| !tz.trim().is_empty()) {
            Some(raw) => raw.trim().parse::<Tz>().unwrap_or_else(|e| {
                warn!(
                    "Invalid CONSULTA_TIMEZONE={} ({}), using {}",
                    raw,
                    e,
                    DEFAULT_TIMEZONE.name()
                );
                DEFAULT_TIMEZONE
            }),
            None => DEFAULT_TIMEZONE,
        };

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            timezone,
            data_paths,
        })
    }

    /// Timezone name used in prompts and validation.
    pub fn timezone_name(&self) -> &'static str {
        self.timezone.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConsultaConfig::from_vars(dir.path(), lookup_from(&[])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.timezone, DEFAULT_TIMEZONE);
        assert_eq!(config.timezone_name(), "Europe/Madrid");
        assert_eq!(
            config.data_paths.llm_config_file,
            dir.path().join("llm-config.json")
        );
    }

    #[test]
    fn test_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConsultaConfig::from_vars(
            dir.path(),
            lookup_from(&[
                ("PORT", "8080"),
                ("CONSULTA_TIMEZONE", " Atlantic/Canary "),
            ]),
        )
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.timezone, chrono_tz::Atlantic::Canary);
        assert_eq!(config.timezone_name(), "Atlantic/Canary");
    }

    #[test]
    fn test_invalid_timezone_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConsultaConfig::from_vars(
            dir.path(),
            lookup_from(&[("CONSULTA_TIMEZONE", "Europe/Atlantis")]),
        )
        .unwrap();
        assert_eq!(config.timezone, DEFAULT_TIMEZONE);
    }

    #[test]
    fn test_data_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested/data");
        let paths = DataPaths::new(&nested).unwrap();
        assert!(paths.root.is_dir());
    }
}

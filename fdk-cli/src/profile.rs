// SPDX-License-Identifier: AGPL-3.0-or-later
//! Driver selection from flags and profile files
//!
//! A profile file is TOML:
//!
//! ```toml
//! [profiles.home]
//! driver = "local"
//! rootDir = "/home/me"
//! ```
//!
//! Every key besides `driver` is handed to the driver builder.

use fdk_core::DriverConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub driver: String,
    #[serde(flatten)]
    pub options: DriverConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct Profiles {
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Profiles {
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CliError::Profiles {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&text).map_err(|message| CliError::Profiles {
            path: path.display().to_string(),
            message,
        })
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }
}

/// `$CONFIG_DIR/file-driver-kit/profiles.toml` for the current platform
pub fn default_profiles_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "fdk", "file-driver-kit")
        .map(|d| d.config_dir().join("profiles.toml"))
}

/// Parse a `key=value` driver option.
pub fn parse_option(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

/// Work out which driver to build and with what configuration.
///
/// `--driver` wins over the profile's driver; `--opt` pairs are layered on
/// top of the profile's keys.
pub fn resolve(
    driver: Option<&str>,
    profile: Option<&Profile>,
    options: &[(String, String)],
) -> CliResult<(String, DriverConfig)> {
    let mut config = profile.map(|p| p.options.clone()).unwrap_or_default();
    config.extend(options.iter().cloned());

    let name = driver
        .map(str::to_string)
        .or_else(|| profile.map(|p| p.driver.clone()))
        .ok_or(CliError::NoDriver)?;

    tracing::debug!(driver = %name, keys = config.len(), "resolved driver");
    Ok((name, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[profiles.home]
driver = "local"
rootDir = "/home/me"

[profiles.cloud]
driver = "dropbox"
client_id = "id"
client_secret = "secret"
token = "t"
"#;

    #[test]
    fn test_parse_profiles() {
        let profiles = Profiles::parse(SAMPLE).unwrap();
        let home = &profiles.profiles["home"];
        assert_eq!(home.driver, "local");
        assert_eq!(home.options.get("rootDir"), Some("/home/me"));
        assert_eq!(home.options.get("driver"), None);
        assert_eq!(profiles.profiles["cloud"].options.len(), 3);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("profiles.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let profiles = Profiles::load(&path).unwrap();
        assert_eq!(profiles.profiles.len(), 2);

        assert!(matches!(
            Profiles::load(&dir.path().join("missing.toml")),
            Err(CliError::Profiles { .. })
        ));
    }

    #[test]
    fn test_empty_file_has_no_profiles() {
        assert!(Profiles::parse("").unwrap().profiles.is_empty());
    }

    #[test]
    fn test_parse_option() {
        assert_eq!(
            parse_option("rootDir=/tmp").unwrap(),
            ("rootDir".to_string(), "/tmp".to_string())
        );
        assert_eq!(
            parse_option("token=a=b").unwrap(),
            ("token".to_string(), "a=b".to_string())
        );
        assert!(parse_option("novalue").is_err());
        assert!(parse_option("=value").is_err());
    }

    #[test]
    fn test_resolve_flags_only() {
        let opts = vec![("rootDir".to_string(), "/tmp".to_string())];
        let (name, config) = resolve(Some("local"), None, &opts).unwrap();
        assert_eq!(name, "local");
        assert_eq!(config.get("rootDir"), Some("/tmp"));
    }

    #[test]
    fn test_resolve_layers_over_profile() {
        let profiles = Profiles::parse(SAMPLE).unwrap();
        let home = &profiles.profiles["home"];
        let opts = vec![("rootDir".to_string(), "/srv".to_string())];

        let (name, config) = resolve(None, Some(home), &opts).unwrap();
        assert_eq!(name, "local");
        assert_eq!(config.get("rootDir"), Some("/srv"));

        let (name, _) = resolve(Some("memory"), Some(home), &[]).unwrap();
        assert_eq!(name, "memory");
    }

    #[test]
    fn test_resolve_without_driver() {
        assert!(matches!(resolve(None, None, &[]), Err(CliError::NoDriver)));
    }
}

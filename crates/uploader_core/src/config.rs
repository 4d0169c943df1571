use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.oresults.eu";
pub const DEFAULT_SETTINGS_FILE: &str = "uploader.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub debounce_ms: u64,
    pub command_timeout_secs: u64,
    pub log_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            debounce_ms: 2_000,
            command_timeout_secs: 10,
            log_capacity: 1_000,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_url: Option<String>,
    debounce_ms: Option<u64>,
    command_timeout_secs: Option<u64>,
    log_capacity: Option<usize>,
}

impl Settings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Overlays values present in a TOML document onto `self`.
    pub fn merge_toml(&mut self, raw: &str) -> anyhow::Result<()> {
        let file_cfg: FileSettings = toml::from_str(raw).context("invalid settings file")?;
        if let Some(v) = file_cfg.api_url {
            self.api_url = v;
        }
        if let Some(v) = file_cfg.debounce_ms {
            self.debounce_ms = v;
        }
        if let Some(v) = file_cfg.command_timeout_secs {
            self.command_timeout_secs = v;
        }
        if let Some(v) = file_cfg.log_capacity {
            self.log_capacity = v;
        }
        Ok(())
    }

    /// Applies `APP__*` overrides; `lookup` is normally `std::env::var`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("ORESULTS_API_URL") {
            self.api_url = v;
        }
        if let Some(v) = lookup("APP__API_URL") {
            self.api_url = v;
        }
        if let Some(v) = lookup("APP__DEBOUNCE_MS").and_then(|v| v.parse().ok()) {
            self.debounce_ms = v;
        }
        if let Some(v) = lookup("APP__COMMAND_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.command_timeout_secs = v;
        }
        if let Some(v) = lookup("APP__LOG_CAPACITY").and_then(|v| v.parse().ok()) {
            self.log_capacity = v;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.api_url)
            .with_context(|| format!("invalid api_url '{}'", self.api_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("api_url must use http or https, got '{}'", url.scheme());
        }
        if self.command_timeout_secs == 0 {
            bail!("command_timeout_secs must be greater than zero");
        }
        if self.log_capacity == 0 {
            bail!("log_capacity must be greater than zero");
        }
        Ok(())
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}

/// Defaults, then the settings file (explicit path or `uploader.toml` in the
/// working directory), then environment overrides.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (file, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };
    match fs::read_to_string(&file) {
        Ok(raw) => settings
            .merge_toml(&raw)
            .with_context(|| format!("failed to load '{}'", file.display()))?,
        Err(err) if required => {
            return Err(err).with_context(|| format!("failed to read '{}'", file.display()));
        }
        Err(_) => {}
    }

    settings.apply_env_overrides(|name| std::env::var(name).ok());
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let mut settings = Settings::default();
        settings
            .merge_toml("api_url = \"http://127.0.0.1:9000/\"\ndebounce_ms = 250\n")
            .expect("merge");
        assert_eq!(settings.api_url, "http://127.0.0.1:9000/");
        assert_eq!(settings.api_base(), "http://127.0.0.1:9000");
        assert_eq!(settings.debounce(), Duration::from_millis(250));
        assert_eq!(settings.command_timeout_secs, 10);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut settings = Settings::default();
        let err = settings.merge_toml("api_key = \"secret\"").expect_err("must fail");
        assert!(err.to_string().contains("invalid settings file"));
    }

    #[test]
    fn env_overrides_win_and_ignore_unparsable_numbers() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("ORESULTS_API_URL", "http://legacy.example"),
            ("APP__API_URL", "http://override.example"),
            ("APP__LOG_CAPACITY", "25"),
            ("APP__COMMAND_TIMEOUT_SECS", "soon"),
        ]);
        let mut settings = Settings::default();
        settings.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(settings.api_url, "http://override.example");
        assert_eq!(settings.log_capacity, 25);
        assert_eq!(settings.command_timeout_secs, 10);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut settings = Settings {
            api_url: "ftp://results".into(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        settings.api_url = DEFAULT_API_URL.into();
        settings.log_capacity = 0;
        assert!(settings.validate().is_err());

        settings.log_capacity = 1;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let missing = std::env::temp_dir().join("uploader_settings_does_not_exist.toml");
        assert!(load_settings(Some(&missing)).is_err());
    }
}
